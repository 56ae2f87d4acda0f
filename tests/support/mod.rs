//! テスト用のインプロセス偽ブラウザ
//!
//! 起動中のセッション数を数え、フィクスチャHTMLを返し、ナビゲーションを停止させられる

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use city_events_service::events::ScrollOptions;
use city_events_service::{
    BrowserLauncher, BrowserSession, EventScraper, ListingPage, ScraperConfig, ScraperError,
    ScrollMetrics, ScrollTarget,
};

#[derive(Default)]
struct FakeState {
    html: Mutex<String>,
    stall_navigation: AtomicBool,
    fail_launch: AtomicBool,
    fail_close: AtomicBool,
    hang_close: AtomicBool,
    closes: AtomicUsize,
    navigation_delay_ms: AtomicUsize,
    height_growth: AtomicUsize,
    launches: AtomicUsize,
    live_sessions: AtomicUsize,
    max_live_sessions: AtomicUsize,
    scrolls: AtomicUsize,
    visited: Mutex<Vec<String>>,
}

#[derive(Clone, Default)]
pub struct FakeBrowser {
    state: Arc<FakeState>,
}

impl FakeBrowser {
    pub fn with_html(html: impl Into<String>) -> Self {
        let browser = Self::default();
        *browser.state.html.lock().unwrap() = html.into();
        browser
    }

    /// goto が完了しない
    pub fn stalling(self) -> Self {
        self.state.stall_navigation.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_launch(self) -> Self {
        self.state.fail_launch.store(true, Ordering::SeqCst);
        self
    }

    /// ブラウザ終了がエラーを返す
    pub fn failing_close(self) -> Self {
        self.state.fail_close.store(true, Ordering::SeqCst);
        self
    }

    /// ブラウザ終了が完了しない
    pub fn hanging_close(self) -> Self {
        self.state.hang_close.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_navigation_delay(self, delay: Duration) -> Self {
        self.state
            .navigation_delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
        self
    }

    /// スクロールのたびにページが伸びる
    pub fn with_height_growth(self, growth: u64) -> Self {
        self.state
            .height_growth
            .store(growth as usize, Ordering::SeqCst);
        self
    }

    pub fn launches(&self) -> usize {
        self.state.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    pub fn live_sessions(&self) -> usize {
        self.state.live_sessions.load(Ordering::SeqCst)
    }

    pub fn max_live_sessions(&self) -> usize {
        self.state.max_live_sessions.load(Ordering::SeqCst)
    }

    pub fn scrolls(&self) -> usize {
        self.state.scrolls.load(Ordering::SeqCst)
    }

    pub fn visited(&self) -> Vec<String> {
        self.state.visited.lock().unwrap().clone()
    }

    pub fn scraper(&self, config: ScraperConfig) -> EventScraper {
        EventScraper::with_launcher(config, Arc::new(self.clone()))
    }
}

#[async_trait]
impl BrowserLauncher for FakeBrowser {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ScraperError> {
        self.state.launches.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_launch.load(Ordering::SeqCst) {
            return Err(ScraperError::Resource("chrome not found".into()));
        }

        let live = self.state.live_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_live_sessions.fetch_max(live, Ordering::SeqCst);

        Ok(Box::new(FakeSession {
            state: self.state.clone(),
        }))
    }
}

struct FakeSession {
    state: Arc<FakeState>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn new_page(&mut self) -> Result<Box<dyn ListingPage>, ScraperError> {
        Ok(Box::new(FakePage {
            state: self.state.clone(),
            height: Mutex::new(2000),
        }))
    }

    async fn close(self: Box<Self>) -> Result<(), ScraperError> {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        if self.state.hang_close.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        self.state.live_sessions.fetch_sub(1, Ordering::SeqCst);
        if self.state.fail_close.load(Ordering::SeqCst) {
            return Err(ScraperError::Resource("browser process did not exit".into()));
        }
        Ok(())
    }
}

struct FakePage {
    state: Arc<FakeState>,
    height: Mutex<u64>,
}

#[async_trait]
impl ScrollTarget for FakePage {
    async fn scroll_metrics(&self) -> Result<ScrollMetrics, ScraperError> {
        Ok(ScrollMetrics {
            scroll_height: *self.height.lock().unwrap(),
            viewport_height: 800,
        })
    }

    async fn scroll_by(&self, _distance: u64) -> Result<(), ScraperError> {
        self.state.scrolls.fetch_add(1, Ordering::SeqCst);
        let growth = self.state.height_growth.load(Ordering::SeqCst) as u64;
        *self.height.lock().unwrap() += growth;
        Ok(())
    }
}

#[async_trait]
impl ListingPage for FakePage {
    async fn goto(&self, url: &str) -> Result<(), ScraperError> {
        self.state.visited.lock().unwrap().push(url.to_string());

        if self.state.stall_navigation.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let delay = self.state.navigation_delay_ms.load(Ordering::SeqCst) as u64;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Ok(())
    }

    async fn wait_for_network_idle(&self, _quiet: Duration) -> Result<(), ScraperError> {
        Ok(())
    }

    async fn content(&self) -> Result<String, ScraperError> {
        Ok(self.state.html.lock().unwrap().clone())
    }

    async fn close(self: Box<Self>) -> Result<(), ScraperError> {
        Ok(())
    }
}

/// タイマーを短くした設定
pub fn fast_config() -> ScraperConfig {
    ScraperConfig::default()
        .with_navigation_timeout(Duration::from_millis(200))
        .with_scroll(ScrollOptions {
            interval: Duration::ZERO,
            settle: Duration::ZERO,
            max_iterations: 40,
            ..Default::default()
        })
}

pub fn card(title: &str, date: &str, href: &str) -> String {
    let date_block = if date.is_empty() {
        String::new()
    } else {
        format!(r#"<div data-ref="event_card_date_string"><p>{}</p></div>"#, date)
    };
    format!(
        r#"<li class="card-list-item"><a href="{}"><span data-ref="event_card_title">{}</span>{}</a></li>"#,
        href, title, date_block
    )
}

pub fn listing_page(cards: &[String]) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>Events</title></head><body><ul>{}</ul></body></html>",
        cards.concat()
    )
}

/// 正常なカード3件と日付欠損のカード1件
pub fn mumbai_fixture() -> String {
    listing_page(&[
        card("Sunburn Arena", "Sat, 15 Nov", "/sunburn-arena-mumbai/event"),
        card("Stand-up Special", "Sun, 16 Nov", "https://insider.in/standup-special/event"),
        card("Jazz by the Bay", "", "/jazz-by-the-bay/event"),
        card("Food Truck Fest", "Fri, 21 Nov – Sun, 23 Nov", "/food-truck-fest/event"),
    ])
}
