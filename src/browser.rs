//! chromiumoxide によるブラウザ操作
//!
//! リクエストごとに独立したChromeプロセスを起動し、終了時に必ず破棄する

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::{BrowserLauncher, BrowserSession, ListingPage, ScrollMetrics, ScrollTarget};

/// 実行中のリクエストがこの数以下ならアイドルとみなす（networkidle2 相当）
const MAX_IDLE_IN_FLIGHT: usize = 2;
/// CDPリクエストのタイムアウト
const CDP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

static LAUNCH_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct ChromeLauncher {
    headless: bool,
    chrome_path: Option<String>,
    idle_poll: Duration,
    close_timeout: Duration,
}

impl ChromeLauncher {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            headless: config.headless,
            chrome_path: config.chrome_path.clone(),
            idle_poll: config.network_idle_poll,
            close_timeout: config.close_timeout,
        }
    }

    /// 同時に起動した他のプロセスと衝突しないユーザーデータディレクトリ
    fn unique_user_data_dir() -> PathBuf {
        let unique_id = format!(
            "{}-{}-{}",
            std::process::id(),
            LAUNCH_COUNTER.fetch_add(1, Ordering::Relaxed),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        std::env::temp_dir().join(format!("city-events-{}", unique_id))
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ScraperError> {
        info!("Launching browser...");

        let user_data_dir = Self::unique_user_data_dir();

        let mut builder = BrowserConfig::builder()
            .user_data_dir(&user_data_dir)
            .window_size(1280, 800)
            .request_timeout(CDP_REQUEST_TIMEOUT);

        if let Some(path) = &self.chrome_path {
            builder = builder.chrome_executable(path);
        }

        if !self.headless {
            builder = builder.with_head();
        }

        // サーバー環境ではサンドボックスが使えない
        builder = builder
            .no_sandbox()
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        let browser_config = builder
            .build()
            .map_err(|e| ScraperError::Resource(format!("ブラウザ設定エラー: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::Resource(format!("ブラウザ起動失敗: {}", e)))?;

        // ブラウザイベントハンドラをバックグラウンドで実行
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        });

        info!("Browser launched");
        Ok(Box::new(ChromeSession {
            browser,
            handler_task,
            user_data_dir,
            idle_poll: self.idle_poll,
            // close / wait それぞれに割り当て、残りをkillに使う
            step_timeout: self.close_timeout / 3,
        }))
    }
}

pub struct ChromeSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    user_data_dir: PathBuf,
    idle_poll: Duration,
    step_timeout: Duration,
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn new_page(&mut self) -> Result<Box<dyn ListingPage>, ScraperError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::Resource(format!("ページ作成失敗: {}", e)))?;

        // ナビゲーション前に購読しておく
        let network = Arc::new(Mutex::new(NetworkTracker::new(Instant::now())));
        let monitor = spawn_network_monitor(&page, network.clone()).await?;

        Ok(Box::new(ChromePage {
            page,
            network,
            monitor,
            idle_poll: self.idle_poll,
        }))
    }

    async fn close(self: Box<Self>) -> Result<(), ScraperError> {
        info!("Closing browser...");
        let mut session = *self;
        let step = session.step_timeout;

        let graceful = match timeout(step, session.browser.close()).await {
            Ok(Ok(_)) => match timeout(step, session.browser.wait()).await {
                Ok(Ok(_)) => Ok(()),
                Ok(Err(e)) => Err(format!("終了待機失敗: {}", e)),
                Err(_) => Err(format!("{:?}以内にプロセスが終了しませんでした", step)),
            },
            Ok(Err(e)) => Err(format!("終了コマンド失敗: {}", e)),
            Err(_) => Err(format!("終了コマンドが{:?}以内に応答しませんでした", step)),
        };

        let result = match graceful {
            Ok(()) => Ok(()),
            Err(reason) => {
                warn!("Graceful browser close failed ({}), killing process", reason);
                match session.browser.kill().await {
                    Some(Err(kill_err)) => Err(ScraperError::Resource(format!(
                        "ブラウザ終了失敗: {} / kill: {}",
                        reason, kill_err
                    ))),
                    _ => Ok(()),
                }
            }
        };

        session.handler_task.abort();

        if let Err(e) = tokio::fs::remove_dir_all(&session.user_data_dir).await {
            debug!(
                "Failed to remove user data dir {:?}: {}",
                session.user_data_dir, e
            );
        }

        if result.is_ok() {
            info!("Browser closed");
        }
        result
    }
}

/// CDPのネットワークイベントから実行中リクエストを数える
#[derive(Debug)]
struct NetworkTracker {
    in_flight: HashSet<String>,
    /// 実行中リクエストが閾値以下になった時刻
    idle_since: Option<Instant>,
}

impl NetworkTracker {
    fn new(now: Instant) -> Self {
        Self {
            in_flight: HashSet::new(),
            idle_since: Some(now),
        }
    }

    fn started(&mut self, request_id: String, now: Instant) {
        self.in_flight.insert(request_id);
        self.refresh(now);
    }

    fn finished(&mut self, request_id: &str, now: Instant) {
        self.in_flight.remove(request_id);
        self.refresh(now);
    }

    fn refresh(&mut self, now: Instant) {
        if self.in_flight.len() > MAX_IDLE_IN_FLIGHT {
            self.idle_since = None;
        } else if self.idle_since.is_none() {
            self.idle_since = Some(now);
        }
    }

    fn is_idle(&self, now: Instant, quiet: Duration) -> bool {
        self.idle_since
            .map(|since| now.saturating_duration_since(since) >= quiet)
            .unwrap_or(false)
    }
}

enum NetworkEvent {
    Started(String),
    Done(String),
}

fn apply_network_event(tracker: &Mutex<NetworkTracker>, event: NetworkEvent) {
    let now = Instant::now();
    let mut tracker = tracker.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    match event {
        NetworkEvent::Started(id) => tracker.started(id, now),
        NetworkEvent::Done(id) => tracker.finished(&id, now),
    }
}

async fn spawn_network_monitor(
    page: &Page,
    tracker: Arc<Mutex<NetworkTracker>>,
) -> Result<JoinHandle<()>, ScraperError> {
    let listen_err =
        |e: CdpError| ScraperError::Resource(format!("ネットワークイベント購読失敗: {}", e));

    let started = page
        .event_listener::<EventRequestWillBeSent>()
        .await
        .map_err(listen_err)?
        .map(|e| NetworkEvent::Started(e.request_id.inner().clone()))
        .boxed();
    let finished = page
        .event_listener::<EventLoadingFinished>()
        .await
        .map_err(listen_err)?
        .map(|e| NetworkEvent::Done(e.request_id.inner().clone()))
        .boxed();
    let failed = page
        .event_listener::<EventLoadingFailed>()
        .await
        .map_err(listen_err)?
        .map(|e| NetworkEvent::Done(e.request_id.inner().clone()))
        .boxed();

    let mut events = futures::stream::select_all([started, finished, failed]);

    Ok(tokio::spawn(async move {
        while let Some(event) = events.next().await {
            apply_network_event(&tracker, event);
        }
    }))
}

pub struct ChromePage {
    page: Page,
    network: Arc<Mutex<NetworkTracker>>,
    monitor: JoinHandle<()>,
    idle_poll: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsScrollMetrics {
    scroll_height: f64,
    viewport_height: f64,
}

impl ChromePage {
    async fn evaluate_json<T>(&self, script: &str) -> Result<T, ScraperError>
    where
        T: serde::de::DeserializeOwned,
    {
        let raw: String = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ScraperError::Extraction(format!("JavaScript実行エラー: {}", e)))?
            .into_value()
            .map_err(|e| ScraperError::Extraction(format!("評価結果の取得失敗: {}", e)))?;

        serde_json::from_str(&raw)
            .map_err(|e| ScraperError::Extraction(format!("評価結果のパース失敗: {}", e)))
    }
}

#[async_trait]
impl ScrollTarget for ChromePage {
    async fn scroll_metrics(&self) -> Result<ScrollMetrics, ScraperError> {
        let metrics: JsScrollMetrics = self
            .evaluate_json(
                r#"
                JSON.stringify({
                    scrollHeight: document.body ? document.body.scrollHeight : 0,
                    viewportHeight: window.innerHeight
                })
                "#,
            )
            .await?;

        Ok(ScrollMetrics {
            scroll_height: metrics.scroll_height.max(0.0) as u64,
            viewport_height: metrics.viewport_height.max(0.0) as u64,
        })
    }

    async fn scroll_by(&self, distance: u64) -> Result<(), ScraperError> {
        let script = format!("window.scrollBy(0, {})", distance);
        self.page
            .evaluate(script.as_str())
            .await
            .map_err(|e| ScraperError::Extraction(format!("スクロール失敗: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl ListingPage for ChromePage {
    async fn goto(&self, url: &str) -> Result<(), ScraperError> {
        info!("Navigating to {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| ScraperError::Navigation(format!("{}: {}", url, e)))?;
        Ok(())
    }

    /// 実行中リクエストが2件以下の状態が `quiet` 続くまで待機する。
    /// 待機時間の上限は呼び出し側のタイムアウトで決まる。
    async fn wait_for_network_idle(&self, quiet: Duration) -> Result<(), ScraperError> {
        let start = Instant::now();

        loop {
            let (idle, in_flight) = {
                let tracker = self
                    .network
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                (tracker.is_idle(Instant::now(), quiet), tracker.in_flight.len())
            };

            if idle {
                info!(
                    "Network idle after {:?} ({} requests in flight)",
                    start.elapsed(),
                    in_flight
                );
                return Ok(());
            }
            debug!("Waiting for network idle ({} requests in flight)", in_flight);

            sleep(self.idle_poll).await;
        }
    }

    async fn content(&self) -> Result<String, ScraperError> {
        self.page
            .content()
            .await
            .map_err(|e| ScraperError::Extraction(format!("HTML取得失敗: {}", e)))
    }

    async fn close(self: Box<Self>) -> Result<(), ScraperError> {
        self.monitor.abort();
        self.page
            .close()
            .await
            .map_err(|e| ScraperError::Resource(format!("ページ終了失敗: {}", e)))
    }
}
