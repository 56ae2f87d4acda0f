//! スクレイプセッション管理
//!
//! 起動 → ナビゲーション → スクロール → 抽出 → 終了 を1リクエストごとに順番に実行する

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::browser::ChromeLauncher;
use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::{BrowserLauncher, BrowserSession, ListingPage};

use super::extractor::extract_raw;
use super::normalizer::{normalize, Normalized};
use super::scroll::exhaust_scroll;
use super::types::ScrapeResult;

/// 都市別イベントスクレイパー
///
/// ブラウザプロセスはリクエスト間で共有しない。同時に起動するプロセス数は
/// `max_concurrent_sessions` で制限し、超過分は空きが出るまで待機する。
pub struct EventScraper {
    config: ScraperConfig,
    launcher: Arc<dyn BrowserLauncher>,
    permits: Arc<Semaphore>,
}

impl EventScraper {
    /// Chromeを使うスクレイパーを作成
    pub fn new(config: ScraperConfig) -> Self {
        let launcher = Arc::new(ChromeLauncher::new(&config));
        Self::with_launcher(config, launcher)
    }

    pub fn with_launcher(config: ScraperConfig, launcher: Arc<dyn BrowserLauncher>) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_sessions.max(1)));
        Self {
            config,
            launcher,
            permits,
        }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub fn listing_url(&self, city_name: &str) -> String {
        self.config.site.listing_url(city_name)
    }

    /// 指定都市のイベントを取得
    ///
    /// ブラウザは成功・失敗どちらの場合も返る前に必ず終了する。
    pub async fn run_scrape(&self, city_name: &str) -> Result<ScrapeResult, ScraperError> {
        let city = city_name.trim();
        if city.is_empty() {
            return Err(ScraperError::Validation("都市名が空です".into()));
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ScraperError::Resource("セッション制限が終了しています".into()))?;

        let url = self.listing_url(city);
        info!("Starting scrape: city={}, url={}", city, url);

        let mut session = self.launcher.launch().await?;

        let outcome = match timeout(
            self.config.session_timeout,
            self.drive(session.as_mut(), &url),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ScraperError::Timeout(format!(
                "スクレイプが{:?}以内に完了しませんでした",
                self.config.session_timeout
            ))),
        };

        // 終了処理にも上限を設ける（超えた場合ブラウザはdropでkillされる）
        let closed = match timeout(self.config.close_timeout, session.close()).await {
            Ok(result) => result,
            Err(_) => Err(ScraperError::Resource(format!(
                "ブラウザが{:?}以内に終了しませんでした",
                self.config.close_timeout
            ))),
        };

        let normalized = match (outcome, closed) {
            (Ok(normalized), Ok(())) => normalized,
            (Ok(_), Err(close_err)) => return Err(close_err),
            (Err(e), Ok(())) => return Err(e),
            (Err(e), Err(close_err)) => {
                error!("Failed to close browser after scrape error: {}", close_err);
                return Err(e);
            }
        };

        if normalized.rejected > 0 {
            warn!(
                "Rejected {} incomplete event cards for {} (markup drift?)",
                normalized.rejected, city
            );
        }
        info!(
            "Scrape complete: city={}, events={}",
            city,
            normalized.events.len()
        );

        Ok(ScrapeResult {
            city: city_name.to_string(),
            events: normalized.events,
            rejected: normalized.rejected,
        })
    }

    async fn drive(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
    ) -> Result<Normalized, ScraperError> {
        let page = session.new_page().await?;
        let result = self.drive_page(page.as_ref(), url).await;

        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }
        result
    }

    async fn drive_page(
        &self,
        page: &dyn ListingPage,
        url: &str,
    ) -> Result<Normalized, ScraperError> {
        let navigation = async {
            page.goto(url).await?;
            page.wait_for_network_idle(self.config.network_idle).await
        };
        timeout(self.config.navigation_timeout, navigation)
            .await
            .map_err(|_| {
                ScraperError::Timeout(format!(
                    "ナビゲーションが{:?}以内に完了しませんでした: {}",
                    self.config.navigation_timeout, url
                ))
            })??;

        let report = exhaust_scroll(page, &self.config.scroll).await;
        debug!("Scroll finished: {:?}", report);

        let html = page.content().await?;
        let raw = extract_raw(&html, &self.config.site.selectors)?;
        Ok(normalize(raw, &self.config.site))
    }
}
