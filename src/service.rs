use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::Service;
use tracing::info;

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::events::{EventScraper, ScrapeResult};

/// スクレイピングリクエスト
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub city: String,
}

impl ScrapeRequest {
    pub fn new(city: impl Into<String>) -> Self {
        Self { city: city.into() }
    }
}

/// tower::Serviceを実装したスクレイパーサービス
#[derive(Clone)]
pub struct ScraperService {
    scraper: Arc<EventScraper>,
}

impl ScraperService {
    pub fn new(config: ScraperConfig) -> Self {
        Self::from_scraper(EventScraper::new(config))
    }

    pub fn from_scraper(scraper: EventScraper) -> Self {
        Self {
            scraper: Arc::new(scraper),
        }
    }

    pub fn scraper(&self) -> &EventScraper {
        &self.scraper
    }
}

impl Service<ScrapeRequest> for ScraperService {
    type Response = ScrapeResult;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // 同時実行数はEventScraper側のセマフォで制限する
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ScrapeRequest) -> Self::Future {
        info!("スクレイピングリクエスト受信: city={}", req.city);
        let scraper = self.scraper.clone();

        Box::pin(async move { scraper.run_scrape(&req.city).await })
    }
}
