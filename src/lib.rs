//! 都市別イベントスクレイパーライブラリ
//!
//! - ヘッドレスChromeでイベント一覧ページを開き、無限スクロールで全件を描画
//! - 描画済みDOMからイベントカードを抽出・正規化して返す
//! - HTTP API（イベント取得・ユーザー登録）を提供
//!
//! # 使用例
//!
//! ```rust,ignore
//! use city_events_service::{ScrapeRequest, ScraperConfig, ScraperService};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = ScraperService::new(ScraperConfig::from_env());
//!
//!     let result = service.call(ScrapeRequest::new("Mumbai")).await.unwrap();
//!     for event in &result.events {
//!         println!("[{}] {} @ {} -> {}", event.id, event.title, event.date, event.link);
//!     }
//! }
//! ```

pub mod browser;
pub mod config;
pub mod error;
pub mod events;
pub mod http;
pub mod service;
pub mod traits;
pub mod users;

// 主要な型をリエクスポート
pub use browser::ChromeLauncher;
pub use config::{ScraperConfig, ServerConfig};
pub use error::ScraperError;
pub use events::{EventRecord, EventScraper, RawEventRecord, ScrapeResult, SiteProfile};
pub use service::{ScrapeRequest, ScraperService};
pub use traits::{BrowserLauncher, BrowserSession, ListingPage, ScrollMetrics, ScrollTarget};
pub use users::{InMemoryUserStore, User, UserStore};
