//! 都市別イベント一覧スクレイパーモジュール
//!
//! 一覧ページを開き、無限スクロールで全カードを描画させてからイベントを抽出する

mod extractor;
mod normalizer;
mod scroll;
mod session;
mod site;
mod types;

pub use extractor::extract_raw;
pub use normalizer::{normalize, Normalized};
pub use scroll::{exhaust_scroll, ScrollOptions, ScrollReport, ScrollStop};
pub use session::EventScraper;
pub use site::{CardSelectors, SiteProfile};
pub use types::{EventRecord, RawEventRecord, ScrapeResult};
