//! 一覧サイトのURLとDOMセレクタ
//!
//! 上流サイトのマークアップ変更時に修正するのはこのファイルだけ

use url::Url;

use crate::error::ScraperError;

const DEFAULT_ORIGIN: &str = "https://insider.in";
const DEFAULT_LISTING_PREFIX: &str = "all-events-in-";

/// イベントカードのセレクタ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSelectors {
    pub card: String,
    pub title: String,
    pub date: String,
    pub link: String,
    pub link_attr: String,
}

impl Default for CardSelectors {
    fn default() -> Self {
        Self {
            card: ".card-list-item".to_string(),
            title: r#"[data-ref="event_card_title"]"#.to_string(),
            date: r#"[data-ref="event_card_date_string"] p"#.to_string(),
            link: "a".to_string(),
            link_attr: "href".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SiteProfile {
    origin: Url,
    listing_prefix: String,
    pub selectors: CardSelectors,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            // 定数なのでパース失敗しない
            origin: Url::parse(DEFAULT_ORIGIN).expect("valid default origin"),
            listing_prefix: DEFAULT_LISTING_PREFIX.to_string(),
            selectors: CardSelectors::default(),
        }
    }
}

impl SiteProfile {
    pub fn new(origin: &str) -> Result<Self, ScraperError> {
        let origin = Url::parse(origin)
            .map_err(|e| ScraperError::Validation(format!("origin URL '{}': {}", origin, e)))?;
        Ok(Self {
            origin,
            ..Default::default()
        })
    }

    pub fn with_listing_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.listing_prefix = prefix.into();
        self
    }

    pub fn with_selectors(mut self, selectors: CardSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// 一覧URLのベース（末尾に小文字の都市名を連結する）
    pub fn listing_base(&self) -> String {
        format!(
            "{}/{}",
            self.origin.as_str().trim_end_matches('/'),
            self.listing_prefix
        )
    }

    pub fn listing_url(&self, city: &str) -> String {
        format!("{}{}", self.listing_base(), city.to_lowercase())
    }

    /// hrefを絶対URLにする。スキーム付きならそのまま返す
    pub fn resolve_link(&self, href: &str) -> Option<String> {
        if Url::parse(href).is_ok() {
            return Some(href.to_string());
        }
        self.origin.join(href).ok().map(String::from)
    }
}
