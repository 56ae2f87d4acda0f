use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScraperError;

/// スクロール判定に使う高さ情報（px）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollMetrics {
    pub scroll_height: u64,
    pub viewport_height: u64,
}

#[async_trait]
pub trait ScrollTarget: Send + Sync {
    /// 現在のスクロール可能な高さとビューポートの高さ
    async fn scroll_metrics(&self) -> Result<ScrollMetrics, ScraperError>;

    /// 下方向にスクロール
    async fn scroll_by(&self, distance: u64) -> Result<(), ScraperError>;
}

/// 一覧ページ（1セッションにつき1つ）
#[async_trait]
pub trait ListingPage: ScrollTarget {
    async fn goto(&self, url: &str) -> Result<(), ScraperError>;

    /// `quiet` の間ネットワーク通信が発生しなくなるまで待機
    async fn wait_for_network_idle(&self, quiet: Duration) -> Result<(), ScraperError>;

    /// 描画済みDOMのHTML
    async fn content(&self) -> Result<String, ScraperError>;

    async fn close(self: Box<Self>) -> Result<(), ScraperError>;
}

/// ブラウザプロセス1つ分のセッション
#[async_trait]
pub trait BrowserSession: Send {
    async fn new_page(&mut self) -> Result<Box<dyn ListingPage>, ScraperError>;

    /// ブラウザプロセスを終了
    async fn close(self: Box<Self>) -> Result<(), ScraperError>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// 独立したブラウザプロセスを起動
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ScraperError>;
}
