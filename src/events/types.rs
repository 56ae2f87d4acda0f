//! イベント関連の型定義

use serde::{Deserialize, Serialize};

/// カードから読み取った生データ（未検証、欠損フィールドは空文字列）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEventRecord {
    pub title: String,
    pub date_text: String,
    pub href: String,
}

impl RawEventRecord {
    pub fn is_complete(&self) -> bool {
        !self.title.is_empty() && !self.date_text.is_empty() && !self.href.is_empty()
    }
}

/// レスポンス用のイベント
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// レスポンス内の連番（0始まり、DOM出現順）
    pub id: usize,
    pub title: String,
    /// 表示用の日付テキスト（パースしない）
    pub date: String,
    /// 絶対URL
    pub link: String,
}

/// 1リクエスト分のスクレイプ結果
#[derive(Debug, Clone)]
pub struct ScrapeResult {
    pub city: String,
    pub events: Vec<EventRecord>,
    /// 欠損フィールドのため破棄したカード数
    pub rejected: usize,
}
