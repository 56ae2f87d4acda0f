//! HTTP API のリクエスト/レスポンス型

use serde::{Deserialize, Serialize};

use crate::events::EventRecord;
use crate::users::User;

/// イベント一覧レスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsResponse {
    pub city: String,
    pub events: Vec<EventRecord>,
}

/// エラー等のメッセージのみのレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// ユーザー登録リクエスト
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// 登録対象のイベント名（フロントエンドが送信、保存はしない）
    #[serde(default, rename = "eventTitle")]
    pub event_title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveUserResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: String,
}
