use axum::http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("入力エラー: {0}")]
    Validation(String),

    #[error("ナビゲーションエラー: {0}")]
    Navigation(String),

    #[error("タイムアウト: {0}")]
    Timeout(String),

    #[error("抽出エラー: {0}")]
    Extraction(String),

    #[error("ブラウザリソースエラー: {0}")]
    Resource(String),
}

impl ScraperError {
    /// HTTPレスポンスのステータスコード
    pub fn status_code(&self) -> StatusCode {
        match self {
            ScraperError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// ブラウザの起動・終了失敗（実行環境の設定不備）
    pub fn is_resource(&self) -> bool {
        matches!(self, ScraperError::Resource(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ScraperError::Validation(_) => "validation",
            ScraperError::Navigation(_) => "navigation",
            ScraperError::Timeout(_) => "timeout",
            ScraperError::Extraction(_) => "extraction",
            ScraperError::Resource(_) => "resource",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ScraperError::Validation("city".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        for err in [
            ScraperError::Navigation("x".into()),
            ScraperError::Timeout("x".into()),
            ScraperError::Extraction("x".into()),
            ScraperError::Resource("x".into()),
        ] {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_only_resource_is_resource() {
        assert!(ScraperError::Resource("launch".into()).is_resource());
        assert!(!ScraperError::Timeout("nav".into()).is_resource());
    }
}
