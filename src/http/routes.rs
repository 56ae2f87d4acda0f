//! HTTP API ルート定義

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, AppState};

/// APIルーターを作成
pub fn create_router(app_state: AppState) -> Router {
    let api_v1 = Router::new()
        .route("/fetch-events", get(handlers::missing_city))
        .route("/fetch-events/", get(handlers::missing_city))
        .route("/fetch-events/:city_name", get(handlers::fetch_events))
        // フロントエンドは save-user に送信する
        .route("/get-user", post(handlers::save_user))
        .route("/save-user", post(handlers::save_user))
        .with_state(app_state);

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api_v1)
}
