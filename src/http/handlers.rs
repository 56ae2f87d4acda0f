//! HTTP API ハンドラ

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tower::ServiceExt;
use tracing::{error, info, warn};

use super::types::{
    EventsResponse, HealthResponse, MessageResponse, SaveUserRequest, SaveUserResponse,
};
use crate::error::ScraperError;
use crate::service::{ScrapeRequest, ScraperService};
use crate::users::{NewUser, UserStore, UserStoreError};

const CITY_REQUIRED: &str = "City parameter is required";
const FIELDS_REQUIRED: &str = "All fields are required";
const USER_EXISTS: &str = "User already exists, You can continue";
const USER_SAVED: &str = "User saved successfully";
const INTERNAL_ERROR: &str = "Internal server error";

/// 共有アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub scraper: ScraperService,
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    pub fn new(scraper: ScraperService, users: Arc<dyn UserStore>) -> Self {
        Self { scraper, users }
    }
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(MessageResponse::new(text))).into_response()
}

fn internal_error() -> Response {
    message(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
}

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// 都市名なしで呼ばれた場合
pub async fn missing_city() -> Response {
    message(StatusCode::BAD_REQUEST, CITY_REQUIRED)
}

/// GET /api/v1/fetch-events/:city_name
pub async fn fetch_events(
    State(state): State<AppState>,
    Path(city_name): Path<String>,
) -> Response {
    if city_name.trim().is_empty() {
        return missing_city().await;
    }

    // クライアントが切断してもブラウザの終了まで処理を続ける
    let request = ScrapeRequest::new(city_name.clone());
    let outcome = tokio::spawn(state.scraper.clone().oneshot(request)).await;

    match outcome {
        Ok(Ok(result)) => (
            StatusCode::OK,
            Json(EventsResponse {
                city: result.city,
                events: result.events,
            }),
        )
            .into_response(),
        Ok(Err(e)) => scrape_error_response(&city_name, e),
        Err(e) => {
            error!("Scrape task for {} failed to complete: {}", city_name, e);
            internal_error()
        }
    }
}

/// 内部エラーの詳細はログにのみ出力し、クライアントには汎用メッセージを返す
fn scrape_error_response(city: &str, err: ScraperError) -> Response {
    if err.is_resource() {
        error!(
            "Browser resource failure while scraping {} (check Chrome installation/sandbox): {}",
            city, err
        );
    } else {
        warn!("Scrape failed for {} [{}]: {}", city, err.kind(), err);
    }

    if err.status_code() == StatusCode::BAD_REQUEST {
        message(StatusCode::BAD_REQUEST, CITY_REQUIRED)
    } else {
        internal_error()
    }
}

/// POST /api/v1/get-user (/api/v1/save-user)
pub async fn save_user(
    State(state): State<AppState>,
    payload: Result<Json<SaveUserRequest>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!("Invalid registration body: {}", rejection);
            return message(StatusCode::BAD_REQUEST, FIELDS_REQUIRED);
        }
    };

    let name = body.name.as_deref().map(str::trim).unwrap_or_default();
    let email = body.email.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() || email.is_empty() {
        return message(StatusCode::BAD_REQUEST, FIELDS_REQUIRED);
    }

    match state.users.find_by_email(email).await {
        Ok(Some(_)) => return message(StatusCode::OK, USER_EXISTS),
        Ok(None) => {}
        Err(e) => {
            error!("Error looking up user: {}", e);
            return internal_error();
        }
    }

    let new_user = NewUser {
        name: name.to_string(),
        email: email.to_string(),
    };

    match state.users.create(new_user).await {
        Ok(user) => {
            info!(
                "User registered: id={}, event={}",
                user.id,
                body.event_title.as_deref().unwrap_or("-")
            );
            (
                StatusCode::CREATED,
                Json(SaveUserResponse {
                    message: USER_SAVED.to_string(),
                    user,
                }),
            )
                .into_response()
        }
        // 同時登録で先に作成された場合
        Err(UserStoreError::AlreadyExists(_)) => message(StatusCode::OK, USER_EXISTS),
        Err(e) => {
            error!("Error saving user: {}", e);
            internal_error()
        }
    }
}
