//! HTTP API
//!
//! 都市別イベント取得とユーザー登録のエンドポイント

pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use handlers::AppState;
pub use routes::create_router;
pub use server::HttpServer;
