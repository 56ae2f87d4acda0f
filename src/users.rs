//! ユーザー登録ストア
//!
//! イベント参加登録で使う `find_by_email` / `create` を提供する

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug)]
pub enum UserStoreError {
    #[error("ユーザーが既に存在します: {0}")]
    AlreadyExists(String),

    #[error("ストアエラー: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError>;

    async fn create(&self, user: NewUser) -> Result<User, UserStoreError>;
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

/// メモリ上のユーザーストア（プロセス終了で消える）
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Users>,
}

#[derive(Debug, Default)]
struct Users {
    by_email: HashMap<String, User>,
    next_id: u64,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.by_email.len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError> {
        Ok(self.inner.read().await.by_email.get(&email_key(email)).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, UserStoreError> {
        let key = email_key(&user.email);
        let mut users = self.inner.write().await;

        if users.by_email.contains_key(&key) {
            return Err(UserStoreError::AlreadyExists(key));
        }

        users.next_id += 1;
        let created = User {
            id: users.next_id,
            name: user.name.trim().to_string(),
            email: user.email.trim().to_string(),
            created_at: Utc::now(),
        };
        users.by_email.insert(key, created.clone());
        Ok(created)
    }
}
