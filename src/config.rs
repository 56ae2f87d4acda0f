use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::events::{ScrollOptions, SiteProfile};

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub headless: bool,
    /// 未指定ならchromiumoxideが自動検出
    pub chrome_path: Option<String>,
    pub navigation_timeout: Duration,
    /// この間リクエストが無ければネットワークアイドルとみなす
    pub network_idle: Duration,
    pub network_idle_poll: Duration,
    /// 1回のスクレイプ全体の上限
    pub session_timeout: Duration,
    /// ブラウザ終了待ちの上限（超えたらプロセスをkill）
    pub close_timeout: Duration,
    pub scroll: ScrollOptions,
    pub max_concurrent_sessions: usize,
    pub site: SiteProfile,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            navigation_timeout: Duration::from_secs(60),
            network_idle: Duration::from_millis(500),
            network_idle_poll: Duration::from_millis(250),
            session_timeout: Duration::from_secs(180),
            close_timeout: Duration::from_secs(10),
            scroll: ScrollOptions::default(),
            max_concurrent_sessions: 4,
            site: SiteProfile::default(),
        }
    }
}

impl ScraperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 環境変数から設定を読み込む（不正な値はデフォルトを使用）
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let site = match std::env::var("LISTING_ORIGIN") {
            Ok(origin) => SiteProfile::new(&origin).unwrap_or_else(|e| {
                warn!("Ignoring LISTING_ORIGIN: {}", e);
                SiteProfile::default()
            }),
            Err(_) => defaults.site,
        };

        Self {
            headless: env_or("HEADLESS", defaults.headless),
            chrome_path: std::env::var("CHROME_PATH")
                .or_else(|_| std::env::var("CHROMIUM_PATH"))
                .ok(),
            navigation_timeout: Duration::from_secs(env_or(
                "NAVIGATION_TIMEOUT_SECS",
                defaults.navigation_timeout.as_secs(),
            )),
            session_timeout: Duration::from_secs(env_or(
                "SESSION_TIMEOUT_SECS",
                defaults.session_timeout.as_secs(),
            )),
            max_concurrent_sessions: env_or(
                "MAX_CONCURRENT_SESSIONS",
                defaults.max_concurrent_sessions,
            )
            .max(1),
            site,
            ..defaults
        }
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_chrome_path(mut self, path: impl Into<String>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    pub fn with_scroll(mut self, scroll: ScrollOptions) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn with_max_concurrent_sessions(mut self, n: usize) -> Self {
        self.max_concurrent_sessions = n.max(1);
        self
    }

    pub fn with_site(mut self, site: SiteProfile) -> Self {
        self.site = site;
        self
    }
}

/// HTTPサーバー設定
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            cors_enabled: true,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = env_or("PORT", 3000);
        Self {
            listen_addr: format!("{}:{}", host, port),
            cors_enabled: env_or("CORS_ENABLED", true),
        }
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T>(key: &str, raw: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid value for {}='{}' ({}), using default", key, raw, e);
        default
    })
}
