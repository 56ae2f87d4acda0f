//! 無限スクロールで遅延ロードのカードを全て描画させる

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::traits::ScrollTarget;

/// スクロール設定
#[derive(Debug, Clone)]
pub struct ScrollOptions {
    /// 1回のスクロール量（px）
    pub step: u64,
    /// スクロール間隔
    pub interval: Duration,
    /// 最下部到達後の待機（最後のカードのマウント待ち）
    pub settle: Duration,
    pub max_iterations: u32,
    pub max_duration: Duration,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            step: 100,
            interval: Duration::from_millis(300),
            settle: Duration::from_millis(1000),
            max_iterations: 500,
            max_duration: Duration::from_secs(90),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollStop {
    ReachedBottom,
    IterationCap,
    TimeCap,
    PageError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollReport {
    pub iterations: u32,
    pub scrolled: u64,
    pub last_height: u64,
    pub stop: ScrollStop,
}

#[derive(Debug, Default)]
struct ScrollState {
    scrolled: u64,
    last_height: u64,
    iterations: u32,
}

impl ScrollState {
    fn report(&self, stop: ScrollStop) -> ScrollReport {
        ScrollReport {
            iterations: self.iterations,
            scrolled: self.scrolled,
            last_height: self.last_height,
            stop,
        }
    }
}

/// 高さの伸びが止まるまでスクロールする（失敗しない、必ず終了する）
///
/// 高さは毎回読み直す。遅延ロードでページが伸びるため、最初の値を使うと途中で止まる。
pub async fn exhaust_scroll<P>(page: &P, options: &ScrollOptions) -> ScrollReport
where
    P: ScrollTarget + ?Sized,
{
    let start = Instant::now();
    let mut state = ScrollState::default();

    let stop = loop {
        if state.iterations >= options.max_iterations {
            break ScrollStop::IterationCap;
        }
        if start.elapsed() >= options.max_duration {
            break ScrollStop::TimeCap;
        }

        let metrics = match page.scroll_metrics().await {
            Ok(m) => m,
            Err(e) => {
                warn!("Failed to read scroll height, stopping scroll: {}", e);
                break ScrollStop::PageError;
            }
        };
        if let Err(e) = page.scroll_by(options.step).await {
            warn!("Failed to scroll page, stopping scroll: {}", e);
            break ScrollStop::PageError;
        }

        state.iterations += 1;
        state.scrolled += options.step;
        state.last_height = metrics.scroll_height;

        if state.scrolled >= metrics.scroll_height.saturating_sub(metrics.viewport_height) {
            break ScrollStop::ReachedBottom;
        }

        if state.iterations % 20 == 0 {
            debug!(
                "Scrolling... ({} iterations, {}px of {}px)",
                state.iterations, state.scrolled, state.last_height
            );
        }
        sleep(options.interval).await;
    };

    match stop {
        ScrollStop::ReachedBottom => info!(
            "Reached bottom after {} iterations (height={}px)",
            state.iterations, state.last_height
        ),
        ScrollStop::IterationCap | ScrollStop::TimeCap => warn!(
            "Scroll cap hit ({:?}) after {} iterations / {:?}, proceeding anyway",
            stop,
            state.iterations,
            start.elapsed()
        ),
        ScrollStop::PageError => {}
    }

    if stop != ScrollStop::PageError {
        sleep(options.settle).await;
    }

    state.report(stop)
}
