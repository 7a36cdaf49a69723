//! 控制器工具函数
//!
//! 包括固定间隔、有上限的轮询辅助函数。

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::debug;

/// 轮询配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// 轮询间隔（秒）
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// 轮询上限（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_interval_secs() -> u64 {
    1
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl PollConfig {
    /// 轮询间隔
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    /// 轮询上限
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 轮询结果
#[derive(Debug, PartialEq, Eq)]
pub enum PollOutcome<E> {
    /// 条件已满足
    Done,
    /// 检查出错，轮询中止
    Failed(E),
    /// 超时仍未满足
    TimedOut,
}

/// 按固定间隔检查条件，直到满足、出错或超时
///
/// 第一次检查立即执行。`check` 返回 `Ok(true)` 表示满足，`Ok(false)` 表示继续等待。
/// 调用方丢弃返回的 future 即取消轮询。
pub async fn poll_until<F, Fut, E>(config: PollConfig, mut check: F) -> PollOutcome<E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    let mut ticker = interval(config.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let polling = async {
        let mut attempt = 0u32;
        loop {
            ticker.tick().await;
            attempt += 1;
            match check().await {
                Ok(true) => return PollOutcome::Done,
                Ok(false) => debug!("第 {} 次检查未满足条件", attempt),
                Err(e) => return PollOutcome::Failed(e),
            }
        }
    };

    timeout(config.timeout(), polling)
        .await
        .unwrap_or(PollOutcome::TimedOut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_poll_config_defaults() {
        let config = PollConfig::default();
        assert_eq!(config.interval(), Duration::from_secs(1));
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_done_after_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let outcome: PollOutcome<()> = poll_until(PollConfig::default(), || {
            let counter = counter.clone();
            async move { Ok(counter.fetch_add(1, Ordering::SeqCst) >= 2) }
        })
        .await;
        assert_eq!(outcome, PollOutcome::Done);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_times_out() {
        let start = tokio::time::Instant::now();
        let outcome: PollOutcome<()> =
            poll_until(PollConfig::default(), || async { Ok(false) }).await;
        assert_eq!(outcome, PollOutcome::TimedOut);
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_stops_on_error() {
        let outcome = poll_until(PollConfig::default(), || async { Err::<bool, _>("boom") }).await;
        assert_eq!(outcome, PollOutcome::Failed("boom"));
    }
}
