//! 超时与有限重试

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use super::SimulationError;
use crate::common::AnalyzerConfig;

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 单次调用超时
    pub timeout: Duration,
    /// 首次调用之外的最大重试次数
    pub max_retries: u32,
    /// 线性退避基数
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(timeout: Duration, max_retries: u32, backoff: Duration) -> Self {
        Self { timeout, max_retries, backoff }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.timeout, config.max_retries, config.retry_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&AnalyzerConfig::default())
    }
}

/// 带超时和重试地执行一次 RPC 操作
///
/// 每次尝试都受 `timeout` 约束；只有可重试错误才会重试，
/// 第 n 次重试前等待 `n * backoff`
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    op_name: &str,
    mut op: F,
) -> Result<T, SimulationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SimulationError>>,
{
    let mut attempt: u32 = 0;
    loop {
        let result = match tokio::time::timeout(policy.timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(SimulationError::Timeout(policy.timeout)),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;
                warn!("{} 失败，第 {}/{} 次重试: {}", op_name, attempt, policy.max_retries, err);
                tokio::time::sleep(policy.backoff * attempt).await;
            }
            Err(err) => {
                warn!("{} 失败，放弃: {}", op_name, err);
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(Duration::from_secs(1), max_retries, Duration::from_millis(100))
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transport_errors_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = with_retry(policy(2), "fetch", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 { Err(SimulationError::Transport("connection reset".into())) } else { Ok(n) }
            }
        })
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(policy(2), "fetch", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(SimulationError::Transport("down".into())) }
        })
        .await;

        assert_eq!(result, Err(SimulationError::Transport("down".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_response_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(policy(5), "simulate", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(SimulationError::InvalidResponse("garbage".into())) }
        })
        .await;

        assert!(matches!(result, Err(SimulationError::InvalidResponse(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_call_times_out() {
        let policy = RetryPolicy::new(Duration::from_millis(50), 1, Duration::from_millis(10));
        let result: Result<(), _> = with_retry(policy, "simulate", || async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        })
        .await;

        assert_eq!(result, Err(SimulationError::Timeout(Duration::from_millis(50))));
    }
}
