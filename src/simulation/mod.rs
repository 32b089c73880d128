//! 模拟执行客户端
//!
//! 分析器只通过 `SimulationClient` 访问网络：拉取执行前账户状态，
//! 以及模拟执行后的账户状态

pub mod mock_client;
pub mod retry;
pub mod rpc_client;
pub mod types;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::VersionedTransaction;
use std::time::Duration;

pub use mock_client::MockSimulationClient;
pub use retry::{RetryPolicy, with_retry};
pub use rpc_client::RpcSimulationClient;
pub use types::{AccountSnapshot, AccountStates, SimulationOutcome};

/// 模拟客户端错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error("RPC 调用失败: {0}")]
    Transport(String),
    #[error("RPC 调用超时 ({0:?})")]
    Timeout(Duration),
    #[error("RPC 响应无法解析: {0}")]
    InvalidResponse(String),
}

impl SimulationError {
    /// 传输层错误和超时可以重试，响应格式错误重试也不会变好
    pub fn is_retryable(&self) -> bool {
        matches!(self, SimulationError::Transport(_) | SimulationError::Timeout(_))
    }
}

/// 模拟客户端 trait
#[async_trait]
pub trait SimulationClient: Send + Sync {
    /// 模拟执行交易，返回 `addresses` 中每个账户执行后的状态
    async fn simulate(
        &self,
        tx: &VersionedTransaction,
        addresses: &[Pubkey],
    ) -> Result<SimulationOutcome, SimulationError>;

    /// 批量拉取账户当前状态
    async fn fetch_accounts(&self, addresses: &[Pubkey]) -> Result<AccountStates, SimulationError>;
}
