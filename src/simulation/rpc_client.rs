//! 基于 JSON-RPC 的模拟客户端

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use solana_account_decoder::{UiAccount, UiAccountData, UiAccountEncoding};
use solana_client::rpc_config::{RpcSimulateTransactionAccountsConfig, RpcSimulateTransactionConfig};
use solana_commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::VersionedTransaction;
use solana_transaction_status::UiTransactionEncoding;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use super::types::{AccountSnapshot, AccountStates, SimulationOutcome};
use super::{SimulationClient, SimulationError};
use crate::common::{AnalyzerConfig, SolanaRpcClient};

/// `getMultipleAccounts` 单次请求的账户上限
pub const MAX_MULTIPLE_ACCOUNTS: usize = 100;

/// RPC 模拟客户端
#[derive(Clone)]
pub struct RpcSimulationClient {
    rpc: Arc<SolanaRpcClient>,
    commitment: CommitmentConfig,
}

impl RpcSimulationClient {
    pub fn new(rpc: Arc<SolanaRpcClient>, commitment: CommitmentConfig) -> Self {
        Self { rpc, commitment }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        let rpc = SolanaRpcClient::new_with_timeout_and_commitment(
            config.rpc_url.clone(),
            config.timeout,
            config.commitment,
        );
        Self::new(Arc::new(rpc), config.commitment)
    }

    pub fn rpc(&self) -> &Arc<SolanaRpcClient> {
        &self.rpc
    }
}

#[async_trait]
impl SimulationClient for RpcSimulationClient {
    async fn simulate(
        &self,
        tx: &VersionedTransaction,
        addresses: &[Pubkey],
    ) -> Result<SimulationOutcome, SimulationError> {
        let config = RpcSimulateTransactionConfig {
            sig_verify: false,
            replace_recent_blockhash: true,
            commitment: Some(self.commitment),
            encoding: Some(UiTransactionEncoding::Base64),
            accounts: Some(RpcSimulateTransactionAccountsConfig {
                encoding: Some(UiAccountEncoding::Base64),
                addresses: addresses.iter().map(|key| key.to_string()).collect(),
            }),
            ..Default::default()
        };

        let response = self
            .rpc
            .simulate_transaction_with_config(tx, config)
            .await
            .map_err(|e| SimulationError::Transport(e.to_string()))?;
        let result = response.value;

        let accounts = match result.accounts {
            Some(ui_accounts) => {
                if ui_accounts.len() != addresses.len() {
                    return Err(SimulationError::InvalidResponse(format!(
                        "请求 {} 个账户，返回 {} 个",
                        addresses.len(),
                        ui_accounts.len()
                    )));
                }
                let mut states = AccountStates::with_capacity(addresses.len());
                for (pubkey, ui_account) in addresses.iter().zip(ui_accounts) {
                    let snapshot = ui_account
                        .map(|account| snapshot_from_ui_account(*pubkey, &account))
                        .transpose()?;
                    states.insert(*pubkey, snapshot);
                }
                Some(states)
            }
            None => None,
        };

        debug!(
            "模拟完成: err={:?}, units={:?}, accounts={}",
            result.err,
            result.units_consumed,
            accounts.as_ref().map_or(0, |states| states.len())
        );

        Ok(SimulationOutcome {
            accounts,
            execution_error: result.err.map(|err| format!("{:?}", err)),
            logs: result.logs.unwrap_or_default(),
            units_consumed: result.units_consumed,
        })
    }

    async fn fetch_accounts(&self, addresses: &[Pubkey]) -> Result<AccountStates, SimulationError> {
        let requests = addresses
            .chunks(MAX_MULTIPLE_ACCOUNTS)
            .map(|chunk| self.rpc.get_multiple_accounts(chunk));
        let chunks = futures::future::try_join_all(requests)
            .await
            .map_err(|e| SimulationError::Transport(e.to_string()))?;

        let mut states = AccountStates::with_capacity(addresses.len());
        for (pubkey, account) in addresses.iter().zip(chunks.into_iter().flatten()) {
            states.insert(*pubkey, account.map(|account| AccountSnapshot::from_account(*pubkey, &account)));
        }
        Ok(states)
    }
}

/// 把 RPC 返回的 UiAccount 还原成快照
pub fn snapshot_from_ui_account(
    pubkey: Pubkey,
    account: &UiAccount,
) -> Result<AccountSnapshot, SimulationError> {
    let owner = Pubkey::from_str(&account.owner)
        .map_err(|e| SimulationError::InvalidResponse(format!("owner {}: {}", account.owner, e)))?;

    let raw_data = match &account.data {
        UiAccountData::Binary(blob, UiAccountEncoding::Base64) => STANDARD
            .decode(blob)
            .map_err(|e| SimulationError::InvalidResponse(format!("base64 账户数据: {}", e)))?,
        UiAccountData::Binary(blob, UiAccountEncoding::Base58) | UiAccountData::LegacyBinary(blob) => {
            bs58::decode(blob)
                .into_vec()
                .map_err(|e| SimulationError::InvalidResponse(format!("base58 账户数据: {}", e)))?
        }
        other => {
            return Err(SimulationError::InvalidResponse(format!("不支持的账户数据编码: {:?}", other)));
        }
    };

    Ok(AccountSnapshot::new(pubkey, owner, account.lamports, raw_data))
}
