//! Mock 模拟客户端
//!
//! 预先设定执行前 / 执行后的账户状态、执行错误或传输失败，
//! 不访问网络。用于测试和需要确定性结果的离线分析

use async_trait::async_trait;
use parking_lot::Mutex;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::VersionedTransaction;
use std::collections::HashMap;

use super::types::{AccountSnapshot, AccountStates, SimulationOutcome};
use super::{SimulationClient, SimulationError};

#[derive(Debug, Default)]
struct CallState {
    simulate_calls: usize,
    fetch_calls: usize,
    simulate_transient_left: u32,
    fetch_transient_left: u32,
}

/// Mock 模拟客户端
///
/// 模拟执行时，未设定执行后状态的账户保持执行前状态
#[derive(Debug, Default)]
pub struct MockSimulationClient {
    pre: HashMap<Pubkey, AccountSnapshot>,
    post: HashMap<Pubkey, Option<AccountSnapshot>>,
    execution_error: Option<String>,
    simulate_failure: Option<SimulationError>,
    fetch_failure: Option<SimulationError>,
    omit_post_accounts: bool,
    logs: Vec<String>,
    units_consumed: Option<u64>,
    calls: Mutex<CallState>,
}

impl MockSimulationClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设定执行前状态
    pub fn with_pre_account(mut self, snapshot: AccountSnapshot) -> Self {
        self.pre.insert(snapshot.pubkey, snapshot);
        self
    }

    /// 设定执行后状态
    pub fn with_post_account(mut self, snapshot: AccountSnapshot) -> Self {
        self.post.insert(snapshot.pubkey, Some(snapshot));
        self
    }

    /// 执行后账户不存在（被关闭）
    pub fn with_closed_account(mut self, pubkey: Pubkey) -> Self {
        self.post.insert(pubkey, None);
        self
    }

    /// 模拟执行成功返回，但交易本身执行失败
    pub fn with_execution_error(mut self, error: impl Into<String>) -> Self {
        self.execution_error = Some(error.into());
        self
    }

    pub fn with_logs(mut self, logs: Vec<String>, units_consumed: u64) -> Self {
        self.logs = logs;
        self.units_consumed = Some(units_consumed);
        self
    }

    /// `simulate` 始终失败
    pub fn with_simulate_failure(mut self, error: SimulationError) -> Self {
        self.simulate_failure = Some(error);
        self
    }

    /// `fetch_accounts` 始终失败
    pub fn with_fetch_failure(mut self, error: SimulationError) -> Self {
        self.fetch_failure = Some(error);
        self
    }

    /// 两个方法各自的前 `n` 次调用返回传输错误
    pub fn with_transient_failures(self, n: u32) -> Self {
        {
            let mut calls = self.calls.lock();
            calls.simulate_transient_left = n;
            calls.fetch_transient_left = n;
        }
        self
    }

    /// 模拟结果不携带账户状态
    pub fn without_post_accounts(mut self) -> Self {
        self.omit_post_accounts = true;
        self
    }

    pub fn simulate_calls(&self) -> usize {
        self.calls.lock().simulate_calls
    }

    pub fn fetch_calls(&self) -> usize {
        self.calls.lock().fetch_calls
    }

    fn post_state(&self, pubkey: &Pubkey) -> Option<AccountSnapshot> {
        match self.post.get(pubkey) {
            Some(state) => state.clone(),
            None => self.pre.get(pubkey).cloned(),
        }
    }
}

#[async_trait]
impl SimulationClient for MockSimulationClient {
    async fn simulate(
        &self,
        _tx: &VersionedTransaction,
        addresses: &[Pubkey],
    ) -> Result<SimulationOutcome, SimulationError> {
        {
            let mut calls = self.calls.lock();
            calls.simulate_calls += 1;
            if calls.simulate_transient_left > 0 {
                calls.simulate_transient_left -= 1;
                return Err(SimulationError::Transport("mock: transient failure".to_string()));
            }
        }
        if let Some(err) = &self.simulate_failure {
            return Err(err.clone());
        }

        let accounts = (!self.omit_post_accounts).then(|| {
            addresses.iter().map(|pubkey| (*pubkey, self.post_state(pubkey))).collect::<AccountStates>()
        });

        Ok(SimulationOutcome {
            accounts,
            execution_error: self.execution_error.clone(),
            logs: self.logs.clone(),
            units_consumed: self.units_consumed,
        })
    }

    async fn fetch_accounts(&self, addresses: &[Pubkey]) -> Result<AccountStates, SimulationError> {
        {
            let mut calls = self.calls.lock();
            calls.fetch_calls += 1;
            if calls.fetch_transient_left > 0 {
                calls.fetch_transient_left -= 1;
                return Err(SimulationError::Transport("mock: transient failure".to_string()));
            }
        }
        if let Some(err) = &self.fetch_failure {
            return Err(err.clone());
        }

        Ok(addresses.iter().map(|pubkey| (*pubkey, self.pre.get(pubkey).cloned())).collect())
    }
}
