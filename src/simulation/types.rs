//! 账户快照与模拟结果

use solana_sdk::account::Account;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;

/// 某一时刻的账户状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub pubkey: Pubkey,
    /// 拥有该账户的程序
    pub owner: Pubkey,
    pub lamports: u64,
    pub raw_data: Vec<u8>,
}

impl AccountSnapshot {
    pub fn new(pubkey: Pubkey, owner: Pubkey, lamports: u64, raw_data: Vec<u8>) -> Self {
        Self { pubkey, owner, lamports, raw_data }
    }

    pub fn from_account(pubkey: Pubkey, account: &Account) -> Self {
        Self::new(pubkey, account.owner, account.lamports, account.data.clone())
    }
}

/// 地址 → 账户状态，`None` 表示账户不存在
pub type AccountStates = HashMap<Pubkey, Option<AccountSnapshot>>;

/// 一次模拟执行的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationOutcome {
    /// 执行后的账户状态；RPC 未返回账户时为 `None`
    pub accounts: Option<AccountStates>,
    /// 交易执行失败的原因
    pub execution_error: Option<String>,
    pub logs: Vec<String>,
    pub units_consumed: Option<u64>,
}

impl SimulationOutcome {
    pub fn is_success(&self) -> bool {
        self.execution_error.is_none()
    }
}
