//! 交易效果报告类型

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use solana_sdk::pubkey::Pubkey;

use crate::parser::registry::ProgramName;

/// 相对于分析主体的资金方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    /// 由前后余额得出方向，余额减少为 `Out`
    pub fn from_balances(pre: u64, post: u64) -> Self {
        if post < pre { Direction::Out } else { Direction::In }
    }

    /// 带符号的数量，流入为正
    pub fn signed(self, amount: u64) -> i128 {
        match self {
            Direction::In => amount as i128,
            Direction::Out => -(amount as i128),
        }
    }
}

/// SOL 余额变化
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolChange {
    /// lamports
    pub amount: u64,
    pub direction: Direction,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Pubkey>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Pubkey>,
}

/// 代币余额变化
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenChange {
    #[serde_as(as = "DisplayFromStr")]
    pub mint: Pubkey,
    /// 原始数量（未按精度换算）
    pub amount: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub decimals: Option<u8>,
    pub direction: Direction,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_account: Option<Pubkey>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_account: Option<Pubkey>,
    pub program_used: ProgramName,
}

impl TokenChange {
    /// 按精度换算后的数量，精度未知时返回 `None`
    pub fn ui_amount(&self) -> Option<f64> {
        self.decimals.map(|decimals| self.amount as f64 / 10f64.powi(decimals as i32))
    }
}

/// 兑换识别结果
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInfo {
    #[serde_as(as = "DisplayFromStr")]
    pub input_mint: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub output_mint: Pubkey,
    pub input_amount: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub output_amount: Option<u64>,
    pub platform: ProgramName,
}

/// 交易效果报告
/// 地址序列化为 base58 字符串
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEffects {
    pub sol_changes: Vec<SolChange>,
    /// 主体自己持有的代币账户的变化
    pub token_changes: Vec<TokenChange>,
    /// 其他持有者的代币账户变化（池子、中间账户）
    pub counterparty_token_changes: Vec<TokenChange>,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub accounts_created: Vec<Pubkey>,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub accounts_closed: Vec<Pubkey>,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub programs_involved: Vec<Pubkey>,
    /// 每条指令一个标签，与指令顺序一致
    pub instruction_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub swap_info: Option<SwapInfo>,
    /// 模拟失败或不完整时为 true，报告只包含静态分析结果
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub simulation_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub compute_units_consumed: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub logs: Vec<String>,
}

impl TransactionEffects {
    /// 去重后的指令标签，保持首次出现顺序
    pub fn unique_instruction_types(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for label in &self.instruction_types {
            if !labels.contains(&label.as_str()) {
                labels.push(label);
            }
        }
        labels
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 主体的 SOL 净变化（lamports，流入为正）
    pub fn net_sol_change(&self) -> i128 {
        self.sol_changes.iter().map(|change| change.direction.signed(change.amount)).sum()
    }
}

/// 仅在不存在时追加，保持首次出现顺序
pub(crate) fn push_unique(set: &mut Vec<Pubkey>, pubkey: Pubkey) {
    if !set.contains(&pubkey) {
        set.push(pubkey);
    }
}
