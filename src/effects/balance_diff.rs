//! 余额差分
//!
//! 比较同一账户执行前后的快照。缺失的一侧视为零余额，
//! 两个函数都不会报错，无法比较时返回 `None`

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use solana_sdk::pubkey::Pubkey;

use crate::constants::programs::SYSTEM_PROGRAM_ID;
use crate::effects::types::{Direction, SolChange};
use crate::parser::layouts::TokenAccountLayout;
use crate::simulation::AccountSnapshot;

/// 代币账户余额差分结果
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalanceDiff {
    #[serde_as(as = "DisplayFromStr")]
    pub token_account: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub mint: Pubkey,
    /// 代币账户的持有者（钱包）
    #[serde_as(as = "DisplayFromStr")]
    pub owner: Pubkey,
    pub amount: u64,
    pub direction: Direction,
    /// 持有者是否为分析主体
    pub subject_owned: bool,
}

fn snapshot_pubkey(pre: Option<&AccountSnapshot>, post: Option<&AccountSnapshot>) -> Option<Pubkey> {
    pre.or(post).map(|snapshot| snapshot.pubkey)
}

/// 代币账户一侧的状态
enum TokenSide {
    /// 不存在或已关闭，按零余额计
    Closed,
    Token(TokenAccountLayout),
    /// 存在但不是 SPL Token 账户
    Foreign,
}

impl TokenSide {
    fn of(snapshot: Option<&AccountSnapshot>) -> Self {
        match snapshot {
            None => TokenSide::Closed,
            // CloseAccount 之后 lamports 归零，运行时回收成空的 System 账户
            Some(snapshot)
                if snapshot.lamports == 0
                    || (snapshot.owner == SYSTEM_PROGRAM_ID && snapshot.raw_data.is_empty()) =>
            {
                TokenSide::Closed
            }
            Some(snapshot) => TokenAccountLayout::decode_owned(&snapshot.owner, &snapshot.raw_data)
                .map_or(TokenSide::Foreign, TokenSide::Token),
        }
    }

    fn layout(&self) -> Option<TokenAccountLayout> {
        match self {
            TokenSide::Token(layout) => Some(*layout),
            _ => None,
        }
    }
}

/// 主体账户的 lamports 变化
///
/// 只处理 `pubkey == subject` 的账户，其他账户返回 `None`
pub fn diff_sol(
    pre: Option<&AccountSnapshot>,
    post: Option<&AccountSnapshot>,
    subject: &Pubkey,
) -> Option<SolChange> {
    if snapshot_pubkey(pre, post)? != *subject {
        return None;
    }

    let pre_lamports = pre.map_or(0, |snapshot| snapshot.lamports);
    let post_lamports = post.map_or(0, |snapshot| snapshot.lamports);
    if pre_lamports == post_lamports {
        return None;
    }

    Some(SolChange {
        amount: pre_lamports.abs_diff(post_lamports),
        direction: Direction::from_balances(pre_lamports, post_lamports),
        from: None,
        to: None,
    })
}

/// SPL Token 账户的余额变化
///
/// 存在的每一侧都必须归 SPL Token Program 所有且长度为 165 字节，
/// 任一侧不满足就不做比较。已关闭的一侧（lamports 为 0 或回收成空 System 账户）
/// 按零余额计
pub fn diff_token(
    pre: Option<&AccountSnapshot>,
    post: Option<&AccountSnapshot>,
    subject: &Pubkey,
) -> Option<TokenBalanceDiff> {
    let token_account = snapshot_pubkey(pre, post)?;

    let (pre_side, post_side) = (TokenSide::of(pre), TokenSide::of(post));
    if matches!(pre_side, TokenSide::Foreign) || matches!(post_side, TokenSide::Foreign) {
        return None;
    }
    let (pre_layout, post_layout) = (pre_side.layout(), post_side.layout());

    let layout = post_layout.or(pre_layout)?;
    let pre_amount = pre_layout.map_or(0, |layout| layout.amount);
    let post_amount = post_layout.map_or(0, |layout| layout.amount);
    if pre_amount == post_amount {
        return None;
    }

    Some(TokenBalanceDiff {
        token_account,
        mint: layout.mint,
        owner: layout.owner,
        amount: pre_amount.abs_diff(post_amount),
        direction: Direction::from_balances(pre_amount, post_amount),
        subject_owned: layout.owner == *subject,
    })
}
