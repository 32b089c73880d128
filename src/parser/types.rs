//! 指令解码结果类型

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use solana_sdk::pubkey::Pubkey;

use crate::constants::programs::{ASSOCIATED_TOKEN_PROGRAM_ID, SYSTEM_PROGRAM_ID, TOKEN_PROGRAM_ID};
use crate::parser::registry::ProgramRegistry;

/// 解码后的指令
///
/// 未知程序、复杂程序（DEX / 聚合器）以及格式错误的数据统一落到
/// `OpaqueInvocation`，解码因此是全函数
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DecodedInstruction {
    /// System Program: Transfer
    SystemTransfer {
        amount: u64,
        #[serde_as(as = "DisplayFromStr")]
        from: Pubkey,
        #[serde_as(as = "DisplayFromStr")]
        to: Pubkey,
    },
    /// System Program: CreateAccount
    SystemCreateAccount {
        #[serde_as(as = "DisplayFromStr")]
        new_account: Pubkey,
        #[serde_as(as = "DisplayFromStr")]
        owner: Pubkey,
        lamports: u64,
    },
    /// SPL Token: Transfer
    TokenTransfer {
        amount: u64,
        #[serde_as(as = "DisplayFromStr")]
        source_account: Pubkey,
        #[serde_as(as = "DisplayFromStr")]
        dest_account: Pubkey,
    },
    /// SPL Token: TransferChecked
    TokenTransferChecked {
        amount: u64,
        decimals: u8,
        #[serde_as(as = "DisplayFromStr")]
        mint: Pubkey,
        #[serde_as(as = "DisplayFromStr")]
        source_account: Pubkey,
        #[serde_as(as = "DisplayFromStr")]
        dest_account: Pubkey,
    },
    /// SPL Token: MintTo
    TokenMintTo {
        amount: u64,
        #[serde_as(as = "DisplayFromStr")]
        mint: Pubkey,
    },
    /// SPL Token: Burn
    TokenBurn {
        amount: u64,
        #[serde_as(as = "DisplayFromStr")]
        mint: Pubkey,
    },
    /// SPL Token: CloseAccount
    TokenCloseAccount {
        #[serde_as(as = "DisplayFromStr")]
        account: Pubkey,
    },
    /// Associated Token Account: Create / CreateIdempotent
    AssociatedTokenCreate {
        #[serde_as(as = "DisplayFromStr")]
        account: Pubkey,
    },
    /// 无法（或不需要）静态解码的调用
    OpaqueInvocation {
        #[serde_as(as = "DisplayFromStr")]
        program_id: Pubkey,
    },
}

impl DecodedInstruction {
    /// 指令所属程序
    pub fn program_id(&self) -> Pubkey {
        match self {
            DecodedInstruction::SystemTransfer { .. }
            | DecodedInstruction::SystemCreateAccount { .. } => SYSTEM_PROGRAM_ID,
            DecodedInstruction::TokenTransfer { .. }
            | DecodedInstruction::TokenTransferChecked { .. }
            | DecodedInstruction::TokenMintTo { .. }
            | DecodedInstruction::TokenBurn { .. }
            | DecodedInstruction::TokenCloseAccount { .. } => TOKEN_PROGRAM_ID,
            DecodedInstruction::AssociatedTokenCreate { .. } => ASSOCIATED_TOKEN_PROGRAM_ID,
            DecodedInstruction::OpaqueInvocation { program_id } => *program_id,
        }
    }

    /// 指令携带的转账 / 铸造 / 销毁数量
    pub fn transfer_amount(&self) -> Option<u64> {
        match self {
            DecodedInstruction::SystemTransfer { amount, .. }
            | DecodedInstruction::TokenTransfer { amount, .. }
            | DecodedInstruction::TokenTransferChecked { amount, .. }
            | DecodedInstruction::TokenMintTo { amount, .. }
            | DecodedInstruction::TokenBurn { amount, .. } => Some(*amount),
            DecodedInstruction::SystemCreateAccount { lamports, .. } => Some(*lamports),
            DecodedInstruction::TokenCloseAccount { .. }
            | DecodedInstruction::AssociatedTokenCreate { .. }
            | DecodedInstruction::OpaqueInvocation { .. } => None,
        }
    }

    /// 参与的账户
    pub fn participants(&self) -> Vec<Pubkey> {
        match self {
            DecodedInstruction::SystemTransfer { from, to, .. } => vec![*from, *to],
            DecodedInstruction::SystemCreateAccount { new_account, .. } => vec![*new_account],
            DecodedInstruction::TokenTransfer { source_account, dest_account, .. }
            | DecodedInstruction::TokenTransferChecked { source_account, dest_account, .. } => {
                vec![*source_account, *dest_account]
            }
            DecodedInstruction::TokenMintTo { mint, .. }
            | DecodedInstruction::TokenBurn { mint, .. } => vec![*mint],
            DecodedInstruction::TokenCloseAccount { account }
            | DecodedInstruction::AssociatedTokenCreate { account } => vec![*account],
            DecodedInstruction::OpaqueInvocation { .. } => vec![],
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, DecodedInstruction::OpaqueInvocation { .. })
    }

    /// 人类可读的指令标签
    pub fn label(&self, registry: &ProgramRegistry) -> String {
        let action = match self {
            DecodedInstruction::SystemTransfer { .. } => "Transfer",
            DecodedInstruction::SystemCreateAccount { .. } => "Create Account",
            DecodedInstruction::TokenTransfer { .. } => "Transfer",
            DecodedInstruction::TokenTransferChecked { .. } => "Transfer Checked",
            DecodedInstruction::TokenMintTo { .. } => "Mint To",
            DecodedInstruction::TokenBurn { .. } => "Burn",
            DecodedInstruction::TokenCloseAccount { .. } => "Close Account",
            DecodedInstruction::AssociatedTokenCreate { .. } => "Create",
            DecodedInstruction::OpaqueInvocation { program_id } => {
                return registry.lookup(program_id).to_string();
            }
        };
        format!("{}: {}", registry.lookup(&self.program_id()), action)
    }
}
