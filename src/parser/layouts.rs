//! 固定布局账户数据解码
//!
//! SPL Token 账户是 165 字节的定长记录:
//! mint @0 (32) | owner @32 (32) | amount @64 (u64 LE) | ...

use solana_sdk::pubkey::Pubkey;
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::Mint;

use crate::constants::programs::TOKEN_PROGRAM_ID;
use crate::parser::utils::BinaryReader;

/// SPL Token 账户记录长度
pub const TOKEN_ACCOUNT_LEN: usize = 165;

pub const TOKEN_ACCOUNT_MINT_OFFSET: usize = 0;
pub const TOKEN_ACCOUNT_OWNER_OFFSET: usize = 32;
pub const TOKEN_ACCOUNT_AMOUNT_OFFSET: usize = 64;

/// Token 账户中与余额相关的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAccountLayout {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

impl TokenAccountLayout {
    /// 解码 token 账户数据，长度必须正好是 165 字节
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() != TOKEN_ACCOUNT_LEN {
            return None;
        }
        let mint = BinaryReader::at(data, TOKEN_ACCOUNT_MINT_OFFSET).read_pubkey().ok()?;
        let owner = BinaryReader::at(data, TOKEN_ACCOUNT_OWNER_OFFSET).read_pubkey().ok()?;
        let amount = BinaryReader::at(data, TOKEN_ACCOUNT_AMOUNT_OFFSET).read_u64().ok()?;
        Some(Self { mint, owner, amount })
    }

    /// 账户归 SPL Token Program 所有且长度正确时才解码
    pub fn decode_owned(program_owner: &Pubkey, data: &[u8]) -> Option<Self> {
        if *program_owner != TOKEN_PROGRAM_ID {
            return None;
        }
        Self::decode(data)
    }
}

/// 从 mint 账户数据读取精度
pub fn decode_mint_decimals(program_owner: &Pubkey, data: &[u8]) -> Option<u8> {
    if *program_owner != TOKEN_PROGRAM_ID {
        return None;
    }
    Mint::unpack(data).ok().map(|mint| mint.decimals)
}
