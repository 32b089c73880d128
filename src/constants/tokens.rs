//! 常用代币常量定义
//!
//! 用于硬编码已知代币的 mint 地址

use solana_sdk::pubkey;

pub use solana_sdk::pubkey::Pubkey;

/// SOL Mint (Wrapped SOL)
///
/// 原生 SOL 变化参与 swap 识别时按此 mint 记账
pub const SOL_MINT: Pubkey = pubkey!("So11111111111111111111111111111111111111112");
