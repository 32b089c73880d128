//! 指令解码器
//!
//! (program id, 指令数据, 账户列表) → `DecodedInstruction`
//!
//! 先按程序分发，再按固定 offset 读取字段。长度不足、账户缺失、
//! 未识别的指令号都返回 `OpaqueInvocation`，不会 panic

use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::parser::constants::discriminators::{associated_token, spl_token, system};
use crate::parser::registry::KnownProgram;
use crate::parser::transaction_adapter::InstructionInfo;
use crate::parser::types::DecodedInstruction;
use crate::parser::utils::BinaryReader;

/// 解码单条指令
pub fn decode(program_id: &Pubkey, data: &[u8], accounts: &[Pubkey]) -> DecodedInstruction {
    let decoded = match KnownProgram::from_program_id(program_id) {
        Some(KnownProgram::System) => decode_system(data, accounts),
        Some(KnownProgram::SplToken) => decode_token(data, accounts),
        Some(KnownProgram::AssociatedToken) => decode_associated_token(accounts),
        // DEX 指令格式不在解码表内，效果由余额 diff 恢复
        Some(_) | None => None,
    };

    decoded.unwrap_or_else(|| {
        debug!("指令无法静态解码，按 OpaqueInvocation 处理: program={}, data_len={}", program_id, data.len());
        DecodedInstruction::OpaqueInvocation { program_id: *program_id }
    })
}

/// 按交易顺序解码所有指令
pub fn decode_instructions(instructions: &[InstructionInfo]) -> Vec<DecodedInstruction> {
    instructions
        .iter()
        .map(|ix| decode(&ix.program_id, &ix.data, &ix.accounts))
        .collect()
}

fn decode_system(data: &[u8], accounts: &[Pubkey]) -> Option<DecodedInstruction> {
    let mut reader = BinaryReader::new(data);
    match reader.read_u32().ok()? {
        system::CREATE_ACCOUNT if data.len() >= system::CREATE_ACCOUNT_LEN => {
            let lamports = reader.read_u64().ok()?;
            reader.skip(8).ok()?; // space
            let owner = reader.read_pubkey().ok()?;
            Some(DecodedInstruction::SystemCreateAccount {
                new_account: *accounts.get(1)?,
                owner,
                lamports,
            })
        }
        system::TRANSFER if data.len() >= system::TRANSFER_LEN => {
            let amount = reader.read_u64().ok()?;
            Some(DecodedInstruction::SystemTransfer {
                amount,
                from: *accounts.first()?,
                to: *accounts.get(1)?,
            })
        }
        _ => None,
    }
}

fn decode_token(data: &[u8], accounts: &[Pubkey]) -> Option<DecodedInstruction> {
    let mut reader = BinaryReader::new(data);
    let opcode = reader.read_u8().ok()?;

    if opcode == spl_token::CLOSE_ACCOUNT {
        return Some(DecodedInstruction::TokenCloseAccount { account: *accounts.first()? });
    }

    if data.len() < spl_token::AMOUNT_LEN {
        return None;
    }
    let amount = reader.read_u64().ok()?;

    match opcode {
        spl_token::TRANSFER => Some(DecodedInstruction::TokenTransfer {
            amount,
            source_account: *accounts.first()?,
            dest_account: *accounts.get(1)?,
        }),
        spl_token::MINT_TO => Some(DecodedInstruction::TokenMintTo { amount, mint: *accounts.first()? }),
        // Burn: account, mint, authority
        spl_token::BURN => Some(DecodedInstruction::TokenBurn { amount, mint: *accounts.get(1)? }),
        spl_token::TRANSFER_CHECKED if data.len() >= spl_token::TRANSFER_CHECKED_LEN => {
            let decimals = reader.read_u8().ok()?;
            Some(DecodedInstruction::TokenTransferChecked {
                amount,
                decimals,
                source_account: *accounts.first()?,
                mint: *accounts.get(1)?,
                dest_account: *accounts.get(2)?,
            })
        }
        _ => None,
    }
}

fn decode_associated_token(accounts: &[Pubkey]) -> Option<DecodedInstruction> {
    accounts
        .get(associated_token::ASSOCIATED_ACCOUNT_INDEX)
        .map(|account| DecodedInstruction::AssociatedTokenCreate { account: *account })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::programs::*;

    fn system_transfer_data(amount: u64) -> Vec<u8> {
        let mut data = 2u32.to_le_bytes().to_vec();
        data.extend_from_slice(&amount.to_le_bytes());
        data
    }

    fn token_amount_data(opcode: u8, amount: u64) -> Vec<u8> {
        let mut data = vec![opcode];
        data.extend_from_slice(&amount.to_le_bytes());
        data
    }

    #[test]
    fn test_decode_system_transfer() {
        let from = Pubkey::new_unique();
        let to = Pubkey::new_unique();
        let decoded = decode(&SYSTEM_PROGRAM_ID, &system_transfer_data(1_000_000_000), &[from, to]);
        assert_eq!(
            decoded,
            DecodedInstruction::SystemTransfer { amount: 1_000_000_000, from, to }
        );
    }

    #[test]
    fn test_decode_system_create_account() {
        let payer = Pubkey::new_unique();
        let new_account = Pubkey::new_unique();
        let owner = TOKEN_PROGRAM_ID;

        let mut data = 0u32.to_le_bytes().to_vec();
        data.extend_from_slice(&2_039_280u64.to_le_bytes());
        data.extend_from_slice(&165u64.to_le_bytes());
        data.extend_from_slice(owner.as_ref());

        let decoded = decode(&SYSTEM_PROGRAM_ID, &data, &[payer, new_account]);
        assert_eq!(
            decoded,
            DecodedInstruction::SystemCreateAccount { new_account, owner, lamports: 2_039_280 }
        );
    }

    #[test]
    fn test_decode_system_unknown_opcode_is_opaque() {
        // opcode 8 = Allocate
        let mut data = 8u32.to_le_bytes().to_vec();
        data.extend_from_slice(&10u64.to_le_bytes());
        let decoded = decode(&SYSTEM_PROGRAM_ID, &data, &[Pubkey::new_unique()]);
        assert_eq!(decoded, DecodedInstruction::OpaqueInvocation { program_id: SYSTEM_PROGRAM_ID });
    }

    #[test]
    fn test_truncated_data_is_opaque() {
        let accounts = [Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique()];
        let full = system_transfer_data(42);
        for len in 0..full.len() {
            let decoded = decode(&SYSTEM_PROGRAM_ID, &full[..len], &accounts);
            assert!(decoded.is_opaque(), "长度 {} 应该是 opaque", len);
        }

        let full = token_amount_data(3, 42);
        for len in 0..full.len() {
            let decoded = decode(&TOKEN_PROGRAM_ID, &full[..len], &accounts);
            assert!(decoded.is_opaque(), "长度 {} 应该是 opaque", len);
        }
    }

    #[test]
    fn test_missing_accounts_is_opaque() {
        let decoded = decode(&SYSTEM_PROGRAM_ID, &system_transfer_data(1), &[Pubkey::new_unique()]);
        assert!(decoded.is_opaque());

        let decoded = decode(&TOKEN_PROGRAM_ID, &[9], &[]);
        assert!(decoded.is_opaque());

        let decoded = decode(&ASSOCIATED_TOKEN_PROGRAM_ID, &[], &[Pubkey::new_unique()]);
        assert!(decoded.is_opaque());
    }

    #[test]
    fn test_decode_token_instructions() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let c = Pubkey::new_unique();

        assert_eq!(
            decode(&TOKEN_PROGRAM_ID, &token_amount_data(3, 500_000), &[a, b, c]),
            DecodedInstruction::TokenTransfer { amount: 500_000, source_account: a, dest_account: b }
        );
        assert_eq!(
            decode(&TOKEN_PROGRAM_ID, &token_amount_data(7, 10), &[a, b, c]),
            DecodedInstruction::TokenMintTo { amount: 10, mint: a }
        );
        assert_eq!(
            decode(&TOKEN_PROGRAM_ID, &token_amount_data(8, 10), &[a, b, c]),
            DecodedInstruction::TokenBurn { amount: 10, mint: b }
        );
        assert_eq!(
            decode(&TOKEN_PROGRAM_ID, &[9], &[a, b, c]),
            DecodedInstruction::TokenCloseAccount { account: a }
        );

        let mut checked = token_amount_data(12, 77);
        checked.push(6);
        assert_eq!(
            decode(&TOKEN_PROGRAM_ID, &checked, &[a, b, c]),
            DecodedInstruction::TokenTransferChecked {
                amount: 77,
                decimals: 6,
                mint: b,
                source_account: a,
                dest_account: c,
            }
        );
    }

    #[test]
    fn test_decode_token_unknown_opcode_is_opaque() {
        // opcode 4 = Approve
        let decoded = decode(&TOKEN_PROGRAM_ID, &token_amount_data(4, 1), &[Pubkey::new_unique()]);
        assert_eq!(decoded, DecodedInstruction::OpaqueInvocation { program_id: TOKEN_PROGRAM_ID });
    }

    #[test]
    fn test_associated_token_ignores_payload() {
        let accounts = [Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique()];
        for data in [vec![], vec![1], vec![0xff; 64]] {
            assert_eq!(
                decode(&ASSOCIATED_TOKEN_PROGRAM_ID, &data, &accounts),
                DecodedInstruction::AssociatedTokenCreate { account: accounts[1] }
            );
        }
    }

    #[test]
    fn test_dex_and_unknown_programs_are_opaque() {
        let data = vec![0xe5, 0x17, 0xcb, 0x97, 0x7a, 0xe3, 0xad, 0x2a];
        let decoded = decode(&JUPITER_V6_PROGRAM_ID, &data, &[Pubkey::new_unique()]);
        assert_eq!(decoded, DecodedInstruction::OpaqueInvocation { program_id: JUPITER_V6_PROGRAM_ID });

        let unknown = Pubkey::new_unique();
        assert_eq!(
            decode(&unknown, &[], &[]),
            DecodedInstruction::OpaqueInvocation { program_id: unknown }
        );
    }
}
