//! 指令解码器测试
//!
//! 解码是全函数：任何数据、任何账户列表都返回结果，不会 panic

use sol_tx_effects::DecodedInstruction;
use sol_tx_effects::constants::programs::*;
use sol_tx_effects::parser::{KnownProgram, ProgramRegistry, TransactionAdapter, decode, decode_instructions};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;

/// 简单的确定性伪随机字节
fn pseudo_random_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 33) as u8
        })
        .collect()
}

/// 测试：每个已知程序、每个指令号、每个截断长度都不会 panic
#[test]
fn test_decode_never_panics_on_any_prefix() {
    let accounts: Vec<Pubkey> = (0..4).map(|_| Pubkey::new_unique()).collect();

    for program in KnownProgram::ALL {
        let program_id = program.program_id();
        for opcode in 0u8..=255 {
            let mut data = vec![opcode, 0, 0, 0];
            data.extend(pseudo_random_bytes(opcode as u64, 60));
            for len in 0..=data.len() {
                for account_count in 0..=accounts.len() {
                    let decoded = decode(&program_id, &data[..len], &accounts[..account_count]);
                    assert_eq!(decoded.program_id(), program_id);
                }
            }
        }
    }
}

/// 测试：长度不足各自最小长度时一律是 OpaqueInvocation
#[test]
fn test_short_data_is_opaque() {
    let accounts: Vec<Pubkey> = (0..3).map(|_| Pubkey::new_unique()).collect();

    // System: Transfer 需要 12 字节, CreateAccount 需要 52 字节
    let cases: [(Pubkey, Vec<u8>); 5] = [
        (SYSTEM_PROGRAM_ID, [2u32.to_le_bytes().to_vec(), vec![0; 8]].concat()),
        (SYSTEM_PROGRAM_ID, [0u32.to_le_bytes().to_vec(), vec![0; 48]].concat()),
        (TOKEN_PROGRAM_ID, [vec![3u8], vec![0; 8]].concat()),
        (TOKEN_PROGRAM_ID, [vec![8u8], vec![0; 8]].concat()),
        (TOKEN_PROGRAM_ID, [vec![12u8], vec![0; 9]].concat()),
    ];

    for (program_id, full) in cases {
        assert!(!decode(&program_id, &full, &accounts).is_opaque(), "完整数据应当可解码");
        for len in 0..full.len() {
            let decoded = decode(&program_id, &full[..len], &accounts);
            assert_eq!(
                decoded,
                DecodedInstruction::OpaqueInvocation { program_id },
                "program={} len={}",
                program_id,
                len
            );
        }
    }
}

/// 测试：随机数据不会 panic，未知程序始终是 opaque
#[test]
fn test_random_payloads() {
    let accounts: Vec<Pubkey> = (0..8).map(|_| Pubkey::new_unique()).collect();
    let unknown = Pubkey::new_unique();

    for seed in 0..500u64 {
        let data = pseudo_random_bytes(seed, (seed % 80) as usize);
        let _ = decode(&SYSTEM_PROGRAM_ID, &data, &accounts);
        let _ = decode(&TOKEN_PROGRAM_ID, &data, &accounts);
        assert!(decode(&unknown, &data, &accounts).is_opaque());
        assert!(decode(&JUPITER_V6_PROGRAM_ID, &data, &accounts).is_opaque());
    }
}

/// 测试：从交易中按顺序解码，标签一一对应
#[test]
fn test_decode_instructions_preserves_order() {
    let payer = Pubkey::new_unique();
    let to = Pubkey::new_unique();
    let registry = ProgramRegistry::new();

    let mut transfer_data = 2u32.to_le_bytes().to_vec();
    transfer_data.extend_from_slice(&42u64.to_le_bytes());
    let instructions = [
        Instruction::new_with_bytes(COMPUTE_BUDGET_PROGRAM_ID, &[2, 0x40, 0x0d, 0x03, 0x00], vec![]),
        Instruction::new_with_bytes(
            SYSTEM_PROGRAM_ID,
            &transfer_data,
            vec![AccountMeta::new(payer, true), AccountMeta::new(to, false)],
        ),
        Instruction::new_with_bytes(METEORA_DLMM_PROGRAM_ID, &[0xff; 16], vec![AccountMeta::new(to, false)]),
    ];

    let adapter = TransactionAdapter::from_instructions(&instructions, Some(&payer)).unwrap();
    let decoded = decode_instructions(&adapter.instructions);
    let labels: Vec<String> = decoded.iter().map(|ix| ix.label(&registry)).collect();

    assert_eq!(labels, vec!["Compute Budget", "System Program: Transfer", "Meteora DLMM"]);
    assert_eq!(decoded[1], DecodedInstruction::SystemTransfer { amount: 42, from: payer, to });
    assert_eq!(decoded[1].transfer_amount(), Some(42));
}
