//! 兑换识别
//!
//! 交易调用了 DEX / 聚合器，且主体同时有流出和流入（不同 mint）时，
//! 认定为一次兑换。多跳兑换取数量最大的流出和流入

use solana_sdk::pubkey::Pubkey;

use crate::constants::tokens::SOL_MINT;
use crate::effects::types::{Direction, SwapInfo, TransactionEffects};
use crate::parser::registry::ProgramRegistry;

#[derive(Debug, Clone, Copy)]
struct Leg {
    mint: Pubkey,
    amount: u64,
    direction: Direction,
}

/// 池子一侧的 SOL 净流入：DEX 程序账户的 lamports 变化加上对手方 WSOL 账户的变化
fn pool_sol_flow(effects: &TransactionEffects, pool_lamports: i128) -> i128 {
    let wsol: i128 = effects
        .counterparty_token_changes
        .iter()
        .filter(|change| change.mint == SOL_MINT)
        .map(|change| change.direction.signed(change.amount))
        .sum();
    pool_lamports + wsol
}

/// 主体的资金腿：代币变化按发现顺序
///
/// 某一侧没有代币腿时，主体的 SOL 净变化按 WSOL 补上，但只计池子一侧
/// 反向流动的那部分；手续费和租金没有对应的池子流动，不会成为兑换腿
fn collect_legs(effects: &TransactionEffects, pool_lamports: i128) -> Vec<Leg> {
    let mut legs: Vec<Leg> = effects
        .token_changes
        .iter()
        .map(|change| Leg { mint: change.mint, amount: change.amount, direction: change.direction })
        .collect();

    let has_out = legs.iter().any(|leg| leg.direction == Direction::Out);
    let has_in = legs.iter().any(|leg| leg.direction == Direction::In);
    let net_sol = effects.net_sol_change();
    let pool_flow = pool_sol_flow(effects, pool_lamports);

    let direction = if !has_out && net_sol < 0 && pool_flow > 0 {
        Some(Direction::Out)
    } else if !has_in && net_sol > 0 && pool_flow < 0 {
        Some(Direction::In)
    } else {
        None
    };

    if let Some(direction) = direction {
        let amount = net_sol.unsigned_abs().min(pool_flow.unsigned_abs());
        legs.push(Leg { mint: SOL_MINT, amount: u64::try_from(amount).unwrap_or(u64::MAX), direction });
    }
    legs
}

/// 按数量降序，数量相同保持发现顺序
fn by_magnitude(legs: &[Leg], direction: Direction) -> Vec<Leg> {
    let mut selected: Vec<Leg> = legs.iter().filter(|leg| leg.direction == direction).copied().collect();
    selected.sort_by(|a, b| b.amount.cmp(&a.amount));
    selected
}

/// 识别兑换，非兑换交易返回 `None`
///
/// `pool_lamports` 是 DEX 程序自己的账户（池子、bonding curve）执行前后的
/// lamports 净变化，用来确认主体的原生 SOL 变化确实流向了池子
pub fn detect(effects: &TransactionEffects, registry: &ProgramRegistry, pool_lamports: i128) -> Option<SwapInfo> {
    let platform = effects.programs_involved.iter().find(|program_id| registry.is_dex(program_id))?;

    let legs = collect_legs(effects, pool_lamports);
    let outs = by_magnitude(&legs, Direction::Out);
    let ins = by_magnitude(&legs, Direction::In);

    outs.iter().find_map(|input| {
        ins.iter().find(|output| output.mint != input.mint).map(|output| SwapInfo {
            input_mint: input.mint,
            output_mint: output.mint,
            input_amount: input.amount,
            output_amount: Some(output.amount),
            platform: registry.lookup(platform),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::programs::*;
    use crate::effects::types::{SolChange, TokenChange};
    use crate::parser::registry::{KnownProgram, ProgramName};

    fn change(mint: Pubkey, amount: u64, direction: Direction) -> TokenChange {
        TokenChange {
            mint,
            amount,
            decimals: None,
            direction,
            from_account: None,
            to_account: None,
            program_used: ProgramName::Known(KnownProgram::SplToken),
        }
    }

    #[test]
    fn test_detect_simple_swap() {
        let registry = ProgramRegistry::new();
        let m1 = Pubkey::new_unique();
        let m2 = Pubkey::new_unique();
        let effects = TransactionEffects {
            programs_involved: vec![COMPUTE_BUDGET_PROGRAM_ID, RAYDIUM_AMM_V4_PROGRAM_ID],
            token_changes: vec![change(m1, 200, Direction::Out), change(m2, 150, Direction::In)],
            ..Default::default()
        };

        let swap = detect(&effects, &registry, 0).unwrap();
        assert_eq!(
            swap,
            SwapInfo {
                input_mint: m1,
                output_mint: m2,
                input_amount: 200,
                output_amount: Some(150),
                platform: ProgramName::Known(KnownProgram::RaydiumAmmV4),
            }
        );
    }

    #[test]
    fn test_requires_dex_program() {
        let registry = ProgramRegistry::new();
        let effects = TransactionEffects {
            programs_involved: vec![TOKEN_PROGRAM_ID],
            token_changes: vec![
                change(Pubkey::new_unique(), 1, Direction::Out),
                change(Pubkey::new_unique(), 1, Direction::In),
            ],
            ..Default::default()
        };
        assert_eq!(detect(&effects, &registry, 0), None);
    }

    #[test]
    fn test_requires_different_mints() {
        let registry = ProgramRegistry::new();
        let mint = Pubkey::new_unique();
        let effects = TransactionEffects {
            programs_involved: vec![JUPITER_V6_PROGRAM_ID],
            token_changes: vec![change(mint, 10, Direction::Out), change(mint, 5, Direction::In)],
            ..Default::default()
        };
        assert_eq!(detect(&effects, &registry, 0), None);
    }

    #[test]
    fn test_multi_hop_picks_largest_legs_and_first_dex() {
        let registry = ProgramRegistry::new();
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let c = Pubkey::new_unique();
        let effects = TransactionEffects {
            programs_involved: vec![JUPITER_V6_PROGRAM_ID, ORCA_WHIRLPOOL_PROGRAM_ID],
            token_changes: vec![
                change(a, 50, Direction::Out),
                change(b, 900, Direction::Out),
                change(c, 300, Direction::In),
                change(a, 300, Direction::In),
            ],
            ..Default::default()
        };

        let swap = detect(&effects, &registry, 0).unwrap();
        assert_eq!(swap.input_mint, b);
        assert_eq!(swap.input_amount, 900);
        // 数量相同取先发现的
        assert_eq!(swap.output_mint, c);
        assert_eq!(swap.platform.label(), "Jupiter");
    }

    fn sol_out(amount: u64) -> SolChange {
        SolChange { amount, direction: Direction::Out, from: None, to: None }
    }

    #[test]
    fn test_native_sol_leg_counts_as_wsol() {
        let registry = ProgramRegistry::new();
        let token = Pubkey::new_unique();
        let effects = TransactionEffects {
            programs_involved: vec![PUMPFUN_PROGRAM_ID],
            sol_changes: vec![sol_out(1_002_044_280)],
            token_changes: vec![change(token, 35_000_000, Direction::In)],
            ..Default::default()
        };

        // bonding curve 收到 1 SOL，其余是手续费和 ATA 租金
        let swap = detect(&effects, &registry, 1_000_000_000).unwrap();
        assert_eq!(swap.input_mint, SOL_MINT);
        assert_eq!(swap.input_amount, 1_000_000_000);
        assert_eq!(swap.output_mint, token);
        assert_eq!(swap.platform.label(), "Pump.fun");
    }

    #[test]
    fn test_fee_alone_is_not_a_swap_leg() {
        let registry = ProgramRegistry::new();
        let effects = TransactionEffects {
            programs_involved: vec![RAYDIUM_CLMM_PROGRAM_ID],
            sol_changes: vec![sol_out(5_000)],
            token_changes: vec![change(Pubkey::new_unique(), 42, Direction::In)],
            ..Default::default()
        };
        assert_eq!(detect(&effects, &registry, 0), None);

        // 池子反而付出了 SOL，也不是用 SOL 买入
        assert_eq!(detect(&effects, &registry, -5_000), None);
    }

    #[test]
    fn test_native_sol_leg_from_pool_wsol_vault() {
        let registry = ProgramRegistry::new();
        let token = Pubkey::new_unique();
        let mut vault = change(SOL_MINT, 500_000_000, Direction::In);
        vault.program_used = ProgramName::Known(KnownProgram::RaydiumAmmV4);
        let effects = TransactionEffects {
            programs_involved: vec![RAYDIUM_AMM_V4_PROGRAM_ID],
            sol_changes: vec![sol_out(500_005_000)],
            token_changes: vec![change(token, 7, Direction::In)],
            counterparty_token_changes: vec![vault],
            ..Default::default()
        };

        let swap = detect(&effects, &registry, 0).unwrap();
        assert_eq!((swap.input_mint, swap.input_amount), (SOL_MINT, 500_000_000));
        assert_eq!(swap.output_mint, token);
    }
}
