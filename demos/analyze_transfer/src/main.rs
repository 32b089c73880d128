//! 分析一笔交易对钱包的影响
//!
//! ```bash
//! # 分析钱包返回的 base64 交易
//! RPC_URL=https://api.mainnet-beta.solana.com cargo run -p analyze_transfer -- <subject> <base64_tx>
//!
//! # 不带参数：构造一笔 0.1 SOL 转账，对本地节点做模拟
//! cargo run -p analyze_transfer
//! ```

use sol_tx_effects::parser::TransactionAdapter;
use sol_tx_effects::{AnalyzerConfig, Direction, TransactionEffectsAnalyzer};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::{Transaction, VersionedTransaction};
use std::str::FromStr;

const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

fn demo_transfer(subject: &Pubkey) -> VersionedTransaction {
    let mut data = 2u32.to_le_bytes().to_vec();
    data.extend_from_slice(&(LAMPORTS_PER_SOL / 10).to_le_bytes());
    let ix = Instruction::new_with_bytes(
        sol_tx_effects::constants::SYSTEM_PROGRAM_ID,
        &data,
        vec![AccountMeta::new(*subject, true), AccountMeta::new(Pubkey::new_unique(), false)],
    );
    VersionedTransaction::from(Transaction::new_unsigned(Message::new(&[ix], Some(subject))))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("🔍 Transaction Effects Demo");
    println!("===========================");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (subject, tx) = match args.as_slice() {
        [subject, encoded] => {
            let subject = Pubkey::from_str(subject)?;
            (subject, TransactionAdapter::decode_wire_base64(encoded)?)
        }
        _ => {
            let subject = Pubkey::new_unique();
            (subject, demo_transfer(&subject))
        }
    };

    let config = AnalyzerConfig::from_env().with_verbose(true);
    println!("RPC: {}", config.rpc_url);
    println!("主体: {}", subject);

    let analyzer = TransactionEffectsAnalyzer::from_config(config);
    let effects = analyzer.analyze(&tx, &subject).await?;

    if effects.degraded {
        println!(
            "⚠️  模拟未完成，只有静态分析结果: {}",
            effects.simulation_error.as_deref().unwrap_or("unknown")
        );
    }

    println!("\n指令:");
    for (i, label) in effects.instruction_types.iter().enumerate() {
        println!("  #{} {}", i, label);
    }

    println!("\nSOL 变化:");
    for change in &effects.sol_changes {
        let sign = if change.direction == Direction::Out { "-" } else { "+" };
        println!("  {}{:.9} SOL", sign, change.amount as f64 / LAMPORTS_PER_SOL as f64);
    }

    println!("\n代币变化:");
    for change in &effects.token_changes {
        let amount = change.ui_amount().map_or_else(|| change.amount.to_string(), |ui| ui.to_string());
        println!("  {:?} {} of {} ({})", change.direction, amount, change.mint, change.program_used);
    }

    if let Some(swap) = &effects.swap_info {
        println!("\n✅ 识别为兑换: {} → {} via {}", swap.input_mint, swap.output_mint, swap.platform);
    }

    println!("\n完整报告:\n{}", effects.to_json_pretty()?);
    Ok(())
}
