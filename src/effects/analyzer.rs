//! 交易效果分析器
//!
//! 静态解码 + 模拟执行前后的账户差分，合并成一份 `TransactionEffects`。
//! 除了交易本身无法解析，`analyze` 不返回错误：网络问题和查找表缺失只会让报告
//! 标记为 `degraded`

use solana_sdk::message::v0::MessageAddressTableLookup;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::VersionedTransaction;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::common::AnalyzerConfig;
use crate::constants::programs::ADDRESS_LOOKUP_TABLE_PROGRAM_ID;
use crate::effects::balance_diff::{TokenBalanceDiff, diff_sol, diff_token};
use crate::effects::swap_detector;
use crate::effects::types::{Direction, SolChange, TokenChange, TransactionEffects, push_unique};
use crate::parser::decoder::decode_instructions;
use crate::parser::layouts::decode_mint_decimals;
use crate::parser::registry::ProgramRegistry;
use crate::parser::transaction_adapter::{AdapterError, LookupAddresses, TransactionAdapter};
use crate::parser::types::DecodedInstruction;
use crate::simulation::{AccountStates, RetryPolicy, RpcSimulationClient, SimulationClient, with_retry};

/// 分析错误，只在交易本身无法解析时出现
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("无效的交易: {0}")]
    InvalidTransaction(#[from] AdapterError),
}

/// 同一次执行的前后账户状态
#[derive(Debug, Clone, Copy)]
pub struct SnapshotPair<'a> {
    pub pre: &'a AccountStates,
    pub post: &'a AccountStates,
}

/// 交易效果分析器
///
/// 无状态，可在多个任务间克隆共享
#[derive(Clone)]
pub struct TransactionEffectsAnalyzer {
    client: Arc<dyn SimulationClient>,
    registry: Arc<ProgramRegistry>,
    config: AnalyzerConfig,
}

impl TransactionEffectsAnalyzer {
    pub fn new(client: Arc<dyn SimulationClient>, config: AnalyzerConfig) -> Self {
        Self { client, registry: ProgramRegistry::shared(), config }
    }

    /// 连接 `config.rpc_url` 的分析器
    pub fn from_config(config: AnalyzerConfig) -> Self {
        let client = Arc::new(RpcSimulationClient::from_config(&config));
        Self::new(client, config)
    }

    pub fn with_registry(mut self, registry: Arc<ProgramRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &ProgramRegistry {
        &self.registry
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// 分析交易对 `subject` 的影响
    pub async fn analyze(
        &self,
        tx: &VersionedTransaction,
        subject: &Pubkey,
    ) -> Result<TransactionEffects, AnalyzeError> {
        self.analyze_with_lookups(tx, None, subject).await
    }

    /// 分析使用地址查找表的 V0 交易
    ///
    /// `lookups` 为 `None` 时按交易里的查找表自行拉取解析；解析失败只输出
    /// 静态账户能解码的部分，并标记 `degraded`
    pub async fn analyze_with_lookups(
        &self,
        tx: &VersionedTransaction,
        lookups: Option<&LookupAddresses>,
        subject: &Pubkey,
    ) -> Result<TransactionEffects, AnalyzeError> {
        let policy = RetryPolicy::from_config(&self.config);

        let resolved = match (lookups, tx.message.address_table_lookups()) {
            (None, Some(tables)) if !tables.is_empty() => match self.resolve_lookup_tables(tables, policy).await {
                Ok(addresses) => Some(addresses),
                Err(err) => {
                    warn!("{}，只输出静态分析结果", err);
                    let adapter = TransactionAdapter::from_static_keys(tx)?;
                    let decoded = decode_instructions(&adapter.instructions);
                    let effects = self.static_effects(&adapter, &decoded, subject, err.to_string());
                    self.log_summary(&adapter, &effects);
                    return Ok(effects);
                }
            },
            _ => None,
        };
        let lookups = lookups.or(resolved.as_ref());

        let adapter = TransactionAdapter::from_versioned_transaction(tx, lookups)?;
        let decoded = decode_instructions(&adapter.instructions);

        let client = self.client.as_ref();
        let keys = adapter.account_keys.as_slice();

        let (pre, simulated) = tokio::join!(
            with_retry(policy, "fetch_accounts", || client.fetch_accounts(keys)),
            with_retry(policy, "simulate", || client.simulate(tx, keys)),
        );

        let (mut effects, outcome) = match (pre, simulated) {
            (Ok(pre), Ok(outcome)) => {
                let effects = match &outcome.accounts {
                    Some(post) => build_effects(
                        &self.registry,
                        &adapter,
                        &decoded,
                        Some(SnapshotPair { pre: &pre, post }),
                        subject,
                    ),
                    None => {
                        warn!("模拟结果没有账户状态，只输出静态分析结果");
                        self.static_effects(&adapter, &decoded, subject, "模拟结果没有账户状态".to_string())
                    }
                };
                (effects, Some(outcome))
            }
            (Err(err), Ok(outcome)) => {
                warn!("执行前状态不可用，只输出静态分析结果: {}", err);
                (self.static_effects(&adapter, &decoded, subject, err.to_string()), Some(outcome))
            }
            (_, Err(err)) => {
                warn!("模拟不可用，只输出静态分析结果: {}", err);
                (self.static_effects(&adapter, &decoded, subject, err.to_string()), None)
            }
        };

        if let Some(outcome) = outcome {
            if let Some(err) = outcome.execution_error {
                warn!("交易模拟执行失败: {}", err);
                effects.degraded = true;
                effects.simulation_error = Some(err);
            }
            effects.logs = outcome.logs;
            effects.compute_units_consumed = outcome.units_consumed;
        }

        if self.config.resolve_decimals {
            self.resolve_decimals(&mut effects, policy).await;
        }

        self.log_summary(&adapter, &effects);
        Ok(effects)
    }

    fn static_effects(
        &self,
        adapter: &TransactionAdapter,
        decoded: &[DecodedInstruction],
        subject: &Pubkey,
        reason: String,
    ) -> TransactionEffects {
        let mut effects = build_effects(&self.registry, adapter, decoded, None, subject);
        effects.degraded = true;
        effects.simulation_error = Some(reason);
        effects
    }

    fn log_summary(&self, adapter: &TransactionAdapter, effects: &TransactionEffects) {
        if self.config.verbose {
            info!(
                "交易分析完成: signature={}, 指令 {} 条, SOL 变化 {} 条, 代币变化 {} 条, swap={}, degraded={}",
                if adapter.signature.is_empty() { "<unsigned>" } else { adapter.signature.as_str() },
                effects.instruction_types.len(),
                effects.sol_changes.len(),
                effects.token_changes.len(),
                effects.swap_info.is_some(),
                effects.degraded
            );
        }
    }

    /// 拉取交易引用的地址查找表并展开成账户列表
    async fn resolve_lookup_tables(
        &self,
        tables: &[MessageAddressTableLookup],
        policy: RetryPolicy,
    ) -> Result<LookupAddresses, AdapterError> {
        let table_keys: Vec<Pubkey> = tables.iter().map(|table| table.account_key).collect();
        let client = self.client.as_ref();
        let keys = table_keys.as_slice();
        let states = with_retry(policy, "fetch_lookup_tables", || client.fetch_accounts(keys))
            .await
            .map_err(|err| AdapterError::LookupTable(format!("查找表拉取失败: {}", err)))?;

        let addresses = LookupAddresses::from_tables(tables, |key| {
            states
                .get(key)
                .and_then(Option::as_ref)
                .filter(|snapshot| snapshot.owner == ADDRESS_LOOKUP_TABLE_PROGRAM_ID)
                .map(|snapshot| snapshot.raw_data.as_slice())
        })?;
        debug!("查找表解析完成: {} 张表, {} 个地址", tables.len(), addresses.len());
        Ok(addresses)
    }

    /// 批量拉取 mint 账户补全精度，失败时保持 `None`
    async fn resolve_decimals(&self, effects: &mut TransactionEffects, policy: RetryPolicy) {
        let mut mints: Vec<Pubkey> = Vec::new();
        for change in effects.token_changes.iter().chain(&effects.counterparty_token_changes) {
            if change.decimals.is_none() {
                push_unique(&mut mints, change.mint);
            }
        }
        if mints.is_empty() {
            return;
        }

        let client = self.client.as_ref();
        let keys = mints.as_slice();
        let states = match with_retry(policy, "fetch_mints", || client.fetch_accounts(keys)).await {
            Ok(states) => states,
            Err(err) => {
                warn!("mint 精度获取失败: {}", err);
                return;
            }
        };

        let decimals: HashMap<Pubkey, u8> = states
            .iter()
            .filter_map(|(mint, snapshot)| {
                let snapshot = snapshot.as_ref()?;
                decode_mint_decimals(&snapshot.owner, &snapshot.raw_data).map(|d| (*mint, d))
            })
            .collect();
        debug!("mint 精度: 请求 {} 个, 解析 {} 个", mints.len(), decimals.len());

        for change in effects.token_changes.iter_mut().chain(effects.counterparty_token_changes.iter_mut()) {
            if change.decimals.is_none() {
                change.decimals = decimals.get(&change.mint).copied();
            }
        }
    }
}

/// 合并静态解码结果和账户差分（不做 I/O）
///
/// `states` 为 `None` 时只输出静态部分：指令标签、程序、解码出的账户创建 / 关闭
pub fn build_effects(
    registry: &ProgramRegistry,
    adapter: &TransactionAdapter,
    decoded: &[DecodedInstruction],
    states: Option<SnapshotPair<'_>>,
    subject: &Pubkey,
) -> TransactionEffects {
    let mut effects = TransactionEffects::default();

    for (info, instruction) in adapter.instructions.iter().zip(decoded) {
        effects.instruction_types.push(instruction.label(registry));
        push_unique(&mut effects.programs_involved, info.program_id);

        match instruction {
            DecodedInstruction::SystemCreateAccount { new_account: account, .. }
            | DecodedInstruction::AssociatedTokenCreate { account } => {
                push_unique(&mut effects.accounts_created, *account);
            }
            DecodedInstruction::TokenCloseAccount { account } => {
                push_unique(&mut effects.accounts_closed, *account);
            }
            _ => {}
        }
    }

    let mut pool_lamports: i128 = 0;
    if let Some(states) = states {
        let dex_program = effects.programs_involved.iter().find(|program_id| registry.is_dex(program_id)).copied();

        for key in &adapter.account_keys {
            let pre = states.pre.get(key).and_then(Option::as_ref);
            let post = states.post.get(key).and_then(Option::as_ref);

            match (pre, post) {
                (None, Some(_)) => push_unique(&mut effects.accounts_created, *key),
                (Some(_), None) => push_unique(&mut effects.accounts_closed, *key),
                (Some(_), Some(after)) if after.lamports == 0 => {
                    push_unique(&mut effects.accounts_closed, *key)
                }
                _ => {}
            }

            // DEX 程序账户（池子、bonding curve）的 lamports 变化，本交易新建的账户不计
            if let Some(before) = pre.filter(|before| before.pubkey != *subject && registry.is_dex(&before.owner)) {
                pool_lamports += post.map_or(0, |after| after.lamports) as i128 - before.lamports as i128;
            }

            if let Some(mut change) = diff_sol(pre, post, subject) {
                enrich_sol_change(&mut change, decoded, subject);
                effects.sol_changes.push(change);
            }

            if let Some(diff) = diff_token(pre, post, subject) {
                let program_used = dex_program.unwrap_or_else(|| pre.or(post).map_or(*key, |s| s.owner));
                let change = token_change(registry, &diff, decoded, &program_used);
                if diff.subject_owned {
                    effects.token_changes.push(change);
                } else {
                    effects.counterparty_token_changes.push(change);
                }
            }
        }
    }

    effects.swap_info = swap_detector::detect(&effects, registry, pool_lamports);

    debug!(
        "效果合并完成: 指令 {}, 程序 {}, SOL 变化 {}, 代币变化 {}/{}",
        effects.instruction_types.len(),
        effects.programs_involved.len(),
        effects.sol_changes.len(),
        effects.token_changes.len(),
        effects.counterparty_token_changes.len()
    );
    effects
}

/// 用匹配的 System 转账补上对手方
fn enrich_sol_change(change: &mut SolChange, decoded: &[DecodedInstruction], subject: &Pubkey) {
    let transfer = decoded.iter().find_map(|instruction| match instruction {
        DecodedInstruction::SystemTransfer { from, to, .. } => {
            let matches = match change.direction {
                Direction::Out => from == subject,
                Direction::In => to == subject,
            };
            matches.then_some((*from, *to))
        }
        _ => None,
    });

    if let Some((from, to)) = transfer {
        change.from = Some(from);
        change.to = Some(to);
    }
}

fn token_change(
    registry: &ProgramRegistry,
    diff: &TokenBalanceDiff,
    decoded: &[DecodedInstruction],
    program_used: &Pubkey,
) -> TokenChange {
    let mut change = TokenChange {
        mint: diff.mint,
        amount: diff.amount,
        decimals: None,
        direction: diff.direction,
        from_account: None,
        to_account: None,
        program_used: registry.lookup(program_used),
    };

    for instruction in decoded {
        let (source, dest, decimals) = match instruction {
            DecodedInstruction::TokenTransfer { source_account, dest_account, .. } => {
                (source_account, dest_account, None)
            }
            DecodedInstruction::TokenTransferChecked { source_account, dest_account, mint, decimals, .. } => {
                (source_account, dest_account, (*mint == diff.mint).then_some(*decimals))
            }
            _ => continue,
        };

        let matches = match diff.direction {
            Direction::Out => *source == diff.token_account,
            Direction::In => *dest == diff.token_account,
        };
        if matches {
            change.from_account = Some(*source);
            change.to_account = Some(*dest);
            change.decimals = change.decimals.or(decimals);
            break;
        }
    }
    change
}
