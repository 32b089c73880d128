//! 程序注册表
//!
//! 已知程序 ID → 语义名称的只读映射。查询是全函数：
//! 未注册的程序返回由 ID 前缀合成的名称，不会报错

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::constants::programs::*;

/// 未知程序标签中保留的 ID 前缀长度
pub const UNKNOWN_PROGRAM_PREFIX_LEN: usize = 8;

/// 已知程序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownProgram {
    System,
    SplToken,
    Token2022,
    AssociatedToken,
    ComputeBudget,
    Memo,
    JupiterV6,
    RaydiumAmmV4,
    RaydiumCpmm,
    RaydiumClmm,
    OrcaWhirlpool,
    MeteoraDlmm,
    PumpFun,
    PumpSwap,
}

impl KnownProgram {
    pub const ALL: [KnownProgram; 14] = [
        KnownProgram::System,
        KnownProgram::SplToken,
        KnownProgram::Token2022,
        KnownProgram::AssociatedToken,
        KnownProgram::ComputeBudget,
        KnownProgram::Memo,
        KnownProgram::JupiterV6,
        KnownProgram::RaydiumAmmV4,
        KnownProgram::RaydiumCpmm,
        KnownProgram::RaydiumClmm,
        KnownProgram::OrcaWhirlpool,
        KnownProgram::MeteoraDlmm,
        KnownProgram::PumpFun,
        KnownProgram::PumpSwap,
    ];

    /// 获取程序ID
    pub fn program_id(&self) -> Pubkey {
        match self {
            KnownProgram::System => SYSTEM_PROGRAM_ID,
            KnownProgram::SplToken => TOKEN_PROGRAM_ID,
            KnownProgram::Token2022 => TOKEN_2022_PROGRAM_ID,
            KnownProgram::AssociatedToken => ASSOCIATED_TOKEN_PROGRAM_ID,
            KnownProgram::ComputeBudget => COMPUTE_BUDGET_PROGRAM_ID,
            KnownProgram::Memo => MEMO_PROGRAM_ID,
            KnownProgram::JupiterV6 => JUPITER_V6_PROGRAM_ID,
            KnownProgram::RaydiumAmmV4 => RAYDIUM_AMM_V4_PROGRAM_ID,
            KnownProgram::RaydiumCpmm => RAYDIUM_CPMM_PROGRAM_ID,
            KnownProgram::RaydiumClmm => RAYDIUM_CLMM_PROGRAM_ID,
            KnownProgram::OrcaWhirlpool => ORCA_WHIRLPOOL_PROGRAM_ID,
            KnownProgram::MeteoraDlmm => METEORA_DLMM_PROGRAM_ID,
            KnownProgram::PumpFun => PUMPFUN_PROGRAM_ID,
            KnownProgram::PumpSwap => PUMPSWAP_PROGRAM_ID,
        }
    }

    /// 获取程序名称
    pub fn name(&self) -> &'static str {
        match self {
            KnownProgram::System => "System Program",
            KnownProgram::SplToken => "SPL Token",
            KnownProgram::Token2022 => "SPL Token-2022",
            KnownProgram::AssociatedToken => "Associated Token Account",
            KnownProgram::ComputeBudget => "Compute Budget",
            KnownProgram::Memo => "Memo",
            KnownProgram::JupiterV6 => "Jupiter",
            KnownProgram::RaydiumAmmV4 => "Raydium AMM V4",
            KnownProgram::RaydiumCpmm => "Raydium CPMM",
            KnownProgram::RaydiumClmm => "Raydium CLMM",
            KnownProgram::OrcaWhirlpool => "Orca Whirlpool",
            KnownProgram::MeteoraDlmm => "Meteora DLMM",
            KnownProgram::PumpFun => "Pump.fun",
            KnownProgram::PumpSwap => "PumpSwap",
        }
    }

    /// 是否是 DEX / 聚合器
    pub fn is_dex(&self) -> bool {
        matches!(
            self,
            KnownProgram::JupiterV6
                | KnownProgram::RaydiumAmmV4
                | KnownProgram::RaydiumCpmm
                | KnownProgram::RaydiumClmm
                | KnownProgram::OrcaWhirlpool
                | KnownProgram::MeteoraDlmm
                | KnownProgram::PumpFun
                | KnownProgram::PumpSwap
        )
    }

    /// 从程序ID解析
    pub fn from_program_id(program_id: &Pubkey) -> Option<Self> {
        Self::ALL.into_iter().find(|program| program.program_id() == *program_id)
    }

    /// 从名称解析（`name()` 的逆操作）
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|program| program.name() == name)
    }
}

impl fmt::Display for KnownProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 程序语义名称
///
/// 序列化为字符串：已知程序为其名称，未知程序为 `Unknown Program: <前缀>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProgramName {
    Known(KnownProgram),
    Unknown(String),
}

impl ProgramName {
    /// 为未注册的程序合成名称
    pub fn unknown(program_id: &Pubkey) -> Self {
        let id = program_id.to_string();
        let prefix: String = id.chars().take(UNKNOWN_PROGRAM_PREFIX_LEN).collect();
        ProgramName::Unknown(format!("Unknown Program: {}", prefix))
    }

    pub fn known(&self) -> Option<KnownProgram> {
        match self {
            ProgramName::Known(program) => Some(*program),
            ProgramName::Unknown(_) => None,
        }
    }

    pub fn is_dex(&self) -> bool {
        self.known().is_some_and(|program| program.is_dex())
    }

    pub fn label(&self) -> &str {
        match self {
            ProgramName::Known(program) => program.name(),
            ProgramName::Unknown(label) => label,
        }
    }
}

impl fmt::Display for ProgramName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<ProgramName> for String {
    fn from(name: ProgramName) -> Self {
        name.label().to_string()
    }
}

impl From<String> for ProgramName {
    fn from(label: String) -> Self {
        match KnownProgram::from_name(&label) {
            Some(program) => ProgramName::Known(program),
            None => ProgramName::Unknown(label),
        }
    }
}

static SHARED_REGISTRY: Lazy<Arc<ProgramRegistry>> = Lazy::new(|| Arc::new(ProgramRegistry::new()));

/// 程序注册表
///
/// 进程内构建一次后只读，通过引用（`Arc`）传给分析器
#[derive(Debug, Clone)]
pub struct ProgramRegistry {
    programs: HashMap<Pubkey, KnownProgram>,
}

impl Default for ProgramRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramRegistry {
    pub fn new() -> Self {
        let mut registry = Self { programs: HashMap::with_capacity(KnownProgram::ALL.len()) };
        for program in KnownProgram::ALL {
            registry.register(program);
        }
        registry
    }

    /// 进程级共享实例
    pub fn shared() -> Arc<ProgramRegistry> {
        Arc::clone(&SHARED_REGISTRY)
    }

    fn register(&mut self, program: KnownProgram) {
        self.programs.insert(program.program_id(), program);
    }

    /// 查询程序名称，未注册时合成 `Unknown Program: <前缀>`
    pub fn lookup(&self, program_id: &Pubkey) -> ProgramName {
        match self.known(program_id) {
            Some(program) => ProgramName::Known(program),
            None => ProgramName::unknown(program_id),
        }
    }

    pub fn known(&self, program_id: &Pubkey) -> Option<KnownProgram> {
        self.programs.get(program_id).copied()
    }

    pub fn is_dex(&self, program_id: &Pubkey) -> bool {
        self.known(program_id).is_some_and(|program| program.is_dex())
    }

    /// DEX / 聚合器程序ID集合
    pub fn dex_programs(&self) -> Vec<Pubkey> {
        KnownProgram::ALL
            .into_iter()
            .filter(|program| program.is_dex() && self.programs.contains_key(&program.program_id()))
            .map(|program| program.program_id())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
