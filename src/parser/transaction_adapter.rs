//! 交易适配器 - 统一的交易数据访问层
//!
//! 把 legacy / V0 消息规整成按顺序排列的 `InstructionInfo` 列表，
//! 账户索引在这里一次性解析成公钥

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use solana_address_lookup_table_interface::state::AddressLookupTable;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::v0::MessageAddressTableLookup;
use solana_sdk::message::{Message, VersionedMessage};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use tracing::debug;

/// 交易适配器错误
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("交易不包含任何指令")]
    EmptyInstructions,
    #[error("指令 {instruction} 引用了不存在的账户索引 {index} (共 {available} 个账户)")]
    AccountIndexOutOfRange { instruction: usize, index: usize, available: usize },
    #[error("交易使用了地址查找表，需要提供 {expected} 个查找表地址，实际 {actual} 个")]
    LookupAddressesMismatch { expected: usize, actual: usize },
    #[error("交易字节解码失败: {0}")]
    WireDecode(String),
    #[error("地址查找表解析失败: {0}")]
    LookupTable(String),
}

/// 地址查找表解析出的账户
///
/// 顺序与运行时一致：先 writable，后 readonly
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupAddresses {
    pub writable: Vec<Pubkey>,
    pub readonly: Vec<Pubkey>,
}

impl LookupAddresses {
    pub fn len(&self) -> usize {
        self.writable.len() + self.readonly.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 按交易里的查找表引用展开地址
    ///
    /// `table_data` 返回查找表账户的原始数据。所有表的 writable 地址在前，
    /// readonly 地址在后，与运行时加载顺序一致
    pub fn from_tables<'a>(
        lookups: &[MessageAddressTableLookup],
        table_data: impl Fn(&Pubkey) -> Option<&'a [u8]>,
    ) -> Result<Self, AdapterError> {
        let mut resolved = Self::default();
        for lookup in lookups {
            let table_key = lookup.account_key;
            let data = table_data(&table_key)
                .ok_or_else(|| AdapterError::LookupTable(format!("查找表 {} 不存在", table_key)))?;
            let table = AddressLookupTable::deserialize(data)
                .map_err(|e| AdapterError::LookupTable(format!("查找表 {} 数据无效: {:?}", table_key, e)))?;

            let select = |indexes: &[u8]| -> Result<Vec<Pubkey>, AdapterError> {
                indexes
                    .iter()
                    .map(|index| {
                        table.addresses.get(*index as usize).copied().ok_or_else(|| {
                            AdapterError::LookupTable(format!("查找表 {} 没有索引 {}", table_key, index))
                        })
                    })
                    .collect()
            };
            resolved.writable.extend(select(&lookup.writable_indexes)?);
            resolved.readonly.extend(select(&lookup.readonly_indexes)?);
        }
        Ok(resolved)
    }
}

fn first_signature(tx: &VersionedTransaction) -> String {
    tx.signatures
        .first()
        .filter(|sig| **sig != Signature::default())
        .map(|sig| sig.to_string())
        .unwrap_or_default()
}

/// 指令信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionInfo {
    /// 程序ID
    pub program_id: Pubkey,
    /// 账户列表
    pub accounts: Vec<Pubkey>,
    /// 指令数据
    pub data: Vec<u8>,
    /// 指令索引
    pub index: usize,
}

/// 交易适配器
#[derive(Debug, Clone)]
pub struct TransactionAdapter {
    /// 交易签名（未签名交易为空字符串）
    pub signature: String,
    /// 手续费支付者
    pub fee_payer: Option<Pubkey>,
    /// 账户公钥列表（静态账户 + 查找表账户）
    pub account_keys: Vec<Pubkey>,
    /// 指令列表
    pub instructions: Vec<InstructionInfo>,
}

impl TransactionAdapter {
    /// 从 VersionedTransaction 创建适配器
    ///
    /// V0 交易如果引用了地址查找表，需要同时传入解析后的查找表地址
    pub fn from_versioned_transaction(
        tx: &VersionedTransaction,
        lookups: Option<&LookupAddresses>,
    ) -> Result<Self, AdapterError> {
        let mut adapter = Self::from_message(&tx.message, lookups)?;
        adapter.signature = first_signature(tx);
        Ok(adapter)
    }

    /// 只用静态账户规整交易（查找表无法解析时）
    ///
    /// 指令的账户列表截断在第一个查找表账户之前，程序 ID 必须是静态账户
    pub fn from_static_keys(tx: &VersionedTransaction) -> Result<Self, AdapterError> {
        let account_keys = tx.message.static_account_keys().to_vec();
        let mut adapter = Self::build(&tx.message, account_keys, true)?;
        adapter.signature = first_signature(tx);
        Ok(adapter)
    }

    /// 从消息创建适配器
    pub fn from_message(
        message: &VersionedMessage,
        lookups: Option<&LookupAddresses>,
    ) -> Result<Self, AdapterError> {
        let mut account_keys = message.static_account_keys().to_vec();

        let expected_lookups: usize = message
            .address_table_lookups()
            .map(|tables| {
                tables
                    .iter()
                    .map(|table| table.writable_indexes.len() + table.readonly_indexes.len())
                    .sum()
            })
            .unwrap_or(0);
        let provided_lookups = lookups.map_or(0, LookupAddresses::len);
        if provided_lookups != expected_lookups {
            return Err(AdapterError::LookupAddressesMismatch {
                expected: expected_lookups,
                actual: provided_lookups,
            });
        }
        if let Some(lookups) = lookups {
            account_keys.extend_from_slice(&lookups.writable);
            account_keys.extend_from_slice(&lookups.readonly);
        }

        Self::build(message, account_keys, false)
    }

    fn build(
        message: &VersionedMessage,
        account_keys: Vec<Pubkey>,
        truncate_unresolved: bool,
    ) -> Result<Self, AdapterError> {
        let compiled = message.instructions();
        if compiled.is_empty() {
            return Err(AdapterError::EmptyInstructions);
        }

        let resolve = |instruction: usize, index: u8| -> Result<Pubkey, AdapterError> {
            account_keys.get(index as usize).copied().ok_or(AdapterError::AccountIndexOutOfRange {
                instruction,
                index: index as usize,
                available: account_keys.len(),
            })
        };

        let mut instructions = Vec::with_capacity(compiled.len());
        for (idx, ix) in compiled.iter().enumerate() {
            let program_id = resolve(idx, ix.program_id_index)?;
            let mut accounts = Vec::with_capacity(ix.accounts.len());
            for account_index in &ix.accounts {
                match resolve(idx, *account_index) {
                    Ok(account) => accounts.push(account),
                    Err(_) if truncate_unresolved => break,
                    Err(err) => return Err(err),
                }
            }

            instructions.push(InstructionInfo { program_id, accounts, data: ix.data.clone(), index: idx });
        }

        debug!("交易规整完成: {} 个账户, {} 条指令", account_keys.len(), instructions.len());

        Ok(Self {
            signature: String::new(),
            fee_payer: account_keys.first().copied(),
            account_keys,
            instructions,
        })
    }

    /// 从未编译的指令列表创建适配器（离线分析用）
    pub fn from_instructions(
        instructions: &[Instruction],
        payer: Option<&Pubkey>,
    ) -> Result<Self, AdapterError> {
        let message = Message::new(instructions, payer);
        Self::from_message(&VersionedMessage::Legacy(message), None)
    }

    /// 解码 base64 编码的交易字节（钱包签名后返回的格式）
    pub fn decode_wire_base64(encoded: &str) -> Result<VersionedTransaction, AdapterError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AdapterError::WireDecode(format!("base64: {}", e)))?;
        Self::decode_wire_bytes(&bytes)
    }

    /// 解码 base58 编码的交易字节
    pub fn decode_wire_base58(encoded: &str) -> Result<VersionedTransaction, AdapterError> {
        let bytes = bs58::decode(encoded.trim())
            .into_vec()
            .map_err(|e| AdapterError::WireDecode(format!("base58: {}", e)))?;
        Self::decode_wire_bytes(&bytes)
    }

    /// 解码 bincode 序列化的交易字节
    pub fn decode_wire_bytes(bytes: &[u8]) -> Result<VersionedTransaction, AdapterError> {
        bincode::deserialize::<VersionedTransaction>(bytes)
            .map_err(|e| AdapterError::WireDecode(format!("bincode: {}", e)))
    }

    /// 按程序筛选指令
    pub fn get_instructions_by_program(&self, program_id: &Pubkey) -> Vec<&InstructionInfo> {
        self.instructions.iter().filter(|ix| ix.program_id == *program_id).collect()
    }

    /// 交易中出现的所有程序（去重，保持首次出现顺序）
    pub fn program_ids(&self) -> Vec<Pubkey> {
        let mut programs: Vec<Pubkey> = Vec::new();
        for ix in &self.instructions {
            if !programs.contains(&ix.program_id) {
                programs.push(ix.program_id);
            }
        }
        programs
    }
}
