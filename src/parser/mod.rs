//! Solana 交易指令解析模块

pub mod types;
pub mod registry;
pub mod decoder;
pub mod transaction_adapter;
pub mod layouts;
pub mod utils;
pub mod constants;

pub use types::DecodedInstruction;
pub use registry::{KnownProgram, ProgramName, ProgramRegistry};
pub use decoder::{decode, decode_instructions};
pub use transaction_adapter::{AdapterError, InstructionInfo, LookupAddresses, TransactionAdapter};
pub use layouts::{TokenAccountLayout, TOKEN_ACCOUNT_LEN};
pub use utils::BinaryReader;
