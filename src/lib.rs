pub mod common;
pub mod constants;
pub mod effects;
pub mod parser;
pub mod simulation;

pub use common::AnalyzerConfig;
pub use effects::{
    AnalyzeError, Direction, SolChange, SwapInfo, TokenChange, TransactionEffects,
    TransactionEffectsAnalyzer,
};
pub use parser::{DecodedInstruction, KnownProgram, LookupAddresses, ProgramName, ProgramRegistry};
pub use simulation::{
    AccountSnapshot, MockSimulationClient, RpcSimulationClient, SimulationClient, SimulationError,
};
