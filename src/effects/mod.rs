//! 交易效果分析
//!
//! 余额差分、效果合并与兑换识别

pub mod analyzer;
pub mod balance_diff;
pub mod swap_detector;
pub mod types;

pub use analyzer::{AnalyzeError, SnapshotPair, TransactionEffectsAnalyzer, build_effects};
pub use balance_diff::{TokenBalanceDiff, diff_sol, diff_token};
pub use swap_detector::detect;
pub use types::{Direction, SolChange, SwapInfo, TokenChange, TransactionEffects};
