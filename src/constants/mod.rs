pub mod programs;
pub mod tokens;

pub use programs::*;
pub use tokens::*;
