pub mod binary_reader;

pub use binary_reader::{BinaryReader, ReadError};
