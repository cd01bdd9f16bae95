//! SFDP (Serial Flash Discoverable Parameters) decoding
//!
//! The chip is read through [`crate::protocol::w25q::read_sfdp`]; this module
//! only interprets the bytes.

mod parser;
mod types;

pub use parser::parse;
pub use types::*;
