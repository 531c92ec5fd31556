#![forbid(unsafe_code)]
#![doc = "Common error types, protocol versions and algorithm identifiers for tlsrec."]

pub mod algorithm;
pub mod error;

pub use algorithm::*;
pub use error::*;
