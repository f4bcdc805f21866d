//! Database pool and schema bootstrap

pub mod init;

pub use init::*;

use crate::Result;

/// Encode a list column as JSON text
pub fn encode_list(values: &[String]) -> Result<String> {
    Ok(serde_json::to_string(values)?)
}

/// Decode a list column stored as JSON text
pub fn decode_list(raw: &str) -> Result<Vec<String>> {
    Ok(serde_json::from_str(raw)?)
}
