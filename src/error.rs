//! Error types for the A5/2 cipher.

use thiserror::Error;

/// Errors produced by A5/2 key setup.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum A52Error {
    /// Key material was not exactly 64 bits long.
    #[error("Invalid key length: expected 8 bytes, got {0}")]
    InvalidKeyLength(usize),
}
