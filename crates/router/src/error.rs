//! Facade errors.

use dex::{DexError, ErrorKind};

/// Errors that can occur while dispatching a call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    #[error(transparent)]
    Dex(#[from] DexError),

    #[error("function not found: 0x{}", hex::encode(.0))]
    FunctionNotFound([u8; 4]),

    #[error("invalid calldata: {0}")]
    InvalidCalldata(String),
}

impl RouterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RouterError::Dex(err) => err.kind(),
            RouterError::FunctionNotFound(_) => ErrorKind::FunctionNotFound,
            RouterError::InvalidCalldata(_) => ErrorKind::InvalidInput,
        }
    }
}
