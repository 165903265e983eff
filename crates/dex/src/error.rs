//! Error taxonomy for the engine.

use crate::ledger::LedgerError;
use crate::order::OrderId;
use crate::types::Timestamp;

pub type Result<T, E = DexError> = std::result::Result<T, E>;

/// Closed set of failure kinds surfaced to callers alongside the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    Expired,
    SlippageExceeded,
    InsufficientLiquidity,
    AlreadyExists,
    AlreadyFilled,
    NotFound,
    FunctionNotFound,
    InvariantViolation,
    InvalidInput,
    TransferFailed,
}

/// Errors that can occur in the engine.
///
/// Every error aborts the whole operation; the caller sees no partial state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DexError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("expired: deadline {deadline} passed at {now}")]
    Expired { deadline: Timestamp, now: Timestamp },

    #[error("slippage exceeded: {0}")]
    SlippageExceeded(String),

    #[error("insufficient liquidity")]
    InsufficientLiquidity,

    #[error("{0} already exists")]
    AlreadyExists(&'static str),

    #[error("order {0} already filled")]
    AlreadyFilled(OrderId),

    #[error("{0} not found")]
    NotFound(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("identical tokens")]
    IdenticalTokens,

    #[error("invalid amount")]
    InvalidAmount,

    #[error("invalid price")]
    InvalidPrice,

    #[error("invalid attached value: {0}")]
    InvalidValue(String),

    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("transfer failed: {0}")]
    TransferFailed(#[from] LedgerError),
}

impl DexError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DexError::Unauthorized(_) => ErrorKind::Unauthorized,
            DexError::Expired { .. } => ErrorKind::Expired,
            DexError::SlippageExceeded(_) => ErrorKind::SlippageExceeded,
            DexError::InsufficientLiquidity => ErrorKind::InsufficientLiquidity,
            DexError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            DexError::AlreadyFilled(_) => ErrorKind::AlreadyFilled,
            DexError::NotFound(_) => ErrorKind::NotFound,
            DexError::InvariantViolation(_) | DexError::Overflow(_) => {
                ErrorKind::InvariantViolation
            }
            DexError::InvalidPath(_)
            | DexError::IdenticalTokens
            | DexError::InvalidAmount
            | DexError::InvalidPrice
            | DexError::InvalidValue(_) => ErrorKind::InvalidInput,
            DexError::TransferFailed(_) => ErrorKind::TransferFailed,
        }
    }
}
