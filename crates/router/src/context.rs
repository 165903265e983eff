//! Per-call context handed to logic modules.

use alloy::primitives::{Address, Bytes, Log, U256};
use alloy::sol_types::SolEvent;
use dex::types::ensure_deadline;
use dex::{DexError, PoolManager, Settlement, Timestamp, TokenLedger};

/// Identity, attached value and host time of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    /// Native value attached to the call.
    pub value: U256,
    /// Current host time, compared against call deadlines.
    pub timestamp: Timestamp,
}

impl CallContext {
    pub fn new(caller: Address, timestamp: Timestamp) -> Self {
        Self {
            caller,
            value: U256::ZERO,
            timestamp,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Fail once the host time is past `deadline`. Deadlines beyond the
    /// timestamp range never expire.
    pub fn ensure_deadline(&self, deadline: U256) -> Result<(), DexError> {
        ensure_deadline(deadline.saturating_to::<Timestamp>(), self.timestamp)
    }
}

/// ABI-encoded return data and the logs emitted by a call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOutput {
    pub data: Bytes,
    pub logs: Vec<Log>,
}

/// Read-only view of the facade storage.
pub struct ViewContext<'a> {
    pub call: &'a CallContext,
    pub state: &'a PoolManager,
    pub ledger: &'a dyn TokenLedger,
}

/// Mutable access to a draft of the facade storage.
///
/// Token movements go into `settlement`; the facade applies them to the
/// ledger only after the module returns.
pub struct ExecContext<'a> {
    pub call: &'a CallContext,
    pub router: Address,
    pub state: &'a mut PoolManager,
    pub ledger: &'a dyn TokenLedger,
    pub settlement: &'a mut Settlement,
    pub(crate) logs: Vec<Log>,
}

impl<'a> ExecContext<'a> {
    pub fn new(
        call: &'a CallContext,
        router: Address,
        state: &'a mut PoolManager,
        ledger: &'a dyn TokenLedger,
        settlement: &'a mut Settlement,
    ) -> Self {
        Self {
            call,
            router,
            state,
            ledger,
            settlement,
            logs: Vec::new(),
        }
    }

    pub fn caller(&self) -> Address {
        self.call.caller
    }

    pub fn value(&self) -> U256 {
        self.call.value
    }

    /// Wrapped native token standing in for attached value.
    pub fn weth(&self) -> Address {
        self.state.config().weth()
    }

    pub fn ensure_deadline(&self, deadline: U256) -> Result<(), DexError> {
        self.call.ensure_deadline(deadline)
    }

    /// Record `event` as emitted by the router.
    pub fn emit<E: SolEvent>(&mut self, event: &E) {
        self.logs.push(Log {
            address: self.router,
            data: event.encode_log_data(),
        });
    }

    pub fn logs(&self) -> &[Log] {
        &self.logs
    }
}
