//! Deferred token movements.
//!
//! Engine operations never touch the ledger directly. They record the
//! transfers they need in a [`Settlement`], which is executed once the engine
//! state is fully updated. Execution produces a [`Journal`] that can undo
//! every movement if a later check fails.

use crate::error::Result;
use crate::ledger::TokenLedger;
use crate::types::{Address, Amount, TokenId};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// How a transfer reaches or leaves custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Pulled from the payer using the allowance granted to custody.
    Pull,
    /// Native value attached to the call, credited as wrapped native token.
    Value,
    /// Paid out of custody.
    Push,
}

/// A single token movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransfer {
    pub kind: TransferKind,
    pub token: TokenId,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
}

/// Transfers recorded by one operation, in the order they were requested.
#[derive(Debug, Clone)]
pub struct Settlement {
    custody: Address,
    transfers: Vec<TokenTransfer>,
}

impl Settlement {
    pub fn new(custody: Address) -> Self {
        Self {
            custody,
            transfers: Vec::new(),
        }
    }

    pub fn custody(&self) -> Address {
        self.custody
    }

    /// Record a pull of `amount` of `token` from `from` into custody.
    pub fn pull(&mut self, token: TokenId, from: Address, amount: Amount) {
        self.record(TransferKind::Pull, token, from, self.custody, amount);
    }

    /// Record attached native value sent by `from`.
    pub fn attach_value(&mut self, token: TokenId, from: Address, amount: Amount) {
        self.record(TransferKind::Value, token, from, self.custody, amount);
    }

    /// Record a payout of `amount` of `token` from custody to `to`.
    pub fn push(&mut self, token: TokenId, to: Address, amount: Amount) {
        self.record(TransferKind::Push, token, self.custody, to, amount);
    }

    fn record(&mut self, kind: TransferKind, token: TokenId, from: Address, to: Address, amount: Amount) {
        if amount.is_zero() {
            return;
        }
        self.transfers.push(TokenTransfer {
            kind,
            token,
            from,
            to,
            amount,
        });
    }

    pub fn transfers(&self) -> &[TokenTransfer] {
        &self.transfers
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Every token this settlement moves.
    pub fn tokens(&self) -> BTreeSet<TokenId> {
        self.transfers.iter().map(|t| t.token).collect()
    }

    /// Execute against `ledger`: all inflows first, then payouts.
    ///
    /// On failure every transfer already applied is reverted before the
    /// error is returned.
    pub fn execute(&self, ledger: &mut dyn TokenLedger) -> Result<Journal> {
        let mut journal = Journal::default();
        let inflows = self.transfers.iter().filter(|t| t.kind != TransferKind::Push);
        let outflows = self.transfers.iter().filter(|t| t.kind == TransferKind::Push);

        for transfer in inflows.chain(outflows) {
            if let Err(err) = journal.apply(ledger, self.custody, transfer) {
                journal.revert(ledger);
                return Err(err.into());
            }
        }
        debug!(transfers = journal.len(), "settlement executed");
        Ok(journal)
    }
}

#[derive(Debug, Clone)]
struct JournalEntry {
    transfer: TokenTransfer,
    prior_allowance: Option<Amount>,
}

/// Record of executed transfers.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    fn apply(
        &mut self,
        ledger: &mut dyn TokenLedger,
        custody: Address,
        transfer: &TokenTransfer,
    ) -> std::result::Result<(), crate::ledger::LedgerError> {
        let prior_allowance = match transfer.kind {
            TransferKind::Pull => {
                let prior = ledger.allowance(transfer.token, transfer.from, custody);
                ledger.transfer_from(
                    transfer.token,
                    custody,
                    transfer.from,
                    transfer.to,
                    transfer.amount,
                )?;
                Some(prior)
            }
            TransferKind::Value | TransferKind::Push => {
                ledger.transfer(transfer.token, transfer.from, transfer.to, transfer.amount)?;
                None
            }
        };
        self.entries.push(JournalEntry {
            transfer: transfer.clone(),
            prior_allowance,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Undo every recorded transfer, newest first.
    pub fn revert(self, ledger: &mut dyn TokenLedger) {
        for entry in self.entries.into_iter().rev() {
            let t = &entry.transfer;
            if let Err(err) = ledger.transfer(t.token, t.to, t.from, t.amount) {
                warn!(token = %t.token, from = %t.to, to = %t.from, %err, "failed to revert transfer");
            }
            if let Some(prior) = entry.prior_allowance {
                if let Err(err) = ledger.approve(t.token, t.from, t.to, prior) {
                    warn!(token = %t.token, owner = %t.from, %err, "failed to restore allowance");
                }
            }
        }
    }
}
