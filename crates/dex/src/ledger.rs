//! Token ledger capability.
//!
//! The engine never owns token balances. Every movement goes through a
//! [`TokenLedger`], which in production is backed by the host's token
//! contracts and in tests by [`MemoryLedger`].

use crate::types::{Address, Amount, TokenId, U256};
use std::collections::HashMap;

/// Errors reported by a token ledger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("unknown token {0}")]
    UnknownToken(TokenId),

    #[error("insufficient balance of {token} for {holder}: have {available}, need {required}")]
    InsufficientBalance {
        token: TokenId,
        holder: Address,
        available: Amount,
        required: Amount,
    },

    #[error("insufficient allowance of {token} from {owner} to {spender}: have {available}, need {required}")]
    InsufficientAllowance {
        token: TokenId,
        owner: Address,
        spender: Address,
        available: Amount,
        required: Amount,
    },

    #[error("balance overflow for {0}")]
    Overflow(TokenId),
}

/// Fungible-token operations the engine depends on.
///
/// Settlement calls into the ledger while the caller holds the router's state
/// and ledger locks, so implementations must not call back into the router.
pub trait TokenLedger: Send + Sync {
    fn balance_of(&self, token: TokenId, holder: Address) -> Amount;

    fn allowance(&self, token: TokenId, owner: Address, spender: Address) -> Amount;

    fn approve(
        &mut self,
        token: TokenId,
        owner: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    fn transfer(
        &mut self,
        token: TokenId,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming allowance.
    fn transfer_from(
        &mut self,
        token: TokenId,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    fn decimals(&self, token: TokenId) -> Result<u8, LedgerError>;

    fn symbol(&self, token: TokenId) -> Result<String, LedgerError>;
}

#[derive(Debug, Clone, Default)]
struct TokenAccount {
    symbol: String,
    decimals: u8,
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
}

/// In-memory ledger holding any number of tokens.
///
/// An allowance of `U256::MAX` is treated as infinite and never decremented.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    tokens: HashMap<TokenId, TokenAccount>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_token(&mut self, token: TokenId, symbol: impl Into<String>, decimals: u8) {
        self.tokens.insert(
            token,
            TokenAccount {
                symbol: symbol.into(),
                decimals,
                ..Default::default()
            },
        );
    }

    pub fn mint(&mut self, token: TokenId, to: Address, amount: Amount) -> Result<(), LedgerError> {
        let account = self.account_mut(token)?;
        let balance = account.balances.entry(to).or_default();
        *balance = balance.checked_add(amount).ok_or(LedgerError::Overflow(token))?;
        Ok(())
    }

    fn account(&self, token: TokenId) -> Result<&TokenAccount, LedgerError> {
        self.tokens.get(&token).ok_or(LedgerError::UnknownToken(token))
    }

    fn account_mut(&mut self, token: TokenId) -> Result<&mut TokenAccount, LedgerError> {
        self.tokens.get_mut(&token).ok_or(LedgerError::UnknownToken(token))
    }
}

impl TokenLedger for MemoryLedger {
    fn balance_of(&self, token: TokenId, holder: Address) -> Amount {
        self.account(token)
            .ok()
            .and_then(|account| account.balances.get(&holder).copied())
            .unwrap_or_default()
    }

    fn allowance(&self, token: TokenId, owner: Address, spender: Address) -> Amount {
        self.account(token)
            .ok()
            .and_then(|account| account.allowances.get(&(owner, spender)).copied())
            .unwrap_or_default()
    }

    fn approve(
        &mut self,
        token: TokenId,
        owner: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.account_mut(token)?.allowances.insert((owner, spender), amount);
        Ok(())
    }

    fn transfer(
        &mut self,
        token: TokenId,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let account = self.account_mut(token)?;
        let available = account.balances.get(&from).copied().unwrap_or_default();
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                token,
                holder: from,
                available,
                required: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let to_balance = account.balances.get(&to).copied().unwrap_or_default();
        let credited = to_balance.checked_add(amount).ok_or(LedgerError::Overflow(token))?;
        account.balances.insert(from, available - amount);
        account.balances.insert(to, credited);
        Ok(())
    }

    fn transfer_from(
        &mut self,
        token: TokenId,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let available = self.allowance(token, from, spender);
        if available < amount {
            return Err(LedgerError::InsufficientAllowance {
                token,
                owner: from,
                spender,
                available,
                required: amount,
            });
        }
        self.transfer(token, from, to, amount)?;
        if available != U256::MAX {
            self.account_mut(token)?
                .allowances
                .insert((from, spender), available - amount);
        }
        Ok(())
    }

    fn decimals(&self, token: TokenId) -> Result<u8, LedgerError> {
        Ok(self.account(token)?.decimals)
    }

    fn symbol(&self, token: TokenId) -> Result<String, LedgerError> {
        Ok(self.account(token)?.symbol.clone())
    }
}
