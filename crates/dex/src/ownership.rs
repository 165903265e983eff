//! Transferable order ownership tokens.
//!
//! Each resting order has exactly one token, keyed by its id. Holding the
//! token, not having submitted the order, is what authorizes cancellation.

use crate::error::{DexError, Result};
use crate::order::OrderId;
use crate::types::Address;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderOwnership {
    holders: HashMap<OrderId, Address>,
    held: HashMap<Address, BTreeSet<OrderId>>,
}

impl OrderOwnership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&mut self, to: Address, id: OrderId) -> Result<()> {
        if self.holders.contains_key(&id) {
            return Err(DexError::AlreadyExists("order token"));
        }
        self.holders.insert(id, to);
        self.held.entry(to).or_default().insert(id);
        Ok(())
    }

    /// Move the token for `id` from `from` to `to`.
    pub fn transfer(&mut self, from: Address, to: Address, id: OrderId) -> Result<()> {
        let holder = self.holder_of(id)?;
        if holder != from {
            return Err(DexError::Unauthorized(format!("{from} does not hold order {id}")));
        }
        self.detach(from, id);
        self.holders.insert(id, to);
        self.held.entry(to).or_default().insert(id);
        Ok(())
    }

    /// Destroy the token for `id`. Burning an absent token is a no-op.
    pub fn burn(&mut self, id: OrderId) {
        if let Some(holder) = self.holders.remove(&id) {
            self.detach(holder, id);
        }
    }

    pub fn holder_of(&self, id: OrderId) -> Result<Address> {
        self.holders
            .get(&id)
            .copied()
            .ok_or_else(|| DexError::NotFound(format!("order token {id}")))
    }

    /// Ids of the live orders held by `holder`, ascending.
    pub fn orders_of(&self, holder: Address) -> Vec<OrderId> {
        self.held
            .get(&holder)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    fn detach(&mut self, holder: Address, id: OrderId) {
        if let Some(ids) = self.held.get_mut(&holder) {
            ids.remove(&id);
            if ids.is_empty() {
                self.held.remove(&holder);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::repeat_byte(0xA1)
    }

    fn bob() -> Address {
        Address::repeat_byte(0xB0)
    }

    #[test]
    fn test_mint_transfer_burn() {
        let mut tokens = OrderOwnership::new();
        tokens.mint(alice(), OrderId(1)).unwrap();
        tokens.mint(alice(), OrderId(2)).unwrap();
        assert_eq!(tokens.orders_of(alice()), vec![OrderId(1), OrderId(2)]);

        tokens.transfer(alice(), bob(), OrderId(1)).unwrap();
        assert_eq!(tokens.holder_of(OrderId(1)).unwrap(), bob());
        assert_eq!(tokens.orders_of(alice()), vec![OrderId(2)]);

        tokens.burn(OrderId(1));
        assert!(tokens.orders_of(bob()).is_empty());
        assert!(matches!(tokens.holder_of(OrderId(1)), Err(DexError::NotFound(_))));
    }

    #[test]
    fn test_transfer_requires_holder() {
        let mut tokens = OrderOwnership::new();
        tokens.mint(alice(), OrderId(1)).unwrap();

        let err = tokens.transfer(bob(), bob(), OrderId(1)).unwrap_err();
        assert!(matches!(err, DexError::Unauthorized(_)));
        assert_eq!(tokens.mint(bob(), OrderId(1)), Err(DexError::AlreadyExists("order token")));
    }
}
