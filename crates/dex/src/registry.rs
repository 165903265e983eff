//! Deterministic per-pair registries.
//!
//! Both the pair registry and the order-book registry derive a child address
//! from the unordered token pair, so the address can be computed before the
//! child exists and is identical for `(A, B)` and `(B, A)`.

use crate::error::{DexError, Result};
use crate::pair::pair_salt;
use crate::types::{Address, TokenId, B256};
use alloy::primitives::keccak256;
use std::collections::HashMap;

/// CREATE2 address: `keccak256(0xff ++ deployer ++ salt ++ code_hash)[12..]`.
pub fn derive_address(deployer: Address, salt: B256, code_hash: B256) -> Address {
    let mut data = [0u8; 85];
    data[0] = 0xff;
    data[1..21].copy_from_slice(deployer.as_slice());
    data[21..53].copy_from_slice(salt.as_slice());
    data[53..].copy_from_slice(code_hash.as_slice());
    Address::from_slice(&keccak256(data)[12..])
}

/// Children keyed by unordered token pair, addressed by CREATE2 derivation.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    kind: &'static str,
    address: Address,
    code_hash: B256,
    entries: HashMap<Address, T>,
    by_salt: HashMap<B256, Address>,
    all: Vec<Address>,
}

impl<T> Registry<T> {
    pub fn new(kind: &'static str, address: Address, code_hash: B256) -> Self {
        Self {
            kind,
            address,
            code_hash,
            entries: HashMap::new(),
            by_salt: HashMap::new(),
            all: Vec::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Address the child for this pair has (or will have).
    pub fn address_for(&self, token_a: TokenId, token_b: TokenId) -> Result<Address> {
        Ok(derive_address(self.address, pair_salt(token_a, token_b)?, self.code_hash))
    }

    /// Create the child for a pair, failing if one already exists.
    pub fn create<F>(&mut self, token_a: TokenId, token_b: TokenId, build: F) -> Result<Address>
    where
        F: FnOnce(Address) -> Result<T>,
    {
        let salt = pair_salt(token_a, token_b)?;
        if self.by_salt.contains_key(&salt) {
            return Err(DexError::AlreadyExists(self.kind));
        }
        let address = derive_address(self.address, salt, self.code_hash);
        let child = build(address)?;
        self.entries.insert(address, child);
        self.by_salt.insert(salt, address);
        self.all.push(address);
        Ok(address)
    }

    /// Address of the existing child for a pair, if created.
    pub fn lookup(&self, token_a: TokenId, token_b: TokenId) -> Option<Address> {
        let salt = pair_salt(token_a, token_b).ok()?;
        self.by_salt.get(&salt).copied()
    }

    pub fn get(&self, token_a: TokenId, token_b: TokenId) -> Option<&T> {
        self.lookup(token_a, token_b).and_then(|address| self.entries.get(&address))
    }

    pub fn get_mut(&mut self, token_a: TokenId, token_b: TokenId) -> Option<&mut T> {
        let address = self.lookup(token_a, token_b)?;
        self.entries.get_mut(&address)
    }

    pub fn by_address(&self, address: Address) -> Option<&T> {
        self.entries.get(&address)
    }

    /// Children in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.all.iter().filter_map(|address| self.entries.get(address))
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}
