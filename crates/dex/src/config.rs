//! DEX configuration parameters.

use crate::types::{Address, B256};
use alloy::primitives::keccak256;
use parking_lot::RwLock;
use std::sync::Arc;

/// Shares locked to the zero address on the first deposit into a pair.
pub const MINIMUM_LIQUIDITY: u64 = 1000;

/// Basis-point denominator for fees.
pub const FEE_DENOMINATOR: u32 = 10_000;

/// Read access to the deployment configuration.
///
/// Components receive a provider at construction instead of copying
/// individual values, so an owner change is visible everywhere at once.
pub trait ConfigProvider: std::fmt::Debug + Send + Sync {
    fn owner(&self) -> Address;
    /// Wrapped native token used for ETH-flavoured entry points.
    fn weth(&self) -> Address;
    fn pair_factory(&self) -> Address;
    fn order_book_factory(&self) -> Address;
    fn pair_code_hash(&self) -> B256;
    fn order_book_code_hash(&self) -> B256;
    fn fee_bps(&self) -> u32;
    fn max_routing_hops(&self) -> usize;
    fn max_path_variants(&self) -> usize;
}

/// Configuration for the DEX.
#[derive(Debug, Clone)]
pub struct DexConfig {
    /// Account allowed to bind facade functions.
    pub owner: Address,

    pub weth: Address,

    /// Address of the pair registry, used as the CREATE2 deployer.
    pub pair_factory: Address,

    /// Address of the order-book registry, used as the CREATE2 deployer.
    pub order_book_factory: Address,

    pub pair_code_hash: B256,

    pub order_book_code_hash: B256,

    /// Fee charged per AMM trade in basis points (1 bp = 0.01%).
    /// For example, 30 = 0.30% fee.
    pub fee_bps: u32,

    /// Maximum number of hops allowed when routing through multiple pairs.
    pub max_routing_hops: usize,

    /// Maximum number of candidate paths evaluated by best-execution queries.
    pub max_path_variants: usize,
}

impl Default for DexConfig {
    fn default() -> Self {
        Self {
            owner: Address::ZERO,
            weth: Address::ZERO,
            pair_factory: Address::repeat_byte(0xF1),
            order_book_factory: Address::repeat_byte(0xF2),
            pair_code_hash: keccak256(b"hybrid-dex/pair"),
            order_book_code_hash: keccak256(b"hybrid-dex/order-book"),
            fee_bps: 30,           // 0.30% default fee
            max_routing_hops: 3,   // Max 3 hops (4 tokens in path)
            max_path_variants: 8,
        }
    }
}

impl DexConfig {
    pub fn with_owner(mut self, owner: Address) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_weth(mut self, weth: Address) -> Self {
        self.weth = weth;
        self
    }

    pub fn with_factories(mut self, pair_factory: Address, order_book_factory: Address) -> Self {
        self.pair_factory = pair_factory;
        self.order_book_factory = order_book_factory;
        self
    }

    /// Create a new configuration with custom fee.
    pub fn with_fee_bps(mut self, fee_bps: u32) -> Self {
        self.fee_bps = fee_bps;
        self
    }

    /// Create a new configuration with custom max routing hops.
    pub fn with_max_routing_hops(mut self, max_hops: usize) -> Self {
        self.max_routing_hops = max_hops;
        self
    }

    pub fn with_max_path_variants(mut self, max_variants: usize) -> Self {
        self.max_path_variants = max_variants;
        self
    }
}

impl ConfigProvider for DexConfig {
    fn owner(&self) -> Address {
        self.owner
    }

    fn weth(&self) -> Address {
        self.weth
    }

    fn pair_factory(&self) -> Address {
        self.pair_factory
    }

    fn order_book_factory(&self) -> Address {
        self.order_book_factory
    }

    fn pair_code_hash(&self) -> B256 {
        self.pair_code_hash
    }

    fn order_book_code_hash(&self) -> B256 {
        self.order_book_code_hash
    }

    fn fee_bps(&self) -> u32 {
        self.fee_bps
    }

    fn max_routing_hops(&self) -> usize {
        self.max_routing_hops
    }

    fn max_path_variants(&self) -> usize {
        self.max_path_variants
    }
}

/// Mutable configuration shared between the engine and the facade.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig(Arc<RwLock<DexConfig>>);

impl SharedConfig {
    pub fn new(config: DexConfig) -> Self {
        Self(Arc::new(RwLock::new(config)))
    }

    pub fn set_owner(&self, owner: Address) {
        self.0.write().owner = owner;
    }

    pub fn snapshot(&self) -> DexConfig {
        self.0.read().clone()
    }
}

impl ConfigProvider for SharedConfig {
    fn owner(&self) -> Address {
        self.0.read().owner
    }

    fn weth(&self) -> Address {
        self.0.read().weth
    }

    fn pair_factory(&self) -> Address {
        self.0.read().pair_factory
    }

    fn order_book_factory(&self) -> Address {
        self.0.read().order_book_factory
    }

    fn pair_code_hash(&self) -> B256 {
        self.0.read().pair_code_hash
    }

    fn order_book_code_hash(&self) -> B256 {
        self.0.read().order_book_code_hash
    }

    fn fee_bps(&self) -> u32 {
        self.0.read().fee_bps
    }

    fn max_routing_hops(&self) -> usize {
        self.0.read().max_routing_hops
    }

    fn max_path_variants(&self) -> usize {
        self.0.read().max_path_variants
    }
}
