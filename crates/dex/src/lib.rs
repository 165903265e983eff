//! Hybrid liquidity engine: a constant-product AMM and a limit order book
//! per token pair, with routing that draws on both.
//!
//! This library provides:
//! - Reserve pairs with fee-adjusted constant-product swaps and liquidity shares
//! - Per-pair order books with price-time priority and transferable ownership tokens
//! - Deterministic pair and order-book registries
//! - Hybrid quotes and swaps over single- and multi-hop paths
//! - Deferred settlement against an injected token ledger

pub mod config;
pub mod error;
pub mod ledger;
pub mod math;
pub mod order;
pub mod orderbook;
pub mod ownership;
pub mod pair;
pub mod pool_manager;
pub mod registry;
pub mod router;
pub mod settlement;
pub mod types;

pub use config::{ConfigProvider, DexConfig, SharedConfig};
pub use error::{DexError, ErrorKind, Result};
pub use ledger::{LedgerError, MemoryLedger, TokenLedger};
pub use order::{Order, OrderId, OrderSide, OrderStatus};
pub use orderbook::{BookSnapshot, Fill, MovePrice, OrderBook, Placement, PriceBound};
pub use pair::ReservePair;
pub use pool_manager::{AddLiquidity, Funding, LiquidityAdded, PoolManager};
pub use router::{BestRoute, Quote, RouteHop};
pub use settlement::{Journal, Settlement, TokenTransfer, TransferKind};
pub use types::{Address, Amount, Price, Timestamp, TokenId, B256, U256};
