//! Facade router for the hybrid exchange.
//!
//! A single entry point decodes ABI calldata, resolves the function selector
//! through an owner-managed binding table and forwards the call to one of
//! three logic modules:
//! - `PairRouter`: liquidity, swaps and pair creation
//! - `OrderBookRouter`: limit orders, order books and cancellation
//! - `PairUtils`: read-only routing queries

pub mod context;
pub mod error;
pub mod facade;
pub mod modules;
pub mod selectors;

pub use context::{CallContext, CallOutput, ExecContext, ViewContext};
pub use error::RouterError;
pub use facade::{HybridRouter, StandardBackends};
pub use modules::{LogicModule, OrderBookRouter, PairRouter, PairUtils};
pub use selectors::{IHybridRouter, Operation};
