//! Logic modules the facade forwards bound selectors to.

mod order_book_router;
mod pair_router;
mod pair_utils;

pub use order_book_router::OrderBookRouter;
pub use pair_router::PairRouter;
pub use pair_utils::PairUtils;

use crate::context::{ExecContext, ViewContext};
use crate::error::RouterError;
use crate::selectors::IHybridRouter::IHybridRouterCalls;
use crate::selectors::Operation;
use alloy::primitives::{Bytes, U256};
use alloy::sol_types::abi::TokenSeq;
use alloy::sol_types::{SolInterface, SolType, SolValue};
use dex::{DexError, OrderId};

/// A backend implementing a subset of the router's entry points.
///
/// Modules are stateless; every call runs against the facade's storage.
pub trait LogicModule: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Entry points this module implements.
    fn operations(&self) -> &'static [Operation];

    fn implements(&self, operation: Operation) -> bool {
        self.operations().contains(&operation)
    }

    /// Serve a read-only entry point.
    fn query(&self, ctx: &ViewContext<'_>, call: IHybridRouterCalls) -> Result<Bytes, RouterError> {
        let _ = ctx;
        Err(RouterError::FunctionNotFound(call.selector()))
    }

    /// Serve a state-changing entry point against a draft of the storage.
    fn execute(&self, ctx: &mut ExecContext<'_>, call: IHybridRouterCalls) -> Result<Bytes, RouterError> {
        let _ = ctx;
        Err(RouterError::FunctionNotFound(call.selector()))
    }
}

/// Encode return values the way a Solidity function returns them.
pub(crate) fn returns<T: SolValue>(values: T) -> Bytes
where
    for<'a> <T::SolType as SolType>::Token<'a>: TokenSeq<'a>,
{
    values.abi_encode_params().into()
}

pub(crate) fn order_id(value: U256) -> Result<OrderId, DexError> {
    u64::try_from(value)
        .map(OrderId)
        .map_err(|_| DexError::NotFound(format!("order {value}")))
}

pub(crate) fn to_usize(value: U256) -> usize {
    value.saturating_to::<usize>()
}
