//! Read-only routing queries.

use super::{returns, to_usize, LogicModule};
use crate::context::ViewContext;
use crate::error::RouterError;
use crate::selectors::IHybridRouter::IHybridRouterCalls;
use crate::selectors::Operation;
use alloy::primitives::{Bytes, U256};
use alloy::sol_types::SolInterface;
use dex::BestRoute;

#[derive(Debug, Default, Clone, Copy)]
pub struct PairUtils;

impl PairUtils {
    const OPERATIONS: &'static [Operation] = &[
        Operation::GetAmountsOut,
        Operation::GetAmountsIn,
        Operation::GetBestAmountsIn,
        Operation::GetBestAmountsOut,
        Operation::GetReserves,
        Operation::GetPair,
    ];

    fn best_route(route: BestRoute) -> Bytes {
        let extra = route.quote.extra();
        returns((route.path, route.quote.amounts, extra))
    }
}

/// Candidate token counts, one per path variant.
fn hop_counts(flags: &[U256]) -> Vec<usize> {
    flags.iter().copied().map(to_usize).collect()
}

impl LogicModule for PairUtils {
    fn name(&self) -> &'static str {
        "PairUtils"
    }

    fn operations(&self) -> &'static [Operation] {
        Self::OPERATIONS
    }

    fn query(&self, ctx: &ViewContext<'_>, call: IHybridRouterCalls) -> Result<Bytes, RouterError> {
        match call {
            IHybridRouterCalls::getAmountsOut(c) => {
                let quote = ctx.state.get_amounts_out(c.amountIn, &c.path)?;
                let extra = quote.extra();
                Ok(returns((quote.amounts, extra)))
            }
            IHybridRouterCalls::getAmountsIn(c) => {
                let quote = ctx.state.get_amounts_in(c.amountOut, &c.path)?;
                let extra = quote.extra();
                Ok(returns((quote.amounts, extra)))
            }
            IHybridRouterCalls::getBestAmountsIn(c) => {
                let route = ctx
                    .state
                    .get_best_amounts_in(c.amountOut, &c.paths, &hop_counts(&c.hopFlags))?;
                Ok(Self::best_route(route))
            }
            IHybridRouterCalls::getBestAmountsOut(c) => {
                let route = ctx
                    .state
                    .get_best_amounts_out(c.amountIn, &c.paths, &hop_counts(&c.hopFlags))?;
                Ok(Self::best_route(route))
            }
            IHybridRouterCalls::getReserves(c) => {
                let (reserve_a, reserve_b) = ctx.state.get_reserves(c.tokenA, c.tokenB)?;
                Ok(returns((reserve_a, reserve_b)))
            }
            IHybridRouterCalls::getPair(c) => {
                let pair = ctx.state.pair_address(c.tokenA, c.tokenB).unwrap_or_default();
                Ok(returns((pair,)))
            }
            other => Err(RouterError::FunctionNotFound(other.selector())),
        }
    }
}
