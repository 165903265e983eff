//! Liquidity, swaps and pair creation.

use super::{returns, LogicModule};
use crate::context::ExecContext;
use crate::error::RouterError;
use crate::selectors::IHybridRouter::{self, IHybridRouterCalls};
use crate::selectors::Operation;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolInterface;
use dex::{AddLiquidity, DexError, Funding, LiquidityAdded};

#[derive(Debug, Default, Clone, Copy)]
pub struct PairRouter;

impl PairRouter {
    const OPERATIONS: &'static [Operation] = &[
        Operation::AddLiquidity,
        Operation::AddLiquidityEth,
        Operation::RemoveLiquidity,
        Operation::SwapExactTokensForTokens,
        Operation::SwapTokensForExactTokens,
        Operation::SwapExactEthForTokens,
        Operation::SwapExactTokensForEth,
        Operation::SwapEthForExactTokens,
        Operation::CreatePair,
    ];

    fn add_liquidity(
        ctx: &mut ExecContext<'_>,
        params: AddLiquidity,
        funding: Funding,
    ) -> Result<LiquidityAdded, RouterError> {
        let caller = ctx.caller();
        let created = ctx.state.pair(params.token_a, params.token_b).is_none();
        let added = ctx.state.add_liquidity(caller, &params, funding, ctx.settlement)?;
        if created {
            Self::emit_pair_created(ctx, params.token_a, params.token_b, added.pair);
        }
        ctx.emit(&IHybridRouter::LiquidityAdded {
            pair: added.pair,
            to: params.to,
            amountA: added.amount_a,
            amountB: added.amount_b,
            liquidity: added.liquidity,
        });
        Ok(added)
    }

    fn emit_pair_created(ctx: &mut ExecContext<'_>, token_a: Address, token_b: Address, pair: Address) {
        let (token0, token1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        let all_pairs = U256::from(ctx.state.pairs().count());
        ctx.emit(&IHybridRouter::PairCreated {
            token0,
            token1,
            pair,
            allPairs: all_pairs,
        });
    }

    #[allow(clippy::too_many_arguments)]
    fn swap(
        ctx: &mut ExecContext<'_>,
        exact_in: bool,
        amount: U256,
        limit: U256,
        path: &[Address],
        to: Address,
        funding: Funding,
    ) -> Result<Vec<U256>, RouterError> {
        let caller = ctx.caller();
        let amounts = if exact_in {
            ctx.state
                .swap_exact_in(caller, amount, limit, path, to, funding, ctx.settlement)?
        } else {
            ctx.state
                .swap_exact_out(caller, amount, limit, path, to, funding, ctx.settlement)?
        };
        if let (Some(&token_in), Some(&token_out)) = (path.first(), path.last()) {
            ctx.emit(&IHybridRouter::Swap {
                sender: caller,
                tokenIn: token_in,
                tokenOut: token_out,
                amountIn: amounts.first().copied().unwrap_or_default(),
                amountOut: amounts.last().copied().unwrap_or_default(),
                to,
            });
        }
        Ok(amounts)
    }

    /// Native-output swaps pay out the wrapped native token.
    fn ensure_ends_native(ctx: &ExecContext<'_>, path: &[Address]) -> Result<(), DexError> {
        if path.last() != Some(&ctx.weth()) {
            return Err(DexError::InvalidPath("path must end with the native token".to_string()));
        }
        Ok(())
    }
}

impl LogicModule for PairRouter {
    fn name(&self) -> &'static str {
        "PairRouter"
    }

    fn operations(&self) -> &'static [Operation] {
        Self::OPERATIONS
    }

    fn execute(&self, ctx: &mut ExecContext<'_>, call: IHybridRouterCalls) -> Result<Bytes, RouterError> {
        match call {
            IHybridRouterCalls::addLiquidity(c) => {
                ctx.ensure_deadline(c.deadline)?;
                let params = AddLiquidity {
                    token_a: c.tokenA,
                    token_b: c.tokenB,
                    amount_a_desired: c.amountADesired,
                    amount_b_desired: c.amountBDesired,
                    amount_a_min: c.amountAMin,
                    amount_b_min: c.amountBMin,
                    to: c.to,
                };
                let added = Self::add_liquidity(ctx, params, Funding::Allowance)?;
                Ok(returns((added.amount_a, added.amount_b, added.liquidity)))
            }
            IHybridRouterCalls::addLiquidityETH(c) => {
                ctx.ensure_deadline(c.deadline)?;
                let value = ctx.value();
                let params = AddLiquidity {
                    token_a: c.token,
                    token_b: ctx.weth(),
                    amount_a_desired: c.amountTokenDesired,
                    amount_b_desired: value,
                    amount_a_min: c.amountTokenMin,
                    amount_b_min: c.amountETHMin,
                    to: c.to,
                };
                let added = Self::add_liquidity(ctx, params, Funding::Value(value))?;
                Ok(returns((added.amount_a, added.amount_b, added.liquidity)))
            }
            IHybridRouterCalls::removeLiquidity(c) => {
                ctx.ensure_deadline(c.deadline)?;
                let caller = ctx.caller();
                let (amount_a, amount_b) = ctx.state.remove_liquidity(
                    caller,
                    c.tokenA,
                    c.tokenB,
                    c.liquidity,
                    c.amountAMin,
                    c.amountBMin,
                    c.to,
                    ctx.settlement,
                )?;
                let pair = ctx.state.pair_address(c.tokenA, c.tokenB).unwrap_or_default();
                ctx.emit(&IHybridRouter::LiquidityRemoved {
                    pair,
                    to: c.to,
                    amountA: amount_a,
                    amountB: amount_b,
                    liquidity: c.liquidity,
                });
                Ok(returns((amount_a, amount_b)))
            }
            IHybridRouterCalls::swapExactTokensForTokens(c) => {
                ctx.ensure_deadline(c.deadline)?;
                let amounts = Self::swap(ctx, true, c.amountIn, c.amountOutMin, &c.path, c.to, Funding::Allowance)?;
                Ok(returns((amounts,)))
            }
            IHybridRouterCalls::swapTokensForExactTokens(c) => {
                ctx.ensure_deadline(c.deadline)?;
                let amounts = Self::swap(ctx, false, c.amountOut, c.amountInMax, &c.path, c.to, Funding::Allowance)?;
                Ok(returns((amounts,)))
            }
            IHybridRouterCalls::swapExactETHForTokens(c) => {
                ctx.ensure_deadline(c.deadline)?;
                let value = ctx.value();
                let amounts = Self::swap(ctx, true, value, c.amountOutMin, &c.path, c.to, Funding::Value(value))?;
                Ok(returns((amounts,)))
            }
            IHybridRouterCalls::swapExactTokensForETH(c) => {
                ctx.ensure_deadline(c.deadline)?;
                Self::ensure_ends_native(ctx, &c.path)?;
                let amounts = Self::swap(ctx, true, c.amountIn, c.amountOutMin, &c.path, c.to, Funding::Allowance)?;
                Ok(returns((amounts,)))
            }
            IHybridRouterCalls::swapETHForExactTokens(c) => {
                ctx.ensure_deadline(c.deadline)?;
                let value = ctx.value();
                let amounts = Self::swap(ctx, false, c.amountOut, value, &c.path, c.to, Funding::Value(value))?;
                Ok(returns((amounts,)))
            }
            IHybridRouterCalls::createPair(c) => {
                ctx.ensure_deadline(c.deadline)?;
                let pair = ctx.state.create_pair(c.tokenA, c.tokenB)?;
                Self::emit_pair_created(ctx, c.tokenA, c.tokenB, pair);
                Ok(returns((pair,)))
            }
            other => Err(RouterError::FunctionNotFound(other.selector())),
        }
    }
}
