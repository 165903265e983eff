//! Limit orders and order-book management.

use super::{order_id, returns, to_usize, LogicModule};
use crate::context::{ExecContext, ViewContext};
use crate::error::RouterError;
use crate::selectors::IHybridRouter::{self, IHybridRouterCalls};
use crate::selectors::Operation;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolInterface;
use dex::{Funding, OrderSide, Price};

#[derive(Debug, Default, Clone, Copy)]
pub struct OrderBookRouter;

/// A limit order submission decoded from any of the four order entry points.
struct Submission {
    base: Address,
    quote: Address,
    side: OrderSide,
    price: U256,
    amount: U256,
    to: Address,
    funding: Funding,
}

impl OrderBookRouter {
    const OPERATIONS: &'static [Operation] = &[
        Operation::BuyWithToken,
        Operation::BuyWithEth,
        Operation::SellToken,
        Operation::SellEth,
        Operation::CreateOrderBook,
        Operation::GetOrderBook,
        Operation::GetPrice,
        Operation::GetUserOrders,
        Operation::TransferOrder,
        Operation::CancelOrder,
        Operation::GetOrderBookAddress,
    ];

    fn submit(ctx: &mut ExecContext<'_>, order: Submission) -> Result<Bytes, RouterError> {
        let caller = ctx.caller();
        let placed = ctx.state.place_limit_order(
            caller,
            order.base,
            order.quote,
            order.side,
            Price::new(order.price),
            order.amount,
            order.to,
            order.funding,
            ctx.settlement,
        )?;
        let book = Self::book_address(ctx, order.base, order.quote);
        ctx.emit(&IHybridRouter::LimitOrderPlaced {
            book,
            orderId: U256::from(placed.order_id.0),
            owner: caller,
            isBuy: order.side == OrderSide::Buy,
            price: order.price,
            amount: order.amount,
            resting: placed.resting,
        });
        Ok(returns((U256::from(placed.order_id.0),)))
    }

    fn book_address(ctx: &ExecContext<'_>, base: Address, quote: Address) -> Address {
        ctx.state.order_book_address(base, quote).unwrap_or_default()
    }
}

impl LogicModule for OrderBookRouter {
    fn name(&self) -> &'static str {
        "OrderBookRouter"
    }

    fn operations(&self) -> &'static [Operation] {
        Self::OPERATIONS
    }

    fn query(&self, ctx: &ViewContext<'_>, call: IHybridRouterCalls) -> Result<Bytes, RouterError> {
        match call {
            IHybridRouterCalls::getOrderBook(c) => {
                let snapshot = ctx
                    .state
                    .order_book_snapshot(c.baseToken, c.quoteToken, to_usize(c.depth))?;
                let prices = |prices: Vec<Price>| prices.into_iter().map(|p| p.value()).collect::<Vec<_>>();
                Ok(returns((
                    prices(snapshot.buy_prices),
                    snapshot.buy_amounts,
                    prices(snapshot.sell_prices),
                    snapshot.sell_amounts,
                    snapshot.price.value(),
                )))
            }
            IHybridRouterCalls::getPrice(c) => {
                let price = ctx.state.get_price(c.baseToken, c.quoteToken)?;
                Ok(returns((price.value(),)))
            }
            IHybridRouterCalls::getUserOrders(c) => {
                let ids = ctx
                    .state
                    .user_orders(c.baseToken, c.quoteToken, c.user)?
                    .iter()
                    .map(|order| U256::from(order.id.0))
                    .collect::<Vec<_>>();
                Ok(returns((ids,)))
            }
            IHybridRouterCalls::getOrderBookAddress(c) => {
                let book = ctx
                    .state
                    .order_book_address(c.baseToken, c.quoteToken)
                    .unwrap_or_default();
                Ok(returns((book,)))
            }
            other => Err(RouterError::FunctionNotFound(other.selector())),
        }
    }

    fn execute(&self, ctx: &mut ExecContext<'_>, call: IHybridRouterCalls) -> Result<Bytes, RouterError> {
        match call {
            IHybridRouterCalls::buyWithToken(c) => {
                ctx.ensure_deadline(c.deadline)?;
                let order = Submission {
                    base: c.baseToken,
                    quote: c.quoteToken,
                    side: OrderSide::Buy,
                    price: c.price,
                    amount: c.amountOffer,
                    to: c.to,
                    funding: Funding::Allowance,
                };
                Self::submit(ctx, order)
            }
            IHybridRouterCalls::sellToken(c) => {
                ctx.ensure_deadline(c.deadline)?;
                let order = Submission {
                    base: c.baseToken,
                    quote: c.quoteToken,
                    side: OrderSide::Sell,
                    price: c.price,
                    amount: c.amountOffer,
                    to: c.to,
                    funding: Funding::Allowance,
                };
                Self::submit(ctx, order)
            }
            IHybridRouterCalls::buyWithEth(c) => {
                ctx.ensure_deadline(c.deadline)?;
                let value = ctx.value();
                let order = Submission {
                    base: c.baseToken,
                    quote: ctx.weth(),
                    side: OrderSide::Buy,
                    price: c.price,
                    amount: value,
                    to: c.to,
                    funding: Funding::Value(value),
                };
                Self::submit(ctx, order)
            }
            IHybridRouterCalls::sellEth(c) => {
                ctx.ensure_deadline(c.deadline)?;
                let value = ctx.value();
                let order = Submission {
                    base: ctx.weth(),
                    quote: c.quoteToken,
                    side: OrderSide::Sell,
                    price: c.price,
                    amount: value,
                    to: c.to,
                    funding: Funding::Value(value),
                };
                Self::submit(ctx, order)
            }
            IHybridRouterCalls::createOrderBook(c) => {
                ctx.ensure_deadline(c.deadline)?;
                let book = ctx
                    .state
                    .create_order_book(ctx.ledger, c.baseToken, c.quoteToken)?;
                ctx.emit(&IHybridRouter::OrderBookCreated {
                    base: c.baseToken,
                    quote: c.quoteToken,
                    book,
                });
                Ok(returns((book,)))
            }
            IHybridRouterCalls::cancelOrder(c) => {
                ctx.ensure_deadline(c.deadline)?;
                let id = order_id(c.orderId)?;
                let caller = ctx.caller();
                let refunded = ctx
                    .state
                    .cancel_order(caller, c.baseToken, c.quoteToken, id, ctx.settlement)?;
                let book = Self::book_address(ctx, c.baseToken, c.quoteToken);
                ctx.emit(&IHybridRouter::OrderCancelled {
                    book,
                    orderId: c.orderId,
                    refunded,
                });
                Ok(returns((refunded,)))
            }
            IHybridRouterCalls::transferOrder(c) => {
                ctx.ensure_deadline(c.deadline)?;
                let id = order_id(c.orderId)?;
                let caller = ctx.caller();
                ctx.state
                    .transfer_order(caller, c.baseToken, c.quoteToken, c.to, id)?;
                let book = Self::book_address(ctx, c.baseToken, c.quoteToken);
                ctx.emit(&IHybridRouter::OrderTransferred {
                    book,
                    orderId: c.orderId,
                    from: caller,
                    to: c.to,
                });
                Ok(Bytes::new())
            }
            other => Err(RouterError::FunctionNotFound(other.selector())),
        }
    }
}
