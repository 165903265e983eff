//! Orderbook implementation with price-time priority matching.

use crate::config::FEE_DENOMINATOR;
use crate::error::{DexError, Result};
use crate::math::{mul_div, pow10, Rounding};
use crate::order::{Order, OrderId, OrderSide, OrderStatus};
use crate::ownership::OrderOwnership;
use crate::settlement::Settlement;
use crate::types::{Address, Amount, Price, TokenId, U256};
use std::cmp::Reverse;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info};

/// All resting orders at one exact price, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceLevel {
    pub price: Price,
    /// Sum of `amount_remaining` over the queued orders.
    pub total_amount: Amount,
    queue: VecDeque<OrderId>,
}

impl PriceLevel {
    fn new(price: Price) -> Self {
        Self {
            price,
            total_amount: U256::ZERO,
            queue: VecDeque::new(),
        }
    }

    pub fn order_ids(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.queue.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn remove(&mut self, id: OrderId) {
        if let Some(pos) = self.queue.iter().position(|queued| *queued == id) {
            self.queue.remove(pos);
        }
    }
}

/// Which resting levels a taker may consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBound {
    /// Every level.
    Unbounded,
    /// Levels at or better than a limit price.
    Limit(Price),
    /// Levels at least as good as the pool's fee-adjusted marginal price.
    Marginal {
        reserve_base: Amount,
        reserve_quote: Amount,
        fee_bps: u32,
    },
}

impl PriceBound {
    /// Bound against a pool with the given reserves; all levels qualify
    /// when the pool is empty.
    pub fn marginal(reserve_base: Amount, reserve_quote: Amount, fee_bps: u32) -> Self {
        if reserve_base.is_zero() || reserve_quote.is_zero() {
            PriceBound::Unbounded
        } else {
            PriceBound::Marginal {
                reserve_base,
                reserve_quote,
                fee_bps,
            }
        }
    }

    /// Whether a taker on `side` may trade against a level at `price`.
    pub fn admits(&self, side: OrderSide, price: Price, unit: U256) -> bool {
        match *self {
            PriceBound::Unbounded => true,
            PriceBound::Limit(limit) => match side {
                OrderSide::Buy => price <= limit,
                OrderSide::Sell => price >= limit,
            },
            PriceBound::Marginal {
                reserve_base,
                reserve_quote,
                fee_bps,
            } => {
                let scale = U256::from(FEE_DENOMINATOR);
                let keep = U256::from(FEE_DENOMINATOR.saturating_sub(fee_bps));
                // Buying from the pool costs rq / rb / (1 - fee) per base;
                // selling to it yields rq / rb * (1 - fee).
                let (lhs, rhs) = match side {
                    OrderSide::Buy => (
                        price.0.checked_mul(reserve_base).and_then(|v| v.checked_mul(keep)),
                        reserve_quote.checked_mul(unit).and_then(|v| v.checked_mul(scale)),
                    ),
                    OrderSide::Sell => (
                        reserve_quote.checked_mul(unit).and_then(|v| v.checked_mul(keep)),
                        price.0.checked_mul(reserve_base).and_then(|v| v.checked_mul(scale)),
                    ),
                };
                matches!((lhs, rhs), (Some(lhs), Some(rhs)) if lhs <= rhs)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlannedFill {
    id: OrderId,
    price: Price,
    base: Amount,
    quote: Amount,
    /// Quote left on a buy order too small to buy one base unit.
    dust: Amount,
}

/// Fills a taker would receive from the current book, computed without
/// mutating it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakePlan {
    side: OrderSide,
    fills: Vec<PlannedFill>,
    /// Taker input consumed: quote for a buy, base for a sell.
    pub amount_in: Amount,
    /// Taker output: base for a buy, quote for a sell.
    pub amount_out: Amount,
}

impl TakePlan {
    fn new(side: OrderSide) -> Self {
        Self {
            side,
            fills: Vec::new(),
            amount_in: U256::ZERO,
            amount_out: U256::ZERO,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }
}

/// How far a taker offer would move the book, without trading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePrice {
    /// Taker input consumed: quote for a buy, base for a sell.
    pub amount_in: Amount,
    /// Taker output: base for a buy, quote for a sell.
    pub amount_out: Amount,
    /// Price of the last level reached, zero when nothing trades.
    pub price: Price,
}

/// A single executed match against a resting order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    /// The maker order ID.
    pub maker_order_id: OrderId,
    /// Recipient of the maker's proceeds.
    pub beneficiary: Address,
    /// Amount of base token traded.
    pub base_amount: Amount,
    /// Amount of quote token traded.
    pub quote_amount: Amount,
    /// Price at which the trade occurred.
    pub price: Price,
}

/// Outcome of submitting a limit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub order_id: OrderId,
    pub fills: Vec<Fill>,
    /// Offered amount consumed by immediate matches.
    pub amount_in: Amount,
    /// Amount received from immediate matches.
    pub amount_out: Amount,
    /// Amount left resting in the book.
    pub resting: Amount,
    /// Amount returned because it could neither trade nor rest.
    pub refunded: Amount,
}

/// Aggregated view of both sides of a book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookSnapshot {
    pub buy_prices: Vec<Price>,
    /// Quote units resting at each buy price.
    pub buy_amounts: Vec<Amount>,
    pub sell_prices: Vec<Price>,
    /// Base units resting at each sell price.
    pub sell_amounts: Vec<Amount>,
    pub price: Price,
}

/// An orderbook for a single base/quote pair.
///
/// Uses BTreeMap for price levels to maintain sorted order:
/// - Buy orders (bids): keyed by `Reverse(price)`, highest first
/// - Sell orders (asks): keyed by price, lowest first
///
/// Orders live in an arena indexed by `id - 1`; levels and ownership
/// tokens refer to them by id only.
#[derive(Debug, Clone)]
pub struct OrderBook {
    pub address: Address,
    pub base: TokenId,
    pub quote: TokenId,
    pub base_decimals: u8,
    /// Prices carry the quote token's decimals.
    pub price_decimals: u8,
    unit: U256,
    bids: BTreeMap<Reverse<Price>, PriceLevel>,
    asks: BTreeMap<Price, PriceLevel>,
    orders: Vec<Order>,
    tokens: OrderOwnership,
    last_price: Option<Price>,
}

impl OrderBook {
    pub fn new(address: Address, base: TokenId, quote: TokenId, base_decimals: u8, quote_decimals: u8) -> Result<Self> {
        if base == quote {
            return Err(DexError::IdenticalTokens);
        }
        Ok(Self {
            address,
            base,
            quote,
            base_decimals,
            price_decimals: quote_decimals,
            unit: pow10(base_decimals),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            orders: Vec::new(),
            tokens: OrderOwnership::new(),
            last_price: None,
        })
    }

    /// `10^base_decimals`, the base amount a price refers to.
    pub fn unit(&self) -> U256 {
        self.unit
    }

    /// Token an order on `side` offers.
    pub fn offered_token(&self, side: OrderSide) -> TokenId {
        match side {
            OrderSide::Buy => self.quote,
            OrderSide::Sell => self.base,
        }
    }

    /// Token an order on `side` receives.
    pub fn received_token(&self, side: OrderSide) -> TokenId {
        self.offered_token(side.opposite())
    }

    /// Taker side for a hop paying `token_in`.
    pub fn taker_side(&self, token_in: TokenId) -> Option<OrderSide> {
        if token_in == self.base {
            Some(OrderSide::Sell)
        } else if token_in == self.quote {
            Some(OrderSide::Buy)
        } else {
            None
        }
    }

    /// Get an order by ID, including filled and cancelled ones.
    pub fn get_order(&self, id: OrderId) -> Option<&Order> {
        let index = usize::try_from(id.0.checked_sub(1)?).ok()?;
        self.orders.get(index)
    }

    fn order(&self, id: OrderId) -> Result<&Order> {
        self.get_order(id)
            .ok_or_else(|| DexError::InvariantViolation(format!("order {id} missing from arena")))
    }

    fn order_mut(&mut self, id: OrderId) -> Result<&mut Order> {
        let index = id
            .0
            .checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(|| DexError::NotFound(format!("order {id}")))?;
        self.orders
            .get_mut(index)
            .ok_or_else(|| DexError::NotFound(format!("order {id}")))
    }

    /// Number of orders ever submitted to this book.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Get the best bid price.
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first_key_value().map(|(k, _)| k.0)
    }

    /// Get the best ask price.
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first_key_value().map(|(k, _)| *k)
    }

    pub fn is_crossed(&self) -> bool {
        matches!((self.best_bid(), self.best_ask()), (Some(bid), Some(ask)) if bid >= ask)
    }

    /// Fail unless best bid < best ask (or a side is empty).
    pub fn check_uncrossed(&self) -> Result<()> {
        if self.is_crossed() {
            return Err(DexError::InvariantViolation(format!(
                "book {} crossed: bid {:?} >= ask {:?}",
                self.address,
                self.best_bid(),
                self.best_ask()
            )));
        }
        Ok(())
    }

    /// Amount of `token` the book owes to resting orders.
    pub fn outstanding(&self, token: TokenId) -> Amount {
        let mut total = U256::ZERO;
        if token == self.quote {
            total = self
                .bids
                .values()
                .fold(total, |acc, level| acc.saturating_add(level.total_amount));
        }
        if token == self.base {
            total = self
                .asks
                .values()
                .fold(total, |acc, level| acc.saturating_add(level.total_amount));
        }
        total
    }

    /// AMM spot price at the book's price decimals.
    pub fn spot_price(&self, reserve_base: Amount, reserve_quote: Amount) -> Option<Price> {
        if reserve_base.is_zero() {
            return None;
        }
        mul_div(reserve_quote, self.unit, reserve_base, Rounding::Down).map(Price)
    }

    /// Last traded price, or `fallback` before the first trade.
    pub fn price(&self, fallback: Option<Price>) -> Price {
        self.last_price.or(fallback).unwrap_or(Price::ZERO)
    }

    /// Aggregated `(price, total_amount)` for the best `depth` levels of `side`.
    pub fn range_book(&self, side: OrderSide, depth: usize) -> Vec<(Price, Amount)> {
        let levels: Box<dyn Iterator<Item = &PriceLevel>> = match side {
            OrderSide::Buy => Box::new(self.bids.values()),
            OrderSide::Sell => Box::new(self.asks.values()),
        };
        levels
            .take(depth)
            .map(|level| (level.price, level.total_amount))
            .collect()
    }

    pub fn snapshot(&self, depth: usize, fallback: Option<Price>) -> BookSnapshot {
        let (buy_prices, buy_amounts) = self.range_book(OrderSide::Buy, depth).into_iter().unzip();
        let (sell_prices, sell_amounts) = self.range_book(OrderSide::Sell, depth).into_iter().unzip();
        BookSnapshot {
            buy_prices,
            buy_amounts,
            sell_prices,
            sell_amounts,
            price: self.price(fallback),
        }
    }

    /// Live orders whose ownership token is held by `holder`.
    pub fn orders_of(&self, holder: Address) -> Vec<&Order> {
        self.tokens
            .orders_of(holder)
            .into_iter()
            .filter_map(|id| self.get_order(id))
            .collect()
    }

    pub fn holder_of(&self, id: OrderId) -> Result<Address> {
        self.tokens.holder_of(id)
    }

    /// Plan how a taker offering `amount` on `side` would trade against the
    /// book, visiting admitted levels best-first and FIFO within a level.
    pub fn plan_take(&self, side: OrderSide, amount: Amount, bound: PriceBound) -> Result<TakePlan> {
        let mut plan = TakePlan::new(side);
        let mut left = amount;
        let levels: Box<dyn Iterator<Item = &PriceLevel>> = match side {
            OrderSide::Buy => Box::new(self.asks.values()),
            OrderSide::Sell => Box::new(self.bids.values()),
        };

        'walk: for level in levels {
            if left.is_zero() || !bound.admits(side, level.price, self.unit) {
                break;
            }
            for id in level.order_ids() {
                let resting = self.order(id)?.amount_remaining;
                let Some(fill) = self.match_step(side, id, level.price, left, resting)? else {
                    break 'walk;
                };
                let (taker_in, taker_out) = match side {
                    OrderSide::Buy => (fill.quote, fill.base),
                    OrderSide::Sell => (fill.base, fill.quote),
                };
                left -= taker_in;
                plan.amount_in += taker_in;
                plan.amount_out += taker_out;
                plan.fills.push(fill);
                if left.is_zero() {
                    break 'walk;
                }
            }
        }
        Ok(plan)
    }

    /// Output a taker offering `amount_in_offer` of `token_in` would get
    /// from levels `bound` admits, and the price it would move the book to.
    pub fn amount_out_for_move_price(&self, token_in: TokenId, amount_in_offer: Amount, bound: PriceBound) -> Result<MovePrice> {
        let side = self
            .taker_side(token_in)
            .ok_or_else(|| DexError::InvalidPath(format!("{token_in} not traded by {}", self.address)))?;
        let plan = self.plan_take(side, amount_in_offer, bound)?;
        Ok(MovePrice {
            amount_in: plan.amount_in,
            amount_out: plan.amount_out,
            price: plan.fills.last().map_or(Price::ZERO, |fill| fill.price),
        })
    }

    /// Input a taker needs to get `amount_out_offer` of `token_out` from
    /// levels `bound` admits, and the price it would move the book to.
    ///
    /// The output falls short of the offer when admitted levels run out;
    /// it may exceed it by rounding. Offering the returned input to
    /// [`OrderBook::plan_take`] reproduces the same fills.
    pub fn amount_in_for_move_price(&self, token_out: TokenId, amount_out_offer: Amount, bound: PriceBound) -> Result<MovePrice> {
        let token_in = if token_out == self.base {
            self.quote
        } else if token_out == self.quote {
            self.base
        } else {
            return Err(DexError::InvalidPath(format!("{token_out} not traded by {}", self.address)));
        };
        let side = self
            .taker_side(token_in)
            .ok_or_else(|| DexError::InvalidPath(format!("{token_in} not traded by {}", self.address)))?;

        let mut moved = MovePrice {
            amount_in: U256::ZERO,
            amount_out: U256::ZERO,
            price: Price::ZERO,
        };
        let mut wanted = amount_out_offer;
        let levels: Box<dyn Iterator<Item = &PriceLevel>> = match side {
            OrderSide::Buy => Box::new(self.asks.values()),
            OrderSide::Sell => Box::new(self.bids.values()),
        };

        'walk: for level in levels {
            if wanted.is_zero() || !bound.admits(side, level.price, self.unit) {
                break;
            }
            for id in level.order_ids() {
                let resting = self.order(id)?.amount_remaining;
                // Just enough to cover what is still wanted from this order
                let offer = match side {
                    OrderSide::Buy => level.price.quote_amount(wanted.min(resting), self.unit, Rounding::Up)?,
                    OrderSide::Sell => level.price.base_amount(wanted, self.unit, Rounding::Up)?,
                };
                let Some(fill) = self.match_step(side, id, level.price, offer, resting)? else {
                    break 'walk;
                };
                let (taker_in, taker_out) = match side {
                    OrderSide::Buy => (fill.quote, fill.base),
                    OrderSide::Sell => (fill.base, fill.quote),
                };
                moved.amount_in += taker_in;
                moved.amount_out += taker_out;
                moved.price = level.price;
                wanted = wanted.saturating_sub(taker_out);
                if wanted.is_zero() {
                    break 'walk;
                }
            }
        }
        Ok(moved)
    }

    /// Trade between a taker with `left` to offer and one resting order.
    /// `None` when either leg would be zero.
    fn match_step(
        &self,
        side: OrderSide,
        id: OrderId,
        price: Price,
        left: Amount,
        resting: Amount,
    ) -> Result<Option<PlannedFill>> {
        let (base, quote, dust) = match side {
            // Resting sell order, remaining in base
            OrderSide::Buy => {
                let base = price.base_amount(left, self.unit, Rounding::Down)?.min(resting);
                let quote = price.quote_amount(base, self.unit, Rounding::Up)?;
                (base, quote, U256::ZERO)
            }
            // Resting buy order, remaining in quote
            OrderSide::Sell => {
                let capacity = price.base_amount(resting, self.unit, Rounding::Down)?;
                let base = left.min(capacity);
                let quote = price.quote_amount(base, self.unit, Rounding::Down)?;
                let after = resting.saturating_sub(quote);
                let dust = if !after.is_zero()
                    && price.base_amount(after, self.unit, Rounding::Down)?.is_zero()
                {
                    after
                } else {
                    U256::ZERO
                };
                (base, quote, dust)
            }
        };
        if base.is_zero() || quote.is_zero() {
            return Ok(None);
        }
        Ok(Some(PlannedFill {
            id,
            price,
            base,
            quote,
            dust,
        }))
    }

    /// Apply a plan produced by [`OrderBook::plan_take`] on this same state.
    ///
    /// Maker proceeds and dust refunds are recorded in `settlement`; the
    /// taker's own output is left to the caller.
    pub fn execute(&mut self, plan: TakePlan, settlement: &mut Settlement) -> Result<Vec<Fill>> {
        let taker_side = plan.side;
        let maker_side = taker_side.opposite();
        let mut fills = Vec::with_capacity(plan.fills.len());

        for planned in plan.fills {
            let consumed = match maker_side {
                OrderSide::Sell => planned.base,
                OrderSide::Buy => planned.quote,
            };
            let order = self.order_mut(planned.id)?;
            if order.amount_remaining < consumed + planned.dust {
                return Err(DexError::InvariantViolation(format!(
                    "stale plan for order {}",
                    planned.id
                )));
            }
            order.fill(consumed);
            if !planned.dust.is_zero() {
                order.close(OrderStatus::Filled);
            }
            let beneficiary = order.beneficiary;
            let closed = order.amount_remaining.is_zero();

            // Maker receives the token the taker pays
            match maker_side {
                OrderSide::Sell => settlement.push(self.quote, beneficiary, planned.quote),
                OrderSide::Buy => {
                    settlement.push(self.base, beneficiary, planned.base);
                    settlement.push(self.quote, beneficiary, planned.dust);
                }
            }

            self.reduce_level(maker_side, planned.price, consumed + planned.dust, closed.then_some(planned.id))?;
            if closed {
                self.tokens.burn(planned.id);
            }
            self.last_price = Some(planned.price);

            debug!(
                book = %self.address,
                maker_order = %planned.id,
                base = %planned.base,
                quote = %planned.quote,
                price = %planned.price,
                "order matched"
            );
            fills.push(Fill {
                maker_order_id: planned.id,
                beneficiary,
                base_amount: planned.base,
                quote_amount: planned.quote,
                price: planned.price,
            });
        }
        Ok(fills)
    }

    fn reduce_level(&mut self, side: OrderSide, price: Price, amount: Amount, remove: Option<OrderId>) -> Result<()> {
        let level = match side {
            OrderSide::Buy => self.bids.get_mut(&Reverse(price)),
            OrderSide::Sell => self.asks.get_mut(&price),
        }
        .ok_or_else(|| DexError::InvariantViolation(format!("missing {side:?} level at {price}")))?;

        level.total_amount = level
            .total_amount
            .checked_sub(amount)
            .ok_or_else(|| DexError::InvariantViolation(format!("level {price} total underflow")))?;
        if let Some(id) = remove {
            level.remove(id);
        }
        if level.is_empty() {
            match side {
                OrderSide::Buy => self.bids.remove(&Reverse(price)),
                OrderSide::Sell => self.asks.remove(&price),
            };
        }
        Ok(())
    }

    fn can_rest(&self, side: OrderSide, price: Price, remainder: Amount) -> Result<bool> {
        if remainder.is_zero() {
            return Ok(false);
        }
        Ok(match side {
            OrderSide::Buy => {
                !price.base_amount(remainder, self.unit, Rounding::Down)?.is_zero()
                    && self.best_ask().map_or(true, |ask| ask > price)
            }
            OrderSide::Sell => self.best_bid().map_or(true, |bid| bid < price),
        })
    }

    /// Submit a limit order offering `amount` (quote for a buy, base for a
    /// sell) at `price`.
    ///
    /// The order first trades against the opposite side at the resting
    /// orders' prices; the remainder rests at `price` when it can trade and
    /// would not cross, and is refunded to `beneficiary` otherwise. The
    /// caller is responsible for funding `amount` into custody.
    pub fn place_limit(
        &mut self,
        owner: Address,
        beneficiary: Address,
        side: OrderSide,
        price: Price,
        amount: Amount,
        settlement: &mut Settlement,
    ) -> Result<Placement> {
        if amount.is_zero() {
            return Err(DexError::InvalidAmount);
        }
        if price.is_zero() {
            return Err(DexError::InvalidPrice);
        }

        let plan = self.plan_take(side, amount, PriceBound::Limit(price))?;
        if plan.is_empty() && !self.can_rest(side, price, amount)? {
            return Err(DexError::InvalidAmount);
        }

        let order_id = OrderId(self.orders.len() as u64 + 1);
        let (amount_in, amount_out) = (plan.amount_in, plan.amount_out);
        let fills = self.execute(plan, settlement)?;
        settlement.push(self.received_token(side), beneficiary, amount_out);

        let mut order = Order::new(order_id, owner, beneficiary, side, price, amount);
        if !amount_in.is_zero() {
            order.fill(amount_in);
        }
        let remainder = order.amount_remaining;
        let mut resting = U256::ZERO;
        let mut refunded = U256::ZERO;

        if self.can_rest(side, price, remainder)? {
            let level = match side {
                OrderSide::Buy => self.bids.entry(Reverse(price)).or_insert_with(|| PriceLevel::new(price)),
                OrderSide::Sell => self.asks.entry(price).or_insert_with(|| PriceLevel::new(price)),
            };
            level.total_amount = level
                .total_amount
                .checked_add(remainder)
                .ok_or(DexError::Overflow("level total"))?;
            level.queue.push_back(order_id);
            self.tokens.mint(owner, order_id)?;
            resting = remainder;
        } else if !remainder.is_zero() {
            refunded = order.close(OrderStatus::Filled);
            settlement.push(self.offered_token(side), beneficiary, refunded);
        }
        self.orders.push(order);

        info!(
            book = %self.address,
            order = %order_id,
            ?side,
            %price,
            %amount,
            fills = fills.len(),
            %resting,
            %refunded,
            "limit order placed"
        );
        Ok(Placement {
            order_id,
            fills,
            amount_in,
            amount_out,
            resting,
            refunded,
        })
    }

    /// Cancel a resting order, refunding its remainder to the beneficiary.
    /// Only the current ownership-token holder may cancel.
    pub fn cancel(&mut self, caller: Address, id: OrderId, settlement: &mut Settlement) -> Result<Amount> {
        let order = self
            .get_order(id)
            .ok_or_else(|| DexError::NotFound(format!("order {id}")))?;
        if order.amount_remaining.is_zero() {
            return Err(DexError::AlreadyFilled(id));
        }
        let holder = self.tokens.holder_of(id)?;
        if holder != caller {
            return Err(DexError::Unauthorized(format!("{caller} does not hold order {id}")));
        }

        let (side, price) = (order.side, order.price);
        let order = self.order_mut(id)?;
        let beneficiary = order.beneficiary;
        let refunded = order.close(OrderStatus::Cancelled);
        self.reduce_level(side, price, refunded, Some(id))?;
        self.tokens.burn(id);
        settlement.push(self.offered_token(side), beneficiary, refunded);

        info!(book = %self.address, order = %id, %refunded, "order cancelled");
        Ok(refunded)
    }

    /// Move the ownership token of `id` from `from` to `to`.
    pub fn transfer_order(&mut self, from: Address, to: Address, id: OrderId) -> Result<()> {
        self.tokens.transfer(from, to, id)?;
        info!(book = %self.address, order = %id, %from, %to, "order ownership transferred");
        Ok(())
    }
}
