//! Engine state: every pair and order book, plus the operations that mutate them.

use crate::config::ConfigProvider;
use crate::error::{DexError, Result};
use crate::ledger::TokenLedger;
use crate::order::{Order, OrderId, OrderSide};
use crate::orderbook::{BookSnapshot, OrderBook, Placement};
use crate::pair::{quote, sort_tokens, ReservePair};
use crate::registry::Registry;
use crate::settlement::Settlement;
use crate::types::{Address, Amount, Price, TokenId, U256};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// How the payer provides the input of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Funding {
    /// Pulled from the payer with the allowance granted to custody.
    Allowance,
    /// Paid from native value attached to the call, credited as wrapped
    /// native token. Unused value is returned to the payer.
    Value(Amount),
}

/// Parameters of a liquidity deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidity {
    pub token_a: TokenId,
    pub token_b: TokenId,
    pub amount_a_desired: Amount,
    pub amount_b_desired: Amount,
    pub amount_a_min: Amount,
    pub amount_b_min: Amount,
    pub to: Address,
}

/// Amounts actually deposited and shares minted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityAdded {
    pub pair: Address,
    pub amount_a: Amount,
    pub amount_b: Amount,
    pub liquidity: Amount,
}

/// The main DEX pool manager.
///
/// Owns every reserve pair and order book. Token movements are recorded in
/// a [`Settlement`] rather than applied, so a caller can run an operation
/// on a clone and discard it on failure.
#[derive(Debug, Clone)]
pub struct PoolManager {
    config: Arc<dyn ConfigProvider>,
    /// Account holding pool reserves and resting order funds.
    custody: Address,
    pairs: Registry<ReservePair>,
    books: Registry<OrderBook>,
}

impl PoolManager {
    pub fn new(config: Arc<dyn ConfigProvider>, custody: Address) -> Self {
        let pairs = Registry::new("pair", config.pair_factory(), config.pair_code_hash());
        let books = Registry::new(
            "order book",
            config.order_book_factory(),
            config.order_book_code_hash(),
        );
        Self {
            config,
            custody,
            pairs,
            books,
        }
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &dyn ConfigProvider {
        self.config.as_ref()
    }

    pub fn custody(&self) -> Address {
        self.custody
    }

    pub fn fee_bps(&self) -> u32 {
        self.config.fee_bps()
    }

    pub fn pair(&self, token_a: TokenId, token_b: TokenId) -> Option<&ReservePair> {
        self.pairs.get(token_a, token_b)
    }

    pub fn book(&self, token_a: TokenId, token_b: TokenId) -> Option<&OrderBook> {
        self.books.get(token_a, token_b)
    }

    pub(crate) fn pair_mut(&mut self, token_a: TokenId, token_b: TokenId) -> Result<&mut ReservePair> {
        self.pairs
            .get_mut(token_a, token_b)
            .ok_or_else(|| DexError::NotFound(format!("pair {token_a}/{token_b}")))
    }

    pub(crate) fn book_mut(&mut self, token_a: TokenId, token_b: TokenId) -> Result<&mut OrderBook> {
        self.books
            .get_mut(token_a, token_b)
            .ok_or_else(|| DexError::NotFound(format!("order book {token_a}/{token_b}")))
    }

    pub(crate) fn existing_book(&self, token_a: TokenId, token_b: TokenId) -> Result<&OrderBook> {
        self.book(token_a, token_b)
            .ok_or_else(|| DexError::NotFound(format!("order book {token_a}/{token_b}")))
    }

    /// Address of the created pair for two tokens, if any.
    pub fn pair_address(&self, token_a: TokenId, token_b: TokenId) -> Option<Address> {
        self.pairs.lookup(token_a, token_b)
    }

    /// Address of the created order book for two tokens, if any.
    pub fn order_book_address(&self, token_a: TokenId, token_b: TokenId) -> Option<Address> {
        self.books.lookup(token_a, token_b)
    }

    /// Get all pairs in creation order.
    pub fn pairs(&self) -> impl Iterator<Item = &ReservePair> {
        self.pairs.iter()
    }

    pub fn books(&self) -> impl Iterator<Item = &OrderBook> {
        self.books.iter()
    }

    /// Create a new reserve pair.
    /// Returns the pair address, or an error if it already exists.
    pub fn create_pair(&mut self, token_a: TokenId, token_b: TokenId) -> Result<Address> {
        sort_tokens(token_a, token_b)?;
        let address = self
            .pairs
            .create(token_a, token_b, |address| ReservePair::new(address, token_a, token_b))?;
        info!(pair = %address, %token_a, %token_b, "pair created");
        Ok(address)
    }

    /// Create the order book for `base`/`quote`. The pair must already exist.
    pub fn create_order_book(&mut self, ledger: &dyn TokenLedger, base: TokenId, quote: TokenId) -> Result<Address> {
        sort_tokens(base, quote)?;
        if self.pair(base, quote).is_none() {
            return Err(DexError::NotFound(format!("pair {base}/{quote}")));
        }
        let base_decimals = ledger.decimals(base)?;
        let quote_decimals = ledger.decimals(quote)?;
        let address = self.books.create(base, quote, |address| {
            OrderBook::new(address, base, quote, base_decimals, quote_decimals)
        })?;
        info!(book = %address, %base, %quote, base_decimals, quote_decimals, "order book created");
        Ok(address)
    }

    /// Record the payer's side of an operation.
    pub(crate) fn collect(
        &self,
        settlement: &mut Settlement,
        token: TokenId,
        payer: Address,
        amount: Amount,
        funding: Funding,
    ) -> Result<()> {
        match funding {
            Funding::Allowance => settlement.pull(token, payer, amount),
            Funding::Value(attached) => {
                if token != self.config.weth() {
                    return Err(DexError::InvalidValue(format!(
                        "value attached for non-native token {token}"
                    )));
                }
                if attached < amount {
                    return Err(DexError::InvalidValue(format!(
                        "attached {attached} below required {amount}"
                    )));
                }
                settlement.attach_value(token, payer, attached);
                settlement.push(token, payer, attached - amount);
            }
        }
        Ok(())
    }

    /// Funding to use for `token` when the call carries `funding`.
    fn funding_for(&self, token: TokenId, funding: Funding) -> Funding {
        match funding {
            Funding::Value(_) if token == self.config.weth() => funding,
            _ => Funding::Allowance,
        }
    }

    /// Deposit liquidity at the current reserve ratio, creating the pair if missing.
    pub fn add_liquidity(
        &mut self,
        caller: Address,
        params: &AddLiquidity,
        funding: Funding,
        settlement: &mut Settlement,
    ) -> Result<LiquidityAdded> {
        let AddLiquidity {
            token_a,
            token_b,
            amount_a_desired,
            amount_b_desired,
            amount_a_min,
            amount_b_min,
            to,
        } = *params;
        if let Funding::Value(_) = funding {
            let weth = self.config.weth();
            if token_a != weth && token_b != weth {
                return Err(DexError::InvalidValue("no native token in pair".to_string()));
            }
        }
        if self.pair(token_a, token_b).is_none() {
            self.create_pair(token_a, token_b)?;
        }

        let pair = self.pair_mut(token_a, token_b)?;
        let (reserve_a, reserve_b) = pair.reserves_for(token_a)?;
        let (amount_a, amount_b) = if reserve_a.is_zero() && reserve_b.is_zero() {
            (amount_a_desired, amount_b_desired)
        } else {
            let amount_b_optimal = quote(amount_a_desired, reserve_a, reserve_b)?;
            if amount_b_optimal <= amount_b_desired {
                if amount_b_optimal < amount_b_min {
                    return Err(DexError::SlippageExceeded(format!(
                        "amountB {amount_b_optimal} below minimum {amount_b_min}"
                    )));
                }
                (amount_a_desired, amount_b_optimal)
            } else {
                let amount_a_optimal = quote(amount_b_desired, reserve_b, reserve_a)?;
                if amount_a_optimal > amount_a_desired || amount_a_optimal < amount_a_min {
                    return Err(DexError::SlippageExceeded(format!(
                        "amountA {amount_a_optimal} below minimum {amount_a_min}"
                    )));
                }
                (amount_a_optimal, amount_b_desired)
            }
        };
        if amount_a.is_zero() || amount_b.is_zero() {
            return Err(DexError::InvalidAmount);
        }

        let (amount0, amount1) = if token_a == pair.token0 {
            (amount_a, amount_b)
        } else {
            (amount_b, amount_a)
        };
        let liquidity = pair.mint(to, amount0, amount1)?;
        let address = pair.address;

        let funding_a = self.funding_for(token_a, funding);
        let funding_b = self.funding_for(token_b, funding);
        self.collect(settlement, token_a, caller, amount_a, funding_a)?;
        self.collect(settlement, token_b, caller, amount_b, funding_b)?;

        info!(pair = %address, %amount_a, %amount_b, %liquidity, %to, "liquidity added");
        Ok(LiquidityAdded {
            pair: address,
            amount_a,
            amount_b,
            liquidity,
        })
    }

    /// Burn the caller's shares and pay out the pro-rata reserves to `to`.
    #[allow(clippy::too_many_arguments)]
    pub fn remove_liquidity(
        &mut self,
        caller: Address,
        token_a: TokenId,
        token_b: TokenId,
        liquidity: Amount,
        amount_a_min: Amount,
        amount_b_min: Amount,
        to: Address,
        settlement: &mut Settlement,
    ) -> Result<(Amount, Amount)> {
        let pair = self.pair_mut(token_a, token_b)?;
        let (amount0, amount1) = pair.burn(caller, liquidity)?;
        let (amount_a, amount_b) = if token_a == pair.token0 {
            (amount0, amount1)
        } else {
            (amount1, amount0)
        };
        if amount_a < amount_a_min {
            return Err(DexError::SlippageExceeded(format!(
                "amountA {amount_a} below minimum {amount_a_min}"
            )));
        }
        if amount_b < amount_b_min {
            return Err(DexError::SlippageExceeded(format!(
                "amountB {amount_b} below minimum {amount_b_min}"
            )));
        }
        let address = pair.address;
        settlement.push(token_a, to, amount_a);
        settlement.push(token_b, to, amount_b);

        info!(pair = %address, %liquidity, %amount_a, %amount_b, %to, "liquidity removed");
        Ok((amount_a, amount_b))
    }

    /// Route one hop through the book then the pool, on live state.
    fn execute_hop(
        &mut self,
        token_in: TokenId,
        token_out: TokenId,
        amount_in: Amount,
        settlement: &mut Settlement,
    ) -> Result<Amount> {
        let plan = self.plan_hop(token_in, token_out, amount_in)?;
        let hop = plan.hop;
        let fee_bps = self.fee_bps();

        if let Some(book_plan) = plan.book_plan {
            self.book_mut(token_in, token_out)?.execute(book_plan, settlement)?;
        }
        if !hop.amm_in.is_zero() {
            let pair = self.pair_mut(token_in, token_out)?;
            if hop.amm_out.is_zero() {
                pair.donate(token_in, hop.amm_in)?;
            } else {
                pair.swap(token_in, hop.amm_in, hop.amm_out, fee_bps)?;
            }
        }

        debug!(
            %token_in,
            %token_out,
            ob_in = %hop.ob_in,
            ob_out = %hop.ob_out,
            amm_in = %hop.amm_in,
            amm_out = %hop.amm_out,
            "hop executed"
        );
        Ok(hop.amount_out())
    }

    /// Swap an exact input along `path`, failing if the output is below
    /// `amount_out_min`. Returns the amount at every token of the path.
    #[allow(clippy::too_many_arguments)]
    pub fn swap_exact_in(
        &mut self,
        caller: Address,
        amount_in: Amount,
        amount_out_min: Amount,
        path: &[TokenId],
        to: Address,
        funding: Funding,
        settlement: &mut Settlement,
    ) -> Result<Vec<Amount>> {
        self.validate_path(path)?;
        if amount_in.is_zero() {
            return Err(DexError::InvalidAmount);
        }
        if let Funding::Value(_) = funding {
            if path[0] != self.config.weth() {
                return Err(DexError::InvalidPath("path must start with the native token".to_string()));
            }
        }
        self.collect(settlement, path[0], caller, amount_in, funding)?;

        let mut amounts = Vec::with_capacity(path.len());
        amounts.push(amount_in);
        let mut current = amount_in;
        for hop in path.windows(2) {
            if current.is_zero() {
                return Err(DexError::InsufficientLiquidity);
            }
            current = self.execute_hop(hop[0], hop[1], current, settlement)?;
            amounts.push(current);
        }

        if current < amount_out_min {
            return Err(DexError::SlippageExceeded(format!(
                "amountOut {current} below minimum {amount_out_min}"
            )));
        }
        let token_out = path[path.len() - 1];
        settlement.push(token_out, to, current);

        info!(
            %caller,
            token_in = %path[0],
            %token_out,
            %amount_in,
            amount_out = %current,
            hops = path.len() - 1,
            "swap executed"
        );
        Ok(amounts)
    }

    /// Swap for an exact output along `path`, spending at most `amount_in_max`.
    ///
    /// Spends the smallest input reaching `amount_out`
    /// ([`PoolManager::min_amount_in`]) as an exact-input swap, so the output
    /// is never below `amount_out` and never costs more than the quote from
    /// [`PoolManager::get_amounts_in`].
    #[allow(clippy::too_many_arguments)]
    pub fn swap_exact_out(
        &mut self,
        caller: Address,
        amount_out: Amount,
        amount_in_max: Amount,
        path: &[TokenId],
        to: Address,
        funding: Funding,
        settlement: &mut Settlement,
    ) -> Result<Vec<Amount>> {
        let amount_in = self.min_amount_in(amount_out, path)?;
        if amount_in > amount_in_max {
            return Err(DexError::SlippageExceeded(format!(
                "amountIn {amount_in} above maximum {amount_in_max}"
            )));
        }
        self.swap_exact_in(caller, amount_in, amount_out, path, to, funding, settlement)
    }

    /// Submit a limit order to the `base`/`quote` book, funded by `caller`.
    #[allow(clippy::too_many_arguments)]
    pub fn place_limit_order(
        &mut self,
        caller: Address,
        base: TokenId,
        quote: TokenId,
        side: OrderSide,
        price: Price,
        amount: Amount,
        to: Address,
        funding: Funding,
        settlement: &mut Settlement,
    ) -> Result<Placement> {
        let book = self.existing_book(base, quote)?;
        if book.base != base {
            return Err(DexError::InvalidPath(format!(
                "{base} is the quote token of book {}",
                book.address
            )));
        }
        let offered = book.offered_token(side);
        self.collect(settlement, offered, caller, amount, funding)?;
        self.book_mut(base, quote)?
            .place_limit(caller, to, side, price, amount, settlement)
    }

    pub fn cancel_order(
        &mut self,
        caller: Address,
        base: TokenId,
        quote: TokenId,
        id: OrderId,
        settlement: &mut Settlement,
    ) -> Result<Amount> {
        self.book_mut(base, quote)?.cancel(caller, id, settlement)
    }

    pub fn transfer_order(
        &mut self,
        caller: Address,
        base: TokenId,
        quote: TokenId,
        to: Address,
        id: OrderId,
    ) -> Result<()> {
        self.book_mut(base, quote)?.transfer_order(caller, to, id)
    }

    /// AMM spot price of `book`, when its pair has reserves.
    fn spot_price(&self, book: &OrderBook) -> Option<Price> {
        let pair = self.pair(book.base, book.quote)?;
        let (reserve_base, reserve_quote) = pair.reserves_for(book.base).ok()?;
        book.spot_price(reserve_base, reserve_quote)
    }

    /// Last traded price of the book, falling back to the AMM spot price
    /// before the first trade.
    pub fn get_price(&self, base: TokenId, quote: TokenId) -> Result<Price> {
        let book = self.existing_book(base, quote)?;
        Ok(book.price(self.spot_price(book)))
    }

    pub fn order_book_snapshot(&self, base: TokenId, quote: TokenId, depth: usize) -> Result<BookSnapshot> {
        let book = self.existing_book(base, quote)?;
        Ok(book.snapshot(depth, self.spot_price(book)))
    }

    /// Live orders in the book whose ownership token `holder` holds.
    pub fn user_orders(&self, base: TokenId, quote: TokenId, holder: Address) -> Result<Vec<Order>> {
        let book = self.existing_book(base, quote)?;
        Ok(book.orders_of(holder).into_iter().cloned().collect())
    }

    /// Check the quiescent invariants after an operation: no crossed book,
    /// and custody holds at least what pools and resting orders account for
    /// in each of `tokens`.
    pub fn check_invariants(&self, ledger: &dyn TokenLedger, tokens: &BTreeSet<TokenId>) -> Result<()> {
        for book in self.books.iter() {
            book.check_uncrossed()?;
        }
        for &token in tokens {
            let pooled = self
                .pairs
                .iter()
                .filter_map(|pair| pair.reserves_for(token).ok())
                .fold(U256::ZERO, |acc, (reserve, _)| acc.saturating_add(reserve));
            let resting = self
                .books
                .iter()
                .fold(U256::ZERO, |acc, book| acc.saturating_add(book.outstanding(token)));
            let required = pooled.saturating_add(resting);
            let held = ledger.balance_of(token, self.custody);
            if held < required {
                return Err(DexError::InvariantViolation(format!(
                    "custody holds {held} of {token}, owes {required}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DexConfig;
    use crate::ledger::MemoryLedger;

    const E18: u128 = 1_000_000_000_000_000_000;

    fn eth() -> TokenId {
        Address::repeat_byte(0x01)
    }

    fn usdc() -> TokenId {
        Address::repeat_byte(0x02)
    }

    fn weth() -> TokenId {
        Address::repeat_byte(0xEE)
    }

    fn custody() -> Address {
        Address::repeat_byte(0xCC)
    }

    fn alice() -> Address {
        Address::repeat_byte(0xA1)
    }

    fn setup() -> (PoolManager, MemoryLedger) {
        let config = DexConfig::default().with_weth(weth());
        let manager = PoolManager::new(Arc::new(config), custody());
        let mut ledger = MemoryLedger::new();
        ledger.register_token(eth(), "ETH", 18);
        ledger.register_token(usdc(), "USDC", 6);
        ledger.register_token(weth(), "WETH", 18);
        (manager, ledger)
    }

    fn deposit(eth_amount: u128, usdc_amount: u128) -> AddLiquidity {
        AddLiquidity {
            token_a: eth(),
            token_b: usdc(),
            amount_a_desired: U256::from(eth_amount),
            amount_b_desired: U256::from(usdc_amount),
            amount_a_min: U256::ZERO,
            amount_b_min: U256::ZERO,
            to: alice(),
        }
    }

    #[test]
    fn test_create_pair() {
        let (mut manager, _) = setup();

        let address = manager.create_pair(eth(), usdc()).unwrap();
        assert_eq!(manager.pair_address(usdc(), eth()), Some(address));

        // Creating same pair again should fail, in either order
        assert_eq!(
            manager.create_pair(usdc(), eth()),
            Err(DexError::AlreadyExists("pair"))
        );
        assert_eq!(manager.create_pair(eth(), eth()), Err(DexError::IdenticalTokens));
    }

    #[test]
    fn test_order_book_requires_pair() {
        let (mut manager, ledger) = setup();

        assert!(matches!(
            manager.create_order_book(&ledger, eth(), usdc()),
            Err(DexError::NotFound(_))
        ));
        manager.create_pair(eth(), usdc()).unwrap();
        let address = manager.create_order_book(&ledger, eth(), usdc()).unwrap();
        assert_eq!(manager.order_book_address(usdc(), eth()), Some(address));

        let book = manager.book(eth(), usdc()).unwrap();
        assert_eq!(book.base_decimals, 18);
        assert_eq!(book.price_decimals, 6);
        assert_eq!(
            manager.create_order_book(&ledger, usdc(), eth()),
            Err(DexError::AlreadyExists("order book"))
        );
    }

    #[test]
    fn test_add_liquidity_at_ratio() {
        let (mut manager, _) = setup();
        let mut settlement = Settlement::new(custody());

        manager
            .add_liquidity(alice(), &deposit(10 * E18, 20_000_000), Funding::Allowance, &mut settlement)
            .unwrap();

        // Second deposit is capped by the usdc side
        let added = manager
            .add_liquidity(alice(), &deposit(10 * E18, 10_000_000), Funding::Allowance, &mut settlement)
            .unwrap();
        assert_eq!(added.amount_a, U256::from(5 * E18));
        assert_eq!(added.amount_b, U256::from(10_000_000u64));

        let mut strict = deposit(10 * E18, 10_000_000);
        strict.amount_a_min = U256::from(6 * E18);
        assert!(matches!(
            manager.add_liquidity(alice(), &strict, Funding::Allowance, &mut settlement),
            Err(DexError::SlippageExceeded(_))
        ));
    }

    #[test]
    fn test_value_funding_refunds_excess() {
        let (mut manager, _) = setup();
        let mut settlement = Settlement::new(custody());

        manager
            .collect(&mut settlement, weth(), alice(), U256::from(7), Funding::Value(U256::from(10)))
            .unwrap();
        let transfers = settlement.transfers();
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[1].to, alice());
        assert_eq!(transfers[1].amount, U256::from(3));

        assert!(matches!(
            manager.collect(&mut settlement, usdc(), alice(), U256::from(7), Funding::Value(U256::from(10))),
            Err(DexError::InvalidValue(_))
        ));
        assert!(matches!(
            manager.collect(&mut settlement, weth(), alice(), U256::from(11), Funding::Value(U256::from(10))),
            Err(DexError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_price_falls_back_to_spot() {
        let (mut manager, ledger) = setup();
        let mut settlement = Settlement::new(custody());

        manager
            .add_liquidity(alice(), &deposit(10 * E18, 20_000_000), Funding::Allowance, &mut settlement)
            .unwrap();
        manager.create_order_book(&ledger, eth(), usdc()).unwrap();

        assert_eq!(manager.get_price(eth(), usdc()).unwrap(), Price::from_u128(2_000_000));
        assert!(matches!(manager.get_price(eth(), weth()), Err(DexError::NotFound(_))));
    }
}
