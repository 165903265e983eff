//! Hybrid routing: order book first, then the pool, hop by hop.
//!
//! For each hop the pair's book (if any) is consumed first, limited to levels
//! priced at least as well as the pool's fee-adjusted marginal price, and the
//! remainder goes through the pool. Quotes and execution share
//! [`PoolManager::plan_hop`], so a quote is exactly what executing it on the
//! same state would do.

use crate::error::{DexError, ErrorKind, Result};
use crate::orderbook::{MovePrice, OrderBook, PriceBound, TakePlan};
use crate::pair::{get_amount_out, ReservePair};
use crate::pool_manager::PoolManager;
use crate::types::{Amount, TokenId, U256};
use std::collections::HashSet;
use tracing::debug;

/// Liquidity split of a single hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteHop {
    /// The input token for this hop.
    pub token_in: TokenId,
    /// The output token for this hop.
    pub token_out: TokenId,
    /// Input consumed by the order book.
    pub ob_in: Amount,
    /// Output received from the order book.
    pub ob_out: Amount,
    /// Input routed through the pool.
    pub amm_in: Amount,
    /// Output received from the pool.
    pub amm_out: Amount,
}

impl RouteHop {
    fn new(token_in: TokenId, token_out: TokenId) -> Self {
        Self {
            token_in,
            token_out,
            ob_in: U256::ZERO,
            ob_out: U256::ZERO,
            amm_in: U256::ZERO,
            amm_out: U256::ZERO,
        }
    }

    pub fn amount_in(&self) -> Amount {
        self.ob_in.saturating_add(self.amm_in)
    }

    pub fn amount_out(&self) -> Amount {
        self.ob_out.saturating_add(self.amm_out)
    }
}

/// A hop's split together with the book fills that realize it.
#[derive(Debug, Clone)]
pub(crate) struct HopPlan {
    pub hop: RouteHop,
    pub book_plan: Option<TakePlan>,
}

/// A quote along one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    /// Amount at every token of the path.
    pub amounts: Vec<Amount>,
    pub hops: Vec<RouteHop>,
}

impl Quote {
    pub fn amount_in(&self) -> Amount {
        self.amounts.first().copied().unwrap_or_default()
    }

    pub fn amount_out(&self) -> Amount {
        self.amounts.last().copied().unwrap_or_default()
    }

    /// Per-hop breakdown, four entries per hop: `[ob_in, ob_out, amm_in, amm_out]`.
    pub fn extra(&self) -> Vec<Amount> {
        self.hops
            .iter()
            .flat_map(|hop| [hop.ob_in, hop.ob_out, hop.amm_in, hop.amm_out])
            .collect()
    }
}

/// Winner of a best-execution query over candidate paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestRoute {
    /// Index of the winning candidate.
    pub index: usize,
    pub path: Vec<TokenId>,
    pub quote: Quote,
}

/// Split a concatenation of candidate paths by their token counts.
pub fn split_paths<'a>(paths: &'a [TokenId], hops: &[usize], max_variants: usize) -> Result<Vec<&'a [TokenId]>> {
    if hops.is_empty() {
        return Err(DexError::InvalidPath("no candidate paths".to_string()));
    }
    if hops.len() > max_variants {
        return Err(DexError::InvalidPath(format!(
            "{} candidates exceed the limit of {max_variants}",
            hops.len()
        )));
    }
    let total = hops.iter().try_fold(0usize, |acc, len| acc.checked_add(*len));
    if total != Some(paths.len()) {
        return Err(DexError::InvalidPath(format!(
            "path lengths do not cover {} tokens",
            paths.len()
        )));
    }
    let mut rest = paths;
    let mut candidates = Vec::with_capacity(hops.len());
    for &len in hops {
        let (candidate, tail) = rest.split_at(len);
        candidates.push(candidate);
        rest = tail;
    }
    Ok(candidates)
}

fn is_shortfall(err: &DexError) -> bool {
    matches!(err.kind(), ErrorKind::InsufficientLiquidity) || matches!(err, DexError::Overflow(_))
}

impl PoolManager {
    /// Paths need 2..=max_hops+1 tokens and may not revisit a token.
    pub fn validate_path(&self, path: &[TokenId]) -> Result<()> {
        let max_tokens = self.config().max_routing_hops().saturating_add(1);
        if path.len() < 2 || path.len() > max_tokens {
            return Err(DexError::InvalidPath(format!(
                "{} tokens, expected 2..={max_tokens}",
                path.len()
            )));
        }
        let mut seen = HashSet::with_capacity(path.len());
        if let Some(repeated) = path.iter().find(|token| !seen.insert(**token)) {
            return Err(DexError::InvalidPath(format!("token {repeated} repeated")));
        }
        Ok(())
    }

    /// Reserves of the `token_a`/`token_b` pair, in argument order.
    pub fn get_reserves(&self, token_a: TokenId, token_b: TokenId) -> Result<(Amount, Amount)> {
        let pair = self
            .pair(token_a, token_b)
            .ok_or_else(|| DexError::NotFound(format!("pair {token_a}/{token_b}")))?;
        pair.reserves_for(token_a)
    }

    /// Book levels routing may take: those at least as good as the pool's
    /// fee-adjusted marginal price.
    fn routing_bound(&self, pair: &ReservePair, book: &OrderBook) -> Result<PriceBound> {
        let (reserve_base, reserve_quote) = pair.reserves_for(book.base)?;
        Ok(PriceBound::marginal(reserve_base, reserve_quote, self.fee_bps()))
    }

    fn routed_book(&self, token_in: TokenId, token_out: TokenId) -> Result<(&OrderBook, PriceBound)> {
        let pair = self
            .pair(token_in, token_out)
            .ok_or_else(|| DexError::NotFound(format!("pair {token_in}/{token_out}")))?;
        let book = self.existing_book(token_in, token_out)?;
        Ok((book, self.routing_bound(pair, book)?))
    }

    /// What the `token_in`/`token_out` book gives for `amount_in_offer`
    /// before its price reaches the pool's marginal price.
    pub fn get_amount_out_for_move_price(
        &self,
        token_in: TokenId,
        token_out: TokenId,
        amount_in_offer: Amount,
    ) -> Result<MovePrice> {
        let (book, bound) = self.routed_book(token_in, token_out)?;
        book.amount_out_for_move_price(token_in, amount_in_offer, bound)
    }

    /// What the `token_in`/`token_out` book needs to give `amount_out_offer`
    /// before its price reaches the pool's marginal price.
    pub fn get_amount_in_for_move_price(
        &self,
        token_in: TokenId,
        token_out: TokenId,
        amount_out_offer: Amount,
    ) -> Result<MovePrice> {
        let (book, bound) = self.routed_book(token_in, token_out)?;
        book.amount_in_for_move_price(token_out, amount_out_offer, bound)
    }

    /// Split `amount_in` of one hop between the book and the pool.
    pub(crate) fn plan_hop(&self, token_in: TokenId, token_out: TokenId, amount_in: Amount) -> Result<HopPlan> {
        if amount_in.is_zero() {
            return Err(DexError::InvalidAmount);
        }
        let pair = self
            .pair(token_in, token_out)
            .ok_or_else(|| DexError::NotFound(format!("pair {token_in}/{token_out}")))?;
        let (reserve_in, reserve_out) = pair.reserves_for(token_in)?;
        let fee_bps = self.fee_bps();

        let mut hop = RouteHop::new(token_in, token_out);
        let mut book_plan = None;
        if let Some(book) = self.book(token_in, token_out) {
            let side = book
                .taker_side(token_in)
                .ok_or_else(|| DexError::InvalidPath(format!("{token_in} not traded by {}", book.address)))?;
            let plan = book.plan_take(side, amount_in, self.routing_bound(pair, book)?)?;
            hop.ob_in = plan.amount_in;
            hop.ob_out = plan.amount_out;
            if !plan.is_empty() {
                book_plan = Some(plan);
            }
        }

        let rest = amount_in - hop.ob_in;
        if !rest.is_zero() {
            if !pair.has_liquidity() {
                return Err(DexError::InsufficientLiquidity);
            }
            hop.amm_in = rest;
            hop.amm_out = get_amount_out(rest, reserve_in, reserve_out, fee_bps)?;
        }
        Ok(HopPlan { hop, book_plan })
    }

    /// Output of `amount_in` along `path`, or `None` when the path cannot
    /// absorb that input.
    fn path_output(&self, amount_in: Amount, path: &[TokenId]) -> Result<Option<Amount>> {
        let mut current = amount_in;
        for pair in path.windows(2) {
            if current.is_zero() {
                return Ok(None);
            }
            match self.plan_hop(pair[0], pair[1], current) {
                Ok(plan) => current = plan.hop.amount_out(),
                Err(err) if is_shortfall(&err) => return Ok(None),
                Err(err) => return Err(err),
            }
        }
        Ok(Some(current))
    }

    fn path_produces(&self, amount_in: Amount, path: &[TokenId], target: Amount) -> Result<bool> {
        Ok(matches!(self.path_output(amount_in, path)?, Some(out) if out >= target))
    }

    /// Smallest input whose output along `path` is at least `amount_out`,
    /// or `None` when no input reaches it.
    fn min_path_input(&self, amount_out: Amount, path: &[TokenId]) -> Result<Option<Amount>> {
        let two = U256::from(2);
        let mut high = U256::from(1);
        while !self.path_produces(high, path, amount_out)? {
            match high.checked_mul(two) {
                Some(next) => high = next,
                None => return Ok(None),
            }
        }
        let mut low = high / two;
        // `low` never produces enough, `high` always does
        while low + U256::from(1) < high {
            let mid = low + (high - low) / two;
            if self.path_produces(mid, path, amount_out)? {
                high = mid;
            } else {
                low = mid;
            }
        }
        Ok(Some(high))
    }

    /// Largest input, starting from the absorbed input `from`, that `path`
    /// still absorbs.
    fn max_path_input(&self, from: Amount, path: &[TokenId]) -> Result<Amount> {
        let two = U256::from(2);
        let mut low = from;
        let mut high = U256::MAX;
        loop {
            let Some(next) = low.checked_mul(two) else {
                if self.path_output(U256::MAX, path)?.is_some() {
                    return Ok(U256::MAX);
                }
                break;
            };
            if self.path_output(next, path)?.is_none() {
                high = next;
                break;
            }
            low = next;
        }
        // `low` is absorbed, `high` is not
        while low + U256::from(1) < high {
            let mid = low + (high - low) / two;
            if self.path_output(mid, path)?.is_some() {
                low = mid;
            } else {
                high = mid;
            }
        }
        Ok(low)
    }

    /// Inputs `(minimal, widest)` whose output along `path` is exactly
    /// `amount_out`, or at least it for the minimal one.
    ///
    /// The widest is `pre(y + 1) - 1` over the whole path. When no input
    /// reaches `y + 1` the output is saturated and the widest is the largest
    /// input the path absorbs.
    fn exact_out_range(&self, amount_out: Amount, path: &[TokenId]) -> Result<(Amount, Amount)> {
        let minimal = self
            .min_path_input(amount_out, path)?
            .ok_or(DexError::InsufficientLiquidity)?;
        let next = match amount_out.checked_add(U256::from(1)) {
            Some(next) => self.min_path_input(next, path)?,
            None => None,
        };
        let widest = match next {
            Some(next_minimal) => next_minimal - U256::from(1),
            None => self.max_path_input(minimal, path)?,
        };
        Ok((minimal, widest.max(minimal)))
    }

    /// Smallest input along `path` whose exact-input swap yields at least
    /// `amount_out`. This is what an exact-output swap spends.
    pub fn min_amount_in(&self, amount_out: Amount, path: &[TokenId]) -> Result<Amount> {
        self.validate_path(path)?;
        if amount_out.is_zero() {
            return Err(DexError::InvalidAmount);
        }
        self.min_path_input(amount_out, path)?
            .ok_or(DexError::InsufficientLiquidity)
    }

    fn quote_exact_out(&self, amount_out: Amount, path: &[TokenId]) -> Result<(Amount, Quote)> {
        self.validate_path(path)?;
        if amount_out.is_zero() {
            return Err(DexError::InvalidAmount);
        }
        let (minimal, widest) = self.exact_out_range(amount_out, path)?;
        let quote = self.get_amounts_out(widest, path)?;
        debug!(%minimal, amounts = ?quote.amounts, "amounts in quoted");
        Ok((minimal, quote))
    }

    /// Quote an exact input along `path`.
    pub fn get_amounts_out(&self, amount_in: Amount, path: &[TokenId]) -> Result<Quote> {
        self.validate_path(path)?;
        if amount_in.is_zero() {
            return Err(DexError::InvalidAmount);
        }

        let mut amounts = Vec::with_capacity(path.len());
        let mut hops = Vec::with_capacity(path.len() - 1);
        amounts.push(amount_in);
        let mut current = amount_in;
        for pair in path.windows(2) {
            if current.is_zero() {
                return Err(DexError::InsufficientLiquidity);
            }
            let hop = self.plan_hop(pair[0], pair[1], current)?.hop;
            current = hop.amount_out();
            amounts.push(current);
            hops.push(hop);
        }
        debug!(?amounts, "amounts out quoted");
        Ok(Quote { amounts, hops })
    }

    /// Quote the input needed for an exact output along `path`.
    ///
    /// Returns the widest input whose output is exactly `amount_out`, with
    /// the amounts of replaying it forward, so quoting the output of any
    /// exact-input swap never returns less than that swap's input. An
    /// exact-output swap spends the low end of that range, see
    /// [`PoolManager::min_amount_in`].
    pub fn get_amounts_in(&self, amount_out: Amount, path: &[TokenId]) -> Result<Quote> {
        self.quote_exact_out(amount_out, path).map(|(_, quote)| quote)
    }

    /// Among the candidate paths, the one where an exact-output swap for
    /// `amount_out` spends the least. Failing candidates are skipped.
    pub fn get_best_amounts_in(&self, amount_out: Amount, paths: &[TokenId], hops: &[usize]) -> Result<BestRoute> {
        let candidates = split_paths(paths, hops, self.config().max_path_variants())?;
        let mut best: Option<(Amount, BestRoute)> = None;
        for (index, path) in candidates.into_iter().enumerate() {
            let (spent, quote) = match self.quote_exact_out(amount_out, path) {
                Ok(quoted) => quoted,
                Err(err) => {
                    debug!(index, %err, "candidate path skipped");
                    continue;
                }
            };
            match &best {
                Some((current, _)) if spent >= *current => {}
                _ => {
                    best = Some((
                        spent,
                        BestRoute {
                            index,
                            path: path.to_vec(),
                            quote,
                        },
                    ))
                }
            }
        }
        best.map(|(_, route)| route).ok_or(DexError::InsufficientLiquidity)
    }

    /// Among the candidate paths, the one yielding the most output for
    /// `amount_in`. Failing candidates are skipped.
    pub fn get_best_amounts_out(&self, amount_in: Amount, paths: &[TokenId], hops: &[usize]) -> Result<BestRoute> {
        let candidates = split_paths(paths, hops, self.config().max_path_variants())?;
        let mut best: Option<BestRoute> = None;
        for (index, path) in candidates.into_iter().enumerate() {
            let quote = match self.get_amounts_out(amount_in, path) {
                Ok(quote) => quote,
                Err(err) => {
                    debug!(index, %err, "candidate path skipped");
                    continue;
                }
            };
            match &best {
                Some(current) if quote.amount_out() <= current.quote.amount_out() => {}
                _ => {
                    best = Some(BestRoute {
                        index,
                        path: path.to_vec(),
                        quote,
                    })
                }
            }
        }
        best.ok_or(DexError::InsufficientLiquidity)
    }
}
