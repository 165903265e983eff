//! Property-based tests for pool, book and routing invariants.

use dex::{
    AddLiquidity, Address, DexConfig, Funding, MemoryLedger, OrderBook, OrderSide, PoolManager,
    Price, ReservePair, Settlement, U256,
};
use proptest::prelude::*;
use std::sync::Arc;

fn token(n: u8) -> Address {
    Address::repeat_byte(n)
}

fn custody() -> Address {
    Address::repeat_byte(0xCC)
}

fn lp() -> Address {
    Address::repeat_byte(0xA1)
}

fn seed(manager: &mut PoolManager, a: Address, b: Address, ra: u128, rb: u128) {
    let params = AddLiquidity {
        token_a: a,
        token_b: b,
        amount_a_desired: U256::from(ra),
        amount_b_desired: U256::from(rb),
        amount_a_min: U256::ZERO,
        amount_b_min: U256::ZERO,
        to: lp(),
    };
    let mut settlement = Settlement::new(custody());
    let Ok(_) = manager.add_liquidity(lp(), &params, Funding::Allowance, &mut settlement) else {
        panic!("seed liquidity");
    };
}

const E15: u128 = 1_000_000_000_000_000;
const E18: u128 = 1_000_000_000_000_000_000;

/// A 1000/2000 pool with a book on top: asks from 2.000 and bids up to
/// 1.999 quote per base, in 0.001 steps, straddling the pool's marginal
/// prices of about 2.006 to buy and 1.994 to sell.
fn hybrid_market(asks: &[(u128, u128)], bids: &[(u128, u128)]) -> (PoolManager, Address, Address) {
    let (base, quote) = (token(1), token(2));
    let mut ledger = MemoryLedger::new();
    ledger.register_token(base, "BASE", 18);
    ledger.register_token(quote, "QUOTE", 18);

    let mut manager = PoolManager::new(Arc::new(DexConfig::default()), custody());
    seed(&mut manager, base, quote, 1000 * E18, 2000 * E18);
    let Ok(_) = manager.create_order_book(&ledger, base, quote) else {
        panic!("create book");
    };

    let maker = Address::repeat_byte(0xB1);
    let mut settlement = Settlement::new(custody());
    let orders = asks
        .iter()
        .map(|&(tick, size)| (OrderSide::Sell, 2000 * E15 + tick * E15, size * E18))
        .chain(bids.iter().map(|&(tick, size)| (OrderSide::Buy, 1990 * E15 + tick * E15, size * 2 * E18)));
    for (side, price, amount) in orders {
        let placed = manager.place_limit_order(
            maker,
            base,
            quote,
            side,
            Price::from_u128(price),
            U256::from(amount),
            maker,
            Funding::Allowance,
            &mut settlement,
        );
        let Ok(_) = placed else {
            panic!("seed order");
        };
    }
    (manager, base, quote)
}

/// A fraction in thousandths of `reserve`, never zero.
fn share(reserve: u128, per_mille: u128) -> u128 {
    reserve / 1000 * per_mille + 1
}

proptest! {
    #[test]
    fn prop_swap_never_decreases_k(
        r0 in 1_000_000u128..1_000_000_000_000_000_000_000_000_000,
        r1 in 1_000_000u128..1_000_000_000_000_000_000_000_000_000,
        amount_in in 1u128..1_000_000_000_000_000_000_000_000_000,
        zero_for_one in any::<bool>(),
    ) {
        let mut pair = ReservePair::new(Address::repeat_byte(0x50), token(1), token(2)).unwrap();
        pair.mint(lp(), U256::from(r0), U256::from(r1)).unwrap();
        let token_in = if zero_for_one { pair.token0 } else { pair.token1 };
        let (reserve_in, reserve_out) = pair.reserves_for(token_in).unwrap();

        let amount_in = U256::from(amount_in);
        let amount_out = dex::pair::get_amount_out(amount_in, reserve_in, reserve_out, 30).unwrap();
        prop_assume!(!amount_out.is_zero());

        let k_before = pair.reserve0 * pair.reserve1;
        pair.swap(token_in, amount_in, amount_out, 30).unwrap();
        prop_assert!(pair.reserve0 * pair.reserve1 >= k_before);

        // One more unit of output must be rejected
        let mut greedy = pair.clone();
        let (reserve_in, reserve_out) = greedy.reserves_for(token_in).unwrap();
        let out = dex::pair::get_amount_out(amount_in, reserve_in, reserve_out, 30).unwrap();
        prop_assert!(greedy.swap(token_in, amount_in, out + U256::from(1), 30).is_err());
    }

    #[test]
    fn prop_book_never_crossed(
        orders in prop::collection::vec(
            (any::<bool>(), 1u128..=40, 1u128..=5_000, 1u128..=10_000),
            1..40,
        ),
    ) {
        let (eth, usdc) = (token(1), token(2));
        let mut book = OrderBook::new(Address::repeat_byte(0x60), eth, usdc, 18, 6).unwrap();

        for (is_buy, tick, size, scale) in orders {
            let side = if is_buy { OrderSide::Buy } else { OrderSide::Sell };
            // Prices in 0.05 USDC steps, sizes up to 5000 ETH or its quote value
            let price = Price::from_u128(tick * 50_000);
            let amount = match side {
                OrderSide::Buy => U256::from(size * scale * 100),
                OrderSide::Sell => U256::from(size * scale) * U256::from(100_000_000_000_000u128),
            };
            let mut settlement = Settlement::new(custody());
            if let Ok(placed) = book.place_limit(lp(), lp(), side, price, amount, &mut settlement) {
                prop_assert_eq!(placed.amount_in + placed.resting + placed.refunded, amount);
            }
            prop_assert!(!book.is_crossed());
        }
    }

    #[test]
    fn prop_single_hop_round_trip(
        r0 in 1_000_000u128..1_000_000_000_000_000_000_000_000,
        r1 in 1_000_000u128..1_000_000_000_000_000_000_000_000,
        per_mille in 1u128..=1000,
    ) {
        let (a, b) = (token(1), token(2));
        let mut manager = PoolManager::new(Arc::new(DexConfig::default()), custody());
        seed(&mut manager, a, b, r0, r1);

        let amount_in = U256::from(share(r0, per_mille));
        let out = manager.get_amounts_out(amount_in, &[a, b]).unwrap();
        prop_assume!(!out.amount_out().is_zero());

        let back = manager.get_amounts_in(out.amount_out(), &[a, b]).unwrap();
        prop_assert!(back.amount_in() >= amount_in);
        let replay = manager.get_amounts_out(back.amount_in(), &[a, b]).unwrap();
        prop_assert!(replay.amount_out() >= out.amount_out());
    }

    #[test]
    fn prop_two_hop_round_trip(
        ra in 1_000_000u128..1_000_000_000_000_000_000_000_000,
        rb in 1_000_000u128..1_000_000_000_000_000_000_000_000,
        rb2 in 1_000_000u128..1_000_000_000_000_000_000_000_000,
        rc in 1_000_000u128..1_000_000_000_000_000_000_000_000,
        per_mille in 1u128..=1000,
    ) {
        let (a, b, c) = (token(1), token(2), token(3));
        let mut manager = PoolManager::new(Arc::new(DexConfig::default()), custody());
        seed(&mut manager, a, b, ra, rb);
        seed(&mut manager, b, c, rb2, rc);
        let path = [a, b, c];

        let amount_in = U256::from(share(ra, per_mille));
        let Ok(out) = manager.get_amounts_out(amount_in, &path) else {
            // Middle amount rounded to zero
            return Ok(());
        };
        prop_assume!(!out.amount_out().is_zero());

        let back = manager.get_amounts_in(out.amount_out(), &path).unwrap();
        prop_assert!(back.amount_in() >= amount_in);
        let replay = manager.get_amounts_out(back.amount_in(), &path).unwrap();
        prop_assert!(replay.amount_out() >= out.amount_out());

        // The swap itself spends no more than the input that produced the output
        let mut settlement = Settlement::new(custody());
        let amounts = manager
            .swap_exact_out(lp(), out.amount_out(), amount_in, &path, lp(), Funding::Allowance, &mut settlement)
            .unwrap();
        prop_assert!(amounts[0] <= amount_in);
        prop_assert!(amounts[2] >= out.amount_out());
    }

    #[test]
    fn prop_hybrid_hop_round_trip(
        asks in prop::collection::vec((0u128..=20, 1u128..=5), 0..6),
        bids in prop::collection::vec((0u128..=9, 1u128..=5), 0..6),
        tenths in 1u128..=200,
        odd in 0u128..1_000_000,
        buy_base in any::<bool>(),
    ) {
        let (manager, base, quote) = hybrid_market(&asks, &bids);
        let path = if buy_base { [quote, base] } else { [base, quote] };
        let amount_in = U256::from(tenths * E18 / 10 + odd);

        let out = manager.get_amounts_out(amount_in, &path).unwrap();
        prop_assert!(!out.amount_out().is_zero());

        let back = manager.get_amounts_in(out.amount_out(), &path).unwrap();
        prop_assert!(back.amount_in() >= amount_in);
        let replay = manager.get_amounts_out(back.amount_in(), &path).unwrap();
        prop_assert!(replay.amount_out() >= out.amount_out());

        // Executing the exact-input quote on live state reproduces it
        let mut live = manager.clone();
        let mut settlement = Settlement::new(custody());
        let amounts = live
            .swap_exact_in(lp(), amount_in, out.amount_out(), &path, lp(), Funding::Allowance, &mut settlement)
            .unwrap();
        prop_assert_eq!(&amounts, &out.amounts);
        prop_assert!(!live.book(base, quote).unwrap().is_crossed());

        // The exact-output swap never spends more than that input
        let mut live = manager.clone();
        let mut settlement = Settlement::new(custody());
        let amounts = live
            .swap_exact_out(lp(), out.amount_out(), amount_in, &path, lp(), Funding::Allowance, &mut settlement)
            .unwrap();
        prop_assert!(amounts[0] <= amount_in);
        prop_assert!(amounts[1] >= out.amount_out());
        prop_assert!(!live.book(base, quote).unwrap().is_crossed());
    }
}
