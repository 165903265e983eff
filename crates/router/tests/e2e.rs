//! End-to-end tests driving the facade with ABI calldata.

use alloy::primitives::{Address, FixedBytes, U256};
use alloy::sol_types::{SolCall, SolValue};
use dex::{DexConfig, ErrorKind, MemoryLedger, OrderId, SharedConfig, TokenLedger};
use hybrid_router::{
    CallContext, CallOutput, HybridRouter, IHybridRouter, Operation, RouterError, StandardBackends,
};
use std::sync::Arc;

const NOW: u64 = 1_000;

fn deadline() -> U256 {
    U256::from(2_000)
}

// Token addresses for testing
fn eth() -> Address {
    Address::repeat_byte(0x01)
}

fn usdc() -> Address {
    Address::repeat_byte(0x02)
}

fn weth() -> Address {
    Address::repeat_byte(0xEE)
}

fn owner() -> Address {
    Address::repeat_byte(0x0A)
}

fn alice() -> Address {
    Address::repeat_byte(0xAA)
}

fn bob() -> Address {
    Address::repeat_byte(0xBB)
}

fn router_address() -> Address {
    Address::repeat_byte(0xD0)
}

fn backends() -> StandardBackends {
    StandardBackends {
        pair_router: Address::repeat_byte(0xB1),
        order_book_router: Address::repeat_byte(0xB2),
        pair_utils: Address::repeat_byte(0xB3),
    }
}

fn e18(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64.pow(18))
}

fn e6(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64.pow(6))
}

fn at(caller: Address) -> CallContext {
    CallContext::new(caller, NOW)
}

/// Deploy a facade without any function bindings.
fn deploy_unbound() -> (HybridRouter<MemoryLedger>, SharedConfig) {
    let config = SharedConfig::new(DexConfig::default().with_owner(owner()).with_weth(weth()));
    let mut ledger = MemoryLedger::new();
    ledger.register_token(eth(), "ETH", 18);
    ledger.register_token(usdc(), "USDC", 6);
    ledger.register_token(weth(), "WETH", 18);
    let router = HybridRouter::with_standard_modules(
        router_address(),
        Arc::new(config.clone()),
        ledger,
        backends(),
    );
    (router, config)
}

fn bind(router: &HybridRouter<MemoryLedger>, caller: Address, backend: Address, selectors: Vec<FixedBytes<4>>) -> Result<CallOutput, RouterError> {
    let calldata = IHybridRouter::bindFunctionsCall { backend, selectors }.abi_encode();
    router.call(&at(caller), &calldata)
}

/// Deploy a facade with every standard selector bound.
fn deploy() -> HybridRouter<MemoryLedger> {
    let (router, _) = deploy_unbound();
    for (backend, selectors) in backends().bindings() {
        bind(&router, owner(), backend, selectors).unwrap();
    }
    router
}

fn fund(router: &HybridRouter<MemoryLedger>, holder: Address, token: Address, amount: U256) {
    let mut ledger = router.ledger_mut();
    ledger.mint(token, holder, amount).unwrap();
    ledger.approve(token, holder, router_address(), U256::MAX).unwrap();
}

fn balance(router: &HybridRouter<MemoryLedger>, token: Address, holder: Address) -> U256 {
    router.ledger().balance_of(token, holder)
}

fn add_liquidity(router: &HybridRouter<MemoryLedger>, token_a: Address, token_b: Address, amount_a: U256, amount_b: U256) -> CallOutput {
    fund(router, owner(), token_a, amount_a);
    fund(router, owner(), token_b, amount_b);
    let call = IHybridRouter::addLiquidityCall {
        tokenA: token_a,
        tokenB: token_b,
        amountADesired: amount_a,
        amountBDesired: amount_b,
        amountAMin: U256::ZERO,
        amountBMin: U256::ZERO,
        to: owner(),
        deadline: deadline(),
    };
    router.call(&at(owner()), &call.abi_encode()).unwrap()
}

fn open_book(router: &HybridRouter<MemoryLedger>, base: Address, quote: Address) {
    let pair = IHybridRouter::createPairCall {
        tokenA: base,
        tokenB: quote,
        deadline: deadline(),
    };
    router.call(&at(owner()), &pair.abi_encode()).unwrap();
    let book = IHybridRouter::createOrderBookCall {
        baseToken: base,
        quoteToken: quote,
        deadline: deadline(),
    };
    router.call(&at(owner()), &book.abi_encode()).unwrap();
}

fn reserves(router: &HybridRouter<MemoryLedger>, token_a: Address, token_b: Address) -> (U256, U256) {
    let call = IHybridRouter::getReservesCall {
        tokenA: token_a,
        tokenB: token_b,
    };
    let out = router.call(&at(alice()), &call.abi_encode()).unwrap();
    <(U256, U256)>::abi_decode_params(&out.data).unwrap()
}

#[test]
fn test_unbound_selector_not_found() {
    let (router, _) = deploy_unbound();
    let call = IHybridRouter::getPairCall {
        tokenA: eth(),
        tokenB: usdc(),
    };

    let err = router.call(&at(alice()), &call.abi_encode()).unwrap_err();
    assert_eq!(
        err,
        RouterError::FunctionNotFound(IHybridRouter::getPairCall::SELECTOR)
    );
    assert_eq!(err.kind(), ErrorKind::FunctionNotFound);

    let err = router.call(&at(alice()), &[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
    assert_eq!(err, RouterError::FunctionNotFound([0xde, 0xad, 0xbe, 0xef]));
}

#[test]
fn test_bind_reads_owner_from_shared_config() {
    let (router, config) = deploy_unbound();
    let selectors = vec![FixedBytes(Operation::GetPair.selector())];

    let err = bind(&router, alice(), backends().pair_utils, selectors.clone()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    // Ownership change is visible to the facade without redeploying
    config.set_owner(alice());
    let out = bind(&router, alice(), backends().pair_utils, selectors).unwrap();
    assert_eq!(out.logs.len(), 1);
    assert_eq!(
        router.binding(Operation::GetPair.selector()),
        Some(backends().pair_utils)
    );
    assert!(bind(&router, owner(), backends().pair_utils, vec![]).is_err());
}

#[test]
fn test_rebind_overwrites_previous_backend() {
    let (router, _) = deploy_unbound();
    let selector = Operation::GetPair.selector();
    let call = IHybridRouter::getPairCall {
        tokenA: eth(),
        tokenB: usdc(),
    }
    .abi_encode();

    // Bound to a module that does not implement it
    bind(&router, owner(), backends().order_book_router, vec![FixedBytes(selector)]).unwrap();
    assert_eq!(
        router.call(&at(alice()), &call).unwrap_err(),
        RouterError::FunctionNotFound(selector)
    );

    // Bound to an address with no module
    bind(&router, owner(), Address::repeat_byte(0x99), vec![FixedBytes(selector)]).unwrap();
    assert_eq!(
        router.call(&at(alice()), &call).unwrap_err(),
        RouterError::FunctionNotFound(selector)
    );

    bind(&router, owner(), backends().pair_utils, vec![FixedBytes(selector)]).unwrap();
    let out = router.call(&at(alice()), &call).unwrap();
    let (pair,) = <(Address,)>::abi_decode_params(&out.data).unwrap();
    assert_eq!(pair, Address::ZERO);
}

#[test]
fn test_expired_deadline_rejected() {
    let router = deploy();
    fund(&router, alice(), eth(), e18(1));
    fund(&router, alice(), usdc(), e6(2000));

    let call = IHybridRouter::addLiquidityCall {
        tokenA: eth(),
        tokenB: usdc(),
        amountADesired: e18(1),
        amountBDesired: e6(2000),
        amountAMin: U256::ZERO,
        amountBMin: U256::ZERO,
        to: alice(),
        deadline: U256::from(NOW - 1),
    };
    let err = router.call(&at(alice()), &call.abi_encode()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Expired);
    assert!(router.state().pair(eth(), usdc()).is_none());
    assert_eq!(balance(&router, eth(), alice()), e18(1));
}

#[test]
fn test_limit_orders_through_facade() {
    let router = deploy();
    open_book(&router, eth(), usdc());

    fund(&router, alice(), usdc(), e6(2));
    let buy = IHybridRouter::buyWithTokenCall {
        amountOffer: e6(2),
        price: U256::from(2_000_000),
        baseToken: eth(),
        quoteToken: usdc(),
        to: alice(),
        deadline: deadline(),
    };
    let out = router.call(&at(alice()), &buy.abi_encode()).unwrap();
    let (order_id,) = <(U256,)>::abi_decode_params(&out.data).unwrap();
    assert_eq!(order_id, U256::from(1));
    assert_eq!(out.logs.len(), 1);

    fund(&router, bob(), eth(), e18(1));
    let sell = IHybridRouter::sellTokenCall {
        amountOffer: e18(1),
        price: U256::from(1_900_000),
        baseToken: eth(),
        quoteToken: usdc(),
        to: bob(),
        deadline: deadline(),
    };
    router.call(&at(bob()), &sell.abi_encode()).unwrap();

    assert_eq!(balance(&router, eth(), alice()), e18(1));
    assert_eq!(balance(&router, usdc(), bob()), e6(2));

    let price = IHybridRouter::getPriceCall {
        baseToken: eth(),
        quoteToken: usdc(),
    };
    let out = router.call(&at(alice()), &price.abi_encode()).unwrap();
    assert_eq!(<(U256,)>::abi_decode_params(&out.data).unwrap().0, U256::from(2_000_000));

    let book = IHybridRouter::getOrderBookCall {
        baseToken: eth(),
        quoteToken: usdc(),
        depth: U256::from(2),
    };
    let out = router.call(&at(alice()), &book.abi_encode()).unwrap();
    let (buy_prices, buy_amounts, sell_prices, sell_amounts, last) =
        <(Vec<U256>, Vec<U256>, Vec<U256>, Vec<U256>, U256)>::abi_decode_params(&out.data).unwrap();
    assert!(buy_prices.is_empty() && buy_amounts.is_empty());
    assert!(sell_prices.is_empty() && sell_amounts.is_empty());
    assert_eq!(last, U256::from(2_000_000));
}

#[test]
fn test_cancel_and_transfer_order() {
    let router = deploy();
    open_book(&router, eth(), usdc());

    fund(&router, alice(), eth(), e18(2));
    let sell = IHybridRouter::sellTokenCall {
        amountOffer: e18(2),
        price: U256::from(2_500_000),
        baseToken: eth(),
        quoteToken: usdc(),
        to: alice(),
        deadline: deadline(),
    };
    router.call(&at(alice()), &sell.abi_encode()).unwrap();

    let cancel = IHybridRouter::cancelOrderCall {
        baseToken: eth(),
        quoteToken: usdc(),
        orderId: U256::from(1),
        deadline: deadline(),
    }
    .abi_encode();
    let err = router.call(&at(bob()), &cancel).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    let transfer = IHybridRouter::transferOrderCall {
        baseToken: eth(),
        quoteToken: usdc(),
        to: bob(),
        orderId: U256::from(1),
        deadline: deadline(),
    };
    router.call(&at(alice()), &transfer.abi_encode()).unwrap();

    let orders = IHybridRouter::getUserOrdersCall {
        baseToken: eth(),
        quoteToken: usdc(),
        user: bob(),
    };
    let out = router.call(&at(bob()), &orders.abi_encode()).unwrap();
    assert_eq!(<(Vec<U256>,)>::abi_decode_params(&out.data).unwrap().0, vec![U256::from(1)]);

    // Refund goes to the beneficiary, not the new holder
    let out = router.call(&at(bob()), &cancel).unwrap();
    assert_eq!(<(U256,)>::abi_decode_params(&out.data).unwrap().0, e18(2));
    assert_eq!(balance(&router, eth(), alice()), e18(2));
    assert_eq!(balance(&router, eth(), bob()), U256::ZERO);

    let err = router.call(&at(bob()), &cancel).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyFilled);
}

#[test]
fn test_swap_matches_quote() {
    let router = deploy();
    add_liquidity(&router, eth(), usdc(), e18(10), e6(20_000));
    let path = vec![eth(), usdc()];

    let quote = IHybridRouter::getAmountsOutCall {
        amountIn: e18(1),
        path: path.clone(),
    };
    let out = router.call(&at(alice()), &quote.abi_encode()).unwrap();
    let (quoted, extra) = <(Vec<U256>, Vec<U256>)>::abi_decode_params(&out.data).unwrap();
    assert_eq!(extra.len(), 4);
    assert_eq!(extra[2], e18(1));

    fund(&router, alice(), eth(), e18(1));
    let swap = IHybridRouter::swapExactTokensForTokensCall {
        amountIn: e18(1),
        amountOutMin: quoted[1],
        path,
        to: bob(),
        deadline: deadline(),
    };
    let out = router.call(&at(alice()), &swap.abi_encode()).unwrap();
    let (amounts,) = <(Vec<U256>,)>::abi_decode_params(&out.data).unwrap();
    assert_eq!(amounts, quoted);
    assert_eq!(balance(&router, usdc(), bob()), quoted[1]);

    let (reserve_eth, reserve_usdc) = reserves(&router, eth(), usdc());
    assert_eq!(reserve_eth, e18(11));
    assert_eq!(reserve_usdc, e6(20_000) - quoted[1]);
}

#[test]
fn test_failed_call_leaves_no_trace() {
    let router = deploy();
    add_liquidity(&router, eth(), usdc(), e18(10), e6(20_000));
    let before = reserves(&router, eth(), usdc());
    fund(&router, alice(), eth(), e18(1));

    // Output below the minimum
    let swap = IHybridRouter::swapExactTokensForTokensCall {
        amountIn: e18(1),
        amountOutMin: e6(5_000),
        path: vec![eth(), usdc()],
        to: alice(),
        deadline: deadline(),
    };
    let err = router.call(&at(alice()), &swap.abi_encode()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SlippageExceeded);
    assert_eq!(reserves(&router, eth(), usdc()), before);
    assert_eq!(balance(&router, eth(), alice()), e18(1));

    // Funds without allowance: the pull fails after state was updated
    router.ledger_mut().mint(eth(), bob(), e18(1)).unwrap();
    let swap = IHybridRouter::swapExactTokensForTokensCall {
        amountIn: e18(1),
        amountOutMin: U256::ZERO,
        path: vec![eth(), usdc()],
        to: bob(),
        deadline: deadline(),
    };
    let err = router.call(&at(bob()), &swap.abi_encode()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransferFailed);
    assert_eq!(reserves(&router, eth(), usdc()), before);
    assert_eq!(balance(&router, eth(), bob()), e18(1));
    assert_eq!(balance(&router, usdc(), bob()), U256::ZERO);
}

fn book_state(router: &HybridRouter<MemoryLedger>) -> (Vec<U256>, Vec<U256>, U256) {
    let call = IHybridRouter::getOrderBookCall {
        baseToken: eth(),
        quoteToken: usdc(),
        depth: U256::from(5),
    };
    let out = router.call(&at(alice()), &call.abi_encode()).unwrap();
    let (_, _, sell_prices, sell_amounts, price) =
        <(Vec<U256>, Vec<U256>, Vec<U256>, Vec<U256>, U256)>::abi_decode_params(&out.data).unwrap();
    (sell_prices, sell_amounts, price)
}

#[test]
fn test_failed_pull_undoes_partial_match() {
    let router = deploy();
    open_book(&router, eth(), usdc());

    fund(&router, alice(), eth(), e18(2));
    let sell = IHybridRouter::sellTokenCall {
        amountOffer: e18(2),
        price: U256::from(2_000_000),
        baseToken: eth(),
        quoteToken: usdc(),
        to: alice(),
        deadline: deadline(),
    };
    router.call(&at(alice()), &sell.abi_encode()).unwrap();
    let before = book_state(&router);
    assert_eq!(before.1, vec![e18(2)]);

    // Bob holds USDC but never approved the router; his buy would take half the ask
    router.ledger_mut().mint(usdc(), bob(), e6(2)).unwrap();
    let buy = IHybridRouter::buyWithTokenCall {
        amountOffer: e6(2),
        price: U256::from(2_000_000),
        baseToken: eth(),
        quoteToken: usdc(),
        to: bob(),
        deadline: deadline(),
    };
    let err = router.call(&at(bob()), &buy.abi_encode()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransferFailed);

    assert_eq!(book_state(&router), before);
    {
        let state = router.state();
        let book = state.book(eth(), usdc()).unwrap();
        assert_eq!(book.get_order(OrderId(1)).unwrap().amount_remaining, e18(2));
        assert!(book.get_order(OrderId(2)).is_none());
    }
    assert_eq!(balance(&router, usdc(), bob()), e6(2));
    assert_eq!(balance(&router, eth(), bob()), U256::ZERO);
    assert_eq!(balance(&router, usdc(), alice()), U256::ZERO);
    assert_eq!(balance(&router, eth(), router_address()), e18(2));
    assert_eq!(balance(&router, usdc(), router_address()), U256::ZERO);

    // With an allowance the same buy goes through against the untouched ask
    fund(&router, bob(), usdc(), U256::ZERO);
    router.call(&at(bob()), &buy.abi_encode()).unwrap();
    assert_eq!(balance(&router, eth(), bob()), e18(1));
    assert_eq!(book_state(&router).1, vec![e18(1)]);
}

#[test]
fn test_native_value_entry_points() {
    let router = deploy();
    fund(&router, alice(), weth(), e18(11));
    fund(&router, alice(), usdc(), e6(20_000));

    let add = IHybridRouter::addLiquidityETHCall {
        token: usdc(),
        amountTokenDesired: e6(20_000),
        amountTokenMin: U256::ZERO,
        amountETHMin: U256::ZERO,
        to: alice(),
        deadline: deadline(),
    };
    let out = router
        .call(&at(alice()).with_value(e18(10)), &add.abi_encode())
        .unwrap();
    let (amount_token, amount_eth, _) = <(U256, U256, U256)>::abi_decode_params(&out.data).unwrap();
    assert_eq!(amount_token, e6(20_000));
    assert_eq!(amount_eth, e18(10));
    assert_eq!(balance(&router, weth(), alice()), e18(1));

    let swap = IHybridRouter::swapExactETHForTokensCall {
        amountOutMin: U256::from(1),
        path: vec![weth(), usdc()],
        to: bob(),
        deadline: deadline(),
    };
    let out = router
        .call(&at(alice()).with_value(e18(1)), &swap.abi_encode())
        .unwrap();
    let (amounts,) = <(Vec<U256>,)>::abi_decode_params(&out.data).unwrap();
    assert_eq!(amounts[0], e18(1));
    assert_eq!(balance(&router, usdc(), bob()), amounts[1]);
    assert_eq!(balance(&router, weth(), alice()), U256::ZERO);

    // Value attached to a non-payable entry point
    let get_pair = IHybridRouter::getPairCall {
        tokenA: weth(),
        tokenB: usdc(),
    };
    let err = router
        .call(&at(alice()).with_value(U256::from(1)), &get_pair.abi_encode())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_best_amounts_skip_missing_routes() {
    let router = deploy();
    add_liquidity(&router, eth(), weth(), e18(10), e18(10));
    add_liquidity(&router, weth(), usdc(), e18(10), e6(20_000));

    // Candidate 0 has no pool; candidate 1 bridges through weth
    let call = IHybridRouter::getBestAmountsInCall {
        amountOut: e6(100),
        paths: vec![eth(), usdc(), eth(), weth(), usdc()],
        hopFlags: vec![U256::from(2), U256::from(3)],
    };
    let out = router.call(&at(alice()), &call.abi_encode()).unwrap();
    let (path, amounts, extra) =
        <(Vec<Address>, Vec<U256>, Vec<U256>)>::abi_decode_params(&out.data).unwrap();
    assert_eq!(path, vec![eth(), weth(), usdc()]);
    assert_eq!(amounts.len(), 3);
    assert_eq!(amounts[2], e6(100));
    assert_eq!(extra.len(), 8);

    let bad = IHybridRouter::getBestAmountsInCall {
        amountOut: e6(100),
        paths: vec![eth(), usdc()],
        hopFlags: vec![U256::from(2)],
    };
    let err = router.call(&at(alice()), &bad.abi_encode()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientLiquidity);
}
