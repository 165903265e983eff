//! Router ABI bindings and the selector table.

use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IHybridRouter {
        event PairCreated(address indexed token0, address indexed token1, address pair, uint256 allPairs);
        event OrderBookCreated(address indexed base, address indexed quote, address book);
        event LiquidityAdded(address indexed pair, address indexed to, uint256 amountA, uint256 amountB, uint256 liquidity);
        event LiquidityRemoved(address indexed pair, address indexed to, uint256 amountA, uint256 amountB, uint256 liquidity);
        event Swap(address indexed sender, address indexed tokenIn, address indexed tokenOut, uint256 amountIn, uint256 amountOut, address to);
        event LimitOrderPlaced(address indexed book, uint256 indexed orderId, address indexed owner, bool isBuy, uint256 price, uint256 amount, uint256 resting);
        event OrderCancelled(address indexed book, uint256 indexed orderId, uint256 refunded);
        event OrderTransferred(address indexed book, uint256 indexed orderId, address from, address to);
        event FunctionsBound(address indexed backend, bytes4[] selectors);

        function addLiquidity(address tokenA, address tokenB, uint256 amountADesired, uint256 amountBDesired, uint256 amountAMin, uint256 amountBMin, address to, uint256 deadline) external returns (uint256 amountA, uint256 amountB, uint256 liquidity);
        function addLiquidityETH(address token, uint256 amountTokenDesired, uint256 amountTokenMin, uint256 amountETHMin, address to, uint256 deadline) external payable returns (uint256 amountToken, uint256 amountETH, uint256 liquidity);
        function removeLiquidity(address tokenA, address tokenB, uint256 liquidity, uint256 amountAMin, uint256 amountBMin, address to, uint256 deadline) external returns (uint256 amountA, uint256 amountB);
        function swapExactTokensForTokens(uint256 amountIn, uint256 amountOutMin, address[] path, address to, uint256 deadline) external returns (uint256[] amounts);
        function swapTokensForExactTokens(uint256 amountOut, uint256 amountInMax, address[] path, address to, uint256 deadline) external returns (uint256[] amounts);
        function swapExactETHForTokens(uint256 amountOutMin, address[] path, address to, uint256 deadline) external payable returns (uint256[] amounts);
        function swapExactTokensForETH(uint256 amountIn, uint256 amountOutMin, address[] path, address to, uint256 deadline) external returns (uint256[] amounts);
        function swapETHForExactTokens(uint256 amountOut, address[] path, address to, uint256 deadline) external payable returns (uint256[] amounts);
        function createPair(address tokenA, address tokenB, uint256 deadline) external returns (address pair);

        function buyWithToken(uint256 amountOffer, uint256 price, address baseToken, address quoteToken, address to, uint256 deadline) external returns (uint256 orderId);
        function buyWithEth(uint256 price, address baseToken, address to, uint256 deadline) external payable returns (uint256 orderId);
        function sellToken(uint256 amountOffer, uint256 price, address baseToken, address quoteToken, address to, uint256 deadline) external returns (uint256 orderId);
        function sellEth(uint256 price, address quoteToken, address to, uint256 deadline) external payable returns (uint256 orderId);
        function createOrderBook(address baseToken, address quoteToken, uint256 deadline) external returns (address book);
        function getOrderBook(address baseToken, address quoteToken, uint256 depth) external view returns (uint256[] buyPrices, uint256[] buyAmounts, uint256[] sellPrices, uint256[] sellAmounts, uint256 price);
        function getPrice(address baseToken, address quoteToken) external view returns (uint256 price);
        function getUserOrders(address baseToken, address quoteToken, address user) external view returns (uint256[] orderIds);
        function transferOrder(address baseToken, address quoteToken, address to, uint256 orderId, uint256 deadline) external;
        function cancelOrder(address baseToken, address quoteToken, uint256 orderId, uint256 deadline) external returns (uint256 refunded);
        function getOrderBookAddress(address baseToken, address quoteToken) external view returns (address book);

        function getAmountsOut(uint256 amountIn, address[] path) external view returns (uint256[] amounts, uint256[] extra);
        function getAmountsIn(uint256 amountOut, address[] path) external view returns (uint256[] amounts, uint256[] extra);
        function getBestAmountsIn(uint256 amountOut, address[] paths, uint256[] hopFlags) external view returns (address[] path, uint256[] amounts, uint256[] extra);
        function getBestAmountsOut(uint256 amountIn, address[] paths, uint256[] hopFlags) external view returns (address[] path, uint256[] amounts, uint256[] extra);
        function getReserves(address tokenA, address tokenB) external view returns (uint256 reserveA, uint256 reserveB);
        function getPair(address tokenA, address tokenB) external view returns (address pair);

        function bindFunctions(address backend, bytes4[] selectors) external;
    }
}

/// Every entry point of the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AddLiquidity,
    AddLiquidityEth,
    RemoveLiquidity,
    SwapExactTokensForTokens,
    SwapTokensForExactTokens,
    SwapExactEthForTokens,
    SwapExactTokensForEth,
    SwapEthForExactTokens,
    CreatePair,
    BuyWithToken,
    BuyWithEth,
    SellToken,
    SellEth,
    CreateOrderBook,
    GetOrderBook,
    GetPrice,
    GetUserOrders,
    TransferOrder,
    CancelOrder,
    GetOrderBookAddress,
    GetAmountsOut,
    GetAmountsIn,
    GetBestAmountsIn,
    GetBestAmountsOut,
    GetReserves,
    GetPair,
    BindFunctions,
}

impl Operation {
    pub const ALL: [Operation; 27] = [
        Operation::AddLiquidity,
        Operation::AddLiquidityEth,
        Operation::RemoveLiquidity,
        Operation::SwapExactTokensForTokens,
        Operation::SwapTokensForExactTokens,
        Operation::SwapExactEthForTokens,
        Operation::SwapExactTokensForEth,
        Operation::SwapEthForExactTokens,
        Operation::CreatePair,
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
        Operation::GetAmountsOut,
        Operation::GetAmountsIn,
        Operation::GetBestAmountsIn,
        Operation::GetBestAmountsOut,
        Operation::GetReserves,
        Operation::GetPair,
        Operation::BindFunctions,
    ];

    pub fn selector(&self) -> [u8; 4] {
        use IHybridRouter::*;
        match self {
            Operation::AddLiquidity => addLiquidityCall::SELECTOR,
            Operation::AddLiquidityEth => addLiquidityETHCall::SELECTOR,
            Operation::RemoveLiquidity => removeLiquidityCall::SELECTOR,
            Operation::SwapExactTokensForTokens => swapExactTokensForTokensCall::SELECTOR,
            Operation::SwapTokensForExactTokens => swapTokensForExactTokensCall::SELECTOR,
            Operation::SwapExactEthForTokens => swapExactETHForTokensCall::SELECTOR,
            Operation::SwapExactTokensForEth => swapExactTokensForETHCall::SELECTOR,
            Operation::SwapEthForExactTokens => swapETHForExactTokensCall::SELECTOR,
            Operation::CreatePair => createPairCall::SELECTOR,
            Operation::BuyWithToken => buyWithTokenCall::SELECTOR,
            Operation::BuyWithEth => buyWithEthCall::SELECTOR,
            Operation::SellToken => sellTokenCall::SELECTOR,
            Operation::SellEth => sellEthCall::SELECTOR,
            Operation::CreateOrderBook => createOrderBookCall::SELECTOR,
            Operation::GetOrderBook => getOrderBookCall::SELECTOR,
            Operation::GetPrice => getPriceCall::SELECTOR,
            Operation::GetUserOrders => getUserOrdersCall::SELECTOR,
            Operation::TransferOrder => transferOrderCall::SELECTOR,
            Operation::CancelOrder => cancelOrderCall::SELECTOR,
            Operation::GetOrderBookAddress => getOrderBookAddressCall::SELECTOR,
            Operation::GetAmountsOut => getAmountsOutCall::SELECTOR,
            Operation::GetAmountsIn => getAmountsInCall::SELECTOR,
            Operation::GetBestAmountsIn => getBestAmountsInCall::SELECTOR,
            Operation::GetBestAmountsOut => getBestAmountsOutCall::SELECTOR,
            Operation::GetReserves => getReservesCall::SELECTOR,
            Operation::GetPair => getPairCall::SELECTOR,
            Operation::BindFunctions => bindFunctionsCall::SELECTOR,
        }
    }

    /// Canonical Solidity signature, used in logs and errors.
    pub fn name(&self) -> &'static str {
        use IHybridRouter::*;
        match self {
            Operation::AddLiquidity => addLiquidityCall::SIGNATURE,
            Operation::AddLiquidityEth => addLiquidityETHCall::SIGNATURE,
            Operation::RemoveLiquidity => removeLiquidityCall::SIGNATURE,
            Operation::SwapExactTokensForTokens => swapExactTokensForTokensCall::SIGNATURE,
            Operation::SwapTokensForExactTokens => swapTokensForExactTokensCall::SIGNATURE,
            Operation::SwapExactEthForTokens => swapExactETHForTokensCall::SIGNATURE,
            Operation::SwapExactTokensForEth => swapExactTokensForETHCall::SIGNATURE,
            Operation::SwapEthForExactTokens => swapETHForExactTokensCall::SIGNATURE,
            Operation::CreatePair => createPairCall::SIGNATURE,
            Operation::BuyWithToken => buyWithTokenCall::SIGNATURE,
            Operation::BuyWithEth => buyWithEthCall::SIGNATURE,
            Operation::SellToken => sellTokenCall::SIGNATURE,
            Operation::SellEth => sellEthCall::SIGNATURE,
            Operation::CreateOrderBook => createOrderBookCall::SIGNATURE,
            Operation::GetOrderBook => getOrderBookCall::SIGNATURE,
            Operation::GetPrice => getPriceCall::SIGNATURE,
            Operation::GetUserOrders => getUserOrdersCall::SIGNATURE,
            Operation::TransferOrder => transferOrderCall::SIGNATURE,
            Operation::CancelOrder => cancelOrderCall::SIGNATURE,
            Operation::GetOrderBookAddress => getOrderBookAddressCall::SIGNATURE,
            Operation::GetAmountsOut => getAmountsOutCall::SIGNATURE,
            Operation::GetAmountsIn => getAmountsInCall::SIGNATURE,
            Operation::GetBestAmountsIn => getBestAmountsInCall::SIGNATURE,
            Operation::GetBestAmountsOut => getBestAmountsOutCall::SIGNATURE,
            Operation::GetReserves => getReservesCall::SIGNATURE,
            Operation::GetPair => getPairCall::SIGNATURE,
            Operation::BindFunctions => bindFunctionsCall::SIGNATURE,
        }
    }

    pub fn from_selector(selector: [u8; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.selector() == selector)
    }

    /// Read-only entry points run under shared locks and never settle.
    pub fn is_view(&self) -> bool {
        matches!(
            self,
            Operation::GetOrderBook
                | Operation::GetPrice
                | Operation::GetUserOrders
                | Operation::GetOrderBookAddress
                | Operation::GetAmountsOut
                | Operation::GetAmountsIn
                | Operation::GetBestAmountsIn
                | Operation::GetBestAmountsOut
                | Operation::GetReserves
                | Operation::GetPair
        )
    }

    /// Entry points that accept attached native value.
    pub fn is_payable(&self) -> bool {
        matches!(
            self,
            Operation::AddLiquidityEth
                | Operation::SwapExactEthForTokens
                | Operation::SwapEthForExactTokens
                | Operation::BuyWithEth
                | Operation::SellEth
        )
    }
}
