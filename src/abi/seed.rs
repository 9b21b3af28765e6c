//! Bundled well-known interfaces
//!
//! Every registry starts from these so common token, name-service, router and
//! NFT marketplace calls decode without a single network round-trip. Signatures use the
//! human-readable form accepted by [`Function::parse`] and [`Event::parse`];
//! parameter names follow the reference implementations.

use alloy::json_abi::{Event, Function};
use once_cell::sync::Lazy;
use tracing::warn;

/// ERC-20 fungible token
const ERC20: &[&str] = &[
    "function name() returns (string)",
    "function symbol() returns (string)",
    "function decimals() returns (uint8)",
    "function totalSupply() returns (uint256)",
    "function balanceOf(address account) returns (uint256)",
    "function transfer(address to, uint256 value) returns (bool)",
    "function allowance(address owner, address spender) returns (uint256)",
    "function approve(address spender, uint256 value) returns (bool)",
    "function transferFrom(address from, address to, uint256 value) returns (bool)",
    "event Transfer(address indexed from, address indexed to, uint256 value)",
    "event Approval(address indexed owner, address indexed spender, uint256 value)",
];

/// ERC-721 non-fungible token
const ERC721: &[&str] = &[
    "function ownerOf(uint256 tokenId) returns (address)",
    "function safeTransferFrom(address from, address to, uint256 tokenId)",
    "function safeTransferFrom(address from, address to, uint256 tokenId, bytes data)",
    "function setApprovalForAll(address operator, bool approved)",
    "function getApproved(uint256 tokenId) returns (address)",
    "function isApprovedForAll(address owner, address operator) returns (bool)",
    "function tokenURI(uint256 tokenId) returns (string)",
    "function supportsInterface(bytes4 interfaceId) returns (bool)",
    "event Transfer(address indexed from, address indexed to, uint256 indexed tokenId)",
    "event Approval(address indexed owner, address indexed approved, uint256 indexed tokenId)",
    "event ApprovalForAll(address indexed owner, address indexed operator, bool approved)",
];

/// ENS registry and public resolver
const ENS: &[&str] = &[
    "function owner(bytes32 node) returns (address)",
    "function resolver(bytes32 node) returns (address)",
    "function ttl(bytes32 node) returns (uint64)",
    "function setOwner(bytes32 node, address owner)",
    "function setSubnodeOwner(bytes32 node, bytes32 label, address owner) returns (bytes32)",
    "function setResolver(bytes32 node, address resolver)",
    "function addr(bytes32 node) returns (address)",
    "function setAddr(bytes32 node, address a)",
    "function text(bytes32 node, string key) returns (string)",
    "function setText(bytes32 node, string key, string value)",
    "event NewOwner(bytes32 indexed node, bytes32 indexed label, address owner)",
    "event NewResolver(bytes32 indexed node, address resolver)",
    "event AddrChanged(bytes32 indexed node, address a)",
];

/// Wrapped native asset
const WETH: &[&str] = &[
    "function deposit()",
    "function withdraw(uint256 wad)",
    "event Deposit(address indexed dst, uint256 wad)",
    "event Withdrawal(address indexed src, uint256 wad)",
];

/// Uniswap V2 router and pair
const UNISWAP_V2: &[&str] = &[
    "function swapExactTokensForTokens(uint256 amountIn, uint256 amountOutMin, address[] path, address to, uint256 deadline) returns (uint256[] amounts)",
    "function swapTokensForExactTokens(uint256 amountOut, uint256 amountInMax, address[] path, address to, uint256 deadline) returns (uint256[] amounts)",
    "function swapExactETHForTokens(uint256 amountOutMin, address[] path, address to, uint256 deadline) returns (uint256[] amounts)",
    "function swapExactTokensForETH(uint256 amountIn, uint256 amountOutMin, address[] path, address to, uint256 deadline) returns (uint256[] amounts)",
    "function swapExactTokensForTokensSupportingFeeOnTransferTokens(uint256 amountIn, uint256 amountOutMin, address[] path, address to, uint256 deadline)",
    "function addLiquidity(address tokenA, address tokenB, uint256 amountADesired, uint256 amountBDesired, uint256 amountAMin, uint256 amountBMin, address to, uint256 deadline) returns (uint256 amountA, uint256 amountB, uint256 liquidity)",
    "function removeLiquidity(address tokenA, address tokenB, uint256 liquidity, uint256 amountAMin, uint256 amountBMin, address to, uint256 deadline) returns (uint256 amountA, uint256 amountB)",
    "function getAmountsOut(uint256 amountIn, address[] path) returns (uint256[] amounts)",
    "function getReserves() returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast)",
    "function swap(uint256 amount0Out, uint256 amount1Out, address to, bytes data)",
    "event Swap(address indexed sender, uint256 amount0In, uint256 amount1In, uint256 amount0Out, uint256 amount1Out, address indexed to)",
    "event Sync(uint112 reserve0, uint112 reserve1)",
];

/// Uniswap V3 swap router and pool
const UNISWAP_V3: &[&str] = &[
    "function exactInputSingle((address,address,uint24,address,uint256,uint256,uint256,uint160) params) returns (uint256 amountOut)",
    "function exactInput((bytes,address,uint256,uint256,uint256) params) returns (uint256 amountOut)",
    "function exactOutputSingle((address,address,uint24,address,uint256,uint256,uint256,uint160) params) returns (uint256 amountIn)",
    "function multicall(bytes[] data) returns (bytes[] results)",
    "function multicall(uint256 deadline, bytes[] data) returns (bytes[] results)",
    "function unwrapWETH9(uint256 amountMinimum, address recipient)",
    "function refundETH()",
    "function swap(address recipient, bool zeroForOne, int256 amountSpecified, uint160 sqrtPriceLimitX96, bytes data) returns (int256 amount0, int256 amount1)",
    "event Swap(address indexed sender, address indexed recipient, int256 amount0, int256 amount1, uint160 sqrtPriceX96, uint128 liquidity, int24 tick)",
];

/// 1inch v4 aggregation router
const ONE_INCH_V4: &[&str] = &[
    "function swap(address caller, (address,address,address,address,uint256,uint256,uint256,bytes) desc, bytes data) returns (uint256 returnAmount, uint256 spentAmount, uint256 gasLeft)",
    "function unoswap(address srcToken, uint256 amount, uint256 minReturn, bytes32[] pools) returns (uint256 returnAmount)",
    "function uniswapV3Swap(uint256 amount, uint256 minReturn, uint256[] pools) returns (uint256 returnAmount)",
    "function clipperSwap(address srcToken, address dstToken, uint256 amount, uint256 minReturn) returns (uint256 returnAmount)",
];

/// Seaport order book
///
/// Order structs are spelled out as tuples: `OrderParameters` is
/// `(offerer, zone, offer[], consideration[], orderType, startTime, endTime,
/// zoneHash, salt, conduitKey, totalOriginalConsiderationItems)`.
const SEAPORT: &[&str] = &[
    "function fulfillBasicOrder((address,uint256,uint256,address,address,address,uint256,uint256,uint8,uint256,uint256,bytes32,uint256,bytes32,bytes32,uint256,(uint256,address)[],bytes) parameters) returns (bool fulfilled)",
    "function fulfillOrder(((address,address,(uint8,address,uint256,uint256,uint256)[],(uint8,address,uint256,uint256,uint256,address)[],uint8,uint256,uint256,bytes32,uint256,bytes32,uint256),bytes) order, bytes32 fulfillerConduitKey) returns (bool fulfilled)",
    "function fulfillAdvancedOrder(((address,address,(uint8,address,uint256,uint256,uint256)[],(uint8,address,uint256,uint256,uint256,address)[],uint8,uint256,uint256,bytes32,uint256,bytes32,uint256),uint120,uint120,bytes,bytes) advancedOrder, (uint256,uint8,uint256,uint256,bytes32[])[] criteriaResolvers, bytes32 fulfillerConduitKey, address recipient) returns (bool fulfilled)",
    "function fulfillAvailableAdvancedOrders(((address,address,(uint8,address,uint256,uint256,uint256)[],(uint8,address,uint256,uint256,uint256,address)[],uint8,uint256,uint256,bytes32,uint256,bytes32,uint256),uint120,uint120,bytes,bytes)[] advancedOrders, (uint256,uint8,uint256,uint256,bytes32[])[] criteriaResolvers, (uint256,uint256)[][] offerFulfillments, (uint256,uint256)[][] considerationFulfillments, bytes32 fulfillerConduitKey, address recipient, uint256 maximumFulfilled) returns (bool[] availableOrders, ((uint8,address,uint256,uint256,address),address,bytes32)[] executions)",
    "function matchOrders(((address,address,(uint8,address,uint256,uint256,uint256)[],(uint8,address,uint256,uint256,uint256,address)[],uint8,uint256,uint256,bytes32,uint256,bytes32,uint256),bytes)[] orders, ((uint256,uint256)[],(uint256,uint256)[])[] fulfillments) returns (((uint8,address,uint256,uint256,address),address,bytes32)[] executions)",
    "function cancel((address,address,(uint8,address,uint256,uint256,uint256)[],(uint8,address,uint256,uint256,uint256,address)[],uint8,uint256,uint256,bytes32,uint256,bytes32,uint256)[] orders) returns (bool cancelled)",
    "function getCounter(address offerer) returns (uint256 counter)",
    "function incrementCounter() returns (uint256 newCounter)",
    "event OrderFulfilled(bytes32 orderHash, address indexed offerer, address indexed zone, address recipient, (uint8,address,uint256,uint256)[] offer, (uint8,address,uint256,uint256,address)[] consideration)",
    "event OrderCancelled(bytes32 orderHash, address indexed offerer, address indexed zone)",
    "event CounterIncremented(uint256 newCounter, address indexed offerer)",
];

/// Gem NFT marketplace aggregator
///
/// `TradeDetails` is `(marketId, value, tradeData)`.
const GEM_SWAP: &[&str] = &[
    "function batchBuyWithETH((uint256,uint256,bytes)[] tradeDetails)",
    "function batchBuyWithERC20s((address[],uint256[]) erc20Details, (uint256,uint256,bytes)[] tradeDetails, (bytes)[] conversionDetails, address[] dustTokens)",
];

const SEED_SETS: &[&[&str]] = &[ERC20, ERC721, ENS, WETH, UNISWAP_V2, UNISWAP_V3, ONE_INCH_V4, SEAPORT, GEM_SWAP];

/// Parsed seed interfaces, built once per process
pub(crate) static SEED: Lazy<SeedInterfaces> = Lazy::new(SeedInterfaces::parse);

pub(crate) struct SeedInterfaces {
    pub functions: Vec<Function>,
    pub events: Vec<Event>,
}

impl SeedInterfaces {
    fn parse() -> Self {
        let mut functions = Vec::new();
        let mut events = Vec::new();
        for line in SEED_SETS.iter().flat_map(|set| set.iter()) {
            if line.starts_with("event ") {
                match Event::parse(line) {
                    Ok(event) => events.push(event),
                    Err(err) => warn!(target: "trace_annotator::abi", %line, %err, "Invalid seed event"),
                }
            } else {
                match Function::parse(line) {
                    Ok(function) => functions.push(function),
                    Err(err) => warn!(target: "trace_annotator::abi", %line, %err, "Invalid seed function"),
                }
            }
        }
        Self { functions, events }
    }
}
