//! Liquidity pool interfaces.
//!
//! Curve pools come in two ABI generations for the two-coin case: legacy
//! crypto pools expose a parameterless `price_oracle()` plus
//! `last_prices_timestamp()`, while NG pools take a coin index and pack
//! their EMA timestamps into `ma_last_time()`.

use alloy::sol;

sol! {
    /// Legacy two-coin Curve crypto pool
    #[sol(rpc)]
    interface ICurveCryptoPool {
        function price_oracle() external view returns (uint256);
        function last_prices_timestamp() external view returns (uint256);
        function get_virtual_price() external view returns (uint256);
    }
}

sol! {
    /// Curve NG two-coin pool
    #[sol(rpc)]
    interface ICurveStableNgPool {
        function price_oracle(uint256 i) external view returns (uint256);
        function ma_last_time() external view returns (uint256);
        function get_virtual_price() external view returns (uint256);
    }
}

sol! {
    /// Curve tricrypto pool
    #[sol(rpc)]
    interface ICurveTriCryptoPool {
        function price_oracle(uint256 k) external view returns (uint256);
        function last_prices_timestamp() external view returns (uint256);
        function get_virtual_price() external view returns (uint256);
    }
}

sol! {
    /// Uniswap V2 pair
    #[sol(rpc)]
    interface IUniswapV2Pair {
        function getReserves() external view returns (
            uint112 reserve0,
            uint112 reserve1,
            uint32 blockTimestampLast
        );
        function token0() external view returns (address);
        function token1() external view returns (address);
    }
}

sol! {
    /// Uniswap V3 pool (oracle subset)
    #[sol(rpc)]
    interface IUniswapV3Pool {
        function observe(uint32[] calldata secondsAgos) external view returns (
            int56[] memory tickCumulatives,
            uint160[] memory secondsPerLiquidityCumulativeX128s
        );
        function token0() external view returns (address);
        function token1() external view returns (address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolCall;

    #[test]
    fn test_pool_selectors() {
        // getReserves(): 0902f1ac
        assert_eq!(hex::encode(IUniswapV2Pair::getReservesCall::SELECTOR), "0902f1ac");
        // observe(uint32[]): 883bdbfd
        assert_eq!(hex::encode(IUniswapV3Pool::observeCall::SELECTOR), "883bdbfd");
        // get_virtual_price(): bb7b8b80
        assert_eq!(
            hex::encode(ICurveCryptoPool::get_virtual_priceCall::SELECTOR),
            "bb7b8b80"
        );
    }

    #[test]
    fn test_curve_generations_differ() {
        // The two ABI generations must not collide on price_oracle
        assert_ne!(
            ICurveCryptoPool::price_oracleCall::SELECTOR,
            ICurveStableNgPool::price_oracleCall::SELECTOR
        );
        assert_eq!(
            ICurveStableNgPool::price_oracleCall::SELECTOR,
            ICurveTriCryptoPool::price_oracleCall::SELECTOR
        );
    }
}
