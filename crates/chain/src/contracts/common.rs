//! Common contract interfaces shared across adapters.

use alloy::sol;

// ERC20 metadata, used to scale reserves and ticks by token decimals
sol! {
    /// ERC20 metadata subset
    #[sol(rpc)]
    interface IERC20Metadata {
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
    }
}

// Chainlink AggregatorV3 interface
sol! {
    /// Chainlink-compatible aggregator interface
    #[sol(rpc)]
    interface IAggregatorV3 {
        function latestRoundData() external view returns (
            uint80 roundId,
            int256 answer,
            uint256 startedAt,
            uint256 updatedAt,
            uint80 answeredInRound
        );

        function decimals() external view returns (uint8);

        function description() external view returns (string memory);
    }
}
