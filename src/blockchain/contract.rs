//! Ping/pong contract bindings.

use alloy::sol;

sol! {
    /// Emitted by anyone pinging the contract.
    #[derive(Debug)]
    event Ping();

    /// Emitted when a pong answers the ping carried in `txHash`.
    #[derive(Debug)]
    event Pong(bytes32 txHash);

    /// Answer the ping emitted by transaction `_txHash`.
    function pong(bytes32 _txHash) external;
}
