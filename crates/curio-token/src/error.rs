use curio_types::{Address, Amount};
use thiserror::Error;

/// Errors that can occur in token operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TokenError {
    #[error("Insufficient balance: {holder} has {balance}, needs {needed}")]
    InsufficientBalance {
        holder: Address,
        balance: Amount,
        needed: Amount,
    },

    #[error("Insufficient allowance: {spender} may spend {allowance} of {owner}'s tokens, needs {needed}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        allowance: Amount,
        needed: Amount,
    },

    #[error("Zero address not allowed")]
    ZeroAddress,
}
