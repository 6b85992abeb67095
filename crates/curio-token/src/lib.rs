//! CURIO Token - in-memory fungible token ledger.
//!
//! Standard balance/transfer/allowance semantics. One `Token` instance
//! backs one registry deployment; every protocol component (registry,
//! bank, voters) is an account in this ledger.

pub mod error;
pub mod token;

pub use error::TokenError;
pub use token::Token;
