//! CURIO Bank - epoch ledger and inflation reserve.
//!
//! Voter participation is batched into fixed-duration epochs. Each
//! epoch accumulates per-voter weight while open; the first inflation
//! claim after the epoch's window elapses freezes it, computing an
//! inflation pool from the bank's token reserve. Voters then pull
//! their proportional share exactly once.
//!
//! The bank's mutating entry points accept calls from a single
//! authorized address: the registry that owns it.

pub mod bank;
pub mod error;

pub use bank::{Bank, BankConfig, EpochDetails};
pub use error::BankError;
