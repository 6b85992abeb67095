//! CURIO Types - Core type definitions for the CURIO registry protocol.
//!
//! This crate provides the fundamental types used throughout CURIO:
//! - Addresses (20-byte, Bech32m encoded)
//! - Listing identifiers (32-byte, blake3 digests)
//! - Amounts (128-bit token quantities with proportional-split helpers)

pub mod address;
pub mod amount;
pub mod error;
pub mod listing_id;

pub use address::Address;
pub use amount::Amount;
pub use error::TypesError;
pub use listing_id::ListingId;

/// Poll identifiers handed out by the voting oracle.
pub type PollId = u64;

/// Epoch numbers in the bank's ledger.
pub type EpochId = u64;
