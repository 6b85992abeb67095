//! CURIO Voting - commit-reveal voting oracle.
//!
//! Polls run in two timed stages: voters first commit a blinded hash of
//! their choice, then disclose choice and salt during the reveal stage.
//! The registry consumes poll outcomes through winner/weight queries;
//! it never inspects commitments directly.

pub mod error;
pub mod poll;

pub use error::VotingError;
pub use poll::{commitment_hash, CommitRevealVoting, Poll, VoteOption};
