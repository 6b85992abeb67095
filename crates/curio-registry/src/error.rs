use curio_bank::BankError;
use curio_token::TokenError;
use curio_types::{Address, Amount, ListingId, PollId};
use curio_voting::VotingError;
use thiserror::Error;

/// Errors that can occur in registry operations.
///
/// Every error aborts the whole operation; no partial state is
/// observable afterwards.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Listing not found: {0}")]
    ListingNotFound(ListingId),

    #[error("Challenge not found for poll {0}")]
    ChallengeNotFound(PollId),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Reward for poll {poll_id} already claimed by {voter}")]
    AlreadyClaimed { poll_id: PollId, voter: Address },

    #[error("Challenge for poll {0} is already resolved")]
    AlreadyResolved(PollId),

    #[error("Deposit {deposit} below minimum {minimum}")]
    InsufficientDeposit { deposit: Amount, minimum: Amount },

    #[error(transparent)]
    Bank(#[from] BankError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Voting(#[from] VotingError),
}
