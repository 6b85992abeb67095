use curio_token::TokenError;
use curio_types::{Address, Amount, EpochId};
use thiserror::Error;

/// Errors that can occur in epoch ledger operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BankError {
    #[error("Unauthorized bank caller: {0}")]
    Unauthorized(Address),

    #[error("Epoch {0} is frozen; no further weight may be recorded")]
    EpochFrozen(EpochId),

    #[error("Epoch {epoch} not yet eligible for resolution (current epoch {current})")]
    NotYetEligible { epoch: EpochId, current: EpochId },

    #[error("Epoch {0} has not been resolved")]
    EpochNotResolved(EpochId),

    #[error("Inflation for epoch {epoch} already claimed by {voter}")]
    AlreadyClaimed { epoch: EpochId, voter: Address },

    #[error("No recorded weight for {voter} in epoch {epoch}")]
    InsufficientRecordedWeight { epoch: EpochId, voter: Address },

    #[error("Reserve cannot cover payout: needed {needed}, reserve {reserve}")]
    InsufficientReserve { needed: Amount, reserve: Amount },

    #[error(transparent)]
    Token(#[from] TokenError),
}
