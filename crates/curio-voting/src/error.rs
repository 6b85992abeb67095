use curio_types::PollId;
use thiserror::Error;

/// Errors that can occur in voting operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VotingError {
    #[error("Poll not found: {0}")]
    PollNotFound(PollId),

    #[error("Poll {0} is not in its commit stage")]
    NotInCommitStage(PollId),

    #[error("Poll {0} is not in its reveal stage")]
    NotInRevealStage(PollId),

    #[error("Poll {0} has not ended")]
    PollNotEnded(PollId),

    #[error("Already committed to poll {0}")]
    AlreadyCommitted(PollId),

    #[error("Already revealed in poll {0}")]
    AlreadyRevealed(PollId),

    #[error("No commitment found in poll {0}")]
    NoCommitment(PollId),

    #[error("Reveal does not match commitment in poll {0}")]
    CommitmentMismatch(PollId),

    #[error("Cannot commit zero weight")]
    ZeroWeight,

    #[error("Voter did not reveal for the winning option in poll {0}")]
    VoterNotWinner(PollId),
}
