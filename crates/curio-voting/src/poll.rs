//! Poll lifecycle: commit stage -> reveal stage -> ended.

use crate::error::VotingError;
use curio_types::{Address, Amount, PollId};
use std::collections::HashMap;

/// The two choices a challenge poll offers.
///
/// `For` favors the listing (the challenge fails); `Against` favors
/// the challenger (the listing is removed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOption {
    Against,
    For,
}

impl VoteOption {
    fn as_byte(self) -> u8 {
        match self {
            VoteOption::Against => 0,
            VoteOption::For => 1,
        }
    }
}

/// Blinded commitment digest: blake3 over the vote option byte and the
/// voter's salt. The salt keeps commitments unlinkable until reveal.
pub fn commitment_hash(option: VoteOption, salt: u64) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[option.as_byte()]);
    hasher.update(&salt.to_le_bytes());
    *hasher.finalize().as_bytes()
}

#[derive(Debug, Clone)]
struct Commitment {
    hash: [u8; 32],
    weight: Amount,
}

/// A single commit-reveal poll.
#[derive(Debug, Clone)]
pub struct Poll {
    /// Timestamp when the commit stage ends and reveal begins
    pub commit_end: u64,
    /// Timestamp when the reveal stage ends
    pub reveal_end: u64,
    /// Percentage of revealed weight that must favor the listing
    pub vote_quorum: u8,
    /// Revealed weight favoring the listing
    pub votes_for: Amount,
    /// Revealed weight favoring the challenger
    pub votes_against: Amount,
    commitments: HashMap<Address, Commitment>,
    revealed: HashMap<Address, (VoteOption, Amount)>,
}

impl Poll {
    fn new(vote_quorum: u8, commit_duration: u64, reveal_duration: u64, now: u64) -> Self {
        Self {
            commit_end: now + commit_duration,
            reveal_end: now + commit_duration + reveal_duration,
            vote_quorum,
            votes_for: Amount::ZERO,
            votes_against: Amount::ZERO,
            commitments: HashMap::new(),
            revealed: HashMap::new(),
        }
    }

    pub fn in_commit_stage(&self, now: u64) -> bool {
        now < self.commit_end
    }

    pub fn in_reveal_stage(&self, now: u64) -> bool {
        now >= self.commit_end && now < self.reveal_end
    }

    pub fn has_ended(&self, now: u64) -> bool {
        now >= self.reveal_end
    }

    /// Whether the poll passed (the listing prevailed).
    ///
    /// Passes when strictly more than `vote_quorum` percent of the
    /// revealed weight favors the listing. With no reveals at all the
    /// poll fails and the challenger prevails.
    fn is_passed(&self) -> bool {
        // saturating arithmetic to prevent overflow
        let total = self.votes_for.raw().saturating_add(self.votes_against.raw());
        self.votes_for.raw().saturating_mul(100) > u128::from(self.vote_quorum).saturating_mul(total)
    }

    fn winning_option(&self) -> VoteOption {
        if self.is_passed() {
            VoteOption::For
        } else {
            VoteOption::Against
        }
    }

    fn winning_weight(&self) -> Amount {
        match self.winning_option() {
            VoteOption::For => self.votes_for,
            VoteOption::Against => self.votes_against,
        }
    }
}

/// All polls of one deployment.
#[derive(Debug)]
pub struct CommitRevealVoting {
    polls: HashMap<PollId, Poll>,
    next_poll_id: PollId,
}

impl Default for CommitRevealVoting {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitRevealVoting {
    pub fn new() -> Self {
        Self {
            polls: HashMap::new(),
            next_poll_id: 1,
        }
    }

    /// Open a poll with the given quorum and stage lengths.
    pub fn open_poll(
        &mut self,
        vote_quorum: u8,
        commit_duration: u64,
        reveal_duration: u64,
        now: u64,
    ) -> PollId {
        let poll_id = self.next_poll_id;
        self.next_poll_id += 1;
        self.polls.insert(
            poll_id,
            Poll::new(vote_quorum, commit_duration, reveal_duration, now),
        );
        tracing::debug!(poll_id, vote_quorum, "poll opened");
        poll_id
    }

    pub fn poll(&self, poll_id: PollId) -> Result<&Poll, VotingError> {
        self.polls
            .get(&poll_id)
            .ok_or(VotingError::PollNotFound(poll_id))
    }

    fn poll_mut(&mut self, poll_id: PollId) -> Result<&mut Poll, VotingError> {
        self.polls
            .get_mut(&poll_id)
            .ok_or(VotingError::PollNotFound(poll_id))
    }

    /// Commit a blinded vote with the given weight.
    pub fn commit_vote(
        &mut self,
        poll_id: PollId,
        voter: Address,
        commitment: [u8; 32],
        weight: Amount,
        now: u64,
    ) -> Result<(), VotingError> {
        if weight.is_zero() {
            return Err(VotingError::ZeroWeight);
        }
        let poll = self.poll_mut(poll_id)?;
        if !poll.in_commit_stage(now) {
            return Err(VotingError::NotInCommitStage(poll_id));
        }
        if poll.commitments.contains_key(&voter) {
            return Err(VotingError::AlreadyCommitted(poll_id));
        }
        poll.commitments.insert(
            voter,
            Commitment {
                hash: commitment,
                weight,
            },
        );
        Ok(())
    }

    /// Disclose a committed vote.
    pub fn reveal_vote(
        &mut self,
        poll_id: PollId,
        voter: Address,
        option: VoteOption,
        salt: u64,
        now: u64,
    ) -> Result<(), VotingError> {
        let poll = self.poll_mut(poll_id)?;
        if !poll.in_reveal_stage(now) {
            return Err(VotingError::NotInRevealStage(poll_id));
        }
        if poll.revealed.contains_key(&voter) {
            return Err(VotingError::AlreadyRevealed(poll_id));
        }
        let commitment = poll
            .commitments
            .get(&voter)
            .ok_or(VotingError::NoCommitment(poll_id))?;
        if commitment.hash != commitment_hash(option, salt) {
            return Err(VotingError::CommitmentMismatch(poll_id));
        }

        let weight = commitment.weight;
        match option {
            VoteOption::For => poll.votes_for += weight,
            VoteOption::Against => poll.votes_against += weight,
        }
        poll.revealed.insert(voter, (option, weight));
        tracing::debug!(poll_id, %voter, ?option, %weight, "vote revealed");
        Ok(())
    }

    pub fn has_ended(&self, poll_id: PollId, now: u64) -> Result<bool, VotingError> {
        Ok(self.poll(poll_id)?.has_ended(now))
    }

    /// Whether the listing prevailed. Only answerable once the poll
    /// has ended.
    pub fn is_passed(&self, poll_id: PollId, now: u64) -> Result<bool, VotingError> {
        let poll = self.poll(poll_id)?;
        if !poll.has_ended(now) {
            return Err(VotingError::PollNotEnded(poll_id));
        }
        Ok(poll.is_passed())
    }

    /// Total revealed weight on the winning side.
    pub fn winning_weight(&self, poll_id: PollId, now: u64) -> Result<Amount, VotingError> {
        let poll = self.poll(poll_id)?;
        if !poll.has_ended(now) {
            return Err(VotingError::PollNotEnded(poll_id));
        }
        Ok(poll.winning_weight())
    }

    /// Weight the voter revealed for the winning option.
    ///
    /// The salt must re-derive the voter's original commitment; a
    /// voter who revealed the losing option, or never revealed, gets
    /// `VoterNotWinner`.
    pub fn winning_voter_weight(
        &self,
        poll_id: PollId,
        voter: Address,
        salt: u64,
        now: u64,
    ) -> Result<Amount, VotingError> {
        let poll = self.poll(poll_id)?;
        if !poll.has_ended(now) {
            return Err(VotingError::PollNotEnded(poll_id));
        }
        let (option, weight) = poll
            .revealed
            .get(&voter)
            .ok_or(VotingError::VoterNotWinner(poll_id))?;
        if *option != poll.winning_option() {
            return Err(VotingError::VoterNotWinner(poll_id));
        }
        let commitment = poll
            .commitments
            .get(&voter)
            .ok_or(VotingError::NoCommitment(poll_id))?;
        if commitment.hash != commitment_hash(*option, salt) {
            return Err(VotingError::CommitmentMismatch(poll_id));
        }
        Ok(*weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voter(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    /// quorum 50, commit 600s, reveal 600s, opened at t=0
    fn open_default(voting: &mut CommitRevealVoting) -> PollId {
        voting.open_poll(50, 600, 600, 0)
    }

    fn commit(
        voting: &mut CommitRevealVoting,
        poll: PollId,
        who: Address,
        option: VoteOption,
        salt: u64,
        weight: u128,
        now: u64,
    ) {
        voting
            .commit_vote(poll, who, commitment_hash(option, salt), Amount::new(weight), now)
            .unwrap();
    }

    #[test]
    fn test_poll_ids_increment() {
        let mut voting = CommitRevealVoting::new();
        assert_eq!(open_default(&mut voting), 1);
        assert_eq!(open_default(&mut voting), 2);
    }

    #[test]
    fn test_stage_windows() {
        let mut voting = CommitRevealVoting::new();
        let id = open_default(&mut voting);
        let poll = voting.poll(id).unwrap();

        assert!(poll.in_commit_stage(0));
        assert!(poll.in_commit_stage(599));
        assert!(!poll.in_commit_stage(600));
        assert!(poll.in_reveal_stage(600));
        assert!(poll.in_reveal_stage(1199));
        assert!(!poll.in_reveal_stage(1200));
        assert!(poll.has_ended(1200));
    }

    #[test]
    fn test_commit_reveal_flow() {
        let mut voting = CommitRevealVoting::new();
        let id = open_default(&mut voting);

        commit(&mut voting, id, voter(1), VoteOption::For, 420, 500, 10);

        // cannot reveal during commit stage
        assert_eq!(
            voting.reveal_vote(id, voter(1), VoteOption::For, 420, 10),
            Err(VotingError::NotInRevealStage(id))
        );

        voting
            .reveal_vote(id, voter(1), VoteOption::For, 420, 700)
            .unwrap();
        assert_eq!(voting.poll(id).unwrap().votes_for, Amount::new(500));

        // double reveal rejected
        assert_eq!(
            voting.reveal_vote(id, voter(1), VoteOption::For, 420, 701),
            Err(VotingError::AlreadyRevealed(id))
        );
    }

    #[test]
    fn test_reveal_wrong_salt_rejected() {
        let mut voting = CommitRevealVoting::new();
        let id = open_default(&mut voting);
        commit(&mut voting, id, voter(1), VoteOption::For, 420, 500, 10);

        assert_eq!(
            voting.reveal_vote(id, voter(1), VoteOption::For, 999, 700),
            Err(VotingError::CommitmentMismatch(id))
        );
        // lying about the option is equally a mismatch
        assert_eq!(
            voting.reveal_vote(id, voter(1), VoteOption::Against, 420, 700),
            Err(VotingError::CommitmentMismatch(id))
        );
    }

    #[test]
    fn test_double_commit_rejected() {
        let mut voting = CommitRevealVoting::new();
        let id = open_default(&mut voting);
        commit(&mut voting, id, voter(1), VoteOption::For, 420, 500, 10);
        assert_eq!(
            voting.commit_vote(
                id,
                voter(1),
                commitment_hash(VoteOption::For, 7),
                Amount::new(1),
                11
            ),
            Err(VotingError::AlreadyCommitted(id))
        );
    }

    #[test]
    fn test_zero_weight_rejected() {
        let mut voting = CommitRevealVoting::new();
        let id = open_default(&mut voting);
        assert_eq!(
            voting.commit_vote(
                id,
                voter(1),
                commitment_hash(VoteOption::For, 1),
                Amount::ZERO,
                10
            ),
            Err(VotingError::ZeroWeight)
        );
    }

    #[test]
    fn test_outcome_quorum() {
        let mut voting = CommitRevealVoting::new();
        let id = open_default(&mut voting);
        commit(&mut voting, id, voter(1), VoteOption::For, 1, 600, 10);
        commit(&mut voting, id, voter(2), VoteOption::Against, 2, 400, 10);
        voting.reveal_vote(id, voter(1), VoteOption::For, 1, 700).unwrap();
        voting.reveal_vote(id, voter(2), VoteOption::Against, 2, 700).unwrap();

        // not answerable before the reveal stage closes
        assert_eq!(voting.is_passed(id, 1199), Err(VotingError::PollNotEnded(id)));

        // 60% for > 50% quorum
        assert!(voting.is_passed(id, 1200).unwrap());
        assert_eq!(voting.winning_weight(id, 1200).unwrap(), Amount::new(600));
    }

    #[test]
    fn test_outcome_exact_quorum_fails() {
        let mut voting = CommitRevealVoting::new();
        let id = open_default(&mut voting);
        commit(&mut voting, id, voter(1), VoteOption::For, 1, 500, 10);
        commit(&mut voting, id, voter(2), VoteOption::Against, 2, 500, 10);
        voting.reveal_vote(id, voter(1), VoteOption::For, 1, 700).unwrap();
        voting.reveal_vote(id, voter(2), VoteOption::Against, 2, 700).unwrap();

        // exactly 50% is not strictly greater than the quorum
        assert!(!voting.is_passed(id, 1200).unwrap());
        assert_eq!(voting.winning_weight(id, 1200).unwrap(), Amount::new(500));
    }

    #[test]
    fn test_no_reveals_means_poll_fails() {
        let mut voting = CommitRevealVoting::new();
        let id = open_default(&mut voting);
        assert!(!voting.is_passed(id, 1200).unwrap());
        assert_eq!(voting.winning_weight(id, 1200).unwrap(), Amount::ZERO);
    }

    #[test]
    fn test_winning_voter_weight() {
        let mut voting = CommitRevealVoting::new();
        let id = open_default(&mut voting);
        commit(&mut voting, id, voter(1), VoteOption::Against, 1, 500, 10);
        commit(&mut voting, id, voter(2), VoteOption::For, 2, 300, 10);
        voting.reveal_vote(id, voter(1), VoteOption::Against, 1, 700).unwrap();
        voting.reveal_vote(id, voter(2), VoteOption::For, 2, 700).unwrap();

        // 300 for / 800 total = 37.5% < 50% quorum -> challenger wins
        assert_eq!(
            voting.winning_voter_weight(id, voter(1), 1, 1200).unwrap(),
            Amount::new(500)
        );
        // loser gets an error, not zero
        assert_eq!(
            voting.winning_voter_weight(id, voter(2), 2, 1200),
            Err(VotingError::VoterNotWinner(id))
        );
        // non-participant too
        assert_eq!(
            voting.winning_voter_weight(id, voter(3), 3, 1200),
            Err(VotingError::VoterNotWinner(id))
        );
        // right voter, wrong salt
        assert_eq!(
            voting.winning_voter_weight(id, voter(1), 99, 1200),
            Err(VotingError::CommitmentMismatch(id))
        );
    }
}
