//! Listing and challenge records.
//!
//! Listings move through: applied -> whitelisted or challenged ->
//! resolved (whitelisted again, or removed). Challenges are created
//! open and resolve exactly once.

use curio_types::{Address, Amount, EpochId, PollId};
use std::collections::HashSet;

/// A candidate or admitted registry entry.
#[derive(Debug, Clone)]
pub struct Listing {
    /// Applicant who controls the deposit
    pub owner: Address,
    /// Timestamp when an unchallenged application may be whitelisted
    pub application_expiry: u64,
    /// Whether the listing is currently admitted
    pub whitelisted: bool,
    /// Deposit not currently locked in a challenge
    pub unstaked_deposit: Amount,
    /// Open challenge, if any
    pub challenge_id: Option<PollId>,
    /// Free-form listing data supplied on apply
    pub data: String,
}

impl Listing {
    pub fn new(owner: Address, deposit: Amount, application_expiry: u64, data: String) -> Self {
        Self {
            owner,
            application_expiry,
            whitelisted: false,
            unstaked_deposit: deposit,
            challenge_id: None,
            data,
        }
    }

    /// Whether the application window has elapsed.
    pub fn application_expired(&self, now: u64) -> bool {
        now >= self.application_expiry
    }
}

/// A staked dispute against a listing.
#[derive(Debug, Clone)]
pub struct Challenge {
    /// Who opened the dispute
    pub challenger: Address,
    /// Tokens dispensed to winning voters, drawn down as they claim
    pub reward_pool: Amount,
    /// The stake each side has at risk
    pub stake: Amount,
    /// Set once, by resolution
    pub resolved: bool,
    /// Winning-side weight at resolution, drawn down as voters claim
    pub total_winning_weight: Amount,
    /// Epoch captured when the challenge was opened; immutable
    pub epoch: EpochId,
    claims: HashSet<Address>,
}

impl Challenge {
    pub fn new(challenger: Address, stake: Amount, reward_pool: Amount, epoch: EpochId) -> Self {
        Self {
            challenger,
            reward_pool,
            stake,
            resolved: false,
            total_winning_weight: Amount::ZERO,
            epoch,
            claims: HashSet::new(),
        }
    }

    /// What the prevailing party walks away with: both stakes minus
    /// the voters' dispensation. When nobody voted on the winning
    /// side there are no claimants, and the whole pot goes to the
    /// winner.
    pub fn winner_takings(&self, winning_weight: Amount) -> Amount {
        if winning_weight.is_zero() {
            self.stake + self.stake
        } else {
            self.stake + self.stake - self.reward_pool
        }
    }

    pub fn has_claimed(&self, voter: Address) -> bool {
        self.claims.contains(&voter)
    }

    pub(crate) fn mark_claimed(&mut self, voter: Address) {
        self.claims.insert(voter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_expiry() {
        let listing = Listing::new(Address::ZERO, Amount::new(10), 600, String::new());
        assert!(!listing.application_expired(599));
        assert!(listing.application_expired(600));
    }

    #[test]
    fn test_winner_takings() {
        // stake 10, dispensation 50% -> pool 5, winner gets 15
        let challenge = Challenge::new(Address::ZERO, Amount::new(10), Amount::new(5), 0);
        assert_eq!(challenge.winner_takings(Amount::new(500)), Amount::new(15));
        // nobody voted: winner takes both stakes
        assert_eq!(challenge.winner_takings(Amount::ZERO), Amount::new(20));
    }

    #[test]
    fn test_claim_tracking() {
        let mut challenge = Challenge::new(Address::ZERO, Amount::new(10), Amount::new(5), 0);
        let voter = Address::from_bytes([1u8; 20]);
        assert!(!challenge.has_claimed(voter));
        challenge.mark_claimed(voter);
        assert!(challenge.has_claimed(voter));
    }
}
