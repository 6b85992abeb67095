//! Registry orchestration: apply/challenge/resolve and reward claims.

use crate::error::RegistryError;
use crate::listing::{Challenge, Listing};
use curio_bank::{Bank, BankError};
use curio_params::Params;
use curio_token::Token;
use curio_types::{Address, Amount, ListingId, PollId};
use curio_voting::{CommitRevealVoting, VotingError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// The listing registry. Owns all listing and challenge records and
/// the bank; shares the token ledger and voting oracle with the rest
/// of the deployment.
pub struct Registry {
    /// The registry's own token account
    address: Address,
    params: Arc<Params>,
    token: Arc<RwLock<Token>>,
    voting: Arc<RwLock<CommitRevealVoting>>,
    bank: Bank,
    listings: HashMap<ListingId, Listing>,
    challenges: HashMap<PollId, Challenge>,
}

impl Registry {
    pub fn new(
        address: Address,
        params: Arc<Params>,
        token: Arc<RwLock<Token>>,
        voting: Arc<RwLock<CommitRevealVoting>>,
        bank: Bank,
    ) -> Self {
        Self {
            address,
            params,
            token,
            voting,
            bank,
            listings: HashMap::new(),
            challenges: HashMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn bank(&self) -> &Bank {
        &self.bank
    }

    // ---- listing lifecycle -------------------------------------------------

    /// Submit a new listing application, pulling `deposit` from the
    /// caller. The application whitelists after the apply stage unless
    /// challenged first.
    pub fn apply(
        &mut self,
        caller: Address,
        listing_id: ListingId,
        deposit: Amount,
        data: &str,
        now: u64,
    ) -> Result<(), RegistryError> {
        if self.listings.contains_key(&listing_id) {
            return Err(RegistryError::InvalidState(format!(
                "listing {} already applied or whitelisted",
                listing_id
            )));
        }
        let minimum = self.params.min_deposit;
        if deposit < minimum {
            return Err(RegistryError::InsufficientDeposit { deposit, minimum });
        }

        self.token
            .write()
            .transfer_from(self.address, caller, self.address, deposit)?;

        let expiry = now + self.params.apply_stage_length;
        self.listings.insert(
            listing_id,
            Listing::new(caller, deposit, expiry, data.to_string()),
        );
        tracing::info!(listing = %listing_id, owner = %caller, %deposit, "application received");
        Ok(())
    }

    /// Top up a listing's unstaked deposit. Owner only.
    pub fn deposit(
        &mut self,
        caller: Address,
        listing_id: ListingId,
        amount: Amount,
    ) -> Result<(), RegistryError> {
        let listing = Self::listing_mut(&mut self.listings, listing_id)?;
        if listing.owner != caller {
            return Err(RegistryError::Unauthorized(format!(
                "{} does not own listing {}",
                caller, listing_id
            )));
        }
        self.token
            .write()
            .transfer_from(self.address, caller, self.address, amount)?;
        listing.unstaked_deposit += amount;
        Ok(())
    }

    /// Withdraw unstaked deposit down to the configured minimum.
    /// Owner only.
    pub fn withdraw(
        &mut self,
        caller: Address,
        listing_id: ListingId,
        amount: Amount,
    ) -> Result<(), RegistryError> {
        let minimum = self.params.min_deposit;
        let listing = Self::listing_mut(&mut self.listings, listing_id)?;
        if listing.owner != caller {
            return Err(RegistryError::Unauthorized(format!(
                "{} does not own listing {}",
                caller, listing_id
            )));
        }
        let remaining = listing
            .unstaked_deposit
            .checked_sub(amount)
            .filter(|r| *r >= minimum)
            .ok_or_else(|| {
                RegistryError::InvalidState(format!(
                    "withdrawing {} would leave listing {} below the minimum deposit",
                    amount, listing_id
                ))
            })?;

        listing.unstaked_deposit = remaining;
        self.token.write().transfer(self.address, caller, amount)?;
        Ok(())
    }

    /// Remove one's own whitelisted, unchallenged listing and reclaim
    /// the deposit.
    pub fn exit(&mut self, caller: Address, listing_id: ListingId) -> Result<(), RegistryError> {
        let listing = Self::listing_ref(&self.listings, listing_id)?;
        if listing.owner != caller {
            return Err(RegistryError::Unauthorized(format!(
                "{} does not own listing {}",
                caller, listing_id
            )));
        }
        if !listing.whitelisted {
            return Err(RegistryError::InvalidState(format!(
                "listing {} is not whitelisted",
                listing_id
            )));
        }
        if self.open_challenge(listing).is_some() {
            return Err(RegistryError::InvalidState(format!(
                "listing {} is mid-challenge",
                listing_id
            )));
        }
        self.remove_listing(listing_id)?;
        tracing::info!(listing = %listing_id, "listing exited");
        Ok(())
    }

    /// Open a staked challenge against a listing, capturing the
    /// current epoch. Returns the poll backing the challenge.
    pub fn challenge(
        &mut self,
        caller: Address,
        listing_id: ListingId,
        now: u64,
    ) -> Result<PollId, RegistryError> {
        let stake = self.params.min_deposit;
        let reward_pool = stake.percent(self.params.dispensation_pct);
        let vote_quorum = self.params.vote_quorum;
        let commit_len = self.params.commit_stage_length;
        let reveal_len = self.params.reveal_stage_length;

        let listing = Self::listing_ref(&self.listings, listing_id)?;
        if let Some(open) = self.open_challenge(listing) {
            return Err(RegistryError::InvalidState(format!(
                "listing {} is already challenged in poll {}",
                listing_id, open
            )));
        }

        // the listing's stake goes at risk alongside the challenger's
        let listing = Self::listing_mut(&mut self.listings, listing_id)?;
        listing.unstaked_deposit =
            listing.unstaked_deposit.checked_sub(stake).ok_or_else(|| {
                RegistryError::InvalidState(format!(
                    "listing {} deposit cannot cover the challenge stake",
                    listing_id
                ))
            })?;

        self.token
            .write()
            .transfer_from(self.address, caller, self.address, stake)?;

        let poll_id = self
            .voting
            .write()
            .open_poll(vote_quorum, commit_len, reveal_len, now);
        let epoch = self.bank.current_epoch(now);

        self.challenges
            .insert(poll_id, Challenge::new(caller, stake, reward_pool, epoch));
        if let Some(listing) = self.listings.get_mut(&listing_id) {
            listing.challenge_id = Some(poll_id);
        }
        tracing::info!(
            listing = %listing_id,
            poll_id,
            challenger = %caller,
            %stake,
            epoch,
            "challenge opened"
        );
        Ok(poll_id)
    }

    /// Advance a listing's state: whitelist an unchallenged expired
    /// application, or resolve a challenge whose poll has ended.
    pub fn update_status(&mut self, listing_id: ListingId, now: u64) -> Result<(), RegistryError> {
        if self.can_be_whitelisted(listing_id, now) {
            return self.whitelist_application(listing_id);
        }

        let listing = Self::listing_ref(&self.listings, listing_id)?;
        match listing.challenge_id {
            Some(poll_id) => {
                let challenge = self
                    .challenges
                    .get(&poll_id)
                    .ok_or(RegistryError::ChallengeNotFound(poll_id))?;
                if challenge.resolved {
                    return Err(RegistryError::AlreadyResolved(poll_id));
                }
                if !self.voting.read().has_ended(poll_id, now)? {
                    return Err(RegistryError::InvalidState(format!(
                        "poll {} has not ended",
                        poll_id
                    )));
                }
                self.resolve_challenge(listing_id, poll_id, now)
            }
            None => Err(RegistryError::InvalidState(format!(
                "listing {} has nothing to update",
                listing_id
            ))),
        }
    }

    // ---- per-challenge rewards ---------------------------------------------

    /// A winning voter's share of a resolved challenge's reward pool.
    /// Pure query; the remainder of the floor division stays in the
    /// pool.
    pub fn voter_reward(
        &self,
        voter: Address,
        poll_id: PollId,
        salt: u64,
        now: u64,
    ) -> Result<Amount, RegistryError> {
        let challenge = self.challenge_ref(poll_id)?;
        if !challenge.resolved {
            return Err(RegistryError::InvalidState(format!(
                "challenge for poll {} is not resolved",
                poll_id
            )));
        }
        let weight = self.winning_voter_weight(voter, poll_id, salt, now)?;
        Ok(challenge
            .reward_pool
            .checked_mul_div(weight, challenge.total_winning_weight)
            .unwrap_or(Amount::ZERO))
    }

    /// Pay the caller their per-challenge reward and record their
    /// weight into the challenge's epoch.
    pub fn claim_reward(
        &mut self,
        caller: Address,
        poll_id: PollId,
        salt: u64,
        now: u64,
    ) -> Result<Amount, RegistryError> {
        let challenge = self.challenge_ref(poll_id)?;
        if !challenge.resolved {
            return Err(RegistryError::InvalidState(format!(
                "challenge for poll {} is not resolved",
                poll_id
            )));
        }
        if challenge.has_claimed(caller) {
            return Err(RegistryError::AlreadyClaimed {
                poll_id,
                voter: caller,
            });
        }
        let weight = self.winning_voter_weight(caller, poll_id, salt, now)?;
        let epoch = challenge.epoch;
        let reward = challenge
            .reward_pool
            .checked_mul_div(weight, challenge.total_winning_weight)
            .unwrap_or(Amount::ZERO);

        // All bookkeeping commits before tokens leave the registry:
        // claim flag, pool draw-down, epoch weight.
        let challenge = self
            .challenges
            .get_mut(&poll_id)
            .ok_or(RegistryError::ChallengeNotFound(poll_id))?;
        challenge.mark_claimed(caller);
        challenge.reward_pool -= reward;
        challenge.total_winning_weight -= weight;

        // A frozen epoch accepts no more weight; the challenge reward
        // still pays out.
        if !self.bank.epoch_details(epoch).resolved {
            self.bank
                .record_voter_weight(self.address, epoch, caller, weight)?;
        }

        self.token.write().transfer(self.address, caller, reward)?;
        tracing::info!(poll_id, voter = %caller, %reward, epoch, "challenge reward claimed");
        Ok(reward)
    }

    /// Pay the caller their inflation share for the epoch of the given
    /// challenge, resolving the epoch on first demand. Guarded per
    /// `(epoch, voter)`: weight earned through several challenges in
    /// one epoch pays exactly once.
    pub fn claim_inflation_rewards(
        &mut self,
        caller: Address,
        poll_id: PollId,
        now: u64,
    ) -> Result<Amount, RegistryError> {
        let epoch = self.challenge_ref(poll_id)?.epoch;

        // Preconditions come before the resolution trigger so a failed
        // claim leaves the epoch ledger untouched.
        if self.bank.epoch_voter_weight(epoch, caller).is_zero() {
            return Err(BankError::InsufficientRecordedWeight {
                epoch,
                voter: caller,
            }
            .into());
        }
        if self.bank.has_claimed_inflation(epoch, caller) {
            return Err(BankError::AlreadyClaimed {
                epoch,
                voter: caller,
            }
            .into());
        }

        if !self.bank.epoch_details(epoch).resolved {
            self.bank.resolve_epoch(self.address, epoch, now)?;
        }
        let payout = self
            .bank
            .withdraw_inflation_reward(self.address, epoch, caller)?;
        self.token.write().transfer(self.address, caller, payout)?;
        tracing::info!(poll_id, voter = %caller, epoch, %payout, "inflation reward claimed");
        Ok(payout)
    }

    // ---- queries -----------------------------------------------------------

    pub fn listing(&self, listing_id: ListingId) -> Option<&Listing> {
        self.listings.get(&listing_id)
    }

    pub fn challenge_info(&self, poll_id: PollId) -> Option<&Challenge> {
        self.challenges.get(&poll_id)
    }

    pub fn is_whitelisted(&self, listing_id: ListingId) -> bool {
        self.listings
            .get(&listing_id)
            .map(|l| l.whitelisted)
            .unwrap_or(false)
    }

    pub fn app_was_made(&self, listing_id: ListingId) -> bool {
        self.listings.contains_key(&listing_id)
    }

    /// The unresolved challenge against a listing, if any.
    pub fn open_challenge_id(&self, listing_id: ListingId) -> Option<PollId> {
        self.listings
            .get(&listing_id)
            .and_then(|l| self.open_challenge(l))
    }

    pub fn challenge_exists(&self, listing_id: ListingId) -> bool {
        self.open_challenge_id(listing_id).is_some()
    }

    /// Whether `update_status` would whitelist the listing.
    pub fn can_be_whitelisted(&self, listing_id: ListingId, now: u64) -> bool {
        self.listings
            .get(&listing_id)
            .map(|l| {
                !l.whitelisted
                    && l.application_expired(now)
                    && self.open_challenge(l).is_none()
            })
            .unwrap_or(false)
    }

    /// Whether `update_status` would resolve the listing's challenge.
    pub fn challenge_can_be_resolved(&self, listing_id: ListingId, now: u64) -> bool {
        self.open_challenge_id(listing_id)
            .and_then(|poll_id| self.voting.read().has_ended(poll_id, now).ok())
            .unwrap_or(false)
    }

    // ---- internals ---------------------------------------------------------

    fn listing_ref(
        listings: &HashMap<ListingId, Listing>,
        listing_id: ListingId,
    ) -> Result<&Listing, RegistryError> {
        listings
            .get(&listing_id)
            .ok_or(RegistryError::ListingNotFound(listing_id))
    }

    fn listing_mut(
        listings: &mut HashMap<ListingId, Listing>,
        listing_id: ListingId,
    ) -> Result<&mut Listing, RegistryError> {
        listings
            .get_mut(&listing_id)
            .ok_or(RegistryError::ListingNotFound(listing_id))
    }

    fn challenge_ref(&self, poll_id: PollId) -> Result<&Challenge, RegistryError> {
        self.challenges
            .get(&poll_id)
            .ok_or(RegistryError::ChallengeNotFound(poll_id))
    }

    fn open_challenge(&self, listing: &Listing) -> Option<PollId> {
        listing.challenge_id.filter(|id| {
            self.challenges
                .get(id)
                .map(|c| !c.resolved)
                .unwrap_or(false)
        })
    }

    fn whitelist_application(&mut self, listing_id: ListingId) -> Result<(), RegistryError> {
        let listing = Self::listing_mut(&mut self.listings, listing_id)?;
        listing.whitelisted = true;
        tracing::info!(listing = %listing_id, "listing whitelisted");
        Ok(())
    }

    /// Settle an ended poll: whitelist or remove the listing, pay the
    /// prevailing party, seed the voter reward pool, freeze the
    /// winning weight.
    fn resolve_challenge(
        &mut self,
        listing_id: ListingId,
        poll_id: PollId,
        now: u64,
    ) -> Result<(), RegistryError> {
        let (passed, winning_weight) = {
            let voting = self.voting.read();
            (
                voting.is_passed(poll_id, now)?,
                voting.winning_weight(poll_id, now)?,
            )
        };

        let challenge = self
            .challenges
            .get_mut(&poll_id)
            .ok_or(RegistryError::ChallengeNotFound(poll_id))?;
        let takings = challenge.winner_takings(winning_weight);
        challenge.resolved = true;
        challenge.total_winning_weight = winning_weight;
        if winning_weight.is_zero() {
            // no claimants for the dispensation
            challenge.reward_pool = Amount::ZERO;
        }
        let challenger = challenge.challenger;

        if passed {
            // the listing prevailed: (re-)whitelist and credit the
            // takings to its deposit
            let listing = Self::listing_mut(&mut self.listings, listing_id)?;
            listing.whitelisted = true;
            listing.unstaked_deposit += takings;
            tracing::info!(listing = %listing_id, poll_id, %takings, "challenge failed; listing whitelisted");
        } else {
            // the challenger prevailed: pay them and remove the listing
            self.token
                .write()
                .transfer(self.address, challenger, takings)?;
            self.remove_listing(listing_id)?;
            tracing::info!(listing = %listing_id, poll_id, %takings, "challenge succeeded; listing removed");
        }
        Ok(())
    }

    /// Delete a listing, refunding any unstaked deposit to its owner.
    fn remove_listing(&mut self, listing_id: ListingId) -> Result<(), RegistryError> {
        let Some(listing) = self.listings.remove(&listing_id) else {
            return Err(RegistryError::ListingNotFound(listing_id));
        };
        if !listing.unstaked_deposit.is_zero() {
            self.token
                .write()
                .transfer(self.address, listing.owner, listing.unstaked_deposit)?;
        }
        Ok(())
    }

    /// Weight the voter revealed for the winning option, with losers
    /// and non-participants mapped to `Unauthorized`.
    fn winning_voter_weight(
        &self,
        voter: Address,
        poll_id: PollId,
        salt: u64,
        now: u64,
    ) -> Result<Amount, RegistryError> {
        self.voting
            .read()
            .winning_voter_weight(poll_id, voter, salt, now)
            .map_err(|e| match e {
                VotingError::VoterNotWinner(_) | VotingError::CommitmentMismatch(_) => {
                    RegistryError::Unauthorized(format!(
                        "{} did not reveal a winning vote in poll {}",
                        voter, poll_id
                    ))
                }
                other => RegistryError::Voting(other),
            })
    }
}
