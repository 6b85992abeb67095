//! Time-bucketed voter-weight accounting and lazy inflation resolution.

use crate::error::BankError;
use curio_token::Token;
use curio_types::{Address, Amount, EpochId};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Bank configuration.
#[derive(Debug, Clone)]
pub struct BankConfig {
    /// Length of one epoch, in seconds
    pub epoch_duration: u64,
    /// Inflation pool per resolved epoch, in basis points of the
    /// reserve at resolution time
    pub inflation_rate_bps: u16,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            epoch_duration: 180,
            inflation_rate_bps: 100, // 1% of the reserve per epoch
        }
    }
}

/// One epoch's ledger entry. Lazily materialized zero-initialized the
/// first time its number is referenced.
#[derive(Debug, Default)]
struct Epoch {
    total_weight: Amount,
    voter_weight: HashMap<Address, Amount>,
    inflation_pool: Amount,
    resolved: bool,
    inflation_claims: HashSet<Address>,
}

/// Aggregate view of an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochDetails {
    pub total_weight: Amount,
    pub inflation_pool: Amount,
    pub resolved: bool,
}

/// The epoch ledger. Owns all epoch records; only the registry named
/// at construction may mutate them.
#[derive(Debug)]
pub struct Bank {
    /// The bank's own token account, holding the reserve
    address: Address,
    /// Sole authorized caller of mutating entry points
    registry: Address,
    /// Timestamp of ledger genesis
    genesis: u64,
    config: BankConfig,
    token: Arc<RwLock<Token>>,
    epochs: HashMap<EpochId, Epoch>,
}

impl Bank {
    pub fn new(
        address: Address,
        registry: Address,
        token: Arc<RwLock<Token>>,
        genesis: u64,
        config: BankConfig,
    ) -> Self {
        Self {
            address,
            registry,
            genesis,
            config,
            token,
            epochs: HashMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn epoch_duration(&self) -> u64 {
        self.config.epoch_duration
    }

    /// The epoch containing `now`: elapsed time since genesis divided
    /// by the epoch duration. Monotonic in `now`.
    pub fn current_epoch(&self, now: u64) -> EpochId {
        now.saturating_sub(self.genesis) / self.config.epoch_duration
    }

    /// Tokens currently backing future inflation payouts.
    pub fn reserve(&self) -> Amount {
        self.token.read().balance_of(self.address)
    }

    /// Accumulate `amount` of voter weight into an open epoch.
    /// Registry-only.
    pub fn record_voter_weight(
        &mut self,
        caller: Address,
        epoch: EpochId,
        voter: Address,
        amount: Amount,
    ) -> Result<(), BankError> {
        self.authorize(caller)?;
        let entry = self.epochs.entry(epoch).or_default();
        if entry.resolved {
            return Err(BankError::EpochFrozen(epoch));
        }
        *entry.voter_weight.entry(voter).or_insert(Amount::ZERO) += amount;
        entry.total_weight += amount;
        tracing::debug!(epoch, %voter, %amount, total = %entry.total_weight, "voter weight recorded");
        Ok(())
    }

    /// Freeze an elapsed epoch, computing its inflation pool from the
    /// reserve. Registry-only. Idempotent: later calls return the
    /// frozen pool without recomputing it.
    pub fn resolve_epoch(
        &mut self,
        caller: Address,
        epoch: EpochId,
        now: u64,
    ) -> Result<Amount, BankError> {
        self.authorize(caller)?;
        let current = self.current_epoch(now);
        let reserve = self.reserve();

        let entry = self.epochs.entry(epoch).or_default();
        if entry.resolved {
            return Ok(entry.inflation_pool);
        }
        if current <= epoch {
            return Err(BankError::NotYetEligible { epoch, current });
        }

        // An epoch nobody participated in freezes with an empty pool;
        // earmarking reserve that no one can claim would strand it.
        let pool = if entry.total_weight.is_zero() {
            Amount::ZERO
        } else {
            reserve
                .checked_mul_div(
                    Amount::new(u128::from(self.config.inflation_rate_bps)),
                    Amount::new(10_000),
                )
                .unwrap_or(Amount::ZERO)
        };
        entry.inflation_pool = pool;
        entry.resolved = true;
        tracing::info!(epoch, pool = %pool, total_weight = %entry.total_weight, "epoch resolved");
        Ok(pool)
    }

    /// Pay a voter's inflation share out of the reserve, to the
    /// registry for forwarding. Registry-only. Enforces the
    /// per-`(epoch, voter)` claim guard.
    pub fn withdraw_inflation_reward(
        &mut self,
        caller: Address,
        epoch: EpochId,
        voter: Address,
    ) -> Result<Amount, BankError> {
        self.authorize(caller)?;
        let reserve = self.reserve();

        let entry = self.epochs.entry(epoch).or_default();
        if !entry.resolved {
            return Err(BankError::EpochNotResolved(epoch));
        }
        let weight = entry
            .voter_weight
            .get(&voter)
            .copied()
            .unwrap_or(Amount::ZERO);
        if weight.is_zero() {
            return Err(BankError::InsufficientRecordedWeight { epoch, voter });
        }
        if entry.inflation_claims.contains(&voter) {
            return Err(BankError::AlreadyClaimed { epoch, voter });
        }

        let payout = entry
            .inflation_pool
            .checked_mul_div(weight, entry.total_weight)
            .unwrap_or(Amount::ZERO);
        if payout > reserve {
            return Err(BankError::InsufficientReserve {
                needed: payout,
                reserve,
            });
        }

        // Claim flag commits before the outbound transfer.
        entry.inflation_claims.insert(voter);
        if let Err(e) = self
            .token
            .write()
            .transfer(self.address, self.registry, payout)
        {
            // keep the operation all-or-nothing
            if let Some(entry) = self.epochs.get_mut(&epoch) {
                entry.inflation_claims.remove(&voter);
            }
            return Err(e.into());
        }

        tracing::info!(epoch, %voter, %payout, "inflation reward withdrawn");
        Ok(payout)
    }

    /// A voter's proportional share of an epoch's inflation pool.
    /// Zero before resolution and for epochs with no recorded weight.
    pub fn epoch_inflation_voter_rewards(&self, epoch: EpochId, voter: Address) -> Amount {
        let Some(entry) = self.epochs.get(&epoch) else {
            return Amount::ZERO;
        };
        if entry.total_weight.is_zero() {
            return Amount::ZERO;
        }
        let weight = entry
            .voter_weight
            .get(&voter)
            .copied()
            .unwrap_or(Amount::ZERO);
        entry
            .inflation_pool
            .checked_mul_div(weight, entry.total_weight)
            .unwrap_or(Amount::ZERO)
    }

    /// Recorded weight for one voter in one epoch.
    pub fn epoch_voter_weight(&self, epoch: EpochId, voter: Address) -> Amount {
        self.epochs
            .get(&epoch)
            .and_then(|e| e.voter_weight.get(&voter))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Aggregate view of an epoch.
    pub fn epoch_details(&self, epoch: EpochId) -> EpochDetails {
        match self.epochs.get(&epoch) {
            Some(entry) => EpochDetails {
                total_weight: entry.total_weight,
                inflation_pool: entry.inflation_pool,
                resolved: entry.resolved,
            },
            None => EpochDetails {
                total_weight: Amount::ZERO,
                inflation_pool: Amount::ZERO,
                resolved: false,
            },
        }
    }

    /// Whether a voter has claimed an epoch's inflation reward.
    pub fn has_claimed_inflation(&self, epoch: EpochId, voter: Address) -> bool {
        self.epochs
            .get(&epoch)
            .map(|e| e.inflation_claims.contains(&voter))
            .unwrap_or(false)
    }

    fn authorize(&self, caller: Address) -> Result<(), BankError> {
        if caller != self.registry {
            return Err(BankError::Unauthorized(caller));
        }
        Ok(())
    }
}
