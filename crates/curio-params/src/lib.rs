//! CURIO Params - named numeric configuration for a registry deployment.
//!
//! Parameters are governance-configurable in principle; this crate only
//! stores and serves them. Values can be loaded from TOML or built from
//! `Params::default()`.

use curio_types::Amount;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur reading or validating parameters.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Invalid percentage for {name}: {value} (must be <= 100)")]
    InvalidPercentage { name: &'static str, value: u8 },

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Registry parameters.
///
/// `dispensation_pct` is the share of a forfeited stake that seeds the
/// voter reward pool; the prevailing party keeps the remainder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Params {
    /// Minimum listing deposit, in base token units
    pub min_deposit: Amount,
    /// Seconds an unchallenged application waits before whitelisting
    pub apply_stage_length: u64,
    /// Seconds of the poll commit stage
    pub commit_stage_length: u64,
    /// Seconds of the poll reveal stage
    pub reveal_stage_length: u64,
    /// Percentage of a forfeited stake dispensed to winning voters
    pub dispensation_pct: u8,
    /// Percentage of revealed weight that must favor the listing for
    /// the poll to pass
    pub vote_quorum: u8,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            min_deposit: Amount::new(10),
            apply_stage_length: 600,
            commit_stage_length: 600,
            reveal_stage_length: 600,
            dispensation_pct: 50,
            vote_quorum: 50,
        }
    }
}

impl Params {
    /// Parse parameters from a TOML document.
    pub fn from_toml(s: &str) -> Result<Self, ParamsError> {
        let params: Self = toml::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    /// Load parameters from a TOML file.
    pub fn load(path: &std::path::Path) -> Result<Self, ParamsError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// Named numeric lookup.
    pub fn get(&self, name: &str) -> Result<u128, ParamsError> {
        match name {
            "minDeposit" => Ok(self.min_deposit.raw()),
            "applyStageLength" => Ok(u128::from(self.apply_stage_length)),
            "commitStageLength" => Ok(u128::from(self.commit_stage_length)),
            "revealStageLength" => Ok(u128::from(self.reveal_stage_length)),
            "dispensationPct" => Ok(u128::from(self.dispensation_pct)),
            "voteQuorum" => Ok(u128::from(self.vote_quorum)),
            other => Err(ParamsError::UnknownParameter(other.to_string())),
        }
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.dispensation_pct > 100 {
            return Err(ParamsError::InvalidPercentage {
                name: "dispensation_pct",
                value: self.dispensation_pct,
            });
        }
        if self.vote_quorum > 100 {
            return Err(ParamsError::InvalidPercentage {
                name: "vote_quorum",
                value: self.vote_quorum,
            });
        }
        Ok(())
    }
}
