//! CURIO Factory - instantiates and capitalizes a registry deployment.
//!
//! One deployment is one token/voting/params/registry/bank set. The
//! factory mints the token supply to a deployer account, moves the
//! bank's reserve into place at genesis, and wires the registry to the
//! bank it exclusively drives.
//!
//! The reserve must stay sufficient to cover all future inflation
//! claims; undercapitalization surfaces as a fatal
//! `InsufficientReserve` at claim time and is not recovered here.

use curio_bank::{Bank, BankConfig};
use curio_params::{Params, ParamsError};
use curio_registry::Registry;
use curio_token::{Token, TokenError};
use curio_types::{Address, Amount};
use curio_voting::CommitRevealVoting;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur assembling a deployment.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("Bank reserve {reserve} exceeds token supply {supply}")]
    ReserveExceedsSupply { reserve: Amount, supply: Amount },

    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Everything needed to stand up one registry instance.
#[derive(Debug, Clone)]
pub struct DeploymentConfig {
    pub token_name: String,
    pub token_symbol: String,
    pub token_decimals: u8,
    pub token_supply: Amount,
    /// Reserve moved to the bank at genesis
    pub bank_reserve: Amount,
    /// Ledger genesis timestamp
    pub genesis: u64,
    pub params: Params,
    pub bank: BankConfig,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        let supply = Amount::new(1_000_000);
        Self {
            token_name: "Curio Token".to_string(),
            token_symbol: "CUR".to_string(),
            token_decimals: 18,
            token_supply: supply,
            // half the supply backs inflation, as seeded deployments do
            bank_reserve: Amount::new(supply.raw() / 2),
            genesis: 0,
            params: Params::default(),
            bank: BankConfig::default(),
        }
    }
}

/// A wired registry deployment.
pub struct Deployment {
    /// Account holding the unallocated token supply
    pub deployer: Address,
    pub token: Arc<RwLock<Token>>,
    pub voting: Arc<RwLock<CommitRevealVoting>>,
    pub params: Arc<Params>,
    pub registry: Registry,
}

impl Deployment {
    /// Build and capitalize a fresh deployment.
    pub fn new(config: DeploymentConfig) -> Result<Self, FactoryError> {
        config.params.validate()?;
        if config.bank_reserve > config.token_supply {
            return Err(FactoryError::ReserveExceedsSupply {
                reserve: config.bank_reserve,
                supply: config.token_supply,
            });
        }

        let deployer = Address::derive("curio/deployer");
        let registry_address = Address::derive("curio/registry");
        let bank_address = Address::derive("curio/bank");

        let token = Arc::new(RwLock::new(Token::new(
            &config.token_name,
            &config.token_symbol,
            config.token_decimals,
            deployer,
            config.token_supply,
        )));
        token
            .write()
            .transfer(deployer, bank_address, config.bank_reserve)?;

        let voting = Arc::new(RwLock::new(CommitRevealVoting::new()));
        let params = Arc::new(config.params);
        let bank = Bank::new(
            bank_address,
            registry_address,
            Arc::clone(&token),
            config.genesis,
            config.bank,
        );
        let registry = Registry::new(
            registry_address,
            Arc::clone(&params),
            Arc::clone(&token),
            Arc::clone(&voting),
            bank,
        );

        tracing::info!(
            supply = %config.token_supply,
            reserve = %config.bank_reserve,
            genesis = config.genesis,
            "deployment capitalized"
        );
        Ok(Self {
            deployer,
            token,
            voting,
            params,
            registry,
        })
    }

    /// Move tokens from the deployer to a participant and approve the
    /// registry to pull them.
    pub fn fund_participant(&self, who: Address, amount: Amount) -> Result<(), FactoryError> {
        let mut token = self.token.write();
        token.transfer(self.deployer, who, amount)?;
        token.approve(who, self.registry.address(), amount)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deployment_capitalizes_bank() {
        let deployment = Deployment::new(DeploymentConfig::default()).unwrap();
        assert_eq!(deployment.registry.bank().reserve(), Amount::new(500_000));
        let token = deployment.token.read();
        assert_eq!(token.balance_of(deployment.deployer), Amount::new(500_000));
        assert_eq!(token.total_supply(), Amount::new(1_000_000));
    }

    #[test]
    fn test_reserve_cannot_exceed_supply() {
        let config = DeploymentConfig {
            token_supply: Amount::new(100),
            bank_reserve: Amount::new(101),
            ..Default::default()
        };
        assert!(matches!(
            Deployment::new(config),
            Err(FactoryError::ReserveExceedsSupply { .. })
        ));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let config = DeploymentConfig {
            params: Params {
                dispensation_pct: 150,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            Deployment::new(config),
            Err(FactoryError::Params(_))
        ));
    }

    #[test]
    fn test_fund_participant() {
        let deployment = Deployment::new(DeploymentConfig::default()).unwrap();
        let voter = Address::derive("voter");
        deployment
            .fund_participant(voter, Amount::new(1_000))
            .unwrap();

        let token = deployment.token.read();
        assert_eq!(token.balance_of(voter), Amount::new(1_000));
        assert_eq!(
            token.allowance(voter, deployment.registry.address()),
            Amount::new(1_000)
        );
    }
}
