use crate::error::TokenError;
use curio_types::{Address, Amount};
use std::collections::HashMap;

/// Fungible token ledger.
#[derive(Debug, Clone)]
pub struct Token {
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Token decimals
    pub decimals: u8,
    /// Total supply
    total_supply: Amount,
    /// Balances: address -> balance
    balances: HashMap<Address, Amount>,
    /// Allowances: (owner, spender) -> amount
    allowances: HashMap<(Address, Address), Amount>,
}

impl Token {
    /// Create a token with the full supply minted to `holder`.
    pub fn new(name: &str, symbol: &str, decimals: u8, holder: Address, supply: Amount) -> Self {
        let mut balances = HashMap::new();
        if !supply.is_zero() {
            balances.insert(holder, supply);
        }
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
            total_supply: supply,
            balances,
            allowances: HashMap::new(),
        }
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn balance_of(&self, holder: Address) -> Amount {
        self.balances.get(&holder).copied().unwrap_or(Amount::ZERO)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> Amount {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Approve `spender` to move up to `amount` of `owner`'s tokens.
    pub fn approve(
        &mut self,
        owner: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        if spender.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        self.allowances.insert((owner, spender), amount);
        Ok(())
    }

    /// Move tokens from `from` to `to`.
    pub fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }

        let from_balance = self.balance_of(from);
        let remaining = from_balance
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientBalance {
                holder: from,
                balance: from_balance,
                needed: amount,
            })?;

        self.set_balance(from, remaining);
        let to_balance = self.balance_of(to);
        self.set_balance(to, to_balance + amount);

        tracing::trace!(%from, %to, %amount, "token transfer");
        Ok(())
    }

    /// Move tokens from `owner` to `to` on behalf of `spender`,
    /// consuming allowance.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        owner: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let allowance = self.allowance(owner, spender);
        let remaining =
            allowance
                .checked_sub(amount)
                .ok_or(TokenError::InsufficientAllowance {
                    owner,
                    spender,
                    allowance,
                    needed: amount,
                })?;

        self.transfer(owner, to, amount)?;
        self.allowances.insert((owner, spender), remaining);
        Ok(())
    }

    fn set_balance(&mut self, holder: Address, balance: Amount) {
        if balance.is_zero() {
            self.balances.remove(&holder);
        } else {
            self.balances.insert(holder, balance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::from_bytes([1u8; 20])
    }

    fn bob() -> Address {
        Address::from_bytes([2u8; 20])
    }

    fn new_token(supply: u128) -> Token {
        Token::new("Curio Token", "CUR", 18, alice(), Amount::new(supply))
    }

    #[test]
    fn test_initial_supply() {
        let token = new_token(1_000_000);
        assert_eq!(token.total_supply(), Amount::new(1_000_000));
        assert_eq!(token.balance_of(alice()), Amount::new(1_000_000));
        assert_eq!(token.balance_of(bob()), Amount::ZERO);
    }

    #[test]
    fn test_transfer() {
        let mut token = new_token(1000);
        token.transfer(alice(), bob(), Amount::new(400)).unwrap();
        assert_eq!(token.balance_of(alice()), Amount::new(600));
        assert_eq!(token.balance_of(bob()), Amount::new(400));
        // total supply unchanged
        assert_eq!(token.total_supply(), Amount::new(1000));
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut token = new_token(100);
        let err = token
            .transfer(alice(), bob(), Amount::new(101))
            .unwrap_err();
        assert!(matches!(err, TokenError::InsufficientBalance { .. }));
        // nothing moved
        assert_eq!(token.balance_of(alice()), Amount::new(100));
    }

    #[test]
    fn test_transfer_to_zero_address() {
        let mut token = new_token(100);
        assert!(matches!(
            token.transfer(alice(), Address::ZERO, Amount::new(1)),
            Err(TokenError::ZeroAddress)
        ));
    }

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let mut token = new_token(1000);
        token.approve(alice(), bob(), Amount::new(500)).unwrap();

        token
            .transfer_from(bob(), alice(), bob(), Amount::new(300))
            .unwrap();
        assert_eq!(token.balance_of(bob()), Amount::new(300));
        assert_eq!(token.allowance(alice(), bob()), Amount::new(200));

        let err = token
            .transfer_from(bob(), alice(), bob(), Amount::new(201))
            .unwrap_err();
        assert!(matches!(err, TokenError::InsufficientAllowance { .. }));
    }

    #[test]
    fn test_transfer_from_insufficient_balance_keeps_allowance() {
        let mut token = new_token(100);
        token.approve(alice(), bob(), Amount::new(500)).unwrap();

        let err = token
            .transfer_from(bob(), alice(), bob(), Amount::new(200))
            .unwrap_err();
        assert!(matches!(err, TokenError::InsufficientBalance { .. }));
        // allowance untouched on failure
        assert_eq!(token.allowance(alice(), bob()), Amount::new(500));
    }
}
