//! Scripted first-depositor donation attack.
//!
//! The attacker mints a single share, donates a large amount straight to
//! the pool to inflate the share price, and waits for victims whose
//! deposits fall just short of one share. Floor rounding credits them
//! nothing, and the attacker's lone share redeems the absorbed assets.
//!
//! Running the same sequence with a virtual offset or a locked initial
//! deposit shows the attack becoming unprofitable.

use crate::core::config::VaultConfig;
use crate::core::domain::Account;
use crate::core::error::VaultError;
use crate::token::balance_store::BalanceStore;
use crate::token::ledger::TokenLedger;
use crate::vault::ledger::Vault;
use crate::vault::request::Request;
use serde::{Deserialize, Serialize};

/// Parameters of one attack run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackConfig {
    /// Virtual-liquidity offset of the target vault.
    pub decimals_offset: u8,
    /// Assets locked by the deployer at construction; zero disables it.
    pub locked_deposit: u128,
    /// Base unit of the asset; the donation is `1000 * scale + 1`.
    pub scale: u128,
    /// Number of victim deposits made after the donation.
    pub victims: usize,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            decimals_offset: 0,
            locked_deposit: 0,
            scale: 1_000_000,
            victims: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// Assets the attacker spent: share purchase plus donation.
    pub attacker_cost: u128,
    /// Assets the attacker received when redeeming.
    pub attacker_payout: u128,
    pub profit: i128,
    pub victim_deposits: Vec<u128>,
    pub victim_shares: Vec<u128>,
}

impl AttackOutcome {
    pub fn is_profitable(&self) -> bool {
        self.profit > 0
    }

    /// Victims that were credited no shares at all.
    pub fn zeroed_victims(&self) -> usize {
        self.victim_shares.iter().filter(|s| **s == 0).count()
    }
}

impl std::fmt::Display for AttackOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Inflation Attack ===")?;
        writeln!(f, "Attacker Cost:   {}", self.attacker_cost)?;
        writeln!(f, "Attacker Payout: {}", self.attacker_payout)?;
        writeln!(f, "Profit:          {}", self.profit)?;
        writeln!(f, "Profitable:      {}", self.is_profitable())?;

        writeln!(f, "\nVictims:")?;
        for (i, (deposit, shares)) in self
            .victim_deposits
            .iter()
            .zip(&self.victim_shares)
            .enumerate()
        {
            writeln!(f, "  victim-{}: deposited {}, received {} shares", i, deposit, shares)?;
        }
        Ok(())
    }
}

fn signed(amount: u128) -> Result<i128, VaultError> {
    i128::try_from(amount).map_err(|_| VaultError::ArithmeticOverflow)
}

/// Run the attack against a freshly deployed vault.
///
/// The attacker issues its single share before donating `1000*scale + 1`.
/// Donating first into a pool with no shares outstanding would only raise
/// the price the attacker then pays for that share.
pub fn run_inflation_attack(config: &AttackConfig) -> Result<AttackOutcome, VaultError> {
    let deployer = Account::disclosed("deployer");
    let attacker = Account::disclosed("attacker");

    let mut assets = TokenLedger::new("ASSET");
    let mut vault_config = VaultConfig::new("pool", "ASSET").with_decimals_offset(config.decimals_offset);
    if config.locked_deposit > 0 {
        assets.mint(&deployer, config.locked_deposit)?;
        vault_config = vault_config.with_initial_deposit(deployer, config.locked_deposit);
    }
    let mut vault = Vault::in_memory(vault_config, assets)?;

    // One share at the honest rate.
    let entry_cost = vault.preview_issue(1)?;
    vault.asset_store_mut().mint(&attacker, entry_cost)?;
    vault.issue(&Request::own(attacker.clone(), attacker.clone(), 1))?;

    let donation = config
        .scale
        .checked_mul(1000)
        .and_then(|d| d.checked_add(1))
        .ok_or(VaultError::ArithmeticOverflow)?;
    let pool = vault.pool_account();
    vault.asset_store_mut().mint(&attacker, donation)?;
    vault.asset_store_mut().transfer(&attacker, &pool, donation)?;
    log::debug!("attacker donated {}, pool now {}", donation, vault.total_assets());

    let mut victim_deposits = Vec::with_capacity(config.victims);
    let mut victim_shares = Vec::with_capacity(config.victims);
    for i in 0..config.victims {
        let victim = Account::disclosed(format!("victim-{i}"));
        // Just below the price of one share.
        let amount = vault.preview_issue(1)?.saturating_sub(1);
        vault.asset_store_mut().mint(&victim, amount)?;
        let receipt = vault.deposit(&Request::own(victim.clone(), victim, amount))?;
        victim_deposits.push(amount);
        victim_shares.push(receipt.shares);
    }

    let held = vault.share_store().balance_of(&attacker);
    let payout = vault
        .redeem(&Request::own(attacker.clone(), attacker, held))?
        .assets;

    let attacker_cost = entry_cost
        .checked_add(donation)
        .ok_or(VaultError::ArithmeticOverflow)?;
    let profit = signed(payout)? - signed(attacker_cost)?;
    log::info!("inflation attack finished with profit {}", profit);

    Ok(AttackOutcome {
        attacker_cost,
        attacker_payout: payout,
        profit,
        victim_deposits,
        victim_shares,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefended_attack_profits() {
        let outcome = run_inflation_attack(&AttackConfig::default()).unwrap();
        assert!(outcome.is_profitable());
        assert_eq!(outcome.zeroed_victims(), 4);
        assert_eq!(outcome.victim_deposits[0], 500_000_001);
    }

    #[test]
    fn test_two_victims_exact_profit() {
        let outcome = run_inflation_attack(&AttackConfig {
            victims: 2,
            ..Default::default()
        })
        .unwrap();
        // pool after victims: 2_250_000_004, one share of two (incl. virtual)
        assert_eq!(outcome.attacker_cost, 1_000_000_002);
        assert_eq!(outcome.attacker_payout, 1_125_000_002);
        assert_eq!(outcome.profit, 125_000_000);
    }

    #[test]
    fn test_donation_into_empty_pool_is_priced_in() {
        let mut vault = Vault::in_memory(VaultConfig::new("pool", "ASSET"), TokenLedger::new("ASSET")).unwrap();
        let pool = vault.pool_account();
        vault.asset_store_mut().mint(&pool, 1_001).unwrap();
        // The first share now costs the whole donation plus one.
        assert_eq!(vault.preview_issue(1).unwrap(), 1_002);
    }

    #[test]
    fn test_locked_deposit_defends() {
        let outcome = run_inflation_attack(&AttackConfig {
            locked_deposit: 1000,
            ..Default::default()
        })
        .unwrap();
        assert!(outcome.profit <= 0);
    }

    #[test]
    fn test_offset_defends() {
        let outcome = run_inflation_attack(&AttackConfig {
            decimals_offset: 6,
            ..Default::default()
        })
        .unwrap();
        assert!(!outcome.is_profitable());
        // Victims still lose dust, but the donation is stranded with virtual shares.
        assert!(outcome.attacker_payout < outcome.attacker_cost / 1000);
    }
}
