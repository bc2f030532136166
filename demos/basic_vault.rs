//! Basic vault lifecycle and inflation-attack comparison.
//!
//! Demonstrates pool-favoring rounding on a yield-bearing vault and how
//! a locked initial deposit or a virtual offset defuses a donation attack.

use vault_engine::core::config::VaultConfig;
use vault_engine::core::domain::Account;
use vault_engine::core::error::VaultError;
use vault_engine::simulation::inflation_attack::{run_inflation_attack, AttackConfig};
use vault_engine::token::balance_store::BalanceStore;
use vault_engine::token::ledger::TokenLedger;
use vault_engine::vault::ledger::Vault;
use vault_engine::vault::request::Request;

fn main() -> Result<(), VaultError> {
    println!("╔══════════════════════════════════════════╗");
    println!("║  vault-engine: Basic Vault Example       ║");
    println!("╚══════════════════════════════════════════╝\n");

    // --- Scenario 1: Yield accrues to holders ---
    println!("━━━ Scenario 1: Deposit, Yield, Exit ━━━\n");

    let alice = Account::disclosed("alice");
    let bob = Account::disclosed("bob");
    let mut assets = TokenLedger::new("USDC");
    assets.mint(&alice, 9)?;
    assets.mint(&bob, 20)?;

    let mut vault = Vault::in_memory(VaultConfig::new("pool", "USDC"), assets)?;
    let pool = vault.pool_account();

    println!("{}", vault.deposit(&Request::own(alice.clone(), alice.clone(), 9))?);
    vault.asset_store_mut().transfer(&bob, &pool, 5)?;
    println!("5 USDC of yield lands in the pool");
    println!("{}", vault.issue(&Request::own(bob.clone(), bob.clone(), 10).with_limit(15))?);
    println!("{}", vault.withdraw(&Request::own(alice.clone(), alice.clone(), 13))?);
    println!("{}", vault.redeem(&Request::own(bob.clone(), bob.clone(), 10))?);
    println!();
    println!("{}", vault.snapshot());
    println!("(the remaining asset is rounding dust kept by the pool)\n");

    // --- Scenario 2: Donation attack ---
    println!("━━━ Scenario 2: Inflation Attack ━━━\n");

    let runs = [
        ("undefended", AttackConfig::default()),
        (
            "locked deposit of 1000",
            AttackConfig {
                locked_deposit: 1_000,
                ..Default::default()
            },
        ),
        (
            "decimals offset 6",
            AttackConfig {
                decimals_offset: 6,
                ..Default::default()
            },
        ),
    ];

    for (name, config) in runs {
        let outcome = run_inflation_attack(&config)?;
        println!(
            "  {:<24} profit {:>16}  victims zeroed {}/{}",
            name,
            outcome.profit,
            outcome.zeroed_victims(),
            outcome.victim_shares.len()
        );
    }
    Ok(())
}
