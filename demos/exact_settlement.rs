//! Two-phase exact settlement into the confidential domain.
//!
//! A holder moves into and out of confidential balances, where the
//! exchange rate cannot be read, using provisional amounts now and
//! reconciling at the true rate later.

use vault_engine::core::config::VaultConfig;
use vault_engine::core::domain::Account;
use vault_engine::core::error::VaultError;
use vault_engine::token::balance_store::BalanceStore;
use vault_engine::token::ledger::TokenLedger;
use vault_engine::vault::ledger::Vault;
use vault_engine::vault::request::Request;

fn main() -> Result<(), VaultError> {
    println!("╔══════════════════════════════════════════╗");
    println!("║  vault-engine: Exact Settlement Example  ║");
    println!("╚══════════════════════════════════════════╝\n");

    let deployer = Account::disclosed("deployer");
    let dana = Account::disclosed("dana");
    let dana_private = Account::confidential("dana");

    let mut assets = TokenLedger::new("USDC");
    assets.mint(&deployer, 1_000)?;
    assets.mint(&dana, 100_000)?;

    let config = VaultConfig::new("pool", "USDC")
        .with_decimals_offset(3)
        .with_initial_deposit(deployer, 1_000);
    let mut vault = Vault::in_memory(config, assets)?;

    // --- Phase 1: deposit into confidential shares ---
    println!("━━━ Phase 1: deposit_exact ━━━\n");

    let min_shares = vault.preview_deposit(40_000)? * 99 / 100;
    let receipt = vault.deposit_exact(
        &Request::own(dana.clone(), dana_private.clone(), 40_000)
            .with_limit(min_shares)
            .with_quote(min_shares / 2),
    )?;
    println!("{}", receipt);
    println!(
        "Confidential shares held now:   {}",
        vault.share_store().balance_of(&dana_private)
    );
    println!("Open commitments:               {}\n", vault.settlement().open_commitments().count());

    // --- Phase 2: anyone may finalize ---
    println!("━━━ Phase 2: finalize ━━━\n");

    if let Some(id) = receipt.commitment {
        let settlement = vault.finalize(&id)?;
        println!("Exact shares:   {}", settlement.exact);
        println!("Surplus minted: {}", settlement.surplus);
        println!(
            "Confidential shares now:        {}\n",
            vault.share_store().balance_of(&dana_private)
        );
    }

    // --- Round trip: redeem back out with a minimum ---
    println!("━━━ Exit: redeem_exact ━━━\n");

    let shares = vault.share_store().balance_of(&dana_private);
    let pool = vault.pool_account();
    vault.transfer_shares(&dana_private, &dana, shares)?;
    let min_assets = vault.preview_redeem(shares)?;
    let receipt = vault.redeem_exact(
        &Request::own(dana.clone(), dana_private.clone(), shares)
            .with_limit(min_assets)
            .with_quote(min_assets / 4),
    )?;
    println!("{}", receipt);

    // Yield arrives before finalization; the recipient gets the better rate.
    vault.asset_store_mut().mint(&pool, 500)?;
    if let Some(id) = receipt.commitment {
        let settlement = vault.finalize(&id)?;
        println!("Exact assets:   {}", settlement.exact);
        println!("Surplus paid:   {}", settlement.surplus);
    }

    println!();
    println!("{}", vault.snapshot());
    vault.check_invariants()?;
    println!("Invariants hold.");
    Ok(())
}
