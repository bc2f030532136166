use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use vault_engine::core::config::VaultConfig;
use vault_engine::core::domain::Account;
use vault_engine::simulation::workload::{apply_workload, build_vault, generate_workload, WorkloadConfig};
use vault_engine::token::balance_store::BalanceStore;
use vault_engine::token::ledger::TokenLedger;
use vault_engine::vault::conversion::{assets_for, shares_for, Rounding};
use vault_engine::vault::ledger::Vault;
use vault_engine::vault::request::Request;

/// Pool state that stays far from the u128 ceiling.
fn arb_pool() -> impl Strategy<Value = (u128, u128, u8)> {
    (0u128..1_000_000_000_000, 0u128..1_000_000_000_000, 0u8..=9)
}

fn arb_amount() -> impl Strategy<Value = u128> {
    0u128..1_000_000_000_000
}

proptest! {
    /// Depositing then paying back at the issue rate never returns more than was put in.
    #[test]
    fn asset_round_trip_favors_pool(
        (total_assets, total_supply, offset) in arb_pool(),
        assets in arb_amount(),
    ) {
        let shares = shares_for(assets, total_assets, total_supply, offset, Rounding::Down).unwrap();
        let back = assets_for(shares, total_assets, total_supply, offset, Rounding::Down).unwrap();
        prop_assert!(back <= assets);
    }

    /// Redeeming shares then re-buying them never yields more shares than before.
    #[test]
    fn share_round_trip_favors_pool(
        (total_assets, total_supply, offset) in arb_pool(),
        shares in arb_amount(),
    ) {
        let assets = assets_for(shares, total_assets, total_supply, offset, Rounding::Down).unwrap();
        let back = shares_for(assets, total_assets, total_supply, offset, Rounding::Down).unwrap();
        prop_assert!(back <= shares);
    }

    /// What a caller pays (rounded up) always covers what it would receive (rounded down).
    #[test]
    fn pay_side_covers_receive_side(
        (total_assets, total_supply, offset) in arb_pool(),
        amount in arb_amount(),
    ) {
        let down = shares_for(amount, total_assets, total_supply, offset, Rounding::Down).unwrap();
        let up = shares_for(amount, total_assets, total_supply, offset, Rounding::Up).unwrap();
        prop_assert!(down <= up);
        prop_assert!(up - down <= 1);

        let down = assets_for(amount, total_assets, total_supply, offset, Rounding::Down).unwrap();
        let up = assets_for(amount, total_assets, total_supply, offset, Rounding::Up).unwrap();
        prop_assert!(down <= up);
        prop_assert!(up - down <= 1);
    }

    /// Issuing exactly the shares a deposit would mint costs no more than the deposit.
    #[test]
    fn issue_cost_never_exceeds_deposit(
        (total_assets, total_supply, offset) in arb_pool(),
        assets in arb_amount(),
    ) {
        let shares = shares_for(assets, total_assets, total_supply, offset, Rounding::Down).unwrap();
        let cost = assets_for(shares, total_assets, total_supply, offset, Rounding::Up).unwrap();
        prop_assert!(cost <= assets);
    }

    /// A full deposit/redeem cycle through the vault never leaves the holder richer.
    #[test]
    fn vault_cycle_never_profits(
        seed_assets in 1u128..1_000_000,
        donation in 0u128..1_000_000,
        deposit in 1u128..1_000_000,
        offset in 0u8..=6,
    ) {
        let seeder = Account::disclosed("seeder");
        let holder = Account::disclosed("holder");
        let mut assets = TokenLedger::new("USDC");
        assets.mint(&seeder, seed_assets + donation).unwrap();
        assets.mint(&holder, deposit).unwrap();
        let mut vault = Vault::in_memory(
            VaultConfig::new("pool", "USDC").with_decimals_offset(offset),
            assets,
        ).unwrap();

        vault.deposit(&Request::own(seeder.clone(), seeder.clone(), seed_assets)).unwrap();
        let pool = vault.pool_account();
        vault.asset_store_mut().transfer(&seeder, &pool, donation).unwrap();

        let shares = vault.deposit(&Request::own(holder.clone(), holder.clone(), deposit)).unwrap().shares;
        let back = vault.redeem(&Request::own(holder.clone(), holder.clone(), shares)).unwrap().assets;
        prop_assert!(back <= deposit);
        prop_assert!(vault.check_invariants().is_ok());
    }

    /// Supply and escrow accounting hold after any random operation stream.
    #[test]
    fn conservation_under_random_workloads(seed in any::<u64>(), offset in 0u8..=4) {
        let config = WorkloadConfig {
            steps: 80,
            decimals_offset: offset,
            ..Default::default()
        };
        let mut vault = build_vault(&config).unwrap();
        let asset_supply = vault.asset_store().total_supply();

        let steps = generate_workload(&config, &mut StdRng::seed_from_u64(seed));
        let summary = apply_workload(&mut vault, &steps);

        prop_assert_eq!(summary.executed + summary.reverted, steps.len());
        prop_assert!(vault.check_invariants().is_ok());
        prop_assert!(vault.share_store().supply_matches_balances());
        prop_assert!(vault.asset_store().supply_matches_balances());
        prop_assert_eq!(vault.asset_store().total_supply(), asset_supply);
        prop_assert!(vault.share_store().balance_of(&vault.pool_account()) >= vault.locked_shares());

        // Balances net of provisional shares are exactly the counted supply.
        let provisional = vault.settlement().provisional_holdings();
        let counted: u128 = vault
            .share_store()
            .all_balances()
            .map(|(account, held)| held.saturating_sub(provisional.get(&account).copied().unwrap_or(0)))
            .sum();
        prop_assert_eq!(counted, vault.total_supply());
    }
}
