use crate::auth::guard::{AccessGuard, DelegationRegistry, IntentAction, OperationIntent};
use crate::core::config::{InitialDeposit, VaultConfig};
use crate::core::domain::Account;
use crate::core::error::VaultError;
use crate::core::operation::OperationKind;
use crate::token::balance_store::BalanceStore;
use crate::token::ledger::TokenLedger;
use crate::vault::conversion::{PoolSnapshot, Rounding};
use crate::vault::request::{Execution, OperationPhase, Receipt, Request};
use crate::vault::settlement::{Commitment, CommitmentId, Settlement, SettlementCoordinator};

/// Tokenized vault over an asset token, issuing shares in a share token.
///
/// The vault owns `total_supply` and reads `total_assets` from the asset
/// store. Every operation checks all of its preconditions before the first
/// balance mutation, so a failed call leaves no trace.
///
/// The pool keeps pooled assets and locked shares in its disclosed
/// accounts. Its confidential accounts hold phase-1 escrow of open
/// commitments, which is excluded from the rate until finalization.
/// Shares minted in phase 1 are likewise outside `total_supply`, so they
/// stay locked in the recipient's account until their commitment settles.
///
/// # Examples
///
/// ```
/// use vault_engine::core::config::VaultConfig;
/// use vault_engine::core::domain::Account;
/// use vault_engine::token::balance_store::BalanceStore;
/// use vault_engine::token::ledger::TokenLedger;
/// use vault_engine::vault::ledger::Vault;
/// use vault_engine::vault::request::Request;
///
/// let mut assets = TokenLedger::new("USDC");
/// assets.mint(&Account::disclosed("alice"), 100).unwrap();
///
/// let mut vault = Vault::in_memory(VaultConfig::new("pool", "USDC"), assets).unwrap();
/// let alice = Account::disclosed("alice");
/// let receipt = vault.deposit(&Request::own(alice.clone(), alice.clone(), 40)).unwrap();
///
/// assert_eq!(receipt.shares, 40);
/// assert_eq!(vault.total_assets(), 40);
/// assert_eq!(vault.total_supply(), 40);
/// ```
#[derive(Debug, Clone)]
pub struct Vault<B = TokenLedger, G = DelegationRegistry> {
    config: VaultConfig,
    assets: B,
    shares: B,
    guard: G,
    total_supply: u128,
    locked_shares: u128,
    settlement: SettlementCoordinator,
}

fn ensure_balance<B: BalanceStore>(store: &B, account: &Account, amount: u128) -> Result<(), VaultError> {
    let available = store.balance_of(account);
    if available < amount {
        return Err(VaultError::InsufficientBalance {
            account: account.clone(),
            available,
            requested: amount,
        });
    }
    Ok(())
}

/// Apply the caller's quote and bound to a computed counter-amount.
///
/// A quote may only move value toward the pool: a payer may offer more
/// than computed, a receiver may accept less.
fn settle_counter(
    kind: OperationKind,
    computed: u128,
    quote: Option<u128>,
    limit: Option<u128>,
) -> Result<u128, VaultError> {
    if kind.caller_pays_counter() {
        let amount = match quote {
            Some(q) if q < computed => {
                return Err(VaultError::SlippageExceeded { computed, bound: q })
            }
            Some(q) => q,
            None => computed,
        };
        match limit {
            Some(max) if amount > max => Err(VaultError::SlippageExceeded {
                computed: amount,
                bound: max,
            }),
            _ => Ok(amount),
        }
    } else {
        let amount = match quote {
            Some(q) if q > computed => {
                return Err(VaultError::SlippageExceeded { computed, bound: q })
            }
            Some(q) => q,
            None => computed,
        };
        match limit {
            Some(min) if amount < min => Err(VaultError::SlippageExceeded {
                computed: amount,
                bound: min,
            }),
            _ => Ok(amount),
        }
    }
}

impl Vault<TokenLedger, DelegationRegistry> {
    /// Vault with a fresh share token and an empty delegation registry.
    pub fn in_memory(config: VaultConfig, assets: TokenLedger) -> Result<Self, VaultError> {
        let shares = TokenLedger::new(format!("v{}", config.asset));
        Self::new(config, assets, shares, DelegationRegistry::new())
    }
}

impl<B: BalanceStore, G: AccessGuard> Vault<B, G> {
    /// Validate `config` and deploy the vault, performing the locked
    /// initial deposit if one is configured.
    pub fn new(config: VaultConfig, assets: B, shares: B, guard: G) -> Result<Self, VaultError> {
        config.validate()?;
        if shares.total_supply() != 0 {
            return Err(VaultError::InvalidConfig(
                "share token must start with zero supply".into(),
            ));
        }
        let initial = config.initial_deposit.clone();
        let mut vault = Self {
            config,
            assets,
            shares,
            guard,
            total_supply: 0,
            locked_shares: 0,
            settlement: SettlementCoordinator::new(),
        };
        if let Some(initial) = initial {
            vault.lock_initial_deposit(&initial)?;
        }
        log::info!(
            "vault {} deployed for {} (offset {}, locked {} shares)",
            vault.config.pool,
            vault.config.asset,
            vault.config.decimals_offset,
            vault.locked_shares
        );
        Ok(vault)
    }

    fn lock_initial_deposit(&mut self, initial: &InitialDeposit) -> Result<(), VaultError> {
        let shares = self.snapshot().shares_for(initial.assets, Rounding::Down)?;
        if shares == 0 {
            return Err(VaultError::InvalidConfig(
                "initial deposit mints no shares".into(),
            ));
        }
        ensure_balance(&self.assets, &initial.depositor, initial.assets)?;
        let pool = self.pool_account();
        self.assets.transfer(&initial.depositor, &pool, initial.assets)?;
        self.shares.mint(&pool, shares)?;
        self.total_supply = shares;
        self.locked_shares = shares;
        Ok(())
    }

    // --- Accessors ---

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn asset_store(&self) -> &B {
        &self.assets
    }

    /// Direct access to the asset token, bypassing the vault (e.g. yield
    /// or donations sent straight to the pool).
    pub fn asset_store_mut(&mut self) -> &mut B {
        &mut self.assets
    }

    pub fn share_store(&self) -> &B {
        &self.shares
    }

    pub fn guard(&self) -> &G {
        &self.guard
    }

    pub fn guard_mut(&mut self) -> &mut G {
        &mut self.guard
    }

    pub fn settlement(&self) -> &SettlementCoordinator {
        &self.settlement
    }

    pub fn commitment(&self, id: &CommitmentId) -> Option<&Commitment> {
        self.settlement.get(id)
    }

    pub fn pool_account(&self) -> Account {
        Account::disclosed(self.config.pool.clone())
    }

    /// Pool account holding phase-1 escrow.
    pub fn escrow_account(&self) -> Account {
        Account::confidential(self.config.pool.clone())
    }

    // --- Views ---

    /// Pooled assets: the pool's disclosed balance plus assets already
    /// paid out by open withdraw/redeem commitments.
    pub fn total_assets(&self) -> u128 {
        self.assets
            .balance_of(&self.pool_account())
            .saturating_add(self.settlement.outstanding_payouts())
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn locked_shares(&self) -> u128 {
        self.locked_shares
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot::new(
            self.total_assets(),
            self.total_supply,
            self.config.decimals_offset,
        )
    }

    pub fn convert_to_shares(&self, assets: u128) -> Result<u128, VaultError> {
        self.snapshot().shares_for(assets, Rounding::Down)
    }

    pub fn convert_to_assets(&self, shares: u128) -> Result<u128, VaultError> {
        self.snapshot().assets_for(shares, Rounding::Down)
    }

    pub fn max_deposit(&self) -> u128 {
        match self.config.deposit_cap {
            Some(cap) => cap.saturating_sub(self.total_assets()),
            None => u128::MAX,
        }
    }

    pub fn max_issue(&self) -> u128 {
        match self.config.deposit_cap {
            Some(_) => self
                .convert_to_shares(self.max_deposit())
                .unwrap_or(u128::MAX),
            None => u128::MAX,
        }
    }

    pub fn max_withdraw(&self, owner: &Account) -> Result<u128, VaultError> {
        self.convert_to_assets(self.max_redeem(owner))
    }

    pub fn max_redeem(&self, owner: &Account) -> u128 {
        if owner.owner == self.config.pool {
            return 0;
        }
        self.free_shares(owner)
    }

    /// Shares in `account` not held back by open commitments.
    pub fn free_shares(&self, account: &Account) -> u128 {
        self.shares
            .balance_of(account)
            .saturating_sub(self.settlement.provisional_held_by(account))
    }

    pub fn preview_deposit(&self, assets: u128) -> Result<u128, VaultError> {
        self.snapshot().shares_for(assets, OperationKind::Deposit.rounding())
    }

    pub fn preview_issue(&self, shares: u128) -> Result<u128, VaultError> {
        self.snapshot().assets_for(shares, OperationKind::Issue.rounding())
    }

    pub fn preview_withdraw(&self, assets: u128) -> Result<u128, VaultError> {
        self.snapshot().shares_for(assets, OperationKind::Withdraw.rounding())
    }

    pub fn preview_redeem(&self, shares: u128) -> Result<u128, VaultError> {
        self.snapshot().assets_for(shares, OperationKind::Redeem.rounding())
    }

    fn preview(&self, kind: OperationKind, amount: u128) -> Result<u128, VaultError> {
        match kind {
            OperationKind::Deposit => self.preview_deposit(amount),
            OperationKind::Issue => self.preview_issue(amount),
            OperationKind::Withdraw => self.preview_withdraw(amount),
            OperationKind::Redeem => self.preview_redeem(amount),
        }
    }

    /// Verify supply accounting and escrow coverage.
    pub fn check_invariants(&self) -> Result<(), VaultError> {
        let expected = self
            .total_supply
            .checked_add(self.settlement.provisional_shares())
            .ok_or(VaultError::ArithmeticOverflow)?;
        if self.shares.total_supply() != expected {
            return Err(VaultError::InvariantViolation(format!(
                "share supply {} != total supply {} + provisional {}",
                self.shares.total_supply(),
                self.total_supply,
                self.settlement.provisional_shares()
            )));
        }
        if self.shares.balance_of(&self.pool_account()) < self.locked_shares {
            return Err(VaultError::InvariantViolation(
                "locked shares left the pool".into(),
            ));
        }
        // With every provisional share still in place, the remaining
        // balances add up to exactly `total_supply`.
        for (account, provisional) in self.settlement.provisional_holdings() {
            let held = self.shares.balance_of(&account);
            if held < provisional {
                return Err(VaultError::InvariantViolation(format!(
                    "{} holds {} shares but {} are provisional",
                    account, held, provisional
                )));
            }
        }
        let (escrow_assets, escrow_shares) = self.settlement.open_commitments().fold(
            (0u128, 0u128),
            |(a, s), c| match c.kind {
                OperationKind::Deposit | OperationKind::Issue => (a.saturating_add(c.asset_amount), s),
                OperationKind::Withdraw | OperationKind::Redeem => (a, s.saturating_add(c.share_amount)),
            },
        );
        let escrow = self.escrow_account();
        if self.assets.balance_of(&escrow) < escrow_assets
            || self.shares.balance_of(&escrow) < escrow_shares
        {
            return Err(VaultError::InvariantViolation(
                "escrow does not cover open commitments".into(),
            ));
        }
        Ok(())
    }

    // --- Operations ---

    /// Pull `amount` assets from `from`, credit shares (rounded down) to `to`.
    pub fn deposit(&mut self, req: &Request) -> Result<Receipt, VaultError> {
        self.execute("deposit", |vault, exec| {
            vault.try_standard(OperationKind::Deposit, req, exec)
        })
    }

    /// Credit exactly `amount` shares to `to`, pulling assets (rounded up) from `from`.
    pub fn issue(&mut self, req: &Request) -> Result<Receipt, VaultError> {
        self.execute("issue", |vault, exec| {
            vault.try_standard(OperationKind::Issue, req, exec)
        })
    }

    /// Pay exactly `amount` assets to `to`, burning shares (rounded up) from `from`.
    pub fn withdraw(&mut self, req: &Request) -> Result<Receipt, VaultError> {
        self.execute("withdraw", |vault, exec| {
            vault.try_standard(OperationKind::Withdraw, req, exec)
        })
    }

    /// Burn `amount` shares from `from`, paying assets (rounded down) to `to`.
    pub fn redeem(&mut self, req: &Request) -> Result<Receipt, VaultError> {
        self.execute("redeem", |vault, exec| {
            vault.try_standard(OperationKind::Redeem, req, exec)
        })
    }

    /// Phase 1 of an exact deposit. `limit` is the minimum share amount,
    /// `quote` the shares minted immediately (at most `limit`, default `limit`).
    pub fn deposit_exact(&mut self, req: &Request) -> Result<Receipt, VaultError> {
        self.execute("deposit_exact", |vault, exec| {
            vault.try_exact(OperationKind::Deposit, req, exec)
        })
    }

    /// Phase 1 of an exact issue. `limit` is the maximum asset cost, escrowed in full.
    pub fn issue_exact(&mut self, req: &Request) -> Result<Receipt, VaultError> {
        self.execute("issue_exact", |vault, exec| {
            vault.try_exact(OperationKind::Issue, req, exec)
        })
    }

    /// Phase 1 of an exact withdraw. `limit` is the maximum share cost, escrowed in full.
    pub fn withdraw_exact(&mut self, req: &Request) -> Result<Receipt, VaultError> {
        self.execute("withdraw_exact", |vault, exec| {
            vault.try_exact(OperationKind::Withdraw, req, exec)
        })
    }

    /// Phase 1 of an exact redeem. `limit` is the minimum asset amount,
    /// `quote` the assets paid immediately (at most `limit`, default `limit`).
    pub fn redeem_exact(&mut self, req: &Request) -> Result<Receipt, VaultError> {
        self.execute("redeem_exact", |vault, exec| {
            vault.try_exact(OperationKind::Redeem, req, exec)
        })
    }

    /// Move shares between holders. Pool shares and provisional shares
    /// cannot be moved.
    pub fn transfer_shares(&mut self, from: &Account, to: &Account, amount: u128) -> Result<(), VaultError> {
        self.ensure_not_pool(from)?;
        self.ensure_free_shares(from, amount)?;
        self.shares.transfer(from, to, amount)?;
        log::debug!("moved {} shares {} -> {}", amount, from, to);
        Ok(())
    }

    /// Phase 2: settle an open commitment at the current rate.
    ///
    /// Anyone may finalize; the commitment's bound protects the recipient.
    /// If the bound is not met the call reverts and the commitment stays open.
    pub fn finalize(&mut self, id: &CommitmentId) -> Result<Settlement, VaultError> {
        self.execute("finalize", |vault, exec| vault.try_finalize(id, exec))
    }

    fn execute<T, F>(&mut self, label: &'static str, body: F) -> Result<T, VaultError>
    where
        F: FnOnce(&mut Self, &mut Execution) -> Result<T, VaultError>,
    {
        let mut exec = Execution::begin(label);
        match body(self, &mut exec) {
            Ok(value) => {
                exec.advance(OperationPhase::Completed);
                Ok(value)
            }
            Err(err) => {
                log::warn!("{} reverted after {:?}: {}", label, exec.phase(), err);
                exec.advance(OperationPhase::Reverted);
                Err(err)
            }
        }
    }

    fn ensure_not_pool(&self, from: &Account) -> Result<(), VaultError> {
        if from.owner == self.config.pool {
            return Err(VaultError::LockedShares);
        }
        Ok(())
    }

    fn ensure_free_shares(&self, account: &Account, amount: u128) -> Result<(), VaultError> {
        let available = self.free_shares(account);
        if available < amount {
            return Err(VaultError::InsufficientBalance {
                account: account.clone(),
                available,
                requested: amount,
            });
        }
        Ok(())
    }

    fn authorize(&self, req: &Request, action: IntentAction) -> Result<OperationIntent, VaultError> {
        let intent = req.intent(action);
        let verdict = self
            .guard
            .authorize(&req.caller, &req.from.owner, &intent, req.nonce);
        if !verdict.is_authorized() {
            return Err(VaultError::InsufficientAuthorization {
                caller: req.caller.clone(),
                owner: req.from.owner.clone(),
            });
        }
        Ok(intent)
    }

    fn enforce_limit(&self, kind: OperationKind, req: &Request) -> Result<(), VaultError> {
        if !self.config.enforce_limits {
            return Ok(());
        }
        let limit = match kind {
            OperationKind::Deposit => self.max_deposit(),
            OperationKind::Issue => self.max_issue(),
            OperationKind::Withdraw => self.max_withdraw(&req.from)?,
            OperationKind::Redeem => self.max_redeem(&req.from),
        };
        if req.amount > limit {
            return Err(VaultError::LimitExceeded {
                limit,
                requested: req.amount,
            });
        }
        Ok(())
    }

    /// New `total_supply` after minting `shares`, checking the share store too.
    fn supply_after_mint(&self, minted: u128, counted: u128) -> Result<u128, VaultError> {
        self.shares
            .total_supply()
            .checked_add(minted)
            .ok_or(VaultError::ArithmeticOverflow)?;
        self.total_supply
            .checked_add(counted)
            .ok_or(VaultError::ArithmeticOverflow)
    }

    fn supply_after_burn(&self, burned: u128) -> Result<u128, VaultError> {
        self.total_supply.checked_sub(burned).ok_or_else(|| {
            VaultError::InvariantViolation(format!(
                "burning {} shares exceeds total supply {}",
                burned, self.total_supply
            ))
        })
    }

    fn try_standard(
        &mut self,
        kind: OperationKind,
        req: &Request,
        exec: &mut Execution,
    ) -> Result<Receipt, VaultError> {
        self.ensure_not_pool(&req.from)?;
        if req.from.is_confidential() && req.quote.is_none() {
            return Err(VaultError::QuoteRequired);
        }
        let intent = self.authorize(req, IntentAction::Standard(kind))?;
        exec.advance(OperationPhase::Authorized);

        self.enforce_limit(kind, req)?;
        let computed = self.preview(kind, req.amount)?;
        let counter = settle_counter(kind, computed, req.quote, req.limit)?;
        let (assets, shares) = if kind.input_is_assets() {
            (req.amount, counter)
        } else {
            (counter, req.amount)
        };

        let pool = self.pool_account();
        let new_supply = match kind {
            OperationKind::Deposit | OperationKind::Issue => {
                ensure_balance(&self.assets, &req.from, assets)?;
                self.supply_after_mint(shares, shares)?
            }
            OperationKind::Withdraw | OperationKind::Redeem => {
                self.ensure_free_shares(&req.from, shares)?;
                ensure_balance(&self.assets, &pool, assets)?;
                self.supply_after_burn(shares)?
            }
        };
        exec.advance(OperationPhase::Computed);

        self.guard
            .consume(&req.caller, &req.from.owner, &intent, req.nonce);
        match kind {
            OperationKind::Deposit | OperationKind::Issue => {
                self.assets.transfer(&req.from, &pool, assets)?;
                self.shares.mint(&req.to, shares)?;
            }
            OperationKind::Withdraw | OperationKind::Redeem => {
                self.shares.burn(&req.from, shares)?;
                self.assets.transfer(&pool, &req.to, assets)?;
            }
        }
        self.total_supply = new_supply;
        exec.advance(OperationPhase::Mutated);

        let receipt = Receipt {
            kind,
            from: req.from.clone(),
            to: req.to.clone(),
            assets,
            shares,
            commitment: None,
        };
        log::info!("{}", receipt);
        Ok(receipt)
    }

    fn try_exact(
        &mut self,
        kind: OperationKind,
        req: &Request,
        exec: &mut Execution,
    ) -> Result<Receipt, VaultError> {
        self.ensure_not_pool(&req.from)?;
        if req.amount == 0 {
            return Err(VaultError::ZeroAmountRejected);
        }
        let bound = req.limit.ok_or(VaultError::QuoteRequired)?;
        let escrow = self.escrow_account();
        // Escrow only ever holds what open commitments put there.
        if req.to == escrow {
            return Err(VaultError::LockedShares);
        }
        let intent = self.authorize(req, IntentAction::Exact(kind))?;
        exec.advance(OperationPhase::Authorized);

        self.enforce_limit(kind, req)?;
        let pool = self.pool_account();
        let (asset_amount, share_amount) = match kind {
            OperationKind::Deposit => {
                let provisional = req.quote.unwrap_or(bound);
                if provisional > bound {
                    return Err(VaultError::SlippageExceeded { computed: provisional, bound });
                }
                ensure_balance(&self.assets, &req.from, req.amount)?;
                self.supply_after_mint(provisional, 0)?;
                (req.amount, provisional)
            }
            OperationKind::Issue => {
                ensure_balance(&self.assets, &req.from, bound)?;
                self.supply_after_mint(req.amount, 0)?;
                (bound, req.amount)
            }
            OperationKind::Withdraw => {
                self.ensure_free_shares(&req.from, bound)?;
                ensure_balance(&self.assets, &pool, req.amount)?;
                (req.amount, bound)
            }
            OperationKind::Redeem => {
                let provisional = req.quote.unwrap_or(bound);
                if provisional > bound {
                    return Err(VaultError::SlippageExceeded { computed: provisional, bound });
                }
                self.ensure_free_shares(&req.from, req.amount)?;
                ensure_balance(&self.assets, &pool, provisional)?;
                (provisional, req.amount)
            }
        };
        exec.advance(OperationPhase::Computed);

        self.guard
            .consume(&req.caller, &req.from.owner, &intent, req.nonce);
        match kind {
            OperationKind::Deposit | OperationKind::Issue => {
                self.assets.transfer(&req.from, &escrow, asset_amount)?;
                self.shares.mint(&req.to, share_amount)?;
            }
            OperationKind::Withdraw | OperationKind::Redeem => {
                self.shares.transfer(&req.from, &escrow, share_amount)?;
                self.assets.transfer(&pool, &req.to, asset_amount)?;
            }
        }
        let id = self.settlement.open(
            req.caller.clone(),
            req.to.clone(),
            req.from.clone(),
            kind,
            asset_amount,
            share_amount,
            bound,
        );
        exec.advance(OperationPhase::Mutated);

        let receipt = Receipt {
            kind,
            from: req.from.clone(),
            to: req.to.clone(),
            assets: asset_amount,
            shares: share_amount,
            commitment: Some(id),
        };
        log::info!("{}", receipt);
        Ok(receipt)
    }

    fn try_finalize(&mut self, id: &CommitmentId, exec: &mut Execution) -> Result<Settlement, VaultError> {
        let settlement = self.settlement.resolve(id, &self.snapshot())?;
        let c = self
            .settlement
            .get(id)
            .cloned()
            .ok_or(VaultError::UnknownOrAlreadyFinalizedCommitment(*id))?;
        exec.advance(OperationPhase::Authorized);

        let pool = self.pool_account();
        let escrow = self.escrow_account();
        let new_supply = match c.kind {
            OperationKind::Deposit => {
                ensure_balance(&self.assets, &escrow, c.asset_amount)?;
                self.supply_after_mint(settlement.surplus, settlement.exact)?
            }
            OperationKind::Issue => {
                ensure_balance(&self.assets, &escrow, c.asset_amount)?;
                self.supply_after_mint(0, c.share_amount)?
            }
            OperationKind::Withdraw => {
                ensure_balance(&self.shares, &escrow, c.share_amount)?;
                self.supply_after_burn(settlement.exact)?
            }
            OperationKind::Redeem => {
                ensure_balance(&self.shares, &escrow, c.share_amount)?;
                ensure_balance(&self.assets, &pool, settlement.surplus)?;
                self.supply_after_burn(c.share_amount)?
            }
        };
        exec.advance(OperationPhase::Computed);

        match c.kind {
            OperationKind::Deposit => {
                self.assets.transfer(&escrow, &pool, c.asset_amount)?;
                self.shares.mint(&c.counterparty_hint, settlement.surplus)?;
            }
            OperationKind::Issue => {
                self.assets.transfer(&escrow, &pool, settlement.exact)?;
                self.assets.transfer(&escrow, &c.refund_to, settlement.refund)?;
            }
            OperationKind::Withdraw => {
                self.shares.burn(&escrow, settlement.exact)?;
                self.shares.transfer(&escrow, &c.refund_to, settlement.refund)?;
            }
            OperationKind::Redeem => {
                self.shares.burn(&escrow, c.share_amount)?;
                self.assets
                    .transfer(&pool, &c.counterparty_hint, settlement.surplus)?;
            }
        }
        self.total_supply = new_supply;
        self.settlement.mark_finalized(id)?;
        exec.advance(OperationPhase::Mutated);

        log::info!(
            "finalized {} commitment {}: exact {}, surplus {}, refund {}",
            c.kind,
            id,
            settlement.exact,
            settlement.surplus,
            settlement.refund
        );
        Ok(settlement)
    }
}
