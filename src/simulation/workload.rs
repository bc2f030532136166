//! Random operation streams for exercising a vault.
//!
//! Generates mixed standard, exact-pattern, donation and finalization
//! steps across a set of holders. Individual steps are allowed to revert;
//! the interesting property is that the vault's accounting holds after
//! any stream.

use crate::core::config::VaultConfig;
use crate::core::domain::Account;
use crate::core::error::VaultError;
use crate::core::operation::OperationKind;
use crate::token::balance_store::BalanceStore;
use crate::token::ledger::TokenLedger;
use crate::vault::ledger::Vault;
use crate::vault::request::Request;
use crate::vault::settlement::CommitmentId;
use rand::Rng;

/// Configuration for generating a random workload.
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// Number of holders acting on the vault.
    pub holders: usize,
    /// Number of steps to generate.
    pub steps: usize,
    /// Assets minted to each holder before the run.
    pub funding: u128,
    pub decimals_offset: u8,
    /// Locked initial deposit; zero disables it.
    pub locked_deposit: u128,
    /// Largest amount used by a single step.
    pub max_amount: u128,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            holders: 5,
            steps: 100,
            funding: 1_000_000,
            decimals_offset: 3,
            locked_deposit: 1_000,
            max_amount: 50_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkloadStep {
    Standard {
        kind: OperationKind,
        holder: usize,
        amount: u128,
        confidential: bool,
    },
    Exact {
        kind: OperationKind,
        holder: usize,
        amount: u128,
    },
    /// Finalize the n-th currently open commitment (modulo the open count).
    Finalize { pick: usize },
    Donate { holder: usize, amount: u128 },
    /// Redeem everything the holder's confidential account holds,
    /// including shares still provisional under an open commitment.
    RedeemHeld { holder: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkloadSummary {
    pub executed: usize,
    pub reverted: usize,
    pub finalized: usize,
}

const KINDS: [OperationKind; 4] = [
    OperationKind::Deposit,
    OperationKind::Issue,
    OperationKind::Withdraw,
    OperationKind::Redeem,
];

pub fn holder_account(index: usize, confidential: bool) -> Account {
    let owner = format!("HOLDER-{:03}", index);
    if confidential {
        Account::confidential(owner)
    } else {
        Account::disclosed(owner)
    }
}

/// Generate a workload from the given random source.
pub fn generate_workload<R: Rng>(config: &WorkloadConfig, rng: &mut R) -> Vec<WorkloadStep> {
    let holders = config.holders.max(1);
    let max_amount = config.max_amount.max(1);
    (0..config.steps)
        .map(|_| {
            let holder = rng.gen_range(0..holders);
            let amount = rng.gen_range(1..=max_amount);
            match rng.gen_range(0..12) {
                0..=4 => WorkloadStep::Standard {
                    kind: KINDS[rng.gen_range(0..KINDS.len())],
                    holder,
                    amount,
                    confidential: rng.gen_bool(0.2),
                },
                5..=6 => WorkloadStep::Exact {
                    kind: KINDS[rng.gen_range(0..KINDS.len())],
                    holder,
                    amount,
                },
                7..=8 => WorkloadStep::Finalize {
                    pick: rng.gen_range(0..holders),
                },
                9 => WorkloadStep::Donate {
                    holder,
                    amount: rng.gen_range(1..=max_amount / 10 + 1),
                },
                _ => WorkloadStep::RedeemHeld { holder },
            }
        })
        .collect()
}

/// Generate a workload using the thread-local random source.
pub fn generate_random_workload(config: &WorkloadConfig) -> Vec<WorkloadStep> {
    generate_workload(config, &mut rand::thread_rng())
}

/// Deploy a vault with every holder funded in both domains.
pub fn build_vault(config: &WorkloadConfig) -> Result<Vault, VaultError> {
    let deployer = Account::disclosed("deployer");
    let mut assets = TokenLedger::new("ASSET");
    for i in 0..config.holders.max(1) {
        assets.mint(&holder_account(i, false), config.funding)?;
        assets.mint(&holder_account(i, true), config.funding)?;
    }
    let mut vault_config = VaultConfig::new("pool", "ASSET").with_decimals_offset(config.decimals_offset);
    if config.locked_deposit > 0 {
        assets.mint(&deployer, config.locked_deposit)?;
        vault_config = vault_config.with_initial_deposit(deployer, config.locked_deposit);
    }
    Vault::in_memory(vault_config, assets)
}

fn standard_request(vault: &Vault, kind: OperationKind, account: Account, amount: u128) -> Result<Request, VaultError> {
    let req = Request::own(account.clone(), account.clone(), amount);
    if !account.is_confidential() {
        return Ok(req);
    }
    // A confidential caller quotes the previewed counter-amount.
    let quote = match kind {
        OperationKind::Deposit => vault.preview_deposit(amount)?,
        OperationKind::Issue => vault.preview_issue(amount)?,
        OperationKind::Withdraw => vault.preview_withdraw(amount)?,
        OperationKind::Redeem => vault.preview_redeem(amount)?,
    };
    Ok(req.with_quote(quote))
}

fn exact_request(vault: &Vault, kind: OperationKind, holder: usize, amount: u128) -> Result<Request, VaultError> {
    let from = holder_account(holder, false);
    let to = holder_account(holder, true);
    let req = Request::own(from.clone(), to, amount);
    let req = match kind {
        OperationKind::Deposit => req.with_limit(vault.preview_deposit(amount)? / 2),
        OperationKind::Issue => req.with_limit(vault.preview_issue(amount)?.saturating_mul(2).saturating_add(1)),
        OperationKind::Withdraw => {
            let cap = vault.preview_withdraw(amount)?.saturating_mul(2).saturating_add(1);
            req.with_limit(cap.min(vault.max_redeem(&from)))
        }
        OperationKind::Redeem => req.with_limit(vault.preview_redeem(amount)? / 2),
    };
    Ok(req)
}

fn apply_one(vault: &mut Vault, step: &WorkloadStep) -> Result<bool, VaultError> {
    match step {
        WorkloadStep::Standard {
            kind,
            holder,
            amount,
            confidential,
        } => {
            let req = standard_request(vault, *kind, holder_account(*holder, *confidential), *amount)?;
            match kind {
                OperationKind::Deposit => vault.deposit(&req)?,
                OperationKind::Issue => vault.issue(&req)?,
                OperationKind::Withdraw => vault.withdraw(&req)?,
                OperationKind::Redeem => vault.redeem(&req)?,
            };
            Ok(false)
        }
        WorkloadStep::Exact {
            kind,
            holder,
            amount,
        } => {
            let req = exact_request(vault, *kind, *holder, *amount)?;
            match kind {
                OperationKind::Deposit => vault.deposit_exact(&req)?,
                OperationKind::Issue => vault.issue_exact(&req)?,
                OperationKind::Withdraw => vault.withdraw_exact(&req)?,
                OperationKind::Redeem => vault.redeem_exact(&req)?,
            };
            Ok(false)
        }
        WorkloadStep::Finalize { pick } => {
            let mut open: Vec<CommitmentId> = vault.settlement().open_commitments().map(|c| c.id).collect();
            if open.is_empty() {
                return Ok(false);
            }
            open.sort();
            let id = open[pick % open.len()];
            vault.finalize(&id)?;
            Ok(true)
        }
        WorkloadStep::Donate { holder, amount } => {
            let pool = vault.pool_account();
            vault
                .asset_store_mut()
                .transfer(&holder_account(*holder, false), &pool, *amount)?;
            Ok(false)
        }
        WorkloadStep::RedeemHeld { holder } => {
            let account = holder_account(*holder, true);
            let held = vault.share_store().balance_of(&account);
            if held == 0 {
                return Ok(false);
            }
            let quote = vault.preview_redeem(held)?;
            let req = Request::own(account, holder_account(*holder, false), held).with_quote(quote);
            vault.redeem(&req)?;
            Ok(false)
        }
    }
}

/// Apply every step, counting the ones that revert.
pub fn apply_workload(vault: &mut Vault, steps: &[WorkloadStep]) -> WorkloadSummary {
    let mut summary = WorkloadSummary::default();
    for step in steps {
        match apply_one(vault, step) {
            Ok(finalized) => {
                summary.executed += 1;
                if finalized {
                    summary.finalized += 1;
                }
            }
            Err(err) => {
                log::debug!("workload step {:?} reverted: {}", step, err);
                summary.reverted += 1;
            }
        }
    }
    summary
}
