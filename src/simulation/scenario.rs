//! JSON-described vault scenarios.
//!
//! A scenario names a vault configuration, the asset balances to mint
//! before deployment, and an ordered list of steps. Steps that revert are
//! recorded with their error and the run continues, so a script can show
//! both the happy path and the failures a bound or guard produces.

use crate::auth::guard::IntentAction;
use crate::core::address::Address;
use crate::core::config::VaultConfig;
use crate::core::domain::Account;
use crate::core::error::VaultError;
use crate::core::operation::OperationKind;
use crate::token::balance_store::BalanceStore;
use crate::token::ledger::TokenLedger;
use crate::vault::ledger::Vault;
use crate::vault::request::{Receipt, Request};
use crate::vault::settlement::{CommitmentId, Settlement};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mint {
    pub account: Account,
    pub amount: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenSide {
    Asset,
    Share,
}

/// One scripted action, written as `{ "<op>": { ...arguments } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Deposit(Request),
    Issue(Request),
    Withdraw(Request),
    Redeem(Request),
    DepositExact(Request),
    IssueExact(Request),
    WithdrawExact(Request),
    RedeemExact(Request),
    /// Finalize the commitment opened by the step at index `step`.
    Finalize { step: usize },
    /// Send assets straight to the pool, bypassing the vault.
    Donate { from: Account, amount: u128 },
    Transfer {
        token: TokenSide,
        from: Account,
        to: Account,
        amount: u128,
    },
    /// The owner of `request.from` delegates `request` to its caller.
    Approve {
        kind: OperationKind,
        #[serde(default)]
        exact: bool,
        request: Request,
    },
}

impl Step {
    pub fn label(&self) -> &'static str {
        match self {
            Step::Deposit(_) => "deposit",
            Step::Issue(_) => "issue",
            Step::Withdraw(_) => "withdraw",
            Step::Redeem(_) => "redeem",
            Step::DepositExact(_) => "deposit_exact",
            Step::IssueExact(_) => "issue_exact",
            Step::WithdrawExact(_) => "withdraw_exact",
            Step::RedeemExact(_) => "redeem_exact",
            Step::Finalize { .. } => "finalize",
            Step::Donate { .. } => "donate",
            Step::Transfer { .. } => "transfer",
            Step::Approve { .. } => "approve",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub config: VaultConfig,
    #[serde(default)]
    pub mints: Vec<Mint>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, VaultError> {
        serde_json::from_str(json).map_err(|e| VaultError::InvalidConfig(format!("invalid scenario: {e}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub index: usize,
    pub op: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<Settlement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceLine {
    pub account: Account,
    pub amount: u128,
}

/// Final state of a scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub steps: Vec<StepReport>,
    pub total_assets: u128,
    pub total_supply: u128,
    pub locked_shares: u128,
    pub share_price: Option<Decimal>,
    pub open_commitments: usize,
    pub invariants_hold: bool,
    pub asset_balances: Vec<BalanceLine>,
    pub share_balances: Vec<BalanceLine>,
}

impl ScenarioReport {
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|s| !s.ok)
    }

    pub fn share_balance(&self, account: &Account) -> u128 {
        Self::lookup(&self.share_balances, account)
    }

    pub fn asset_balance(&self, account: &Account) -> u128 {
        Self::lookup(&self.asset_balances, account)
    }

    fn lookup(lines: &[BalanceLine], account: &Account) -> u128 {
        lines
            .iter()
            .find(|l| &l.account == account)
            .map(|l| l.amount)
            .unwrap_or(0)
    }
}

impl std::fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Scenario Result ===")?;
        for step in &self.steps {
            match (&step.receipt, &step.settlement, &step.error) {
                (Some(receipt), _, _) => writeln!(f, "  [{}] {}", step.index, receipt)?,
                (_, Some(s), _) => writeln!(
                    f,
                    "  [{}] finalize {}: exact {}, surplus {}, refund {}",
                    step.index, s.kind, s.exact, s.surplus, s.refund
                )?,
                (_, _, Some(err)) => writeln!(f, "  [{}] {} REVERTED: {}", step.index, step.op, err)?,
                _ => writeln!(f, "  [{}] {}", step.index, step.op)?,
            }
        }

        writeln!(f, "\nTotal Assets:     {}", self.total_assets)?;
        writeln!(f, "Total Supply:     {}", self.total_supply)?;
        writeln!(f, "Locked Shares:    {}", self.locked_shares)?;
        match &self.share_price {
            Some(price) => writeln!(f, "Share Price:      {}", price.round_dp(12).normalize())?,
            None => writeln!(f, "Share Price:      n/a")?,
        }
        writeln!(f, "Open Commitments: {}", self.open_commitments)?;
        writeln!(f, "Invariants Hold:  {}", self.invariants_hold)?;

        writeln!(f, "\nShare Balances:")?;
        for line in &self.share_balances {
            writeln!(f, "  {}: {}", line.account, line.amount)?;
        }
        writeln!(f, "\nAsset Balances:")?;
        for line in &self.asset_balances {
            writeln!(f, "  {}: {}", line.account, line.amount)?;
        }
        Ok(())
    }
}

enum Outcome {
    Receipt(Receipt),
    Settlement(Settlement),
    Done,
}

fn sorted_balances(token: &TokenLedger) -> Vec<BalanceLine> {
    let mut lines: Vec<BalanceLine> = token
        .all_balances()
        .map(|(account, amount)| BalanceLine { account, amount })
        .collect();
    lines.sort_by(|a, b| a.account.to_string().cmp(&b.account.to_string()));
    lines
}

/// Deploy the scenario's vault and execute every step.
///
/// Fails only if the vault cannot be deployed; step failures are reported.
pub fn run_scenario(scenario: &Scenario) -> Result<ScenarioReport, VaultError> {
    let mut assets = TokenLedger::new(scenario.config.asset.clone());
    for mint in &scenario.mints {
        assets.mint(&mint.account, mint.amount)?;
    }
    let mut vault = Vault::in_memory(scenario.config.clone(), assets)?;

    let mut opened: HashMap<usize, CommitmentId> = HashMap::new();
    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let mut report = StepReport {
            index,
            op: step.label().to_string(),
            ok: true,
            receipt: None,
            settlement: None,
            error: None,
        };
        match apply_step(&mut vault, step, &opened) {
            Ok(Outcome::Receipt(receipt)) => {
                if let Some(id) = receipt.commitment {
                    opened.insert(index, id);
                }
                report.receipt = Some(receipt);
            }
            Ok(Outcome::Settlement(settlement)) => report.settlement = Some(settlement),
            Ok(Outcome::Done) => {}
            Err(err) => {
                report.ok = false;
                report.error = Some(err.to_string());
            }
        }
        steps.push(report);
    }

    let snapshot = vault.snapshot();
    Ok(ScenarioReport {
        steps,
        total_assets: snapshot.total_assets,
        total_supply: snapshot.total_supply,
        locked_shares: vault.locked_shares(),
        share_price: snapshot.share_price(),
        open_commitments: vault.settlement().open_commitments().count(),
        invariants_hold: vault.check_invariants().is_ok(),
        asset_balances: sorted_balances(vault.asset_store()),
        share_balances: sorted_balances(vault.share_store()),
    })
}

fn apply_step(
    vault: &mut Vault,
    step: &Step,
    opened: &HashMap<usize, CommitmentId>,
) -> Result<Outcome, VaultError> {
    let outcome = match step {
        Step::Deposit(req) => Outcome::Receipt(vault.deposit(req)?),
        Step::Issue(req) => Outcome::Receipt(vault.issue(req)?),
        Step::Withdraw(req) => Outcome::Receipt(vault.withdraw(req)?),
        Step::Redeem(req) => Outcome::Receipt(vault.redeem(req)?),
        Step::DepositExact(req) => Outcome::Receipt(vault.deposit_exact(req)?),
        Step::IssueExact(req) => Outcome::Receipt(vault.issue_exact(req)?),
        Step::WithdrawExact(req) => Outcome::Receipt(vault.withdraw_exact(req)?),
        Step::RedeemExact(req) => Outcome::Receipt(vault.redeem_exact(req)?),
        Step::Finalize { step } => {
            let id = opened.get(step).ok_or_else(|| {
                VaultError::InvalidConfig(format!("step {step} opened no commitment"))
            })?;
            Outcome::Settlement(vault.finalize(id)?)
        }
        Step::Donate { from, amount } => {
            let pool = vault.pool_account();
            vault.asset_store_mut().transfer(from, &pool, *amount)?;
            Outcome::Done
        }
        Step::Transfer {
            token,
            from,
            to,
            amount,
        } => {
            if from.owner == vault.config().pool {
                return Err(VaultError::LockedShares);
            }
            match token {
                TokenSide::Asset => vault.asset_store_mut().transfer(from, to, *amount)?,
                TokenSide::Share => vault.transfer_shares(from, to, *amount)?,
            }
            Outcome::Done
        }
        Step::Approve {
            kind,
            exact,
            request,
        } => {
            let action = if *exact {
                IntentAction::Exact(*kind)
            } else {
                IntentAction::Standard(*kind)
            };
            let owner: Address = request.from.owner.clone();
            vault
                .guard_mut()
                .approve(&owner, &request.caller, request.intent(action), request.nonce);
            Outcome::Done
        }
    };
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    const YIELD_SCENARIO: &str = r#"{
        "config": { "pool": "pool", "asset": "USDC" },
        "mints": [
            { "account": { "owner": "alice", "domain": "disclosed" }, "amount": 9 },
            { "account": { "owner": "bob", "domain": "disclosed" }, "amount": 20 }
        ],
        "steps": [
            { "deposit": { "caller": "alice",
              "from": { "owner": "alice", "domain": "disclosed" },
              "to": { "owner": "alice", "domain": "disclosed" }, "amount": 9 } },
            { "donate": { "from": { "owner": "bob", "domain": "disclosed" }, "amount": 5 } },
            { "issue": { "caller": "bob",
              "from": { "owner": "bob", "domain": "disclosed" },
              "to": { "owner": "bob", "domain": "disclosed" }, "amount": 10, "limit": 15 } },
            { "withdraw": { "caller": "alice",
              "from": { "owner": "alice", "domain": "disclosed" },
              "to": { "owner": "alice", "domain": "disclosed" }, "amount": 13 } },
            { "redeem": { "caller": "bob",
              "from": { "owner": "bob", "domain": "disclosed" },
              "to": { "owner": "bob", "domain": "disclosed" }, "amount": 10 } }
        ]
    }"#;

    #[test]
    fn test_yield_scenario() {
        let scenario = Scenario::from_json(YIELD_SCENARIO).unwrap();
        let report = run_scenario(&scenario).unwrap();

        assert_eq!(report.failed_steps().count(), 0);
        assert_eq!(report.steps[2].receipt.as_ref().unwrap().assets, 15);
        assert_eq!(report.steps[3].receipt.as_ref().unwrap().shares, 9);
        assert_eq!(report.steps[4].receipt.as_ref().unwrap().assets, 15);
        assert_eq!(report.total_supply, 0);
        assert_eq!(report.total_assets, 1);
        assert!(report.invariants_hold);
        assert_eq!(report.asset_balance(&Account::disclosed("alice")), 13);
    }

    #[test]
    fn test_finalize_unknown_step_is_reported() {
        let scenario = Scenario {
            config: VaultConfig::new("pool", "USDC"),
            mints: vec![],
            steps: vec![Step::Finalize { step: 7 }],
        };
        let report = run_scenario(&scenario).unwrap();
        assert!(!report.steps[0].ok);
        assert!(report.steps[0].error.as_ref().unwrap().contains("step 7"));
    }

    #[test]
    fn test_exact_steps_and_finalize() {
        let alice = Account::disclosed("alice");
        let scenario = Scenario {
            config: VaultConfig::new("pool", "USDC"),
            mints: vec![Mint {
                account: alice.clone(),
                amount: 100,
            }],
            steps: vec![
                Step::Deposit(Request::own(alice.clone(), alice.clone(), 50)),
                Step::RedeemExact(
                    Request::own(alice.clone(), Account::confidential("alice"), 10)
                        .with_limit(10)
                        .with_quote(4),
                ),
                Step::Finalize { step: 1 },
                Step::Finalize { step: 1 },
            ],
        };
        let report = run_scenario(&scenario).unwrap();

        assert!(report.steps[2].ok);
        assert_eq!(report.steps[2].settlement.as_ref().unwrap().surplus, 6);
        assert!(!report.steps[3].ok);
        assert_eq!(report.asset_balance(&Account::confidential("alice")), 10);
        assert_eq!(report.open_commitments, 0);
        assert!(report.invariants_hold);
    }

    #[test]
    fn test_report_serializes() {
        let scenario = Scenario::from_json(YIELD_SCENARIO).unwrap();
        let report = run_scenario(&scenario).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"total_assets\":1"));
        assert!(!json.contains("\"error\""));
    }
}
