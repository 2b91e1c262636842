use std::collections::BTreeMap;

use bank_store::AccountStore;
use bank_types::{AccountId, Money, TransactionId};
use tracing::{info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::traits::TransactionLog;

/// Result of replaying the transaction log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditReport {
    pub transaction_count: u64,
    pub account_count: u64,
    /// Balance of every account the log touches, rebuilt from zero.
    pub replayed: BTreeMap<AccountId, Money>,
    /// Sum of all stored balances.
    pub stored_total: Money,
    pub violations: Vec<Violation>,
}

impl AuditReport {
    /// Returns `true` if the log and the stored balances agree.
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A single inconsistency found by the audit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub transaction: Option<TransactionId>,
    pub account: Option<AccountId>,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    MalformedTransaction,
    IdOutOfOrder,
    TimestampRegression,
    NegativeBalance,
    BalanceMismatch,
}

/// Replays the transaction log and compares it with stored balances.
///
/// The audit reads a snapshot of the log first and the accounts second, so
/// it should run while no operations are in flight.
pub struct LedgerAudit;

impl LedgerAudit {
    pub fn run(accounts: &dyn AccountStore, log: &dyn TransactionLog) -> LedgerResult<AuditReport> {
        let transactions = log.list()?;
        let stored = accounts.list()?;

        let mut violations = Vec::new();
        let mut replayed: BTreeMap<AccountId, Money> = BTreeMap::new();

        for (index, tx) in transactions.iter().enumerate() {
            if !tx.shape_is_valid() {
                violations.push(Violation {
                    transaction: Some(tx.id),
                    account: None,
                    kind: ViolationKind::MalformedTransaction,
                    description: format!("{} has an invalid sender/receiver/amount shape", tx.kind),
                });
                continue;
            }

            if let Some(prev) = index.checked_sub(1).map(|i| &transactions[i]) {
                if tx.id <= prev.id {
                    violations.push(Violation {
                        transaction: Some(tx.id),
                        account: None,
                        kind: ViolationKind::IdOutOfOrder,
                        description: format!("{} follows {}", tx.id, prev.id),
                    });
                }
                if tx.timestamp < prev.timestamp {
                    violations.push(Violation {
                        transaction: Some(tx.id),
                        account: None,
                        kind: ViolationKind::TimestampRegression,
                        description: format!("timestamp earlier than {}", prev.id),
                    });
                }
            }

            // Sender first, then receiver.
            for account in [tx.sender, tx.receiver].into_iter().flatten() {
                let balance = replayed.entry(account).or_default();
                *balance = balance
                    .checked_add(tx.effect_on(account))
                    .ok_or(LedgerError::BalanceOverflow(account))?;
                if balance.is_negative() {
                    violations.push(Violation {
                        transaction: Some(tx.id),
                        account: Some(account),
                        kind: ViolationKind::NegativeBalance,
                        description: format!("replayed balance of {account} is {balance}"),
                    });
                }
            }
        }

        let mut stored_total = Money::zero();
        for account in &stored {
            stored_total = stored_total
                .checked_add(account.balance)
                .ok_or(LedgerError::BalanceOverflow(account.id))?;
            let expected = replayed.get(&account.id).copied().unwrap_or_default();
            if expected != account.balance {
                violations.push(Violation {
                    transaction: None,
                    account: Some(account.id),
                    kind: ViolationKind::BalanceMismatch,
                    description: format!(
                        "stored balance {} but log replays to {expected}",
                        account.balance
                    ),
                });
            }
        }

        let report = AuditReport {
            transaction_count: transactions.len() as u64,
            account_count: stored.len() as u64,
            replayed,
            stored_total,
            violations,
        };

        if report.is_consistent() {
            info!(
                transactions = report.transaction_count,
                accounts = report.account_count,
                "ledger audit passed"
            );
        } else {
            warn!(violations = report.violations.len(), "ledger audit found violations");
        }
        Ok(report)
    }
}
