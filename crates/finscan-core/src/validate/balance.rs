//! Running-balance reconciliation for statement rows.

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::models::record::{Discrepancy, DiscrepancyReason, TransactionRow, ValidationResult};

/// Replays `opening + credit - debit` row by row and flags rows whose printed
/// balance is off by more than the tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceValidator {
    tolerance: Decimal,
}

impl Default for BalanceValidator {
    fn default() -> Self {
        Self::new(Decimal::new(1, 2))
    }
}

impl BalanceValidator {
    /// Validator accepting differences up to `tolerance` (absolute value).
    pub fn new(tolerance: Decimal) -> Self {
        Self {
            tolerance: tolerance.abs(),
        }
    }

    /// Validator requiring exact cents.
    pub fn strict() -> Self {
        Self::new(Decimal::ZERO)
    }

    pub fn tolerance(&self) -> Decimal {
        self.tolerance
    }

    /// Validate rows in order. A mismatch never resets the running balance
    /// and never stops the walk.
    pub fn validate(&self, rows: &[TransactionRow], opening_balance: Decimal) -> ValidationResult {
        let mut discrepancies = Vec::new();
        let mut running = opening_balance;

        for (index, row) in rows.iter().enumerate() {
            let reason = match apply(running, row) {
                None => Some(DiscrepancyReason::ArithmeticOverflow),
                Some(next) => {
                    running = next;
                    self.check_stated(running.round_dp(2), row.balance)
                }
            };

            if let Some(reason) = reason {
                discrepancies.push(Discrepancy {
                    row: index + 1,
                    date: row.date.clone(),
                    description: row.description.clone(),
                    expected_balance: row.balance,
                    calculated_balance: running.round_dp(2),
                    reason,
                });
            }
        }

        if discrepancies.is_empty() {
            info!("Balance validated over {} rows", rows.len());
        } else {
            warn!(
                "{} of {} rows disagree with the running balance",
                discrepancies.len(),
                rows.len()
            );
        }

        ValidationResult::from_discrepancies(discrepancies)
    }

    fn check_stated(
        &self,
        calculated: Decimal,
        stated: Option<Decimal>,
    ) -> Option<DiscrepancyReason> {
        let Some(stated) = stated else {
            return Some(DiscrepancyReason::UnreadableBalance);
        };
        match calculated.checked_sub(stated.round_dp(2)) {
            Some(diff) if diff.abs() <= self.tolerance => None,
            _ => Some(DiscrepancyReason::BalanceMismatch),
        }
    }
}

/// `balance + credit - debit`, or `None` when it leaves the decimal range.
fn apply(balance: Decimal, row: &TransactionRow) -> Option<Decimal> {
    row.credit
        .checked_sub(row.debit)
        .and_then(|movement| balance.checked_add(movement))
}

/// Running balance after each row, starting from `opening_balance`. A row
/// that would overflow leaves the balance unchanged.
pub fn running_balances(rows: &[TransactionRow], opening_balance: Decimal) -> Vec<Decimal> {
    rows.iter()
        .scan(opening_balance, |balance, row| {
            if let Some(next) = apply(*balance, row) {
                *balance = next;
            }
            Some(*balance)
        })
        .collect()
}
