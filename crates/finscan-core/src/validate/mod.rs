//! Balance reconciliation and acceptance checks.

pub mod acceptance;
pub mod balance;

pub use acceptance::{
    AcceptanceChecker, ExpectedValues, load_expected_values, parse_expected_values,
};
pub use balance::{BalanceValidator, running_balances};
