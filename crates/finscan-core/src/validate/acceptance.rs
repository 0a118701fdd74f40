//! Comparison of extracted fields against a table of expected values.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{FinscanError, Result};
use crate::extract::amounts::parse_amount;
use crate::models::config::ValidationConfig;
use crate::models::record::{
    AcceptanceReport, Category, CategoryTable, CheckStatus, FieldCheck, FieldSet,
};

/// Expected field values per category. Values may be JSON strings or numbers.
pub type ExpectedValues = CategoryTable<BTreeMap<String, serde_json::Value>>;

/// Parse an expected-values document (`{"check": {"amount": "250.00"}}`).
pub fn parse_expected_values(json: &str) -> Result<ExpectedValues> {
    Ok(serde_json::from_str(json)?)
}

/// Load expected values from a file. A missing or malformed file yields an
/// empty table, so every check reports no expectation.
pub fn load_expected_values(path: &Path) -> ExpectedValues {
    let loaded = std::fs::read_to_string(path)
        .map_err(FinscanError::from)
        .and_then(|content| parse_expected_values(&content));

    match loaded {
        Ok(values) => {
            debug!("Loaded expected values from {}", path.display());
            values
        }
        Err(e) => {
            warn!("Expected values unavailable ({}): {}", path.display(), e);
            ExpectedValues::default()
        }
    }
}

fn scalar_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Checks configured fields of a page against [`ExpectedValues`].
#[derive(Debug, Clone, Default)]
pub struct AcceptanceChecker {
    expected: ExpectedValues,
    fields: CategoryTable<Vec<String>>,
}

impl AcceptanceChecker {
    pub fn new(expected: ExpectedValues, fields: CategoryTable<Vec<String>>) -> Self {
        Self { expected, fields }
    }

    /// Build from configuration, loading the expected-values file if one is named.
    pub fn from_config(config: &ValidationConfig) -> Self {
        let expected = config
            .expected_values_file
            .as_deref()
            .map(load_expected_values)
            .unwrap_or_default();
        Self::new(expected, config.acceptance_fields.clone())
    }

    /// Replace the expected values.
    pub fn with_expected(mut self, expected: ExpectedValues) -> Self {
        self.expected = expected;
        self
    }

    /// Expected value for `field`, also accepting an `expected_` prefixed key.
    fn expected_value(&self, category: Category, field: &str) -> Option<String> {
        let table = self.expected.get(category)?;
        table
            .get(field)
            .or_else(|| table.get(&format!("expected_{}", field)))
            .and_then(scalar_text)
    }

    /// Compare every acceptance field of `category` found in `fields`.
    pub fn check(&self, category: Category, fields: &FieldSet) -> AcceptanceReport {
        let Some(names) = self.fields.get(category) else {
            return AcceptanceReport::default();
        };

        let checks = names
            .iter()
            .map(|name| {
                let expected = self.expected_value(category, name);
                let found = fields.get(name).map(str::to_string);

                let status = match (&expected, &found) {
                    (None, _) => CheckStatus::NoExpectation,
                    (Some(e), Some(f)) if values_match(e, f) => CheckStatus::Match,
                    _ => CheckStatus::Mismatch,
                };

                FieldCheck {
                    field: name.clone(),
                    expected,
                    found,
                    status,
                }
            })
            .collect();

        let report = AcceptanceReport { checks };
        for mismatch in report.mismatches() {
            warn!(
                "{} field {} expected {:?}, found {:?}",
                category, mismatch.field, mismatch.expected, mismatch.found
            );
        }
        report
    }
}

/// Numeric comparison when both sides are amounts, exact text otherwise.
fn values_match(expected: &str, found: &str) -> bool {
    match (parse_amount(expected), parse_amount(found)) {
        (Some(e), Some(f)) => e == f,
        _ => expected.trim() == found.trim(),
    }
}
