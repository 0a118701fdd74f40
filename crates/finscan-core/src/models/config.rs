//! Configuration structures for the classification/extraction/validation pipeline.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{FinscanError, Result};
use crate::models::record::CategoryTable;

/// Main configuration for the finscan pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinscanConfig {
    /// Page classification configuration.
    pub classification: ClassificationConfig,

    /// Field and table extraction configuration.
    pub extraction: ExtractionConfig,

    /// Balance and acceptance validation configuration.
    pub validation: ValidationConfig,

    /// Output formatting.
    pub output: OutputConfig,
}

/// How keyword evidence is scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Count word-boundary occurrences of each keyword.
    #[default]
    Exact,
    /// Mean partial similarity (0-100) between page text and each keyword.
    Fuzzy,
}

/// Classifier configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Scoring mode.
    pub mode: MatchMode,

    /// Minimum winning score in fuzzy mode. Same 0-100 scale as the score.
    pub threshold: f64,

    /// Representative keyword phrases per category, lowercase.
    pub keywords: CategoryTable<Vec<String>>,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            mode: MatchMode::Exact,
            threshold: 0.8,
            keywords: CategoryTable::new(
                strings(&[
                    "account number",
                    "transaction",
                    "balance",
                    "deposit",
                    "withdrawal",
                    "statement",
                ]),
                strings(&[
                    "pay to the order",
                    "memo",
                    "check number",
                    "authorized signature",
                    "routing number",
                ]),
                strings(&[
                    "net salary",
                    "gross salary",
                    "deduction",
                    "pay period",
                    "employer",
                    "employee",
                    "income",
                ]),
            ),
        }
    }
}

/// Shape of the value that follows a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Digits with thousands separators and decimal points.
    Numeric,
    /// A single word of letters and digits.
    Alphanumeric,
    /// A date-like token (`01/02/2024`, `2024-02-01`, `1.2.2024`).
    Date,
    /// Words of letters and spaces, ending at the first other character.
    Text,
}

impl ValueKind {
    /// Regex fragment matching the value.
    pub fn pattern(&self) -> &'static str {
        match self {
            ValueKind::Numeric => r"[\d,.]+",
            ValueKind::Alphanumeric => r"\w+",
            ValueKind::Date => r"[\w/.\-]+",
            ValueKind::Text => r"[a-z]+(?:[ \t]+[a-z]+)*",
        }
    }
}

/// A labeled field rule: `label` (a regex fragment) followed by a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelPattern {
    /// Output field name.
    pub field: String,
    /// Label phrase, matched case-insensitively. May contain alternations.
    pub label: String,
    /// Value shape.
    pub value: ValueKind,
}

impl LabelPattern {
    pub fn new(field: &str, label: &str, value: ValueKind) -> Self {
        Self {
            field: field.to_string(),
            label: label.to_string(),
            value,
        }
    }
}

/// Strategy used to rebuild transaction rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStrategyKind {
    /// One composed regex over the concatenated page text.
    #[default]
    Pattern,
    /// Whitespace token positions within each OCR line.
    LineTokens,
}

impl std::str::FromStr for TableStrategyKind {
    type Err = FinscanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "pattern" => Ok(TableStrategyKind::Pattern),
            "line_tokens" => Ok(TableStrategyKind::LineTokens),
            other => Err(FinscanError::Config(format!("unknown table strategy: {}", other))),
        }
    }
}

/// Field and table extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Ordered label rules per category. First match in the text wins.
    pub labels: CategoryTable<Vec<LabelPattern>>,

    /// Strategy for transaction rows.
    pub table_strategy: TableStrategyKind,

    /// Minimum similarity (0-100) for "credit"/"debit" to count as present
    /// in a row description.
    pub keyword_match_threshold: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        use ValueKind::*;

        Self {
            labels: CategoryTable::new(
                vec![
                    LabelPattern::new("account_number", "account number", Alphanumeric),
                    LabelPattern::new("opening_balance", "opening balance", Numeric),
                    LabelPattern::new("closing_balance", "closing balance", Numeric),
                    LabelPattern::new("total_balance", "total balance", Numeric),
                ],
                vec![
                    LabelPattern::new("check_number", "check number", Alphanumeric),
                    LabelPattern::new("amount", "amount", Numeric),
                    LabelPattern::new("payee", "pay to the order of|payee", Text),
                    LabelPattern::new("date", "date", Date),
                ],
                vec![
                    LabelPattern::new("employee_id", "employee id", Alphanumeric),
                    LabelPattern::new("employee_name", "employee name", Text),
                    LabelPattern::new("gross_salary", "gross salary", Numeric),
                    LabelPattern::new("net_salary", "net salary", Numeric),
                    LabelPattern::new("deductions", "deductions", Numeric),
                ],
            ),
            table_strategy: TableStrategyKind::Pattern,
            keyword_match_threshold: 80.0,
        }
    }
}

/// Validation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Largest allowed difference between stated and calculated balance.
    /// Zero makes the comparison strict.
    pub tolerance: Decimal,

    /// JSON file with expected field values (category -> field -> value).
    pub expected_values_file: Option<PathBuf>,

    /// Fields compared against the expected values, per category.
    pub acceptance_fields: CategoryTable<Vec<String>>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            tolerance: Decimal::new(1, 2),
            expected_values_file: None,
            acceptance_fields: CategoryTable::new(
                strings(&["opening_balance"]),
                strings(&["amount"]),
                strings(&["net_salary"]),
            ),
        }
    }
}

/// Output formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Indentation width of written JSON.
    pub json_indent: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { json_indent: 4 }
    }
}

impl FinscanConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| FinscanError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{ "validation": { "tolerance": 0 }, "classification": { "mode": "fuzzy" } }"#;
        let config: FinscanConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.validation.tolerance, Decimal::ZERO);
        assert_eq!(config.classification.mode, MatchMode::Fuzzy);
        assert_eq!(config.classification.threshold, 0.8);
        assert_eq!(config.extraction, ExtractionConfig::default());
        assert_eq!(config.output.json_indent, 4);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = FinscanConfig::default();
        config.extraction.table_strategy = TableStrategyKind::LineTokens;
        config.save(&path).unwrap();

        let loaded = FinscanConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "classification": { "mode": "psychic" } }"#).unwrap();

        assert!(matches!(FinscanConfig::from_file(&path), Err(FinscanError::Config(_))));
    }

    #[test]
    fn test_table_strategy_from_str() {
        assert_eq!(
            "line-tokens".parse::<TableStrategyKind>().unwrap(),
            TableStrategyKind::LineTokens
        );
        assert_eq!("Pattern".parse::<TableStrategyKind>().unwrap(), TableStrategyKind::Pattern);
        assert!("grid".parse::<TableStrategyKind>().is_err());
    }
}
