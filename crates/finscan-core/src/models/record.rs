//! Records derived from OCR pages: categories, fields, rows and validation results.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::FinscanError;
use crate::extract::amounts::parse_amount;

/// Document type assigned to a page.
///
/// Declaration order matters: on equal classification scores the earlier
/// category wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    BankStatement,
    Check,
    SalarySlip,
    /// Fallback when no category has enough evidence.
    #[serde(alias = "others")]
    Other,
}

impl Category {
    /// Categories that carry keyword and label tables, in tie-break order.
    pub const SCORED: [Category; 3] =
        [Category::BankStatement, Category::Check, Category::SalarySlip];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::BankStatement => "bank_statement",
            Category::Check => "check",
            Category::SalarySlip => "salary_slip",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = FinscanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bank_statement" => Ok(Category::BankStatement),
            "check" => Ok(Category::Check),
            "salary_slip" => Ok(Category::SalarySlip),
            "other" | "others" => Ok(Category::Other),
            other => Err(FinscanError::UnknownCategory(other.to_string())),
        }
    }
}

/// One value per scored category. `Category::Other` has no entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTable<T> {
    #[serde(default)]
    pub bank_statement: T,
    #[serde(default)]
    pub check: T,
    #[serde(default)]
    pub salary_slip: T,
}

impl<T> CategoryTable<T> {
    pub fn new(bank_statement: T, check: T, salary_slip: T) -> Self {
        Self {
            bank_statement,
            check,
            salary_slip,
        }
    }

    pub fn get(&self, category: Category) -> Option<&T> {
        match category {
            Category::BankStatement => Some(&self.bank_statement),
            Category::Check => Some(&self.check),
            Category::SalarySlip => Some(&self.salary_slip),
            Category::Other => None,
        }
    }

    /// Entries in tie-break order.
    pub fn entries(&self) -> impl Iterator<Item = (Category, &T)> {
        [
            (Category::BankStatement, &self.bank_statement),
            (Category::Check, &self.check),
            (Category::SalarySlip, &self.salary_slip),
        ]
        .into_iter()
    }

    /// Convert every entry, stopping at the first error.
    pub fn try_map<U, E>(
        &self,
        mut f: impl FnMut(Category, &T) -> Result<U, E>,
    ) -> Result<CategoryTable<U>, E> {
        Ok(CategoryTable {
            bank_statement: f(Category::BankStatement, &self.bank_statement)?,
            check: f(Category::Check, &self.check)?,
            salary_slip: f(Category::SalarySlip, &self.salary_slip)?,
        })
    }
}

/// Outcome of classifying one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    pub category: Category,
    /// Keyword count (exact mode) or mean 0-100 similarity (fuzzy mode).
    /// Not comparable across modes.
    pub score: f64,
}

/// Extracted key fields. Values keep their original text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSet(BTreeMap<String, String>);

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Parse a field as a money amount. Unparseable text counts as absent.
    pub fn amount(&self, field: &str) -> Option<Decimal> {
        self.get(field).and_then(parse_amount)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A bank statement row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    /// Date text as printed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Calendar date when `date` could be parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posted_on: Option<NaiveDate>,

    pub description: String,

    /// Money in. Zero whenever `debit` is nonzero.
    pub credit: Decimal,

    /// Money out. Zero whenever `credit` is nonzero.
    pub debit: Decimal,

    /// Balance printed on the row; `None` when unreadable.
    pub balance: Option<Decimal>,
}

/// A salary slip breakdown row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRow {
    pub component: String,
    /// Amount text as printed.
    pub amount: String,
}

/// Table rows of a page. Serialized as a plain array.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Rows {
    Transactions(Vec<TransactionRow>),
    Salary(Vec<SalaryRow>),
    #[default]
    None,
}

impl Rows {
    pub fn len(&self) -> usize {
        match self {
            Rows::Transactions(rows) => rows.len(),
            Rows::Salary(rows) => rows.len(),
            Rows::None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn transactions(&self) -> &[TransactionRow] {
        match self {
            Rows::Transactions(rows) => rows,
            _ => &[],
        }
    }

    pub fn salary(&self) -> &[SalaryRow] {
        match self {
            Rows::Salary(rows) => rows,
            _ => &[],
        }
    }
}

impl Serialize for Rows {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Rows::Transactions(rows) => rows.serialize(serializer),
            Rows::Salary(rows) => rows.serialize(serializer),
            Rows::None => serializer.collect_seq(std::iter::empty::<()>()),
        }
    }
}

/// Why a row was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyReason {
    /// Stated balance differs from the running balance beyond tolerance.
    BalanceMismatch,
    /// Row balance text did not parse as a number.
    UnreadableBalance,
    /// Row amounts push the running balance out of the representable range.
    /// The movement is skipped and the walk continues from the prior balance.
    ArithmeticOverflow,
}

/// A row whose stated balance disagrees with the replayed arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    /// 1-based row index.
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub description: String,
    /// Balance printed on the row.
    pub expected_balance: Option<Decimal>,
    /// Running balance computed from the opening balance.
    pub calculated_balance: Decimal,
    pub reason: DiscrepancyReason,
}

/// Result of replaying a running balance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub success: bool,
    pub discrepancies: Vec<Discrepancy>,
}

impl ValidationResult {
    pub fn from_discrepancies(discrepancies: Vec<Discrepancy>) -> Self {
        Self {
            success: discrepancies.is_empty(),
            discrepancies,
        }
    }
}

/// Balance validation state of a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageValidation {
    /// Running balance replayed.
    Validated(ValidationResult),
    /// Could have been validated but an input was missing.
    NotValidated { reason: String },
    /// Category has no running balance.
    NotApplicable,
}

impl PageValidation {
    pub fn discrepancies(&self) -> &[Discrepancy] {
        match self {
            PageValidation::Validated(result) => &result.discrepancies,
            _ => &[],
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, PageValidation::Validated(result) if result.success)
    }
}

/// Outcome of comparing one field against its expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Match,
    Mismatch,
    NoExpectation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCheck {
    pub field: String,
    pub expected: Option<String>,
    pub found: Option<String>,
    pub status: CheckStatus,
}

/// Acceptance checks for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AcceptanceReport {
    pub checks: Vec<FieldCheck>,
}

impl AcceptanceReport {
    /// No check reported a mismatch.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.status != CheckStatus::Mismatch)
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &FieldCheck> {
        self.checks.iter().filter(|c| c.status == CheckStatus::Mismatch)
    }
}

/// Everything derived from one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult {
    pub page: String,
    pub category: Category,
    pub confidence: f64,
    pub fields: FieldSet,
    pub rows: Rows,
    pub validation: PageValidation,
    pub acceptance: AcceptanceReport,
}

/// Everything derived from one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub pages: Vec<PageResult>,
}

impl DocumentResult {
    /// All balance discrepancies, tagged with their page id.
    pub fn discrepancies(&self) -> impl Iterator<Item = (&str, &Discrepancy)> {
        self.pages
            .iter()
            .flat_map(|p| p.validation.discrepancies().iter().map(move |d| (p.page.as_str(), d)))
    }

    pub fn discrepancy_count(&self) -> usize {
        self.discrepancies().count()
    }

    /// Pages whose balance walk ran, grouped by outcome: (clean, with discrepancies).
    pub fn validation_counts(&self) -> (usize, usize) {
        self.pages.iter().fold((0, 0), |(clean, dirty), p| match &p.validation {
            PageValidation::Validated(r) if r.success => (clean + 1, dirty),
            PageValidation::Validated(_) => (clean, dirty + 1),
            _ => (clean, dirty),
        })
    }
}
