//! Table row reconstruction for statements and salary slips.
//!
//! Rows are inferred from token counts and text patterns, not page geometry.
//! Transaction rows come from one of two strategies that disagree on how the
//! first amount is split into credit or debit:
//!
//! - [`PatternStrategy`] matches rows in the concatenated page text and looks
//!   for the words "credit"/"debit" (fuzzily) in the description.
//! - [`LineTokenStrategy`] reads each OCR line by token position and treats
//!   the first amount column as credit whenever it holds a nonzero number.

use rust_decimal::Decimal;
use tracing::debug;

use crate::fuzzy::best_word_score;
use crate::models::config::{ExtractionConfig, TableStrategyKind};
use crate::models::page::OcrPage;
use crate::models::record::{Category, Rows, SalaryRow, TransactionRow};

use super::amounts::parse_amount;
use super::dates::parse_statement_date;
use super::patterns::TRANSACTION_ROW;

/// A way of turning a statement page into transaction rows.
pub trait TableStrategy {
    /// Name used in configuration and logs.
    fn name(&self) -> &'static str;

    /// Transaction rows in page order.
    fn transactions(&self, page: &OcrPage) -> Vec<TransactionRow>;
}

/// Positional heuristic over whitespace tokens of each OCR line:
/// `date description... amount amount balance`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineTokenStrategy;

impl LineTokenStrategy {
    /// Fewest tokens a line needs to be a row.
    pub const MIN_TOKENS: usize = 5;

    /// Read one line. Lines with too few tokens are not rows.
    pub fn parse_line(line: &str) -> Option<TransactionRow> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let n = tokens.len();
        if n < Self::MIN_TOKENS {
            return None;
        }

        // A nonzero number in the first amount column is a credit. Otherwise
        // the second column is the debit, taken without checking it.
        let (credit, debit) = match parse_amount(tokens[n - 3]) {
            Some(amount) if !amount.is_zero() => (amount, Decimal::ZERO),
            _ => (Decimal::ZERO, parse_amount(tokens[n - 2]).unwrap_or_default()),
        };

        Some(TransactionRow {
            date: Some(tokens[0].to_string()),
            posted_on: parse_statement_date(tokens[0]),
            description: tokens[1..n - 3].join(" "),
            credit,
            debit,
            balance: parse_amount(tokens[n - 1]),
        })
    }
}

impl TableStrategy for LineTokenStrategy {
    fn name(&self) -> &'static str {
        "line_tokens"
    }

    fn transactions(&self, page: &OcrPage) -> Vec<TransactionRow> {
        page.lines().filter_map(Self::parse_line).collect()
    }
}

/// Single composed regex over the normalized page text.
#[derive(Debug, Clone, Copy)]
pub struct PatternStrategy {
    /// Minimum 0-100 similarity for "credit"/"debit" to count as present.
    pub keyword_threshold: f64,
}

impl Default for PatternStrategy {
    fn default() -> Self {
        Self { keyword_threshold: 80.0 }
    }
}

impl PatternStrategy {
    pub fn new(keyword_threshold: f64) -> Self {
        Self { keyword_threshold }
    }

    /// Split the first amount by the description wording. "credit" is tried
    /// first, so a row naming both is a credit.
    fn split_amount(&self, description: &str, amount: Decimal) -> (Decimal, Decimal) {
        if best_word_score("credit", description) >= self.keyword_threshold {
            (amount, Decimal::ZERO)
        } else if best_word_score("debit", description) >= self.keyword_threshold {
            (Decimal::ZERO, amount)
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        }
    }
}

impl TableStrategy for PatternStrategy {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn transactions(&self, page: &OcrPage) -> Vec<TransactionRow> {
        let text = page.text();

        TRANSACTION_ROW
            .captures_iter(&text)
            .map(|caps| {
                let date = &caps[1];
                let description = caps[2].trim().to_string();
                let amount = caps.get(3).and_then(|m| parse_amount(m.as_str())).unwrap_or_default();
                let (credit, debit) = self.split_amount(&description, amount);

                TransactionRow {
                    date: Some(date.to_string()),
                    posted_on: parse_statement_date(date),
                    description,
                    credit,
                    debit,
                    balance: parse_amount(&caps[5]),
                }
            })
            .collect()
    }
}

/// Salary breakdown: every line with at least two tokens is
/// `component... amount`.
pub fn salary_rows(page: &OcrPage) -> Vec<SalaryRow> {
    page.lines()
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let (amount, component) = tokens.split_last()?;
            if component.is_empty() {
                return None;
            }
            Some(SalaryRow {
                component: component.join(" "),
                amount: amount.to_string(),
            })
        })
        .collect()
}

/// Reconstructs table rows for a page of a known category.
pub struct TableExtractor {
    strategy: Box<dyn TableStrategy + Send + Sync>,
}

impl TableExtractor {
    /// Build with the strategy named in the configuration.
    pub fn new(config: &ExtractionConfig) -> Self {
        let strategy: Box<dyn TableStrategy + Send + Sync> = match config.table_strategy {
            TableStrategyKind::Pattern => {
                Box::new(PatternStrategy::new(config.keyword_match_threshold))
            }
            TableStrategyKind::LineTokens => Box::new(LineTokenStrategy),
        };
        Self { strategy }
    }

    /// Replace the transaction strategy.
    pub fn with_strategy(mut self, strategy: impl TableStrategy + Send + Sync + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Rows for `category`, in input order.
    pub fn extract_rows(&self, page: &OcrPage, category: Category) -> Rows {
        let rows = match category {
            Category::BankStatement => Rows::Transactions(self.strategy.transactions(page)),
            Category::SalarySlip => Rows::Salary(salary_rows(page)),
            Category::Check | Category::Other => Rows::None,
        };

        debug!(
            "Page {}: {} {} rows ({})",
            page.id,
            rows.len(),
            category,
            self.strategy.name()
        );
        rows
    }
}

impl Default for TableExtractor {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

impl std::fmt::Debug for TableExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableExtractor")
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        parse_amount(s).unwrap()
    }

    fn page(lines: &[&str]) -> OcrPage {
        OcrPage::from_lines("page_1", lines.iter().copied())
    }

    #[test]
    fn test_line_tokens_row_boundary() {
        assert_eq!(LineTokenStrategy::parse_line("01/01/2024 deposit 500.00 1500.00"), None);

        let row = LineTokenStrategy::parse_line("01/01/2024 deposit 500.00 0.00 1500.00").unwrap();
        assert_eq!(row.description, "deposit");
        assert_eq!(row.credit, dec("500.00"));
    }

    #[test]
    fn test_line_tokens_opening_deposit() {
        let statement = page(&["01/01/2024 opening deposit 500.00 0.00 1500.00"]);
        let rows = LineTokenStrategy.transactions(&statement);

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.date.as_deref(), Some("01/01/2024"));
        assert_eq!(row.posted_on, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(row.description, "opening deposit");
        assert_eq!(row.credit, dec("500.00"));
        assert_eq!(row.debit, Decimal::ZERO);
        assert_eq!(row.balance, Some(dec("1500.00")));
    }

    #[test]
    fn test_line_tokens_debit_by_elimination() {
        let row =
            LineTokenStrategy::parse_line("02/01/2024 rent payment 0.00 700.00 800.00").unwrap();
        assert_eq!(row.credit, Decimal::ZERO);
        assert_eq!(row.debit, dec("700.00"));

        // Not a number in the first column: second column is the debit.
        let row = LineTokenStrategy::parse_line("02/01/2024 card fee - 12.50 787.50").unwrap();
        assert_eq!(row.credit, Decimal::ZERO);
        assert_eq!(row.debit, dec("12.50"));
    }

    #[test]
    fn test_line_tokens_never_both_sides() {
        let row = LineTokenStrategy::parse_line("03/01/2024 transfer 100.00 50.00 950.00").unwrap();
        assert_eq!(row.credit, dec("100.00"));
        assert_eq!(row.debit, Decimal::ZERO);
    }

    #[test]
    fn test_line_tokens_unreadable_balance() {
        let row = LineTokenStrategy::parse_line("03/01/2024 transfer 100.00 0.00 9S0.00").unwrap();
        assert_eq!(row.balance, None);
    }

    #[test]
    fn test_line_tokens_skips_short_lines() {
        let rows = LineTokenStrategy.transactions(&page(&[
            "Statement of account",
            "01/01/2024 deposit 500.00 0.00 1500.00",
            "Page 1 of 2",
            "02/01/2024 atm withdrawal 0.00 200.00 1300.00",
        ]));
        let descriptions: Vec<&str> = rows.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(descriptions, vec!["deposit", "atm withdrawal"]);
    }

    #[test]
    fn test_pattern_uses_description_keywords() {
        let strategy = PatternStrategy::default();
        let rows = strategy.transactions(&page(&[
            "01/01/2024 salary credit 3,000.00 0.00 4,000.00",
            "02/01/2024 atm debit 200.00 0.00 3,800.00",
        ]));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].description, "salary credit");
        assert_eq!(rows[0].credit, dec("3000.00"));
        assert_eq!(rows[0].debit, Decimal::ZERO);
        assert_eq!(rows[0].balance, Some(dec("4000.00")));

        assert_eq!(rows[1].credit, Decimal::ZERO);
        assert_eq!(rows[1].debit, dec("200.00"));
        assert_eq!(rows[1].balance, Some(dec("3800.00")));
    }

    #[test]
    fn test_pattern_tolerates_ocr_noise_in_keyword() {
        let rows = PatternStrategy::default()
            .transactions(&page(&["05/01/2024 cheque deblt 75.00 0.00 925.00"]));
        assert_eq!(rows[0].debit, dec("75.00"));
    }

    #[test]
    fn test_pattern_credit_wins_when_both_keywords_match() {
        let rows = PatternStrategy::default().transactions(&page(&[
            "01/01/2024 debit card credt 10.00 0.00 90.00",
            "02/01/2024 credit debit transfer 5.00 0.00 95.00",
        ]));

        assert_eq!((rows[0].credit, rows[0].debit), (dec("10.00"), Decimal::ZERO));
        assert_eq!((rows[1].credit, rows[1].debit), (dec("5.00"), Decimal::ZERO));
    }

    #[test]
    fn test_pattern_without_keyword_moves_nothing() {
        let rows = PatternStrategy::default()
            .transactions(&page(&["01/01/2024 opening deposit 500.00 0.00 1500.00"]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].credit, Decimal::ZERO);
        assert_eq!(rows[0].debit, Decimal::ZERO);
        assert_eq!(rows[0].balance, Some(dec("1500.00")));
    }

    #[test]
    fn test_strategies_disagree() {
        let statement = page(&["01/03/2024 atm debit 200.00 0.00 800.00"]);

        let by_tokens = LineTokenStrategy.transactions(&statement);
        let by_pattern = PatternStrategy::default().transactions(&statement);

        assert_eq!((by_tokens[0].credit, by_tokens[0].debit), (dec("200.00"), Decimal::ZERO));
        assert_eq!((by_pattern[0].credit, by_pattern[0].debit), (Decimal::ZERO, dec("200.00")));
    }

    #[test]
    fn test_salary_rows() {
        let rows = salary_rows(&page(&["Basic Salary 5000", "HRA 1,200.00", "Total", ""]));
        assert_eq!(
            rows,
            vec![
                SalaryRow {
                    component: "Basic Salary".to_string(),
                    amount: "5000".to_string(),
                },
                SalaryRow {
                    component: "HRA".to_string(),
                    amount: "1,200.00".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_extract_rows_dispatch() {
        let extractor = TableExtractor::default();
        let lines = page(&["Pay to the order of John Smith 250.00"]);

        assert_eq!(extractor.strategy_name(), "pattern");
        assert_eq!(extractor.extract_rows(&lines, Category::Check), Rows::None);
        assert_eq!(extractor.extract_rows(&lines, Category::Other), Rows::None);
        assert_eq!(extractor.extract_rows(&lines, Category::SalarySlip).len(), 1);
    }

    #[test]
    fn test_configured_strategy() {
        let config = ExtractionConfig {
            table_strategy: TableStrategyKind::LineTokens,
            ..Default::default()
        };
        let extractor = TableExtractor::new(&config);
        assert_eq!(extractor.strategy_name(), "line_tokens");

        let extractor = extractor.with_strategy(PatternStrategy::new(90.0));
        assert_eq!(extractor.strategy_name(), "pattern");
    }
}
