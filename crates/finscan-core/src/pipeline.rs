//! Classification, extraction and validation of whole documents.

use tracing::{debug, info};

use crate::classify::Classifier;
use crate::error::Result;
use crate::extract::fields::FieldExtractor;
use crate::extract::table::TableExtractor;
use crate::models::config::FinscanConfig;
use crate::models::page::{OcrDocument, OcrPage};
use crate::models::record::{
    Category, ClassificationResult, DocumentResult, FieldSet, PageResult, PageValidation, Rows,
};
use crate::validate::{AcceptanceChecker, BalanceValidator, ExpectedValues};

/// Field that seeds the running balance of a statement page.
const OPENING_BALANCE: &str = "opening_balance";

/// All components built from one configuration.
#[derive(Debug)]
pub struct Pipeline {
    classifier: Classifier,
    fields: FieldExtractor,
    tables: TableExtractor,
    balance: BalanceValidator,
    acceptance: AcceptanceChecker,
}

impl Pipeline {
    /// Compile every rule in `config`. Fails on a keyword or label that is
    /// not a valid pattern.
    pub fn new(config: &FinscanConfig) -> Result<Self> {
        let pipeline = Self {
            classifier: Classifier::new(&config.classification)?,
            fields: FieldExtractor::new(&config.extraction.labels)?,
            tables: TableExtractor::new(&config.extraction),
            balance: BalanceValidator::new(config.validation.tolerance),
            acceptance: AcceptanceChecker::from_config(&config.validation),
        };

        debug!(
            "Pipeline ready: {:?} classification, {} table strategy, tolerance {}",
            config.classification.mode,
            pipeline.tables.strategy_name(),
            pipeline.balance.tolerance()
        );
        Ok(pipeline)
    }

    /// Use `expected` for acceptance checks instead of the configured file.
    pub fn with_expected_values(mut self, expected: ExpectedValues) -> Self {
        self.acceptance = self.acceptance.with_expected(expected);
        self
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Classify every page of a document.
    pub fn classify_document(&self, document: &OcrDocument) -> Vec<ClassificationResult> {
        document
            .pages
            .iter()
            .map(|page| self.classifier.classify_page(page))
            .collect()
    }

    /// Classify, extract and validate one page.
    pub fn process_page(&self, page: &OcrPage) -> PageResult {
        let classification = self.classifier.classify_page(page);
        self.build_page(page, classification.category, classification.score)
    }

    /// Process a page as `category`, skipping classification. Confidence is
    /// the page's score for that category (zero for `Other`).
    pub fn process_page_as(&self, page: &OcrPage, category: Category) -> PageResult {
        let confidence = self
            .classifier
            .scores(&page.text())
            .get(category)
            .copied()
            .unwrap_or(0.0);
        self.build_page(page, category, confidence)
    }

    fn build_page(&self, page: &OcrPage, category: Category, confidence: f64) -> PageResult {
        let text = page.text();
        let fields = self.fields.extract_fields(&text, category);
        let rows = self.tables.extract_rows(page, category);
        let validation = self.validate_balance(category, &fields, &rows);
        let acceptance = self.acceptance.check(category, &fields);

        info!(
            "Page {}: {} ({}), {} fields, {} rows",
            page.id,
            category,
            confidence,
            fields.len(),
            rows.len()
        );

        PageResult {
            page: page.id.clone(),
            category,
            confidence,
            fields,
            rows,
            validation,
            acceptance,
        }
    }

    fn validate_balance(
        &self,
        category: Category,
        fields: &FieldSet,
        rows: &Rows,
    ) -> PageValidation {
        match category {
            Category::BankStatement => match fields.amount(OPENING_BALANCE) {
                Some(opening) => {
                    PageValidation::Validated(self.balance.validate(rows.transactions(), opening))
                }
                None => PageValidation::NotValidated {
                    reason: "opening balance not found".to_string(),
                },
            },
            Category::Check | Category::SalarySlip | Category::Other => {
                PageValidation::NotApplicable
            }
        }
    }

    /// Process every page of a document, in input order.
    pub fn process_document(&self, document: &OcrDocument) -> DocumentResult {
        let pages: Vec<PageResult> = document
            .pages
            .iter()
            .map(|page| self.process_page(page))
            .collect();

        let result = DocumentResult { source: None, pages };
        let (clean, dirty) = result.validation_counts();
        info!(
            "Processed {} pages: {} balanced, {} with discrepancies",
            result.pages.len(),
            clean,
            dirty
        );
        result
    }
}
