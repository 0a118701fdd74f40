//! Core library for financial document OCR post-processing.
//!
//! This crate provides:
//! - Page classification (bank statement, check, salary slip) from keywords
//! - Labeled field extraction and table row reconstruction
//! - Running-balance reconciliation and acceptance checks against expected values
//!
//! Input is page-level OCR text; rendering and recognition happen elsewhere.

pub mod classify;
pub mod error;
pub mod extract;
pub mod fuzzy;
pub mod models;
pub mod pipeline;
pub mod validate;

pub use classify::Classifier;
pub use error::{FinscanError, Result};
pub use extract::{
    FieldExtractor, LineTokenStrategy, PatternStrategy, TableExtractor, TableStrategy,
};
pub use models::config::{FinscanConfig, MatchMode, TableStrategyKind};
pub use models::page::{OcrDocument, OcrPage, TextItem};
pub use models::record::{
    Category, ClassificationResult, Discrepancy, DocumentResult, FieldSet, PageResult,
    PageValidation, Rows, TransactionRow, ValidationResult,
};
pub use pipeline::Pipeline;
pub use validate::{AcceptanceChecker, BalanceValidator};
