//! Data models: OCR input, derived records and configuration.

pub mod config;
pub mod page;
pub mod record;
