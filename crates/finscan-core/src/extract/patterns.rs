//! Fixed regex patterns for statement extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Statement row in concatenated page text:
    // date, description (letters/spaces), up to three amounts
    pub static ref TRANSACTION_ROW: Regex = Regex::new(
        r"(?i)(\d{2}/\d{2}/\d{4})\s+([a-z\s]+)\s+([\d,.]+)?\s+([\d,.]+)?\s+([\d,.]+)"
    ).unwrap();

    // Day/month/year (or month/day/year) with . / - separators
    pub static ref DATE_DMY: Regex = Regex::new(
        r"^(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})$"
    ).unwrap();

    // ISO-style year first
    pub static ref DATE_YMD: Regex = Regex::new(
        r"^(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})$"
    ).unwrap();
}
