//! Field and table extraction from classified pages.

pub mod amounts;
pub mod dates;
pub mod fields;
pub mod patterns;
pub mod table;

pub use amounts::{format_amount, parse_amount};
pub use dates::parse_statement_date;
pub use fields::FieldExtractor;
pub use table::{LineTokenStrategy, PatternStrategy, TableExtractor, TableStrategy, salary_rows};
