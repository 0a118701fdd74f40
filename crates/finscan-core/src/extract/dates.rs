//! Statement date parsing.

use chrono::NaiveDate;

use super::patterns::{DATE_DMY, DATE_YMD};

/// Parse a date token as printed on a statement row.
///
/// `dd/mm/yyyy` is tried before `mm/dd/yyyy`; the second reading is only used
/// when the first is not a valid calendar date.
pub fn parse_statement_date(token: &str) -> Option<NaiveDate> {
    let token = token.trim();

    if let Some(caps) = DATE_YMD.captures(token) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let caps = DATE_DMY.captures(token)?;
    let first: u32 = caps[1].parse().ok()?;
    let second: u32 = caps[2].parse().ok()?;
    let year = parse_year(&caps[3]);

    NaiveDate::from_ymd_opt(year, second, first)
        .or_else(|| NaiveDate::from_ymd_opt(year, first, second))
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if s.len() == 2 {
        // 2-digit year: 00-49 -> 2000s, 50-99 -> 1900s
        if year < 50 { 2000 + year } else { 1900 + year }
    } else {
        year
    }
}
