use chrono::{Datelike, NaiveDate};

use crate::scoring::fields::Experience;

/// Whole years of experience, summed per role as `end_year - start_year`.
///
/// A missing or `"Present"` end date counts as `today`'s year. Roles with an
/// unparseable date or an end before the start contribute nothing.
pub fn total_experience_years(experiences: &[Experience], today: NaiveDate) -> u32 {
    experiences
        .iter()
        .filter_map(|experience| {
            let start = parse_year(experience.start_date.as_deref()?)?;
            let end = match experience.end_date.as_deref() {
                None => today.year(),
                Some(end) if end.trim().eq_ignore_ascii_case("present") => today.year(),
                Some(end) => parse_year(end)?,
            };
            u32::try_from(end - start).ok()
        })
        .sum()
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM` or `YYYY`.
fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.year());
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d") {
        return Some(date.year());
    }
    if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw.parse().ok();
    }
    None
}
