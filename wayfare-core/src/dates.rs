use chrono::{Datelike, NaiveDate};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DateParseError {
    #[error("could not interpret \"{0}\" as a calendar date")]
    Unparseable(String),
}

const MONTHS: &[(&str, u32)] = &[
    ("january", 1),
    ("jan", 1),
    ("february", 2),
    ("feb", 2),
    ("march", 3),
    ("mar", 3),
    ("april", 4),
    ("apr", 4),
    ("may", 5),
    ("june", 6),
    ("jun", 6),
    ("july", 7),
    ("jul", 7),
    ("august", 8),
    ("aug", 8),
    ("september", 9),
    ("sept", 9),
    ("sep", 9),
    ("october", 10),
    ("oct", 10),
    ("november", 11),
    ("nov", 11),
    ("december", 12),
    ("dec", 12),
];

/// Resolve a free-form date phrase against a caller-supplied "today".
///
/// Rules, in order: ISO passthrough; "<month name> <day>[, <year>]";
/// "<month>/<day>[/<year>]". When no year is given the current year is
/// assumed, rolling forward to next year if the date has already passed.
pub fn resolve_date(phrase: &str, today: NaiveDate) -> Result<NaiveDate, DateParseError> {
    let trimmed = phrase.trim();
    if trimmed.is_empty() {
        return Err(DateParseError::Unparseable(phrase.to_string()));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Some(date) = parse_month_name(trimmed, today) {
        return Ok(date);
    }

    if let Some(date) = parse_slash(trimmed, today) {
        return Ok(date);
    }

    Err(DateParseError::Unparseable(phrase.to_string()))
}

/// "<Month name or abbreviation> <day>[, <year>]", e.g. "July 19" or
/// "mar 3, 2027".
fn parse_month_name(phrase: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lowered = phrase.to_lowercase();
    let parts: Vec<&str> = lowered.split_whitespace().collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }

    let month = MONTHS
        .iter()
        .find(|(name, _)| *name == parts[0])
        .map(|(_, m)| *m)?;

    let day_token = parts[1].trim_end_matches(',');
    let day: u32 = strip_ordinal(day_token).parse().ok()?;

    let year = match parts.get(2) {
        Some(token) => Some(token.parse::<i32>().ok()?),
        None => None,
    };

    build_date(month, day, year, today)
}

/// "<month>/<day>[/<year>]", two-digit years expanding via 2000 + yy.
fn parse_slash(phrase: &str, today: NaiveDate) -> Option<NaiveDate> {
    let parts: Vec<&str> = phrase.split('/').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }

    let month: u32 = parts[0].trim().parse().ok()?;
    let day: u32 = parts[1].trim().parse().ok()?;
    if month == 0 || month > 12 || day == 0 || day > 31 {
        return None;
    }

    let year = match parts.get(2) {
        Some(token) => {
            let y: i32 = token.trim().parse().ok()?;
            Some(if y < 100 { 2000 + y } else { y })
        }
        None => None,
    };

    build_date(month, day, year, today)
}

/// Apply the year-rollover rule: with no explicit year, a date strictly
/// before today rolls forward to next year.
fn build_date(month: u32, day: u32, year: Option<i32>, today: NaiveDate) -> Option<NaiveDate> {
    match year {
        Some(y) => NaiveDate::from_ymd_opt(y, month, day),
        None => {
            let this_year = NaiveDate::from_ymd_opt(today.year(), month, day)?;
            if this_year < today {
                NaiveDate::from_ymd_opt(today.year() + 1, month, day)
            } else {
                Some(this_year)
            }
        }
    }
}

fn strip_ordinal(token: &str) -> &str {
    for suffix in ["st", "nd", "rd", "th"] {
        if let Some(stripped) = token.strip_suffix(suffix) {
            if !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit()) {
                return stripped;
            }
        }
    }
    token
}
