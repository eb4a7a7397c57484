//! Dates and pay periods.
//!
//! Dates are normalized to ISO `YYYY-MM-DD`; pay periods (competência) to a
//! `YYYY-MM` month key plus a display form such as `Julho de 2024`.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::text::fold;

/// Portuguese month names (accent-folded, uppercase) and abbreviations.
const MONTHS: &[(&str, u32)] = &[
    ("JANEIRO", 1),
    ("FEVEREIRO", 2),
    ("MARCO", 3),
    ("ABRIL", 4),
    ("MAIO", 5),
    ("JUNHO", 6),
    ("JULHO", 7),
    ("AGOSTO", 8),
    ("SETEMBRO", 9),
    ("OUTUBRO", 10),
    ("NOVEMBRO", 11),
    ("DEZEMBRO", 12),
    ("JAN", 1),
    ("FEV", 2),
    ("MAR", 3),
    ("ABR", 4),
    ("MAI", 5),
    ("JUN", 6),
    ("JUL", 7),
    ("AGO", 8),
    ("SET", 9),
    ("OUT", 10),
    ("NOV", 11),
    ("DEZ", 12),
];

const MONTH_DISPLAY: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// `DD/MM/YYYY` (also `-` or `.` separated, two-digit years allowed).
pub static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4}|\d{2})\b").unwrap());

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap());

/// Month name followed by a year: `JULHO DE 2024`, `JUL/2024`, `Julho 2024`.
/// Matched against accent-folded text.
pub static NAMED_PERIOD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([A-Z]{3,9})\.?\s*(?:DE\s+|/\s*|-\s*)?(\d{4})\b").unwrap()
});

/// Numeric period: `07/2024`.
pub static NUMERIC_PERIOD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(0?[1-9]|1[0-2])\s*/\s*(\d{4})\b").unwrap());

/// A pay period (month of a year).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (1900..=2200).contains(&year) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// `YYYY-MM` month key.
    pub fn mes(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Display form: `Julho de 2024`.
    pub fn competencia(&self) -> String {
        format!("{} de {}", MONTH_DISPLAY[(self.month - 1) as usize], self.year)
    }
}

/// Look up a Portuguese month name or abbreviation.
///
/// Unknown names yield `None` rather than a guessed month.
pub fn month_number(name: &str) -> Option<u32> {
    let key = fold(name.trim().trim_end_matches('.'));
    MONTHS
        .iter()
        .find(|(month, _)| *month == key)
        .map(|(_, number)| *number)
}

/// Normalize a `DD/MM/YYYY` date to `YYYY-MM-DD`.
///
/// Two-digit years are read as 20YY. Already-ISO input is validated and
/// returned unchanged. Impossible dates (31/02) yield `None`.
pub fn normalize_date(input: &str) -> Option<String> {
    let trimmed = input.trim();

    if let Some(caps) = ISO_DATE.captures(trimmed) {
        let date = NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        )?;
        return Some(date.format("%Y-%m-%d").to_string());
    }

    let caps = DATE_PATTERN.captures(trimmed)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = match caps[3].len() {
        2 => 2000 + caps[3].parse::<i32>().ok()?,
        _ => caps[3].parse().ok()?,
    };
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Every pay period mentioned in `text`, in order of appearance.
///
/// Month names are checked against the fixed table; numeric `MM/YYYY`
/// periods that are the tail of a full `DD/MM/YYYY` date are ignored.
pub fn find_periods(text: &str) -> Vec<Period> {
    let folded = fold(text);
    let mut found: Vec<(usize, Period)> = Vec::new();

    for caps in NAMED_PERIOD_PATTERN.captures_iter(&folded) {
        let (Some(whole), Some(name), Some(year)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let Some(month) = month_number(name.as_str()) else {
            continue;
        };
        if let Some(period) = year.as_str().parse().ok().and_then(|y| Period::new(y, month)) {
            found.push((whole.start(), period));
        }
    }

    for caps in NUMERIC_PERIOD_PATTERN.captures_iter(&folded) {
        let (Some(whole), Some(month), Some(year)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let preceded_by_day = folded[..whole.start()]
            .chars()
            .next_back()
            .is_some_and(|c| c == '/' || c == '.' || c == '-' || c.is_ascii_digit());
        if preceded_by_day {
            continue;
        }
        let period = month
            .as_str()
            .parse()
            .ok()
            .zip(year.as_str().parse().ok())
            .and_then(|(m, y)| Period::new(y, m));
        if let Some(period) = period {
            found.push((whole.start(), period));
        }
    }

    found.sort_by_key(|(pos, _)| *pos);
    let mut periods: Vec<Period> = Vec::with_capacity(found.len());
    for (_, period) in found {
        if !periods.contains(&period) {
            periods.push(period);
        }
    }
    periods
}

/// First pay period mentioned in `text`.
pub fn parse_period(text: &str) -> Option<Period> {
    find_periods(text).into_iter().next()
}
