use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

// `2023.07.04`, `2023-7-4`, `2023.07-04`
static RE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})[.\-](\d{1,2})[.\-](\d{1,2})$").unwrap()
});

/// Calendar date of a release, always rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReleaseDate(NaiveDate);

impl ReleaseDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse either separator style, with or without zero padding.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = RE_DATE.captures(text.trim())?;
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl std::fmt::Display for ReleaseDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl std::str::FromStr for ReleaseDate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("not a YYYY-MM-DD or YYYY.MM.DD date: {s:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_separators() {
        let a = ReleaseDate::parse("2023.07.04").unwrap();
        let b = ReleaseDate::parse("2023-7-4").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "2023-07-04");
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(ReleaseDate::parse("2023/07/04").is_none());
        assert!(ReleaseDate::parse("2023-13-01").is_none());
        assert!(ReleaseDate::parse("").is_none());
        assert!("07-04-2023".parse::<ReleaseDate>().is_err());
    }
}
