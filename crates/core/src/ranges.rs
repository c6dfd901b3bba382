//! Integer range lists as used in coverage lines: `4-6, 9-11`.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

/// Widest span a single `lo-hi` part may cover; anything wider is dropped.
pub const MAX_RANGE_SPAN: u32 = 10_000;

static RE_RANGE_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*-\s*(\d+)|(\d+)").unwrap());

static RE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:ch|ep)\.\s*").unwrap());

/// Render a set of integers as maximal consecutive runs.
pub fn format_ranges<'a, I>(numbers: I) -> String
where
    I: IntoIterator<Item = &'a u32>,
{
    let sorted: BTreeSet<u32> = numbers.into_iter().copied().collect();
    let mut groups: Vec<String> = Vec::new();
    let mut run: Option<(u32, u32)> = None;

    for n in sorted {
        run = match run {
            Some((start, end)) if end + 1 == n => Some((start, n)),
            Some(done) => {
                groups.push(render_run(done));
                Some((n, n))
            }
            None => Some((n, n)),
        };
    }
    if let Some(done) = run {
        groups.push(render_run(done));
    }
    groups.join(", ")
}

fn render_run((start, end): (u32, u32)) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{start}-{end}")
    }
}

/// Parse a range list, tolerating `Ch.`/`Ep.` prefixes, typographic
/// dashes and stray text between groups.
pub fn parse_ranges(text: &str) -> BTreeSet<u32> {
    let cleaned = normalize_dashes(&RE_PREFIX.replace_all(text, ""));
    let mut numbers = BTreeSet::new();

    for caps in RE_RANGE_PART.captures_iter(&cleaned) {
        if let (Some(a), Some(b)) = (caps.get(1), caps.get(2)) {
            let (Ok(a), Ok(b)) = (a.as_str().parse::<u32>(), b.as_str().parse::<u32>()) else {
                continue;
            };
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            if hi - lo > MAX_RANGE_SPAN {
                warn!(lo, hi, max_span = MAX_RANGE_SPAN, "range too wide, skipped");
                continue;
            }
            numbers.extend(lo..=hi);
        } else if let Some(single) = caps.get(3) {
            if let Ok(n) = single.as_str().parse() {
                numbers.insert(n);
            }
        }
    }
    numbers
}

fn normalize_dashes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_runs() {
        let set = BTreeSet::from([4, 5, 6, 9, 10, 11]);
        assert_eq!(format_ranges(&set), "4-6, 9-11");
    }

    #[test]
    fn formats_singletons() {
        let set = BTreeSet::from([1, 3, 4, 7]);
        assert_eq!(format_ranges(&set), "1, 3-4, 7");
        assert_eq!(format_ranges(&BTreeSet::new()), "");
    }

    #[test]
    fn parse_is_left_inverse_of_format() {
        let set = BTreeSet::from([4, 5, 6, 9, 10, 11]);
        assert_eq!(parse_ranges(&format_ranges(&set)), set);
    }

    #[test]
    fn parses_sheet_cells() {
        assert_eq!(parse_ranges("Ch. 23-25"), BTreeSet::from([23, 24, 25]));
        assert_eq!(parse_ranges("Ep. 9\u{2013}10, 12"), BTreeSet::from([9, 10, 12]));
        assert_eq!(parse_ranges("179-181, 180"), BTreeSet::from([179, 180, 181]));
        assert!(parse_ranges("Unavailable").is_empty());
    }

    #[test]
    fn oversized_range_is_dropped() {
        assert_eq!(
            parse_ranges("Anime Episode(s): 1-300000000, 45-46"),
            BTreeSet::from([45, 46])
        );
        assert_eq!(parse_ranges("1-10001").len(), 10_001);
        assert!(parse_ranges("1-10002").is_empty());
    }
}
