//! Variant suffix handling.
//!
//! A variant is the outermost trailing parenthetical of a title, e.g.
//! `Alabasta (Alternate (G-8))` carries the variant `Alternate (G-8)`.
//! Nested parentheses are kept verbatim by scanning back from the final
//! `)` to its matching `(`.

/// Locate the trailing parenthetical group.
///
/// Returns the byte offset of the opening paren and the inner text.
pub fn trailing_parenthetical(text: &str) -> Option<(usize, &str)> {
    let trimmed = text.trim_end();
    if !trimmed.ends_with(')') {
        return None;
    }

    let mut depth = 0usize;
    for (idx, ch) in trimmed.char_indices().rev() {
        match ch {
            ')' => depth += 1,
            '(' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some((idx, &trimmed[idx + 1..trimmed.len() - 1]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Whether the suffix is one of the conventional variant cuts.
pub fn is_conventional(suffix: &str) -> bool {
    let lower = suffix.trim_start().to_lowercase();
    lower.starts_with("extended") || lower.starts_with("alternate")
}

/// Split `title` into `(base, variant)`.
///
/// Only conventional variants are split off; any other parenthetical stays
/// part of the base title so that it round-trips unchanged.
pub fn split_variant(title: &str) -> (String, String) {
    match trailing_parenthetical(title) {
        Some((open, inner)) if is_conventional(inner) => (
            title[..open].trim_end().to_string(),
            inner.trim().to_string(),
        ),
        _ => (title.trim().to_string(), String::new()),
    }
}

/// Re-attach a variant to a base title.
pub fn with_variant(base: &str, variant: &str) -> String {
    if variant.is_empty() {
        base.to_string()
    } else if base.is_empty() {
        format!("({variant})")
    } else {
        format!("{base} ({variant})")
    }
}

/// Canonical spelling of a bare keyword variant (`extended` → `Extended`).
pub fn canonical_keyword(word: &str) -> String {
    let trimmed = word.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) if is_conventional(trimmed) => {
            first.to_uppercase().collect::<String>() + chars.as_str()
        }
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_parens_are_preserved() {
        let (base, variant) = split_variant("Alabasta (Alternate (G-8))");
        assert_eq!(base, "Alabasta");
        assert_eq!(variant, "Alternate (G-8)");
    }

    #[test]
    fn extended_suffix() {
        assert_eq!(
            split_variant("The Straw Hat Pirates (Extended)"),
            ("The Straw Hat Pirates".into(), "Extended".into())
        );
    }

    #[test]
    fn unconventional_suffix_stays_in_title() {
        let title = "Luffy vs. Usopp (April Fools 2023)";
        assert_eq!(split_variant(title), (title.into(), String::new()));
    }

    #[test]
    fn unbalanced_parens_are_ignored() {
        assert_eq!(trailing_parenthetical("Broken (Extended"), None);
        assert_eq!(trailing_parenthetical("Broken Extended)"), None);
    }

    #[test]
    fn trailing_group_is_outermost() {
        assert_eq!(
            trailing_parenthetical("A (b) c (d (e))"),
            Some((8, "d (e)"))
        );
    }

    #[test]
    fn with_variant_round_trips() {
        let (base, variant) = split_variant("Alabasta (Alternate (G-8))");
        assert_eq!(with_variant(&base, &variant), "Alabasta (Alternate (G-8))");
        assert_eq!(with_variant("Alabasta", ""), "Alabasta");
    }

    #[test]
    fn keyword_capitalised() {
        assert_eq!(canonical_keyword("extended"), "Extended");
        assert_eq!(canonical_keyword("ALTERNATE"), "ALTERNATE");
        assert_eq!(canonical_keyword("bonus"), "bonus");
    }
}
