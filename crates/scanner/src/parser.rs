use pacesync_core::exceptions::{ExceptionMapping, ExceptionMatch};
use pacesync_core::taxonomy::SeasonTaxonomy;
use pacesync_core::types::{EpisodeIdentity, FileFormat};
use pacesync_core::variant;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

static VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "mov", "wmv", "flv", "webm", "ts", "mpg", "mpeg", "3gp", "ogv",
];

// Extensions stripped before matching; anything else stays in the stem so
// titles like "Luffy vs. Usopp" survive.
static STRIPPED_EXTENSIONS: &[&str] = &["nfo"];

// One Pace - S12E05 - Alabasta (Alternate (G-8))
// One Pace S01E02 Romance Dawn
static RE_PLEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<show>.+?)\s*-?\s*S(?P<season>\d{1,3})E(?P<episode>\d{1,4})(?:(?:\s*-\s*|\s+)(?P<title>.*?))?\s*$")
        .unwrap()
});

// [One Pace] Paced One Piece - Alabasta Episode 5
static RE_PACED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\[One Pace\]\s*Paced\s+[^-]+?\s*-\s*(?P<arc>.+?)\s+Episode\s+(?P<episode>\d+)(?P<rest>.*)$")
        .unwrap()
});

// [One Pace][1-10] Alabasta 05 Extended [1080p][ABCD1234]
// [One Pace] Alabasta 05 [1080p]
static RE_BRACKET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\[One Pace\]\s*(?:\[[\d\s,\-]*\])?\s*(?P<arc>[^\[\]]+?)\s+(?P<episode>\d{1,3})(?:-\d{1,3})?(?P<rest>(?:[\s\[].*)?)$")
        .unwrap()
});

// One Pace [1-10] Alabasta 05
static RE_SHOW_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^One Pace\s*\[[\d\s,\-]*\]\s*(?P<arc>[^\[\]]+?)\s+(?P<episode>\d{1,3})(?:-\d{1,3})?(?P<rest>(?:[\s\[].*)?)$")
        .unwrap()
});

// Episode 1010, One Piece - 1010, One Piece E1010, OP1010
static RE_BARE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:Episode|One\s*Piece\s*-?\s*E?|OP)\s*0*(?P<number>\d{1,4})\b").unwrap()
});

static RE_SXXEXX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)s\d+e\d+").unwrap());

/// Check a file against a configured extension list.
pub fn has_extension(filename: &str, extensions: &[String]) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Filename without directory components and without a known extension.
pub fn stem(filename: &str) -> &str {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    match name.rsplit_once('.') {
        Some((stem, ext))
            if VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str())
                || STRIPPED_EXTENSIONS.contains(&ext.to_lowercase().as_str()) =>
        {
            stem
        }
        _ => name,
    }
}

/// Embedded container titles look like `Alabasta 05 - The Title`; keep only
/// the part after the first spaced hyphen.
pub fn reduce_embedded_title(raw: &str) -> Option<String> {
    let title = match raw.split_once(" - ") {
        Some((_, rest)) => rest,
        None => raw,
    }
    .trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

/// Bare-number range that maps onto a season provisionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionalRange {
    pub first: u32,
    pub last: u32,
    pub season: u32,
}

impl Default for ProvisionalRange {
    fn default() -> Self {
        Self {
            first: 1000,
            last: 1200,
            season: 35,
        }
    }
}

impl ProvisionalRange {
    pub fn season_for(&self, number: u32) -> Option<u32> {
        (self.first..=self.last).contains(&number).then_some(self.season)
    }
}

/// One naming-convention family.
pub trait PatternMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Format reported for files this matcher recognises.
    fn format(&self) -> FileFormat;

    /// Try to parse an extension-less filename.
    fn try_parse(&self, stem: &str) -> Option<EpisodeIdentity>;
}

pub struct PlexMatcher;

impl PatternMatcher for PlexMatcher {
    fn name(&self) -> &'static str {
        "plex"
    }

    fn format(&self) -> FileFormat {
        FileFormat::Plex
    }

    fn try_parse(&self, stem: &str) -> Option<EpisodeIdentity> {
        let caps = RE_PLEX.captures(stem)?;
        let season: u32 = caps["season"].parse().ok()?;
        let episode: u32 = caps["episode"].parse().ok()?;
        let full_title = caps.name("title").map(|m| m.as_str()).unwrap_or("");
        let (title, variant) = variant::split_variant(full_title);

        Some(EpisodeIdentity {
            season: Some(season),
            episode: Some(episode),
            title: (!title.is_empty()).then_some(title),
            variant,
            arc_name: None,
            original_number: None,
        })
    }
}

pub struct LegacyBracketMatcher;

impl LegacyBracketMatcher {
    /// Text between the episode number and the first tag group.
    fn variant_from_rest(rest: &str) -> String {
        let words = rest.split('[').next().unwrap_or("").trim();
        if words.is_empty() {
            return String::new();
        }
        if variant::is_conventional(words) {
            return variant::canonical_keyword(words);
        }
        match variant::trailing_parenthetical(words) {
            Some((0, inner)) => inner.trim().to_string(),
            _ => String::new(),
        }
    }
}

impl PatternMatcher for LegacyBracketMatcher {
    fn name(&self) -> &'static str {
        "legacy_bracket"
    }

    fn format(&self) -> FileFormat {
        FileFormat::LegacyBracket
    }

    fn try_parse(&self, stem: &str) -> Option<EpisodeIdentity> {
        let caps = [&*RE_PACED, &*RE_BRACKET, &*RE_SHOW_FIRST]
            .iter()
            .find_map(|re| re.captures(stem))?;
        let episode: u32 = caps["episode"].parse().ok()?;
        let arc = caps["arc"].trim().to_string();
        if arc.is_empty() {
            return None;
        }
        let rest = caps.name("rest").map(|m| m.as_str()).unwrap_or("");

        Some(EpisodeIdentity {
            season: None,
            episode: Some(episode),
            title: None,
            variant: Self::variant_from_rest(rest),
            arc_name: Some(arc),
            original_number: None,
        })
    }
}

/// Filenames listed in the exception mapping.
pub struct ExceptionMatcher {
    mapping: ExceptionMapping,
}

impl ExceptionMatcher {
    pub fn new(mapping: ExceptionMapping) -> Self {
        Self { mapping }
    }
}

impl PatternMatcher for ExceptionMatcher {
    fn name(&self) -> &'static str {
        "exception"
    }

    fn format(&self) -> FileFormat {
        FileFormat::Unrecognized
    }

    fn try_parse(&self, stem: &str) -> Option<EpisodeIdentity> {
        match self.mapping.match_filename(stem) {
            ExceptionMatch::One { season, episode } => Some(EpisodeIdentity {
                season: Some(season),
                episode: Some(episode),
                ..Default::default()
            }),
            ExceptionMatch::Ambiguous => {
                warn!(file = stem, "multiple exception entries match, ignoring");
                None
            }
            ExceptionMatch::None => None,
        }
    }
}

/// Unabridged-source numbering such as `Episode 1010`.
pub struct BareNumberMatcher {
    provisional: ProvisionalRange,
}

impl BareNumberMatcher {
    pub fn new(provisional: ProvisionalRange) -> Self {
        Self { provisional }
    }
}

impl PatternMatcher for BareNumberMatcher {
    fn name(&self) -> &'static str {
        "bare_number"
    }

    fn format(&self) -> FileFormat {
        FileFormat::Unrecognized
    }

    fn try_parse(&self, stem: &str) -> Option<EpisodeIdentity> {
        if RE_SXXEXX.is_match(stem) {
            return None;
        }
        let caps = RE_BARE_NUMBER.captures(stem)?;
        let number: u32 = caps["number"].parse().ok()?;
        Some(EpisodeIdentity {
            season: self.provisional.season_for(number),
            original_number: Some(number),
            ..Default::default()
        })
    }
}

/// Ordered matcher chain; the first family that matches wins.
pub struct FilenameParser {
    taxonomy: SeasonTaxonomy,
    matchers: Vec<Box<dyn PatternMatcher>>,
}

impl FilenameParser {
    /// The standard chain: plex, legacy bracket, exception, bare number.
    pub fn new(
        taxonomy: SeasonTaxonomy,
        exceptions: ExceptionMapping,
        provisional: ProvisionalRange,
    ) -> Self {
        Self::with_matchers(
            taxonomy,
            vec![
                Box::new(PlexMatcher),
                Box::new(LegacyBracketMatcher),
                Box::new(ExceptionMatcher::new(exceptions)),
                Box::new(BareNumberMatcher::new(provisional)),
            ],
        )
    }

    pub fn with_matchers(taxonomy: SeasonTaxonomy, matchers: Vec<Box<dyn PatternMatcher>>) -> Self {
        Self { taxonomy, matchers }
    }

    pub fn taxonomy(&self) -> &SeasonTaxonomy {
        &self.taxonomy
    }

    pub fn matcher_names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    /// Best-effort parse; unparseable input yields an empty identity.
    pub fn parse(&self, filename: &str, embedded_title: Option<&str>) -> EpisodeIdentity {
        self.parse_with_format(filename, embedded_title).1
    }

    pub fn identify_format(&self, filename: &str) -> FileFormat {
        let stem = stem(filename);
        self.matchers
            .iter()
            .find(|m| m.try_parse(stem).is_some())
            .map(|m| m.format())
            .unwrap_or(FileFormat::Unrecognized)
    }

    pub fn parse_with_format(
        &self,
        filename: &str,
        embedded_title: Option<&str>,
    ) -> (FileFormat, EpisodeIdentity) {
        let stem = stem(filename);
        let embedded = embedded_title.and_then(reduce_embedded_title);

        let Some((matcher, mut identity)) = self
            .matchers
            .iter()
            .find_map(|m| m.try_parse(stem).map(|id| (m, id)))
        else {
            debug!(file = filename, "no pattern family matched");
            return (FileFormat::Unrecognized, EpisodeIdentity::default());
        };

        match matcher.format() {
            // Legacy names only carry the arc; the container title is the real one.
            FileFormat::LegacyBracket => {
                if embedded.is_some() {
                    identity.title = embedded;
                }
            }
            _ => {
                if identity.title.is_none() {
                    identity.title = embedded;
                }
            }
        }

        // An embedded title may carry its own variant suffix.
        if let Some(title) = identity.title.take() {
            let (base, embedded_variant) = variant::split_variant(&title);
            if identity.variant.is_empty() {
                identity.variant = embedded_variant;
            }
            identity.title = (!base.is_empty()).then_some(base);
        }

        if identity.season.is_none() {
            if let Some(arc) = identity.arc_name.as_deref() {
                match self.taxonomy.lookup(arc) {
                    Some((canonical, season)) => {
                        identity.season = Some(season);
                        identity.arc_name = Some(canonical.to_string());
                    }
                    None => debug!(file = filename, arc, "arc not in season taxonomy"),
                }
            }
        }

        debug!(
            file = filename,
            matcher = matcher.name(),
            season = ?identity.season,
            episode = ?identity.episode,
            variant = %identity.variant,
            "parsed filename"
        );
        (matcher.format(), identity)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> FilenameParser {
        FilenameParser::new(
            SeasonTaxonomy::from_pairs([("Romance Dawn", 1), ("Whisky Peak", 10), ("Alabasta", 12)]),
            ExceptionMapping::from_json(r#"{"Season 1": {"Luffy Special Cut": 7}}"#).unwrap(),
            ProvisionalRange::default(),
        )
    }

    #[test]
    fn matcher_order_is_fixed() {
        assert_eq!(
            parser().matcher_names(),
            ["plex", "legacy_bracket", "exception", "bare_number"]
        );
    }

    #[test]
    fn plex_with_nested_variant() {
        let id = parser().parse("One Pace - S12E05 - Alabasta (Alternate (G-8)).mkv", None);
        assert_eq!(id.season, Some(12));
        assert_eq!(id.episode, Some(5));
        assert_eq!(id.title.as_deref(), Some("Alabasta"));
        assert_eq!(id.variant, "Alternate (G-8)");
    }

    #[test]
    fn plex_without_dashes() {
        let (format, id) = parser().parse_with_format("One Pace S01E02 Romance Dawn.mkv", None);
        assert_eq!(format, FileFormat::Plex);
        assert_eq!(id.season, Some(1));
        assert_eq!(id.episode, Some(2));
        assert_eq!(id.title.as_deref(), Some("Romance Dawn"));
        assert_eq!(id.variant, "");
    }

    #[test]
    fn plex_keeps_unconventional_parenthetical() {
        let id = parser().parse("One Pace - S01E03 - Luffy vs. Usopp (April Fools).mp4", None);
        assert_eq!(id.title.as_deref(), Some("Luffy vs. Usopp (April Fools)"));
        assert_eq!(id.variant, "");
    }

    #[test]
    fn plex_without_title_uses_embedded() {
        let id = parser().parse("One Pace - S01E02.mkv", Some("Romance Dawn 02 - The Great Swordsman"));
        assert_eq!(id.title.as_deref(), Some("The Great Swordsman"));
    }

    #[test]
    fn legacy_bracket_resolves_season() {
        let (format, id) =
            parser().parse_with_format("[One Pace][1-10] Alabasta 05 [1080p][ABCD1234].mkv", None);
        assert_eq!(format, FileFormat::LegacyBracket);
        assert_eq!(id.arc_name.as_deref(), Some("Alabasta"));
        assert_eq!(id.season, Some(12));
        assert_eq!(id.episode, Some(5));
        assert_eq!(id.title, None);
        assert_eq!(id.variant, "");
    }

    #[test]
    fn legacy_extended_keyword() {
        let id = parser().parse("[One Pace][23-25] Whiskey Peak 02 extended [480p][F00D].mkv", None);
        assert_eq!(id.season, Some(10));
        assert_eq!(id.arc_name.as_deref(), Some("Whisky Peak"));
        assert_eq!(id.variant, "Extended");
    }

    #[test]
    fn legacy_prefers_embedded_title() {
        let id = parser().parse(
            "[One Pace][1] Romance Dawn 01 [1080p][X].mkv",
            Some("Romance Dawn 01 - Enter Luffy"),
        );
        assert_eq!(id.title.as_deref(), Some("Enter Luffy"));
    }

    #[test]
    fn paced_form() {
        let id = parser().parse("[One Pace] Paced One Piece - Alabasta Episode 3.mp4", None);
        assert_eq!(id.season, Some(12));
        assert_eq!(id.episode, Some(3));
    }

    #[test]
    fn exception_mapping_applies() {
        let (format, id) = parser().parse_with_format("Luffy Special Cut v2.mkv", None);
        assert_eq!(format, FileFormat::Unrecognized);
        assert_eq!(id.key(), Some(pacesync_core::EpisodeKey::new(1, 7)));
    }

    #[test]
    fn bare_numbering() {
        let id = parser().parse("[Sub] One Piece - 1010 [1080p].mkv", None);
        assert_eq!(id.original_number, Some(1010));
        assert_eq!(id.season, Some(35));
        assert_eq!(id.episode, None);

        let id = parser().parse("OP0045.mkv", None);
        assert_eq!(id.original_number, Some(45));
        assert_eq!(id.season, None);
        assert!(id.is_parseable());
    }

    #[test]
    fn unparseable_is_empty() {
        let id = parser().parse("holiday video.mkv", None);
        assert!(id.is_empty());
        assert_eq!(parser().identify_format("holiday video.mkv"), FileFormat::Unrecognized);
    }

    #[test]
    fn stem_strips_known_extensions_only() {
        assert_eq!(stem("dir/One Pace - S01E01 - Luffy vs. Usopp.mkv"), "One Pace - S01E01 - Luffy vs. Usopp");
        assert_eq!(stem("One Pace - S01E01 - Luffy vs. Usopp"), "One Pace - S01E01 - Luffy vs. Usopp");
        assert_eq!(stem("a.nfo"), "a");
    }

    #[test]
    fn extension_check() {
        assert!(has_extension("x.MKV", &["mkv".into()]));
        assert!(!has_extension("x.avi", &["mkv".into(), "mp4".into()]));
    }
}
