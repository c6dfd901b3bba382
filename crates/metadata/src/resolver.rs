//! Turns a parsed identity plus the metadata tables into a complete episode.
//!
//! Resolution never blocks on input. When a decision is missing the
//! resolver returns [`Resolution::Prompt`]; the caller records the answer
//! in [`RunState`] and resolves again.

use pacesync_core::error::PipelineError;
use pacesync_core::normalize;
use pacesync_core::taxonomy::SeasonTaxonomy;
use pacesync_core::types::{EpisodeIdentity, EpisodeKey, IdentityKey, ResolvedEpisode};
use pacesync_core::variant;
use tracing::{debug, info};

use crate::prompt::{Answerer, Prompt};
use crate::state::{RunState, TitleSource};
use crate::tables::MetadataTables;

/// Upper bound on prompts for a single file. Each prompt kind is asked at
/// most once when answers are valid, so hitting this means a broken answerer.
const MAX_PROMPTS_PER_FILE: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Complete(ResolvedEpisode),
    Prompt(Prompt),
}

pub struct Resolver<'a> {
    taxonomy: &'a SeasonTaxonomy,
    tables: &'a MetadataTables,
}

impl<'a> Resolver<'a> {
    pub fn new(taxonomy: &'a SeasonTaxonomy, tables: &'a MetadataTables) -> Self {
        Self { taxonomy, tables }
    }

    fn season_for(&self, identity: &EpisodeIdentity) -> Option<u32> {
        if let Some(season) = identity.season {
            return Some(season);
        }
        if let Some((_, season)) = identity.arc_name.as_deref().and_then(|a| self.taxonomy.lookup(a)) {
            return Some(season);
        }
        identity
            .title
            .as_deref()
            .and_then(|t| self.taxonomy.find_in_text(t))
            .map(|(_, season)| season)
    }

    fn arc_for(&self, identity: &EpisodeIdentity, season: u32) -> Option<String> {
        if let Some(arc) = identity.arc_name.as_deref() {
            let canonical = self
                .taxonomy
                .lookup(arc)
                .map(|(name, _)| name)
                .unwrap_or(arc);
            return Some(canonical.to_string());
        }
        let arc = self.taxonomy.arc_for_season(season)?;
        debug!(season, arc, "arc name derived from season");
        Some(arc.to_string())
    }

    /// One resolution pass over `identity` using the answers already in
    /// `state`.
    pub fn resolve(
        &self,
        identity: &EpisodeIdentity,
        filename: &str,
        state: &RunState,
    ) -> Result<Resolution, PipelineError> {
        let season = self.season_for(identity);
        let (Some(season), Some(episode)) = (season, identity.episode) else {
            return Err(PipelineError::UnresolvableIdentity {
                filename: filename.to_string(),
                detail: format!(
                    "season={season:?} episode={:?} arc={:?}",
                    identity.episode, identity.arc_name
                ),
            });
        };
        let key = EpisodeKey::new(season, episode);
        let arc_name = self.arc_for(identity, season);

        let source = self.tables.title(key);
        let (source_base, source_variant) = source
            .map(|entry| variant::split_variant(&entry.title))
            .filter(|(base, _)| !base.is_empty())
            .unzip();
        let (media_base, media_variant) = identity
            .title
            .as_deref()
            .map(variant::split_variant)
            .filter(|(base, _)| !base.is_empty())
            .unzip();

        // The file on disk decides the variant.
        let variant = [
            Some(identity.variant.clone()),
            media_variant,
            source_variant,
        ]
        .into_iter()
        .flatten()
        .find(|v| !v.is_empty())
        .unwrap_or_default();
        let ikey = IdentityKey {
            key,
            has_variant: !variant.is_empty(),
        };

        let title = match (source_base, media_base) {
            (Some(src), Some(media)) => {
                if normalize::comparison_key(&src) == normalize::comparison_key(&media) {
                    src
                } else {
                    match state.title_source(ikey) {
                        Some(TitleSource::Source) => src,
                        Some(TitleSource::Media) => media,
                        None => {
                            return Ok(Resolution::Prompt(Prompt::TitleConflict {
                                key: ikey,
                                filename: filename.to_string(),
                                source_title: variant::with_variant(&src, &variant),
                                media_title: variant::with_variant(&media, &variant),
                            }));
                        }
                    }
                }
            }
            (Some(src), None) => src,
            (None, Some(media)) => media,
            (None, None) => match state.supplied_title(ikey) {
                Some(title) => variant::split_variant(title).0,
                None => {
                    return Ok(Resolution::Prompt(Prompt::MissingTitle {
                        key: ikey,
                        filename: filename.to_string(),
                    }));
                }
            },
        };

        let details = arc_name
            .as_deref()
            .and_then(|arc| self.tables.details(arc, episode));
        if details.is_none() {
            debug!(file = filename, %key, arc = ?arc_name, "no guide row");
        }

        let Some(premiered) = details
            .and_then(|d| d.release_date)
            .or_else(|| state.cached_date(key))
        else {
            return Ok(Resolution::Prompt(Prompt::MissingDate {
                key: ikey,
                filename: filename.to_string(),
                title: variant::with_variant(&title, &variant),
            }));
        };

        Ok(Resolution::Complete(ResolvedEpisode {
            season,
            episode,
            title,
            variant,
            arc_name,
            plot: source.map(|s| s.plot.clone()).unwrap_or_default(),
            manga_chapters: details.map(|d| d.manga_chapters.clone()).unwrap_or_default(),
            anime_episodes: details.map(|d| d.anime_episodes.clone()).unwrap_or_default(),
            premiered,
            aired: premiered,
            source_filename: filename.to_string(),
        }))
    }

    /// Resolve, routing every prompt through `answerer` until complete.
    pub fn resolve_with(
        &self,
        identity: &EpisodeIdentity,
        filename: &str,
        state: &mut RunState,
        answerer: &mut dyn Answerer,
    ) -> Result<ResolvedEpisode, PipelineError> {
        for _ in 0..MAX_PROMPTS_PER_FILE {
            match self.resolve(identity, filename, state)? {
                Resolution::Complete(episode) => {
                    info!(
                        file = filename,
                        key = %episode.key(),
                        title = %episode.display_title(),
                        "resolved"
                    );
                    return Ok(episode);
                }
                Resolution::Prompt(prompt) => {
                    let answer = answerer.answer(&prompt)?;
                    state.apply(&prompt, answer)?;
                }
            }
        }
        Err(PipelineError::InvalidAnswer(format!(
            "{filename}: gave up after {MAX_PROMPTS_PER_FILE} prompts"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{Answer, NonInteractive, ScriptedAnswers};
    use crate::state::TitlePolicy;
    use crate::{ArcDetails, DetailRow, TitleRow};
    use pacesync_core::ReleaseDate;
    use std::collections::BTreeSet;

    fn taxonomy() -> SeasonTaxonomy {
        SeasonTaxonomy::from_pairs([("Romance Dawn", 1), ("Orange Town", 2), ("Alabasta", 14)])
    }

    fn tables(tax: &SeasonTaxonomy) -> MetadataTables {
        MetadataTables::build(
            vec![
                TitleRow {
                    arc_title: "Romance Dawn".into(),
                    arc_part: "1".into(),
                    title: "Romance Dawn, the Dawn of an Adventure".into(),
                    description: "Luffy sets out to sea.".into(),
                },
                TitleRow {
                    arc_title: "Orange Town".into(),
                    arc_part: "1".into(),
                    title: "The Clown Pirates".into(),
                    description: "Buggy appears.".into(),
                },
            ],
            vec![ArcDetails {
                arc_name: "Romance Dawn".into(),
                rows: vec![DetailRow {
                    episode_name: "Romance Dawn 01".into(),
                    manga_chapters: BTreeSet::from([1, 2, 3]),
                    anime_episodes: BTreeSet::from([1, 2]),
                    release_date: ReleaseDate::parse("2020-06-01"),
                }],
            }],
            tax,
        )
    }

    fn identity(arc: &str, episode: u32, title: Option<&str>, variant: &str) -> EpisodeIdentity {
        EpisodeIdentity {
            episode: Some(episode),
            title: title.map(str::to_string),
            variant: variant.to_string(),
            arc_name: Some(arc.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn complete_from_tables() {
        let tax = taxonomy();
        let t = tables(&tax);
        let r = Resolver::new(&tax, &t);
        let id = identity("Romance Dawn", 1, Some("Romance Dawn, The Dawn of an Adventure"), "Extended");
        let Resolution::Complete(ep) = r.resolve(&id, "f.mkv", &RunState::default()).unwrap() else {
            panic!("expected complete");
        };
        assert_eq!(ep.season, 1);
        assert_eq!(ep.title, "Romance Dawn, the Dawn of an Adventure");
        assert_eq!(ep.variant, "Extended");
        assert_eq!(ep.plot, "Luffy sets out to sea.");
        assert_eq!(ep.manga_chapters, BTreeSet::from([1, 2, 3]));
        assert_eq!(ep.premiered, ep.aired);
        assert_eq!(ep.display_title(), "Romance Dawn, the Dawn of an Adventure (Extended)");
    }

    #[test]
    fn season_only_identity_derives_arc() {
        let tax = taxonomy();
        let t = tables(&tax);
        let r = Resolver::new(&tax, &t);
        let id = EpisodeIdentity {
            season: Some(1),
            episode: Some(1),
            ..Default::default()
        };
        let Resolution::Complete(ep) = r.resolve(&id, "f.mkv", &RunState::default()).unwrap() else {
            panic!("expected complete");
        };
        assert_eq!(ep.arc_name.as_deref(), Some("Romance Dawn"));
    }

    #[test]
    fn season_found_in_title_text() {
        let tax = taxonomy();
        let t = tables(&tax);
        let r = Resolver::new(&tax, &t);
        let id = EpisodeIdentity {
            episode: Some(1),
            title: Some("Orange Town: The Clown Pirates".into()),
            ..Default::default()
        };
        let prompt = r.resolve(&id, "f.mkv", &RunState::default()).unwrap();
        assert!(matches!(prompt, Resolution::Prompt(Prompt::TitleConflict { key, .. }) if key.key == EpisodeKey::new(2, 1)));
    }

    #[test]
    fn unresolvable_without_episode() {
        let tax = taxonomy();
        let t = tables(&tax);
        let r = Resolver::new(&tax, &t);
        let id = EpisodeIdentity {
            arc_name: Some("Nowhere Island".into()),
            episode: Some(2),
            ..Default::default()
        };
        let err = r.resolve(&id, "f.mkv", &RunState::default()).unwrap_err();
        assert_eq!(err.code(), "unresolvable_identity");
    }

    #[test]
    fn differing_titles_prompt_then_honour_choice() {
        let tax = taxonomy();
        let t = tables(&tax);
        let r = Resolver::new(&tax, &t);
        let id = identity("Orange Town", 1, Some("Buggy the Clown"), "");
        let mut state = RunState::default();
        state.remember_date(EpisodeKey::new(2, 1), ReleaseDate::parse("2020-07-01").unwrap());

        let Resolution::Prompt(prompt) = r.resolve(&id, "f.mkv", &state).unwrap() else {
            panic!("expected prompt");
        };
        let Prompt::TitleConflict {
            source_title,
            media_title,
            ..
        } = &prompt
        else {
            panic!("expected title conflict");
        };
        assert_eq!(source_title, "The Clown Pirates");
        assert_eq!(media_title, "Buggy the Clown");

        state.apply(&prompt, Answer::UseMedia).unwrap();
        let Resolution::Complete(ep) = r.resolve(&id, "f.mkv", &state).unwrap() else {
            panic!("expected complete");
        };
        assert_eq!(ep.title, "Buggy the Clown");
    }

    #[test]
    fn sticky_policy_skips_prompt() {
        let tax = taxonomy();
        let t = tables(&tax);
        let r = Resolver::new(&tax, &t);
        let id = identity("Orange Town", 1, Some("Buggy the Clown"), "");
        let mut state = RunState::new(TitlePolicy::PreferSource);
        let mut script = ScriptedAnswers::new([Answer::Date(ReleaseDate::parse("2020-07-01").unwrap())]);
        let ep = r.resolve_with(&id, "f.mkv", &mut state, &mut script).unwrap();
        assert_eq!(ep.title, "The Clown Pirates");
        assert_eq!(script.asked().len(), 1);
        assert!(matches!(script.asked()[0], Prompt::MissingDate { .. }));
    }

    #[test]
    fn missing_date_is_hard_error_when_non_interactive() {
        let tax = taxonomy();
        let t = tables(&tax);
        let r = Resolver::new(&tax, &t);
        let id = identity("Orange Town", 1, None, "");
        let err = r
            .resolve_with(&id, "f.mkv", &mut RunState::default(), &mut NonInteractive)
            .unwrap_err();
        assert_eq!(err.code(), "missing_required_date");
    }

    #[test]
    fn date_answer_is_reused_for_the_variant_cut() {
        let tax = taxonomy();
        let t = tables(&tax);
        let r = Resolver::new(&tax, &t);
        let mut state = RunState::default();
        let mut script = ScriptedAnswers::new([Answer::Date(ReleaseDate::parse("2020-07-01").unwrap())]);
        let base = identity("Orange Town", 1, None, "");
        let extended = identity("Orange Town", 1, None, "Extended");
        let a = r.resolve_with(&base, "a.mkv", &mut state, &mut script).unwrap();
        let b = r.resolve_with(&extended, "b.mkv", &mut state, &mut script).unwrap();
        assert_eq!(a.premiered, b.premiered);
        assert_eq!(script.asked().len(), 1);
        assert_ne!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn quit_cancels() {
        let tax = taxonomy();
        let t = tables(&tax);
        let r = Resolver::new(&tax, &t);
        let id = identity("Alabasta", 3, None, "");
        let mut script = ScriptedAnswers::new([Answer::Quit]);
        let err = r
            .resolve_with(&id, "f.mkv", &mut RunState::default(), &mut script)
            .unwrap_err();
        assert!(err.is_fatal());
    }
}
