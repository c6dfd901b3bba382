use std::collections::BTreeSet;

use pacesync_core::ReleaseDate;
use pacesync_core::types::ResolvedEpisode;
use pacesync_sidecar::{
    FsSidecarStore, SidecarStore, build_episode, episode_filename, load_records, reconcile,
};

fn cut(variant: &str) -> ResolvedEpisode {
    let date = ReleaseDate::parse("2018-03-03").unwrap();
    ResolvedEpisode {
        season: 5,
        episode: 3,
        title: "Luffy vs Kuro".into(),
        variant: variant.into(),
        arc_name: Some("Syrup Village".into()),
        plot: "Kuro attacks.".into(),
        manga_chapters: BTreeSet::from([35, 36]),
        anime_episodes: BTreeSet::from([15, 16, 17]),
        premiered: date,
        aired: date,
        source_filename: "src.mkv".into(),
    }
}

#[test]
fn base_and_extended_cuts_coexist() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsSidecarStore;
    let mut paths = Vec::new();
    for variant in ["", "Extended"] {
        let episode = cut(variant);
        let name = episode_filename("One Pace", 5, 3, &episode.display_title(), "nfo");
        let path = dir.path().join(&name);
        assert!(!path.exists(), "{name} would be overwritten");
        store.write(&path, &build_episode(&episode, "One Pace")).unwrap();
        paths.push(path);
    }

    let records = load_records(&store, paths.iter().map(|p| p.as_path()));
    assert_eq!(records.len(), 2);
    assert_ne!(records[0].identity_key(), records[1].identity_key());
    assert!(records.iter().all(|r| r.is_canonical()));
}

#[test]
fn rebuilt_sidecar_reconciles_clean() {
    let dir = tempfile::tempdir().unwrap();
    let episode = cut("Extended");
    let built = build_episode(&episode, "One Pace");
    let name = episode_filename("One Pace", 5, 3, &episode.display_title(), "nfo");
    let path = dir.path().join(&name);
    FsSidecarStore.write(&path, &built).unwrap();

    let existing = FsSidecarStore.read(&path).unwrap();
    let r = reconcile(&existing, &built, &name, &name);
    assert!(!r.needs_write());
    assert!(!r.rename_needed);
}
