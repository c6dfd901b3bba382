//! Google Sheets exports: a CSV of titles/plots and a ZIP of per-arc HTML
//! episode guide tables.

use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use pacesync_core::ReleaseDate;
use pacesync_core::ranges;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use tracing::{debug, info};

use crate::provider::MetadataSource;
use crate::retry::{RetryPolicy, with_backoff};
use crate::{ArcDetails, DetailRow, MetadataError, TitleRow};

pub const DEFAULT_TITLE_PLOT_URL: &str = "https://docs.google.com/spreadsheets/d/1M0Aa2p5x7NioaH9-u8FyHq6rH3t5s6Sccs8GoC6pHAM/export?format=csv";
pub const DEFAULT_EPISODE_GUIDE_URL: &str = "https://docs.google.com/spreadsheets/d/1HQRMJgu_zArp-sLnvFMDzOyjdsht87eFLECxMK858lA/export?format=zip";

static SEL_TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static SEL_ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static SEL_CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

pub struct SheetsSource {
    client: reqwest::blocking::Client,
    title_plot_url: String,
    episode_guide_url: String,
    retry: RetryPolicy,
}

impl SheetsSource {
    pub fn new(
        title_plot_url: String,
        episode_guide_url: String,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, MetadataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pacesync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MetadataError::Network(e.to_string()))?;
        Ok(Self {
            client,
            title_plot_url,
            episode_guide_url,
            retry,
        })
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, MetadataError> {
        with_backoff(&self.retry, url, |attempt| {
            debug!(url, attempt = attempt + 1, "sheets request");
            let resp = self
                .client
                .get(url)
                .send()
                .map_err(|e| MetadataError::Network(e.to_string()))?;
            if !resp.status().is_success() {
                return Err(MetadataError::Provider(format!(
                    "sheets returned {}",
                    resp.status()
                )));
            }
            resp.bytes()
                .map(|b| b.to_vec())
                .map_err(|e| MetadataError::Network(e.to_string()))
        })
    }
}

impl MetadataSource for SheetsSource {
    fn name(&self) -> &str {
        "sheets"
    }

    fn fetch_titles(&self) -> Result<Vec<TitleRow>, MetadataError> {
        let bytes = self.get_bytes(&self.title_plot_url)?;
        let text = String::from_utf8(bytes).map_err(|e| MetadataError::Format(e.to_string()))?;
        let rows = parse_title_csv(&text)?;
        info!(rows = rows.len(), "loaded title/plot feed");
        Ok(rows)
    }

    fn fetch_arc_details(&self) -> Result<Vec<ArcDetails>, MetadataError> {
        let bytes = self.get_bytes(&self.episode_guide_url)?;
        let arcs = parse_guide_zip(&bytes)?;
        info!(arcs = arcs.len(), "loaded episode guide");
        Ok(arcs)
    }
}

#[derive(Deserialize)]
struct CsvRow {
    #[serde(default)]
    arc_title: String,
    #[serde(default)]
    arc_part: String,
    #[serde(default)]
    title_en: String,
    #[serde(default)]
    description_en: String,
}

/// Parse the title/plot CSV; rows without arc title or part are dropped.
pub fn parse_title_csv(text: &str) -> Result<Vec<TitleRow>, MetadataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for record in reader.deserialize::<CsvRow>() {
        let record = record.map_err(|e| MetadataError::Format(format!("csv: {e}")))?;
        let arc_title = record.arc_title.trim();
        let arc_part = record.arc_part.trim();
        if arc_title.is_empty() || arc_part.is_empty() {
            continue;
        }
        rows.push(TitleRow {
            arc_title: arc_title.to_string(),
            arc_part: arc_part.to_string(),
            title: record.title_en.trim().to_string(),
            description: record.description_en.trim().to_string(),
        });
    }
    Ok(rows)
}

/// Unpack every `.html` entry of the guide archive.
pub fn parse_guide_zip(bytes: &[u8]) -> Result<Vec<ArcDetails>, MetadataError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| MetadataError::Format(format!("zip: {e}")))?;
    let mut arcs = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| MetadataError::Format(format!("zip: {e}")))?;
        let name = entry.name().to_string();
        if !name.to_lowercase().ends_with(".html") {
            continue;
        }
        let mut html = String::new();
        entry
            .read_to_string(&mut html)
            .map_err(|e| MetadataError::Format(format!("{name}: {e}")))?;
        let arc_name = Path::new(&name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(name);
        arcs.push(parse_arc_html(&arc_name, &html));
    }
    Ok(arcs)
}

#[derive(Debug, Default)]
struct Columns {
    name: Option<usize>,
    chapters: Option<usize>,
    episodes: Option<usize>,
    release_date: Option<usize>,
}

impl Columns {
    fn from_header(cells: &[String]) -> Self {
        let mut cols = Self::default();
        for (idx, text) in cells.iter().enumerate() {
            if text.contains("Release Date") {
                cols.release_date = Some(idx);
            } else if text.contains("One Pace Episode")
                || (text.contains("Episode") && cols.name.is_none())
            {
                cols.name = Some(idx);
            } else if text.contains("Chapters") {
                cols.chapters = Some(idx);
            } else if text.contains("Episodes") && cols.episodes.is_none() {
                cols.episodes = Some(idx);
            }
        }
        cols
    }
}

fn is_freezebar(el: &ElementRef<'_>) -> bool {
    el.value()
        .attr("class")
        .is_some_and(|c| c.contains("freezebar"))
}

fn cell_texts(row: &ElementRef<'_>) -> Option<Vec<String>> {
    let cells: Vec<ElementRef<'_>> = row.select(&SEL_CELL).collect();
    if cells.iter().any(is_freezebar) {
        return None;
    }
    Some(
        cells
            .iter()
            .map(|c| c.text().collect::<String>().trim().to_string())
            .collect(),
    )
}

/// Parse one arc's guide page. The header row is found by its content and
/// freeze-bar spacer rows are skipped.
pub fn parse_arc_html(arc_name: &str, html: &str) -> ArcDetails {
    let doc = Html::parse_document(html);
    let mut details = ArcDetails {
        arc_name: arc_name.to_string(),
        rows: Vec::new(),
    };

    for table in doc.select(&SEL_TABLE) {
        let mut columns: Option<Columns> = None;
        for row in table.select(&SEL_ROW) {
            if is_freezebar(&row) {
                continue;
            }
            let Some(cells) = cell_texts(&row) else {
                continue;
            };

            if columns.is_none() {
                let header = Columns::from_header(&cells);
                if header.name.is_some() {
                    columns = Some(header);
                }
                continue;
            }
            let Some(cols) = columns.as_ref() else {
                continue;
            };
            let Some(name_idx) = cols.name else {
                continue;
            };
            let Some(name) = cells.get(name_idx).filter(|n| !n.is_empty()) else {
                continue;
            };

            let cell = |idx: Option<usize>| idx.and_then(|i| cells.get(i)).map(String::as_str);
            details.rows.push(DetailRow {
                episode_name: name.clone(),
                manga_chapters: cell(cols.chapters).map(ranges::parse_ranges).unwrap_or_default(),
                anime_episodes: cell(cols.episodes).map(ranges::parse_ranges).unwrap_or_default(),
                release_date: cell(cols.release_date).and_then(ReleaseDate::parse),
            });
        }
        if !details.rows.is_empty() {
            break;
        }
    }

    debug!(arc = arc_name, rows = details.rows.len(), "parsed guide table");
    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::io::Write;

    const GUIDE: &str = r#"<html><body><table class="waffle">
<thead><tr><th class="row-headers-background"></th><th>A</th><th>B</th><th>C</th><th>D</th></tr></thead>
<tbody>
<tr><td class="s0">One Pace Episode</td><td class="s0">Chapters</td><td class="s0">Episodes</td><td class="s0">Release Date</td></tr>
<tr class="freezebar-cell"><td class="freezebar-cell"></td></tr>
<tr><td>Syrup Village 01</td><td>Ch. 23-25</td><td>Ep. 9&#8211;10</td><td>2014.3.6</td></tr>
<tr><td>Syrup Village 02</td><td>26, 28-29</td><td>11</td><td>2014-04-01</td></tr>
<tr><td></td><td></td><td></td><td></td></tr>
</tbody></table></body></html>"#;

    #[test]
    fn parses_guide_table() {
        let arc = parse_arc_html("Syrup Village", GUIDE);
        assert_eq!(arc.rows.len(), 2);
        let first = &arc.rows[0];
        assert_eq!(first.episode_name, "Syrup Village 01");
        assert_eq!(first.manga_chapters, BTreeSet::from([23, 24, 25]));
        assert_eq!(first.anime_episodes, BTreeSet::from([9, 10]));
        assert_eq!(first.release_date.map(|d| d.to_string()).as_deref(), Some("2014-03-06"));
        assert_eq!(arc.rows[1].manga_chapters, BTreeSet::from([26, 28, 29]));
    }

    #[test]
    fn table_without_header_yields_no_rows() {
        let arc = parse_arc_html("X", "<table><tr><td>a</td><td>b</td></tr></table>");
        assert!(arc.rows.is_empty());
    }

    #[test]
    fn parses_title_csv() {
        let csv = "arc_title,arc_part,title_en,description_en,extra\n\
                   Romance Dawn,1,Enter Luffy,\"Luffy, a boy\",x\n\
                   ,2,No arc,,\n\
                   Romance Dawn,2, The Great Swordsman ,Zoro.,\n";
        let rows = parse_title_csv(csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].description, "Luffy, a boy");
        assert_eq!(rows[1].title, "The Great Swordsman");
    }

    #[test]
    fn unpacks_guide_zip() {
        let mut buf = Vec::new();
        {
            let mut zw = zip::ZipWriter::new(Cursor::new(&mut buf));
            let opts = zip::write::FileOptions::default();
            zw.start_file("Syrup Village.html", opts).unwrap();
            zw.write_all(GUIDE.as_bytes()).unwrap();
            zw.start_file("resources/sheet.css", opts).unwrap();
            zw.write_all(b"td {}").unwrap();
            zw.finish().unwrap();
        }
        let arcs = parse_guide_zip(&buf).unwrap();
        assert_eq!(arcs.len(), 1);
        assert_eq!(arcs[0].arc_name, "Syrup Village");
        assert_eq!(arcs[0].rows.len(), 2);
    }
}
