use crate::{ArcDetails, MetadataError, TitleRow};

/// A source of externally maintained episode metadata. Both feeds are pulled
/// in full.
pub trait MetadataSource {
    fn name(&self) -> &str;

    /// Title and plot rows keyed by arc title and part.
    fn fetch_titles(&self) -> Result<Vec<TitleRow>, MetadataError>;

    /// Per-arc guide tables with coverage and release dates.
    fn fetch_arc_details(&self) -> Result<Vec<ArcDetails>, MetadataError>;
}

/// In-memory source, used offline and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub titles: Vec<TitleRow>,
    pub arcs: Vec<ArcDetails>,
}

impl MetadataSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch_titles(&self) -> Result<Vec<TitleRow>, MetadataError> {
        Ok(self.titles.clone())
    }

    fn fetch_arc_details(&self) -> Result<Vec<ArcDetails>, MetadataError> {
        Ok(self.arcs.clone())
    }
}
