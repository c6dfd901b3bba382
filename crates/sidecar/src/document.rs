//! Flat field-list model shared by episode, season and show sidecars.

/// Fields kept by structural repair, for every document kind.
pub const ALLOWED_FIELDS: &[&str] = &[
    "title",
    "showtitle",
    "season",
    "episode",
    "plot",
    "premiered",
    "aired",
    "seasonnumber",
    "namedseason",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SidecarKind {
    Episode,
    Season,
    Show,
}

impl SidecarKind {
    pub fn root(self) -> &'static str {
        match self {
            Self::Episode => "episodedetails",
            Self::Season => "season",
            Self::Show => "tvshow",
        }
    }

    pub fn from_root(name: &str) -> Option<Self> {
        match name {
            "episodedetails" => Some(Self::Episode),
            "season" => Some(Self::Season),
            "tvshow" => Some(Self::Show),
            _ => None,
        }
    }
}

/// Direct children of the root element, in document order. Duplicates are
/// representable so that repair can see and remove them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarDocument {
    pub kind: SidecarKind,
    fields: Vec<(String, String)>,
}

impl SidecarDocument {
    pub fn new(kind: SidecarKind) -> Self {
        Self {
            kind,
            fields: Vec::new(),
        }
    }

    pub fn with_fields(kind: SidecarKind, fields: Vec<(String, String)>) -> Self {
        Self { kind, fields }
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// First occurrence wins.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set the first occurrence of `name`, appending it when absent.
    /// Returns whether the document changed.
    pub fn ensure(&mut self, name: &str, value: &str) -> bool {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) if v == value => false,
            Some((_, v)) => {
                *v = value.to_string();
                true
            }
            None => {
                self.push(name, value);
                true
            }
        }
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<(String, String)> {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_updates_first_or_appends() {
        let mut doc = SidecarDocument::new(SidecarKind::Season);
        assert!(doc.ensure("seasonnumber", "3"));
        assert!(!doc.ensure("seasonnumber", "3"));
        doc.push("title", "a");
        doc.push("title", "b");
        assert!(doc.ensure("title", "c"));
        assert_eq!(doc.get("title"), Some("c"));
        assert_eq!(doc.fields()[2], ("title".to_string(), "b".to_string()));
    }

    #[test]
    fn roots_round_trip() {
        for kind in [SidecarKind::Episode, SidecarKind::Season, SidecarKind::Show] {
            assert_eq!(SidecarKind::from_root(kind.root()), Some(kind));
        }
        assert_eq!(SidecarKind::from_root("movie"), None);
    }
}
