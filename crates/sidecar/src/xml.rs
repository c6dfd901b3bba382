//! XML codec for sidecar documents.

use std::fmt::Write;

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;

use crate::SidecarError;
use crate::document::{SidecarDocument, SidecarKind};

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Parse a sidecar. Only direct children of the root become fields; text of
/// deeper elements is folded into their top-level ancestor.
pub fn parse(text: &str) -> Result<SidecarDocument, SidecarError> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut kind: Option<SidecarKind> = None;
    let mut fields: Vec<(String, String)> = Vec::new();
    let mut current: Option<(String, String)> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match depth {
                    1 => {
                        kind = Some(SidecarKind::from_root(&name).ok_or(SidecarError::UnknownRoot(name))?)
                    }
                    2 => current = Some((name, String::new())),
                    _ => {}
                }
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match depth {
                    0 => kind = Some(SidecarKind::from_root(&name).ok_or(SidecarError::UnknownRoot(name))?),
                    1 => fields.push((name, String::new())),
                    _ => {}
                }
            }
            Event::Text(t) => {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                if depth == 2 {
                    if let Some(field) = current.take() {
                        fields.push(field);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let kind = kind.ok_or(SidecarError::MissingRoot)?;
    Ok(SidecarDocument::with_fields(kind, fields))
}

/// Render with an XML declaration and two-space indentation.
pub fn render(doc: &SidecarDocument) -> String {
    let root = doc.kind.root();
    let mut out = String::with_capacity(64 + doc.len() * 48);
    let _ = writeln!(out, "{DECLARATION}");
    let _ = writeln!(out, "<{root}>");
    for (name, value) in doc.fields() {
        let _ = writeln!(out, "  <{name}>{}</{name}>", escape(value));
    }
    let _ = writeln!(out, "</{root}>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPISODE: &str = r#"<?xml version='1.0' encoding='UTF-8' standalone='yes'?>
<episodedetails>
  <title>Luffy &amp; Zoro</title>
  <showtitle>One Pace</showtitle>
  <uniqueid type="tmdb">123</uniqueid>
  <ratings><rating name="x"><value>7</value></rating></ratings>
  <plot>Line one.

Manga Chapter(s): 1-3</plot>
  <aired/>
</episodedetails>
"#;

    #[test]
    fn parses_direct_children() {
        let doc = parse(EPISODE).unwrap();
        assert_eq!(doc.kind, SidecarKind::Episode);
        assert_eq!(doc.get("title"), Some("Luffy & Zoro"));
        assert_eq!(doc.get("uniqueid"), Some("123"));
        assert_eq!(doc.get("ratings"), Some("7"));
        assert_eq!(doc.get("plot"), Some("Line one.\n\nManga Chapter(s): 1-3"));
        assert_eq!(doc.get("aired"), Some(""));
        assert_eq!(doc.len(), 6);
    }

    #[test]
    fn render_escapes_and_reparses() {
        let mut doc = SidecarDocument::new(SidecarKind::Season);
        doc.push("title", "12. Alabasta <Part 1> & more");
        doc.push("seasonnumber", "12");
        let text = render(&doc);
        assert!(text.starts_with("<?xml"));
        assert!(text.contains("&lt;Part 1&gt; &amp; more"));
        assert_eq!(parse(&text).unwrap(), doc);
    }

    #[test]
    fn rejects_unknown_or_missing_root() {
        assert!(matches!(parse("<movie><title>x</title></movie>"), Err(SidecarError::UnknownRoot(_))));
        assert!(matches!(parse(""), Err(SidecarError::MissingRoot)));
    }
}
