//! Library-sections listing parser
//!
//! Parses `/library/sections` into [`Library`] values. Sections appear as
//! `Directory` elements carrying `key`, `title` and `type` attributes.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use super::container::{attr_value, attrs_map};
use crate::error::{ExportError, Result};
use crate::types::Library;

/// Parse the library listing from raw XML.
///
/// Sections missing a key or title are skipped; the kind string is kept
/// raw so unsupported kinds fail later, per library, not here.
pub fn parse_libraries(xml: &str) -> Result<Vec<Library>> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut libraries = Vec::new();
    let mut depth: usize = 0;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if depth == 1 && e.name().as_ref() == b"Directory" {
                    if let Some(library) = library_from_element(&e) {
                        libraries.push(library);
                    }
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) => {
                if depth == 1 && e.name().as_ref() == b"Directory" {
                    if let Some(library) = library_from_element(&e) {
                        libraries.push(library);
                    }
                }
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExportError::Xml(format!("XML parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    Ok(libraries)
}

fn library_from_element(e: &quick_xml::events::BytesStart) -> Option<Library> {
    let attrs = attrs_map(e);
    let key = attrs.get("key").filter(|k| !k.is_empty())?.clone();
    let title = attrs.get("title").filter(|t| !t.is_empty())?.clone();
    let kind = attr_value(e, "type").unwrap_or_default();
    Some(Library { key, title, kind })
}
