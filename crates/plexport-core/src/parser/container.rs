//! MediaContainer page parser
//!
//! Parses one page of a library-contents (or metadata-lookup) response into
//! raw [`MediaItem`] records. Plex keeps nearly everything in attributes:
//! the item elements (`Video` for movies, `Directory` for shows and albums)
//! carry their fields directly, with child elements for technical media
//! info (`Media`/`Part`), tag lists (`Genre`, `Role`, ...) and alternate
//! ids (`Guid`).

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{ExportError, Result};
use crate::types::MediaItem;

/// One parsed MediaContainer document
#[derive(Debug, Clone, Default)]
pub struct ContainerDoc {
    /// Server-reported total collection size (`totalSize`, else `size`)
    pub total_size: u64,
    /// Items carried by this document, in document order
    pub items: Vec<MediaItem>,
}

/// Parse a MediaContainer document from raw XML.
///
/// # Arguments
/// * `xml` - Raw XML response body
///
/// # Returns
/// * `Ok(ContainerDoc)` with the reported total and parsed items
/// * `Err(ExportError::Xml)` if the document is malformed or the root is
///   not a `MediaContainer`
pub fn parse_container(xml: &str) -> Result<ContainerDoc> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut doc = ContainerDoc::default();
    let mut depth: usize = 0;
    let mut saw_root = false;
    let mut current: Option<MediaItem> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = element_name(&e);
                if depth == 0 {
                    read_root(&name, &e, &mut doc, &mut saw_root)?;
                } else if depth == 1 && is_item_element(&name) {
                    current = Some(item_from_attrs(&e));
                } else if let Some(item) = current.as_mut() {
                    capture_child(item, &name, &e);
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) => {
                let name = element_name(&e);
                if depth == 0 {
                    read_root(&name, &e, &mut doc, &mut saw_root)?;
                } else if depth == 1 && is_item_element(&name) {
                    // Self-closing item with no children
                    doc.items.push(item_from_attrs(&e));
                } else if let Some(item) = current.as_mut() {
                    capture_child(item, &name, &e);
                }
            }
            Ok(Event::End(e)) => {
                depth = depth.saturating_sub(1);
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if depth == 1 && is_item_element(&name) {
                    if let Some(item) = current.take() {
                        doc.items.push(item);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExportError::Xml(format!("XML parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(ExportError::Xml("missing MediaContainer root".to_string()));
    }

    Ok(doc)
}

fn read_root(
    name: &str,
    e: &BytesStart,
    doc: &mut ContainerDoc,
    saw_root: &mut bool,
) -> Result<()> {
    if name != "MediaContainer" {
        return Err(ExportError::Xml(format!(
            "unexpected root element '{}'",
            name
        )));
    }
    doc.total_size = total_size_attr(e);
    *saw_root = true;
    Ok(())
}

/// Whether an element at container depth is a media item
fn is_item_element(name: &str) -> bool {
    name == "Video" || name == "Directory"
}

fn item_from_attrs(e: &BytesStart) -> MediaItem {
    MediaItem {
        attrs: attrs_map(e),
        ..Default::default()
    }
}

/// Fold a child element into the item under construction.
///
/// Only the first `Media` and `Part` are kept; the schemas report the
/// primary file the way the server lists it first.
fn capture_child(item: &mut MediaItem, name: &str, e: &BytesStart) {
    match name {
        "Media" if item.media.is_empty() => item.media = attrs_map(e),
        "Part" if item.part.is_empty() => item.part = attrs_map(e),
        "Genre" => push_tag(&mut item.genres, e),
        "Country" => push_tag(&mut item.countries, e),
        "Director" => push_tag(&mut item.directors, e),
        "Writer" => push_tag(&mut item.writers, e),
        "Role" => push_tag(&mut item.actors, e),
        "Guid" => {
            if let Some(id) = attr_value(e, "id") {
                if !id.is_empty() {
                    item.guids.push(id);
                }
            }
        }
        _ => {}
    }
}

fn push_tag(tags: &mut Vec<String>, e: &BytesStart) {
    if let Some(tag) = attr_value(e, "tag") {
        if !tag.is_empty() {
            tags.push(tag);
        }
    }
}

/// Probe responses report `totalSize`; full pages report both `totalSize`
/// and the page-local `size`.
fn total_size_attr(e: &BytesStart) -> u64 {
    for key in ["totalSize", "size"] {
        if let Some(value) = attr_value(e, key) {
            if let Ok(total) = value.parse() {
                return total;
            }
        }
    }
    0
}

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

/// All attributes of an element, XML-unescaped.
pub(crate) fn attrs_map(e: &BytesStart) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_default();
        map.insert(key, value);
    }
    map
}

/// A single attribute of an element, XML-unescaped.
pub(crate) fn attr_value(e: &BytesStart, wanted: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == wanted.as_bytes() {
            return Some(
                attr.unescape_value()
                    .map(|v| v.into_owned())
                    .unwrap_or_default(),
            );
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOVIE_PAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MediaContainer size="2" totalSize="3" offset="0">
  <Video ratingKey="101" title="The Matrix" year="1999" duration="8160000" rating="8.7">
    <Media videoResolution="1080" videoCodec="h264" audioCodec="aac" container="mkv">
      <Part size="8589934592" file="/movies/matrix.mkv"/>
    </Media>
    <Genre tag="Action"/>
    <Genre tag="Sci-Fi"/>
    <Country tag="USA"/>
    <Director tag="Lana Wachowski"/>
    <Writer tag="Lilly Wachowski"/>
    <Role tag="Keanu Reeves"/>
    <Guid id="imdb://tt0133093"/>
    <Guid id="tmdb://603"/>
  </Video>
  <Video ratingKey="102" title="Heat &amp; Dust" year="1983"/>
</MediaContainer>"#;

    #[test]
    fn test_parse_movie_page() {
        let doc = parse_container(MOVIE_PAGE).unwrap();
        assert_eq!(doc.total_size, 3);
        assert_eq!(doc.items.len(), 2);

        let matrix = &doc.items[0];
        assert_eq!(matrix.attr("title"), "The Matrix");
        assert_eq!(matrix.rating_key(), Some("101"));
        assert_eq!(matrix.media_attr("videoCodec"), "h264");
        assert_eq!(matrix.part_attr("size"), "8589934592");
        assert_eq!(matrix.genres, vec!["Action", "Sci-Fi"]);
        assert_eq!(matrix.directors, vec!["Lana Wachowski"]);
        assert_eq!(matrix.guids, vec!["imdb://tt0133093", "tmdb://603"]);
    }

    #[test]
    fn test_parse_unescapes_attributes() {
        let doc = parse_container(MOVIE_PAGE).unwrap();
        assert_eq!(doc.items[1].attr("title"), "Heat & Dust");
    }

    #[test]
    fn test_self_closing_item_has_no_children() {
        let doc = parse_container(MOVIE_PAGE).unwrap();
        let second = &doc.items[1];
        assert!(second.media.is_empty());
        assert!(second.genres.is_empty());
    }

    #[test]
    fn test_probe_response_total_size() {
        let doc = parse_container(r#"<MediaContainer totalSize="120" size="0"/>"#).unwrap();
        assert_eq!(doc.total_size, 120);
        assert!(doc.items.is_empty());
    }

    #[test]
    fn test_directory_items_are_parsed() {
        let xml = r#"<MediaContainer size="1" totalSize="1">
          <Directory ratingKey="7" title="Breaking Bad" leafCount="62" childCount="5">
            <Genre tag="Crime"/>
          </Directory>
        </MediaContainer>"#;
        let doc = parse_container(xml).unwrap();
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].attr("leafCount"), "62");
        assert_eq!(doc.items[0].genres, vec!["Crime"]);
    }

    #[test]
    fn test_only_first_media_and_part_are_kept() {
        let xml = r#"<MediaContainer size="1" totalSize="1">
          <Video ratingKey="1" title="Dual">
            <Media container="mkv"><Part size="10"/></Media>
            <Media container="avi"><Part size="20"/></Media>
          </Video>
        </MediaContainer>"#;
        let doc = parse_container(xml).unwrap();
        assert_eq!(doc.items[0].media_attr("container"), "mkv");
        assert_eq!(doc.items[0].part_attr("size"), "10");
    }

    #[test]
    fn test_empty_container() {
        let doc = parse_container("<MediaContainer size=\"0\"/>").unwrap();
        assert_eq!(doc.total_size, 0);
        assert!(doc.items.is_empty());
    }

    #[test]
    fn test_wrong_root_is_rejected() {
        let result = parse_container("<html><body/></html>");
        assert!(matches!(result, Err(ExportError::Xml(_))));
    }

    #[test]
    fn test_empty_document_is_rejected() {
        let result = parse_container("");
        assert!(matches!(result, Err(ExportError::Xml(_))));
    }

    #[test]
    fn test_malformed_xml_is_rejected() {
        let result = parse_container("<MediaContainer><Video</MediaContainer>");
        assert!(result.is_err());
    }
}
