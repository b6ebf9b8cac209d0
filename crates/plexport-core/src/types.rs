//! Data types for Plexport
//!
//! This module contains the core data structures used throughout the library:
//! libraries and their kinds, raw media items as parsed off the wire, and the
//! merged collection produced by the paginated fetcher.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Kind of a Plex library section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LibraryKind {
    /// Movie library (item type 1)
    Movie,
    /// TV show library (item type 2)
    Show,
    /// Music library, exported at album granularity (item type 9)
    Artist,
}

impl LibraryKind {
    /// Resolve a library's declared kind string.
    ///
    /// # Returns
    /// * `Some(kind)` for "movie", "show" and "artist"
    /// * `None` for anything else (photo libraries etc.)
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "movie" => Some(LibraryKind::Movie),
            "show" => Some(LibraryKind::Show),
            "artist" => Some(LibraryKind::Artist),
            _ => None,
        }
    }

    /// Plex item-type filter code used in the `type` query parameter.
    ///
    /// Music libraries are filtered at album granularity (9), not artist.
    pub fn item_type(&self) -> u32 {
        match self {
            LibraryKind::Movie => 1,
            LibraryKind::Show => 2,
            LibraryKind::Artist => 9,
        }
    }

    /// Canonical kind string as the server reports it.
    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryKind::Movie => "movie",
            LibraryKind::Show => "show",
            LibraryKind::Artist => "artist",
        }
    }
}

/// One library section as listed by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    /// Section key, used in content endpoints
    pub key: String,
    /// Display title
    pub title: String,
    /// Raw kind string; resolved lazily so unknown kinds fail per library
    pub kind: String,
}

impl Library {
    /// Resolve the declared kind, if supported.
    pub fn resolved_kind(&self) -> Option<LibraryKind> {
        LibraryKind::parse(&self.kind)
    }
}

/// One raw media item parsed from a MediaContainer document.
///
/// Fields are kept close to the wire: attribute maps plus the child tag
/// collections the schemas draw from. Normalization happens later, at
/// serialization time.
#[derive(Debug, Clone, Default)]
pub struct MediaItem {
    /// Attributes of the item element itself (`Video` or `Directory`)
    pub attrs: HashMap<String, String>,
    /// Attributes of the first `Media` child, if any
    pub media: HashMap<String, String>,
    /// Attributes of the first `Part` child, if any
    pub part: HashMap<String, String>,
    /// `Genre` tag values, in document order
    pub genres: Vec<String>,
    /// `Country` tag values
    pub countries: Vec<String>,
    /// `Director` tag values
    pub directors: Vec<String>,
    /// `Writer` tag values
    pub writers: Vec<String>,
    /// `Role` tag values (cast)
    pub actors: Vec<String>,
    /// Alternate-id entries (`Guid id="..."`), e.g. `tmdb://603`
    pub guids: Vec<String>,
}

impl MediaItem {
    /// Item attribute by name, empty string when absent.
    pub fn attr(&self, name: &str) -> &str {
        self.attrs.get(name).map(String::as_str).unwrap_or("")
    }

    /// First-Media attribute by name, empty string when absent.
    pub fn media_attr(&self, name: &str) -> &str {
        self.media.get(name).map(String::as_str).unwrap_or("")
    }

    /// First-Part attribute by name, empty string when absent.
    pub fn part_attr(&self, name: &str) -> &str {
        self.part.get(name).map(String::as_str).unwrap_or("")
    }

    /// The item's rating key, used for secondary metadata lookups.
    pub fn rating_key(&self) -> Option<&str> {
        self.attrs.get("ratingKey").map(String::as_str)
    }
}

/// One bounded slice of a remote collection, produced by a single fetch.
#[derive(Debug, Clone)]
pub struct Page {
    /// Offset of the first item within the full collection
    pub offset: u64,
    /// Items carried by this window, in server order
    pub items: Vec<MediaItem>,
}

/// A full library collection merged from contiguous pages.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Server-reported total at probe time
    pub expected_total: u64,
    /// Merged items, in original server order
    pub items: Vec<MediaItem>,
}

impl Collection {
    /// Whether the merge ended up with exactly the probed number of items.
    ///
    /// A mismatch means the server mutated between pages; the fetcher logs
    /// it but still returns the merge.
    pub fn is_complete(&self) -> bool {
        self.items.len() as u64 == self.expected_total
    }
}
