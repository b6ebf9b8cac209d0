//! XML parsers for Plex MediaContainer documents
//!
//! This module contains parsers for the server's REST+XML responses:
//! - `container`: parse a MediaContainer page into raw media items
//! - `sections`: parse the library-sections listing
//! - `guid`: extract the TMDB cross-reference id from alternate-id entries

pub mod container;
pub mod guid;
pub mod sections;

// Re-export main parsing functions
pub use container::{parse_container, ContainerDoc};
pub use guid::extract_tmdb_id;
pub use sections::parse_libraries;
