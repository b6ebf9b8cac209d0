//! Fixed output column schemas
//!
//! One ordered column set per media kind, fixed at compile time. The
//! arrays define both the CSV header and the extraction order of
//! [`crate::export`]'s row builders; changing them is a breaking change
//! for downstream import tools.

use crate::types::LibraryKind;

/// Movie export columns (24)
pub const MOVIE_COLUMNS: [&str; 24] = [
    "title",
    "year",
    "tmdb_id",
    "duration",
    "studio",
    "content_rating",
    "summary",
    "rating",
    "audience_rating",
    "originally_available_at",
    "added_at",
    "updated_at",
    "video_resolution",
    "audio_channels",
    "audio_codec",
    "video_codec",
    "container",
    "video_frame_rate",
    "size",
    "genres",
    "countries",
    "directors",
    "writers",
    "actors",
];

/// TV show export columns (16)
pub const SHOW_COLUMNS: [&str; 16] = [
    "series_title",
    "tmdb_id",
    "total_episodes",
    "seasons",
    "studio",
    "content_rating",
    "summary",
    "audience_rating",
    "year",
    "duration",
    "originally_available_at",
    "added_at",
    "updated_at",
    "genres",
    "countries",
    "actors",
];

/// Music album export columns (7)
pub const ALBUM_COLUMNS: [&str; 7] = [
    "artist",
    "album",
    "year",
    "genres",
    "studio",
    "added_at",
    "updated_at",
];

/// The column schema for a library kind.
pub fn columns_for(kind: LibraryKind) -> &'static [&'static str] {
    match kind {
        LibraryKind::Movie => &MOVIE_COLUMNS,
        LibraryKind::Show => &SHOW_COLUMNS,
        LibraryKind::Artist => &ALBUM_COLUMNS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_widths() {
        assert_eq!(columns_for(LibraryKind::Movie).len(), 24);
        assert_eq!(columns_for(LibraryKind::Show).len(), 16);
        assert_eq!(columns_for(LibraryKind::Artist).len(), 7);
    }

    #[test]
    fn test_cross_reference_column_position() {
        assert_eq!(MOVIE_COLUMNS[2], "tmdb_id");
        assert_eq!(SHOW_COLUMNS[1], "tmdb_id");
    }

    #[test]
    fn test_no_duplicate_columns() {
        for columns in [
            &MOVIE_COLUMNS[..],
            &SHOW_COLUMNS[..],
            &ALBUM_COLUMNS[..],
        ] {
            let unique: std::collections::HashSet<_> = columns.iter().collect();
            assert_eq!(unique.len(), columns.len());
        }
    }
}
