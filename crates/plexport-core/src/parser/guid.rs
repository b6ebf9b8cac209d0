//! Cross-reference id extraction
//!
//! A metadata lookup returns several alternate-id entries per item
//! (`imdb://...`, `tmdb://...`, `tvdb://...`). Downstream import tools key
//! on the TMDB id, so that is the one the exporter pulls out.

/// Scheme prefix of a TMDB alternate id
const TMDB_PREFIX: &str = "tmdb://";

/// Extract the TMDB id from a list of alternate-id entries.
///
/// # Returns
/// * `Some(id)` for the first entry carrying a non-empty `tmdb://` id
/// * `None` when no entry matches
///
/// # Examples
/// ```
/// use plexport_core::parser::extract_tmdb_id;
///
/// let guids = vec!["imdb://tt0133093".to_string(), "tmdb://603".to_string()];
/// assert_eq!(extract_tmdb_id(&guids), Some("603".to_string()));
/// assert_eq!(extract_tmdb_id(&[]), None);
/// ```
pub fn extract_tmdb_id(guids: &[String]) -> Option<String> {
    guids.iter().find_map(|guid| {
        let id = guid.strip_prefix(TMDB_PREFIX)?;
        if id.is_empty() {
            None
        } else {
            Some(id.to_string())
        }
    })
}
