//! Library export pipeline
//!
//! The high-level API of the crate. For one library: resolve its kind,
//! check the output precondition, fetch the full collection through the
//! paginated fetcher, enrich movie/show items with a cross-reference id
//! and stream one normalized CSV row per item. A multi-library run wraps
//! that per library and aggregates outcomes without letting one failure
//! abort the rest.

use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::{Pacer, PlexClient};
use crate::error::{ExportError, Result};
use crate::fetcher::{PaginatedFetcher, ProgressCallback, DEFAULT_PAGE_SIZE};
use crate::normalize::{
    clean_text, duration_minutes, format_duration, format_rating, format_size, format_timestamp,
    join_tags,
};
use crate::parser::{extract_tmdb_id, parse_container, parse_libraries};
use crate::schema;
use crate::types::{Library, LibraryKind, MediaItem};

/// Tuning knobs of the pipeline; defaults match the server's rate
/// expectations, tests substitute zero delays.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Window size for paginated library fetches
    pub page_size: u64,
    /// Mandatory delay between page requests
    pub page_delay: Duration,
    /// Delay between per-item metadata lookups
    pub item_delay: Duration,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_delay: Duration::from_millis(500),
            item_delay: Duration::from_millis(100),
        }
    }
}

/// Options for a single library export
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// CSV output path
    pub output: PathBuf,
    /// Overwrite an existing output file
    pub force: bool,
}

/// Outcome of a single successful library export
#[derive(Debug, Clone, Copy)]
pub struct ExportOutcome {
    /// Number of data rows written (header excluded)
    pub rows_written: u64,
}

/// Aggregated outcome of a multi-library run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    /// Libraries exported successfully
    pub succeeded: u64,
    /// Libraries that failed (fetch, unknown kind, serialization)
    pub failed: u64,
    /// Libraries skipped because their output already existed
    pub skipped: u64,
    /// Total data rows written across all libraries
    pub rows_written: u64,
}

impl RunSummary {
    /// A run counts as successful when at least one library exported.
    pub fn any_succeeded(&self) -> bool {
        self.succeeded > 0
    }
}

/// Main export API
///
/// # Example
/// ```no_run
/// use plexport_core::{ClientConfig, Exporter, PlexClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = PlexClient::new(ClientConfig::new("http://localhost:32400", "token"))?;
///     let exporter = Exporter::new(client);
///     let summary = exporter.export_all("exports".as_ref(), false).await?;
///     println!("exported {} rows", summary.rows_written);
///     Ok(())
/// }
/// ```
pub struct Exporter {
    client: PlexClient,
    config: ExporterConfig,
    page_progress: Option<ProgressCallback>,
}

impl Exporter {
    /// Create an exporter with default pacing.
    pub fn new(client: PlexClient) -> Self {
        Self::with_config(client, ExporterConfig::default())
    }

    /// Create an exporter with custom pacing/window configuration.
    pub fn with_config(client: PlexClient, config: ExporterConfig) -> Self {
        Self {
            client,
            config,
            page_progress: None,
        }
    }

    /// Attach an observer for page-fetch progress.
    pub fn with_page_progress(mut self, progress: ProgressCallback) -> Self {
        self.page_progress = Some(progress);
        self
    }

    /// List the server's library sections.
    pub async fn libraries(&self) -> Result<Vec<Library>> {
        let body = self.client.get("/library/sections", &[]).await?;
        parse_libraries(&body)
    }

    /// Export one library to CSV.
    ///
    /// The output-exists guard runs before any fetch; a fetch failure
    /// discards the merged partial collection without touching the output
    /// file. Zero exported rows is a warning, not an error.
    ///
    /// # Errors
    /// Failure kinds are scoped to this library: unknown kind, existing
    /// output, exhausted fetch retries, CSV/filesystem errors.
    pub async fn export_library(
        &self,
        library: &Library,
        options: &ExportOptions,
    ) -> Result<ExportOutcome> {
        let kind = library
            .resolved_kind()
            .ok_or_else(|| ExportError::UnknownLibraryKind {
                key: library.key.clone(),
                kind: library.kind.clone(),
            })?;

        if options.output.exists() && !options.force {
            return Err(ExportError::OutputExists(options.output.clone()));
        }

        tracing::info!(
            library = %library.title,
            kind = kind.as_str(),
            output = %options.output.display(),
            "exporting library"
        );

        let collection = self.fetch_collection(&library.key, kind).await?;

        if let Some(parent) = options.output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(&options.output)?;
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_writer(BufWriter::new(file));
        writer.write_record(schema::columns_for(kind))?;

        let item_pacer = Pacer::new(self.config.item_delay);
        let total = collection.items.len();
        for (index, item) in collection.items.iter().enumerate() {
            let row = match kind {
                LibraryKind::Movie => {
                    item_pacer.pause().await;
                    let tmdb_id = self.cross_reference_id(item).await;
                    movie_row(item, &tmdb_id)
                }
                LibraryKind::Show => {
                    item_pacer.pause().await;
                    let tmdb_id = self.cross_reference_id(item).await;
                    show_row(item, &tmdb_id)
                }
                LibraryKind::Artist => album_row(item),
            };
            writer.write_record(&row)?;
            tracing::debug!(library = %library.title, "serialized item {}/{}", index + 1, total);
        }
        writer.flush()?;

        let rows_written = total as u64;
        if rows_written == 0 {
            tracing::warn!(library = %library.title, "no data was exported");
        } else {
            tracing::info!(library = %library.title, rows = rows_written, "export complete");
        }

        Ok(ExportOutcome { rows_written })
    }

    /// Export every library into `output_dir`.
    ///
    /// One library's failure never aborts the rest; existing outputs are
    /// skipped unless `force` is set. The summary's exit mapping is up to
    /// the caller: a run with zero successes is the only run-level failure.
    ///
    /// # Errors
    /// Only listing the libraries (or creating `output_dir`) can fail at
    /// the run level.
    pub async fn export_all(&self, output_dir: &Path, force: bool) -> Result<RunSummary> {
        let libraries = self.libraries().await?;
        fs::create_dir_all(output_dir)?;

        let mut summary = RunSummary::default();
        for (index, library) in libraries.iter().enumerate() {
            tracing::info!(
                "processing library {}/{}: {}",
                index + 1,
                libraries.len(),
                library.title
            );

            let output = output_dir.join(output_file_name(&library.title));
            if output.exists() && !force {
                tracing::warn!(
                    library = %library.title,
                    output = %output.display(),
                    "skipping: output already exists"
                );
                summary.skipped += 1;
                continue;
            }

            let options = ExportOptions { output, force };
            match self.export_library(library, &options).await {
                Ok(outcome) => {
                    summary.succeeded += 1;
                    summary.rows_written += outcome.rows_written;
                }
                Err(err) => {
                    summary.failed += 1;
                    tracing::error!(library = %library.title, "export failed: {}", err);
                }
            }
        }

        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            rows = summary.rows_written,
            "run finished"
        );
        Ok(summary)
    }

    async fn fetch_collection(
        &self,
        library_key: &str,
        kind: LibraryKind,
    ) -> Result<crate::types::Collection> {
        let mut fetcher = PaginatedFetcher::new(
            &self.client,
            self.config.page_size,
            Pacer::new(self.config.page_delay),
        );
        if let Some(progress) = &self.page_progress {
            fetcher = fetcher.with_progress(progress.clone());
        }

        let path = format!("/library/sections/{}/all", library_key);
        fetcher
            .fetch_all(&path, &[("type", kind.item_type().to_string())])
            .await
    }

    /// Look up an item's TMDB cross-reference id.
    ///
    /// Degrades to an empty id on any failure; a single broken item must
    /// not abort the library export.
    async fn cross_reference_id(&self, item: &MediaItem) -> String {
        let Some(rating_key) = item.rating_key() else {
            return String::new();
        };

        let path = format!("/library/metadata/{}", rating_key);
        let lookup = match self.client.get(&path, &[]).await {
            Ok(body) => parse_container(&body),
            Err(err) => Err(err),
        };

        match lookup {
            Ok(doc) => doc
                .items
                .first()
                .and_then(|meta| extract_tmdb_id(&meta.guids))
                .unwrap_or_default(),
            Err(err) => {
                tracing::warn!(rating_key, "metadata lookup failed: {}", err);
                String::new()
            }
        }
    }
}

/// Output filename for a library: spaces become dashes, `.csv` suffix.
pub fn output_file_name(title: &str) -> String {
    format!("{}.csv", title.replace(' ', "-"))
}

fn attr_or<'a>(item: &'a MediaItem, name: &str, default: &'a str) -> &'a str {
    let value = item.attr(name);
    if value.is_empty() {
        default
    } else {
        value
    }
}

fn parse_ms(raw: &str) -> u64 {
    raw.parse().unwrap_or(0)
}

/// Build the 24-column movie row.
fn movie_row(item: &MediaItem, tmdb_id: &str) -> Vec<String> {
    let size = if item.part.is_empty() {
        String::new()
    } else {
        format_size(item.part_attr("size").parse().unwrap_or(0))
    };

    vec![
        clean_text(item.attr("title")),
        item.attr("year").to_string(),
        tmdb_id.to_string(),
        duration_minutes(parse_ms(item.attr("duration"))),
        clean_text(item.attr("studio")),
        item.attr("contentRating").to_string(),
        clean_text(item.attr("summary")),
        format_rating(item.attr("rating")),
        format_rating(item.attr("audienceRating")),
        item.attr("originallyAvailableAt").to_string(),
        format_timestamp(item.attr("addedAt")),
        format_timestamp(item.attr("updatedAt")),
        item.media_attr("videoResolution").to_string(),
        item.media_attr("audioChannels").to_string(),
        item.media_attr("audioCodec").to_string(),
        item.media_attr("videoCodec").to_string(),
        item.media_attr("container").to_string(),
        item.media_attr("videoFrameRate").to_string(),
        size,
        join_tags(&item.genres),
        join_tags(&item.countries),
        join_tags(&item.directors),
        join_tags(&item.writers),
        join_tags(&item.actors),
    ]
}

/// Build the 16-column show row.
fn show_row(item: &MediaItem, tmdb_id: &str) -> Vec<String> {
    vec![
        clean_text(item.attr("title")),
        tmdb_id.to_string(),
        attr_or(item, "leafCount", "0").to_string(),
        attr_or(item, "childCount", "0").to_string(),
        clean_text(item.attr("studio")),
        item.attr("contentRating").to_string(),
        clean_text(item.attr("summary")),
        format_rating(item.attr("audienceRating")),
        item.attr("year").to_string(),
        format_duration(parse_ms(item.attr("duration"))),
        item.attr("originallyAvailableAt").to_string(),
        format_timestamp(item.attr("addedAt")),
        format_timestamp(item.attr("updatedAt")),
        join_tags(&item.genres),
        join_tags(&item.countries),
        join_tags(&item.actors),
    ]
}

/// Build the 7-column album row.
fn album_row(item: &MediaItem) -> Vec<String> {
    vec![
        clean_text(item.attr("parentTitle")),
        clean_text(item.attr("title")),
        item.attr("year").to_string(),
        join_tags(&item.genres),
        clean_text(item.attr("studio")),
        format_timestamp(item.attr("addedAt")),
        format_timestamp(item.attr("updatedAt")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie_item() -> MediaItem {
        let mut item = MediaItem::default();
        for (key, value) in [
            ("ratingKey", "101"),
            ("title", "The  Matrix"),
            ("year", "1999"),
            ("duration", "8160000"),
            ("rating", "8.7"),
            ("audienceRating", "8.5"),
            ("studio", "Warner Bros."),
            ("contentRating", "R"),
            ("summary", "A hacker&#39;s story"),
            ("originallyAvailableAt", "1999-03-31"),
        ] {
            item.attrs.insert(key.to_string(), value.to_string());
        }
        item.media.insert("videoCodec".to_string(), "h264".to_string());
        item.part.insert("size".to_string(), "1610612736".to_string());
        item.genres = vec!["Action".to_string(), "Sci-Fi".to_string()];
        item.directors = vec!["Lana Wachowski".to_string()];
        item
    }

    #[test]
    fn test_movie_row_shape_and_normalization() {
        let row = movie_row(&movie_item(), "603");
        assert_eq!(row.len(), schema::MOVIE_COLUMNS.len());
        assert_eq!(row[0], "The Matrix");
        assert_eq!(row[1], "1999");
        assert_eq!(row[2], "603");
        assert_eq!(row[3], "136");
        assert_eq!(row[6], "A hacker's story");
        assert_eq!(row[7], "87%");
        assert_eq!(row[8], "85%");
        assert_eq!(row[15], "h264");
        assert_eq!(row[18], "1.5GiB");
        assert_eq!(row[19], "Action , Sci-Fi");
    }

    #[test]
    fn test_movie_row_missing_part_leaves_size_empty() {
        let mut item = movie_item();
        item.part.clear();
        let row = movie_row(&item, "");
        assert_eq!(row[18], "");
    }

    #[test]
    fn test_movie_row_all_fields_absent() {
        let row = movie_row(&MediaItem::default(), "");
        assert_eq!(row.len(), 24);
        // Runtime minutes default to "0", everything else is empty
        assert_eq!(row[3], "0");
        assert!(row.iter().enumerate().all(|(i, v)| i == 3 || v.is_empty()));
    }

    #[test]
    fn test_show_row_shape_and_defaults() {
        let mut item = MediaItem::default();
        item.attrs.insert("title".to_string(), "Breaking Bad".to_string());
        item.attrs.insert("duration".to_string(), "2700000".to_string());
        let row = show_row(&item, "1396");
        assert_eq!(row.len(), schema::SHOW_COLUMNS.len());
        assert_eq!(row[0], "Breaking Bad");
        assert_eq!(row[1], "1396");
        assert_eq!(row[2], "0");
        assert_eq!(row[3], "0");
        assert_eq!(row[9], "45m");
    }

    #[test]
    fn test_album_row_shape() {
        let mut item = MediaItem::default();
        item.attrs.insert("parentTitle".to_string(), "Daft Punk".to_string());
        item.attrs.insert("title".to_string(), "Discovery".to_string());
        item.attrs.insert("year".to_string(), "2001".to_string());
        item.genres = vec!["Electronic".to_string()];
        let row = album_row(&item);
        assert_eq!(row.len(), schema::ALBUM_COLUMNS.len());
        assert_eq!(row, vec!["Daft Punk", "Discovery", "2001", "Electronic", "", "", ""]);
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("Movies"), "Movies.csv");
        assert_eq!(output_file_name("TV Shows"), "TV-Shows.csv");
    }

    #[test]
    fn test_run_summary_success_rule() {
        let mut summary = RunSummary::default();
        assert!(!summary.any_succeeded());
        summary.failed = 3;
        assert!(!summary.any_succeeded());
        summary.succeeded = 1;
        assert!(summary.any_succeeded());
    }
}
