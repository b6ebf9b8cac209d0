//! Cursor-based pagination
//!
//! The server caps container responses, so a library is fetched as a
//! sequence of fixed-size windows. A zero-size probe request discovers the
//! server-reported total, then contiguous windows at offsets 0, P, 2P, ...
//! are merged in order into a single [`Collection`]. A mandatory (but
//! injectable) delay separates page requests.

use std::sync::Arc;

use crate::client::{Pacer, PlexClient};
use crate::error::Result;
use crate::parser::{parse_container, ContainerDoc};
use crate::types::{Collection, Page};

/// Default window size for library-content requests
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Progress of a paginated fetch, reported once per completed page
#[derive(Debug, Clone, Copy)]
pub struct PageProgress {
    /// 1-based index of the page just merged
    pub current_page: u64,
    /// Total number of pages this fetch will issue
    pub total_pages: u64,
}

/// Observer invoked after each merged page; purely informational
pub type ProgressCallback = Arc<dyn Fn(PageProgress) + Send + Sync + 'static>;

/// Fetches a full remote collection through fixed-size windows.
pub struct PaginatedFetcher<'a> {
    client: &'a PlexClient,
    page_size: u64,
    pacer: Pacer,
    progress: Option<ProgressCallback>,
}

impl<'a> PaginatedFetcher<'a> {
    /// Create a fetcher over `client` with the given window size.
    ///
    /// A `page_size` of zero is clamped to one.
    pub fn new(client: &'a PlexClient, page_size: u64, pacer: Pacer) -> Self {
        Self {
            client,
            page_size: page_size.max(1),
            pacer,
            progress: None,
        }
    }

    /// Attach a progress observer. Reporting never affects correctness.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Fetch and merge every window of a collection endpoint.
    ///
    /// # Arguments
    /// * `path` - Collection endpoint, e.g. `/library/sections/1/all`
    /// * `query` - Extra query parameters (the item-type filter)
    ///
    /// # Returns
    /// The merged collection in original server order. An empty collection
    /// (probe total of zero) is not an error. Any page failure aborts the
    /// fetch and discards the partial merge.
    pub async fn fetch_all(&self, path: &str, query: &[(&str, String)]) -> Result<Collection> {
        let probe = self.request_window(path, query, 0, 0).await?;
        let total = probe.total_size;
        let total_pages = total.div_ceil(self.page_size);

        let mut collection = Collection {
            expected_total: total,
            items: Vec::with_capacity(total as usize),
        };

        let mut offset = 0;
        let mut current_page = 0;
        while offset < total {
            self.pacer.pause().await;
            let doc = self.request_window(path, query, offset, self.page_size).await?;
            let page = Page {
                offset,
                items: doc.items,
            };
            current_page += 1;

            tracing::debug!(
                path,
                offset = page.offset,
                page_items = page.items.len(),
                "merged page {}/{}",
                current_page,
                total_pages
            );
            if let Some(progress) = &self.progress {
                progress(PageProgress {
                    current_page,
                    total_pages,
                });
            }

            collection.items.extend(page.items);
            offset += self.page_size;
        }

        if !collection.is_complete() {
            tracing::warn!(
                path,
                expected = collection.expected_total,
                merged = collection.items.len(),
                "collection changed while paginating"
            );
        }

        Ok(collection)
    }

    async fn request_window(
        &self,
        path: &str,
        query: &[(&str, String)],
        start: u64,
        size: u64,
    ) -> Result<ContainerDoc> {
        let mut window_query: Vec<(&str, String)> = vec![
            ("X-Plex-Container-Start", start.to_string()),
            ("X-Plex-Container-Size", size.to_string()),
        ];
        window_query.extend(query.iter().map(|(k, v)| (*k, v.clone())));

        let body = self.client.get(path, &window_query).await?;
        parse_container(&body)
    }
}
