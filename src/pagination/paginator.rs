//! Sequential page collection
//!
//! Pages are fetched strictly one after another: each request depends on the
//! cursor returned by the previous response.

use super::types::{Cursor, PageSource, PaginationState, ResourceSet};
use crate::cancel::CancelToken;
use crate::error::Result;
use crate::http::RequestSpec;
use tracing::{debug, warn};

/// Drives a [`PageSource`] until the result set is exhausted
pub struct Paginator<'a, S: PageSource + ?Sized> {
    source: &'a S,
    max_pages: Option<usize>,
}

impl<'a, S: PageSource + ?Sized> Paginator<'a, S> {
    /// Create an unbounded paginator over `source`
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            max_pages: None,
        }
    }

    /// Stop after at most `max_pages` pages (`None` = unbounded)
    #[must_use]
    pub fn max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Fetch every page reachable from `template` and concatenate the records
    /// in page order.
    ///
    /// Any failure aborts the collection; records gathered so far are dropped.
    pub async fn collect_all(
        &self,
        template: &RequestSpec,
        cancel: &CancelToken,
    ) -> Result<ResourceSet> {
        let mut state = PaginationState::new();
        let mut records = Vec::new();
        let mut spec = template.clone();

        loop {
            cancel.check()?;

            let page = self.source.fetch_page(&spec, cancel).await?;
            state.add_page(page.items.len());
            debug!(
                path = %template.path,
                page = state.pages,
                records = page.items.len(),
                "Fetched page"
            );
            records.extend(page.items);

            let Some(cursor) = page.next_cursor else {
                break;
            };

            if state.reached(self.max_pages) {
                debug!(path = %template.path, pages = state.pages, "Page limit reached");
                break;
            }

            if !state.consume(&cursor) {
                warn!(
                    path = %template.path,
                    cursor = cursor.as_str(),
                    "Cursor repeated, stopping pagination"
                );
                break;
            }

            spec = template.with_cursor(&cursor);
        }

        Ok(ResourceSet::new(records))
    }
}

impl RequestSpec {
    /// Derive the request for the page at `cursor`.
    ///
    /// A URL cursor already carries every query parameter, so it replaces the
    /// target outright; a token cursor is added to the template's query.
    pub fn with_cursor(&self, cursor: &Cursor) -> RequestSpec {
        let mut spec = self.clone();
        match cursor {
            Cursor::Url(url) => {
                spec.path.clone_from(url);
                spec.query.clear();
            }
            Cursor::Token(token) => {
                spec.query
                    .insert(spec.layout.cursor_param.clone(), token.clone());
            }
        }
        spec
    }
}
