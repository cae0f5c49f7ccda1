//! Pagination types and traits
//!
//! Defines pages, cursors, the assembled result set and the `PageSource`
//! seam the paginator drives.

use super::link::next_link;
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::http::RequestSpec;
use crate::types::{JsonValue, Record};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Serialize;
use std::collections::HashSet;

// ============================================================================
// Cursor
// ============================================================================

/// Opaque position of the next page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cursor {
    /// Absolute URL from a `Link: <...>; rel="next"` header
    Url(String),
    /// Token from a field embedded in the response body
    Token(String),
}

impl Cursor {
    /// Raw cursor value
    pub fn as_str(&self) -> &str {
        match self {
            Cursor::Url(value) | Cursor::Token(value) => value,
        }
    }
}

// ============================================================================
// Page Layout
// ============================================================================

/// Where records and cursors live in a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLayout {
    /// Dotted path to the records array; `None` means the body itself
    pub items_path: Option<String>,
    /// Dotted path to an embedded next-page token
    pub cursor_path: Option<String>,
    /// Query parameter used to send an embedded token back
    pub cursor_param: String,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            items_path: None,
            cursor_path: None,
            cursor_param: "cursor".to_string(),
        }
    }
}

impl PageLayout {
    /// Records under `path` (e.g. `items` for search endpoints)
    #[must_use]
    pub fn items_at(mut self, path: impl Into<String>) -> Self {
        self.items_path = Some(path.into());
        self
    }

    /// Embedded cursor under `path`, sent back as `param`
    #[must_use]
    pub fn cursor_at(mut self, path: impl Into<String>, param: impl Into<String>) -> Self {
        self.cursor_path = Some(path.into());
        self.cursor_param = param.into();
        self
    }
}

// ============================================================================
// Page
// ============================================================================

/// One response worth of records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Records in response order
    pub items: Vec<Record>,
    /// Cursor of the following page; `None` on the terminal page
    pub next_cursor: Option<Cursor>,
}

impl Page {
    /// Create a page
    pub fn new(items: Vec<Record>, next_cursor: Option<Cursor>) -> Self {
        Self { items, next_cursor }
    }

    /// A terminal page
    pub fn last(items: Vec<Record>) -> Self {
        Self::new(items, None)
    }

    /// Whether this is the terminal page
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }

    /// Build a page from a decoded body and its headers.
    ///
    /// A `Link` header with `rel="next"` takes precedence over an embedded
    /// cursor; the body field is only read when no such link is present.
    pub fn from_response(
        body: JsonValue,
        headers: &HeaderMap,
        layout: &PageLayout,
        path: &str,
    ) -> Result<Self> {
        let embedded = layout
            .cursor_path
            .as_deref()
            .and_then(|p| extract_path(&body, p))
            .and_then(cursor_token);

        let next_cursor = headers
            .get(reqwest::header::LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_link)
            .map(Cursor::Url)
            .or(embedded.map(Cursor::Token));

        let items = match &layout.items_path {
            Some(items_path) => match extract_path(&body, items_path) {
                Some(JsonValue::Array(items)) => items.clone(),
                Some(JsonValue::Null) | None => Vec::new(),
                Some(_) => {
                    return Err(Error::decode(
                        path,
                        format!("'{items_path}' is not an array"),
                    ))
                }
            },
            None => match body {
                JsonValue::Array(items) => items,
                JsonValue::Null => Vec::new(),
                object @ JsonValue::Object(_) => vec![object],
                other => {
                    return Err(Error::decode(
                        path,
                        format!("expected an array or object, got {other}"),
                    ))
                }
            },
        };

        Ok(Self::new(items, next_cursor))
    }
}

/// Follow a dotted path (`$.` prefix optional) through nested objects
pub fn extract_path<'a>(value: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    path.split('.')
        .filter(|part| !part.is_empty())
        .try_fold(value, |current, part| current.as_object()?.get(part))
}

fn cursor_token(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ============================================================================
// Resource Set
// ============================================================================

/// Ordered records of one collection call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResourceSet {
    records: Vec<Record>,
}

impl ResourceSet {
    /// Wrap records that are already in page order
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records were collected
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records as a slice
    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    /// Iterate records in order
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Take ownership of the records
    pub fn into_vec(self) -> Vec<Record> {
        self.records
    }
}

impl IntoIterator for ResourceSet {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResourceSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ============================================================================
// Pagination State
// ============================================================================

/// Tracks pagination progress during one collection call
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Pages fetched so far
    pub pages: usize,
    /// Records fetched so far
    pub total_fetched: u64,
    /// Cursors already followed
    seen: HashSet<Cursor>,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a fetched page
    pub fn add_page(&mut self, records: usize) {
        self.pages += 1;
        self.total_fetched += records as u64;
    }

    /// Mark `cursor` as consumed. Returns `false` if it was consumed before.
    pub fn consume(&mut self, cursor: &Cursor) -> bool {
        self.seen.insert(cursor.clone())
    }

    /// Whether the page budget is used up
    pub fn reached(&self, max_pages: Option<usize>) -> bool {
        max_pages.is_some_and(|max| self.pages >= max)
    }
}

// ============================================================================
// Page Source
// ============================================================================

/// Anything that can turn a request into a page
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch one page
    async fn fetch_page(&self, spec: &RequestSpec, cancel: &CancelToken) -> Result<Page>;
}
