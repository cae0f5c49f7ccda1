//! Pagination module
//!
//! Supports: Link header (`rel="next"`) and cursors embedded in the response body.
//!
//! # Overview
//!
//! The [`Paginator`] repeatedly asks a [`PageSource`] for pages, following
//! the cursor of each page until a page arrives without one. When a response
//! carries both a `Link` header and an embedded cursor, the `Link` header wins.

mod link;
mod paginator;
mod types;

pub use link::{next_link, parse_link_header};
pub use paginator::Paginator;
pub use types::{
    extract_path, Cursor, Page, PageLayout, PageSource, PaginationState, ResourceSet,
};
