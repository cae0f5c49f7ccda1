//! Output module
//!
//! Serializes collected records to JSON files or any writer. Records are
//! written exactly as the API returned them.

mod writer;

pub use writer::{write_records, JsonExporter, OutputFormat};
