//! JSON file writer
//!
//! Writes a [`ResourceSet`] unchanged, either as one JSON array or as one
//! record per line.

use crate::error::{Result, ResultExt};
use crate::pagination::ResourceSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Serialization format for exported records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON array
    Json,
    /// JSON array indented by two spaces
    #[default]
    Pretty,
    /// One JSON record per line
    Jsonl,
}

impl OutputFormat {
    /// File extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json | OutputFormat::Pretty => "json",
            OutputFormat::Jsonl => "jsonl",
        }
    }
}

/// Write `records` to `writer` in the given format
pub fn write_records<W: Write>(
    mut writer: W,
    records: &ResourceSet,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => serde_json::to_writer(&mut writer, records)?,
        OutputFormat::Pretty => serde_json::to_writer_pretty(&mut writer, records)?,
        OutputFormat::Jsonl => {
            for record in records {
                serde_json::to_writer(&mut writer, record)?;
                writer.write_all(b"\n")?;
            }
        }
    }

    if format != OutputFormat::Jsonl {
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Exports result sets into files under one directory
#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_dir: PathBuf,
    format: OutputFormat,
}

impl JsonExporter {
    /// Create an exporter writing into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
        }
    }

    /// Target directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Path a result set named `stem` is written to
    pub fn file_path(&self, stem: &str) -> PathBuf {
        self.output_dir
            .join(format!("{stem}.{}", self.format.extension()))
    }

    /// Write `records` to `<output_dir>/<stem>.<ext>`, creating the directory
    /// if needed. Returns the written path.
    pub fn export(&self, records: &ResourceSet, stem: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory {}", self.output_dir.display())
        })?;
        let path = self.file_path(stem);

        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_records(BufWriter::new(file), records, self.format)?;

        info!(path = %path.display(), records = records.len(), "Exported records");
        Ok(path)
    }
}
