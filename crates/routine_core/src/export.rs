//! Read-only export projections of the routine collection.
//!
//! # Responsibility
//! - Render routines as tab-delimited text or as the persisted JSON array.
//! - Write renders to a caller-chosen path and report failures with cause.
//!
//! # Invariants
//! - Export never mutates the store; it projects a `list()` snapshot.
//! - Rows keep the order of the given slice.

use crate::model::routine::RoutineItem;
use chrono::NaiveDateTime;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Header line of the tab-delimited export.
pub const TEXT_HEADER: &str = "Tanggal\tWaktu\tKegiatan";

/// Export target format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unsupported export format `{other}`; expected text|json")),
        }
    }
}

/// Export failure.
#[derive(Debug)]
pub enum ExportError {
    Write { path: PathBuf, source: io::Error },
    Serialize(serde_json::Error),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Write { path, .. } => write!(f, "failed to export to `{}`", path.display()),
            Self::Serialize(_) => write!(f, "failed to encode export"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Write { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Renders the header line plus one `date\trange\tactivity` row per item.
/// Every line, the last included, ends with `\n`.
pub fn render_text(items: &[RoutineItem]) -> String {
    let mut out = String::with_capacity(TEXT_HEADER.len() + 1 + items.len() * 48);
    out.push_str(TEXT_HEADER);
    out.push('\n');
    for item in items {
        out.push_str(&item.formatted_date());
        out.push('\t');
        out.push_str(&item.time_range());
        out.push('\t');
        out.push_str(&text_cell(item.activity()));
        out.push('\n');
    }
    out
}

/// Renders items as the indented JSON array used by the routine document.
pub fn render_json(items: &[RoutineItem]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(items)?)
}

pub fn export_text(items: &[RoutineItem], path: &Path) -> Result<(), ExportError> {
    write_export(path, ExportFormat::Text, render_text(items), items.len())
}

pub fn export_json(items: &[RoutineItem], path: &Path) -> Result<(), ExportError> {
    write_export(path, ExportFormat::Json, render_json(items)?, items.len())
}

/// Dispatches to [`export_text`] or [`export_json`].
pub fn export_routines(
    items: &[RoutineItem],
    format: ExportFormat,
    path: &Path,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Text => export_text(items, path),
        ExportFormat::Json => export_json(items, path),
    }
}

/// Suggested file name, e.g. `Routine_20240601_0830.txt`.
pub fn default_export_file_name(now: NaiveDateTime, format: ExportFormat) -> String {
    format!("Routine_{}.{}", now.format("%Y%m%d_%H%M"), format.extension())
}

fn write_export(
    path: &Path,
    format: ExportFormat,
    content: String,
    count: usize,
) -> Result<(), ExportError> {
    match std::fs::write(path, content) {
        Ok(()) => {
            info!(
                "event=routine_export module=export status=ok format={} count={count}",
                format.extension()
            );
            Ok(())
        }
        Err(source) => {
            error!(
                "event=routine_export module=export status=error format={} path={} error={source}",
                format.extension(),
                path.display()
            );
            Err(ExportError::Write {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

// Tabs and line breaks would split the row.
fn text_cell(value: &str) -> String {
    value.replace(['\t', '\r', '\n'], " ")
}
