// src/load/mod.rs
pub mod csv_source;
pub mod parquet_source;
pub mod xlsx_source;

use anyhow::{bail, Result};
use std::path::Path;
use tracing::{error, info, warn};

use crate::catalog::{ProgramRecord, RecordSet};

/// Program code, program name, cipher code.
pub const MIN_COLUMNS: usize = 3;

/// Text pandas-style exports leave in empty cells.
const NAN_SENTINEL: &str = "nan";

/// One positional row of the source table, before carry-forward.
/// `None` means the cell is missing from the row entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub ep_code: Option<String>,
    pub ep_name: Option<String>,
    pub cipher_code: Option<String>,
    /// Carried through for completeness; never searched.
    pub cipher_name: Option<String>,
}

impl RawRow {
    /// Build from positional cells: code, name, cipher code, cipher name.
    /// Extra cells are ignored, missing ones become `None`.
    pub fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let mut it = cells.into_iter();
        Self {
            ep_code: it.next().flatten(),
            ep_name: it.next().flatten(),
            cipher_code: it.next().flatten(),
            cipher_name: it.next().flatten(),
        }
    }
}

/// Rows read from a source, plus the table width.
#[derive(Debug, Default)]
pub struct RawTable {
    /// Widest row seen (CSV) or schema field count (Parquet).
    pub column_count: usize,
    pub rows: Vec<RawRow>,
}

/// Supported encodings of the tabular source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Parquet,
    /// Excel or OpenDocument workbook; the first worksheet is read.
    Xlsx,
}

impl SourceFormat {
    /// Workbook extensions read as spreadsheets, `.parquet` as Parquet,
    /// everything else as CSV.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("parquet") => SourceFormat::Parquet,
            Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => SourceFormat::Xlsx,
            _ => SourceFormat::Csv,
        }
    }
}

/// True for a missing cell, an all-whitespace cell, or the literal `nan`.
pub fn is_blank(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") | Some(NAN_SENTINEL) => true,
        Some(_) => false,
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    let v = value.as_deref();
    if is_blank(v) {
        None
    } else {
        v.map(str::trim)
    }
}

/// Accumulator for the row fold: the most recently declared program.
#[derive(Debug, Default, Clone)]
pub struct CarryForward {
    current_code: Option<String>,
    current_name: Option<String>,
}

impl CarryForward {
    /// Feed one row. A row declaring both code and name becomes the current
    /// program; any row with a cipher code under a current program emits a record.
    /// Rows that do neither leave the state alone.
    pub fn step(&mut self, row: &RawRow) -> Option<ProgramRecord> {
        if let (Some(code), Some(name)) = (non_blank(&row.ep_code), non_blank(&row.ep_name)) {
            self.current_code = Some(code.to_string());
            self.current_name = Some(name.to_string());
        }

        let cipher = non_blank(&row.cipher_code)?;
        let ep_code = self.current_code.as_ref()?;
        let ep_name = self.current_name.as_ref()?;
        Some(ProgramRecord {
            ep_code: ep_code.clone(),
            ep_name: ep_name.clone(),
            cipher_code: cipher.to_string(),
        })
    }
}

/// Resolve carry-forward over `rows` in order, returning every emitted record.
pub fn resolve_rows<'a, I>(rows: I) -> Vec<ProgramRecord>
where
    I: IntoIterator<Item = &'a RawRow>,
{
    let (_, records) = rows.into_iter().fold(
        (CarryForward::default(), Vec::new()),
        |(mut state, mut records), row| {
            if let Some(record) = state.step(row) {
                records.push(record);
            }
            (state, records)
        },
    );
    records
}

/// Read the source at `path` and resolve it into program records.
pub fn try_load(path: &Path) -> Result<Vec<ProgramRecord>> {
    let table = match SourceFormat::from_path(path) {
        SourceFormat::Csv => csv_source::read_table(path)?,
        SourceFormat::Parquet => parquet_source::read_table(path)?,
        SourceFormat::Xlsx => xlsx_source::read_table(path)?,
    };

    if table.column_count < MIN_COLUMNS {
        bail!(
            "source has only {} columns, expected at least {}",
            table.column_count,
            MIN_COLUMNS
        );
    }

    Ok(resolve_rows(&table.rows))
}

/// Load the record set for the process lifetime.
///
/// Never fails: any read, parse or shape error is logged and yields an empty
/// set, so the bot stays up and answers "not found".
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load<P: AsRef<Path>>(path: P) -> RecordSet {
    let path = path.as_ref();
    match try_load(path) {
        Ok(records) => {
            if records.is_empty() {
                warn!("source parsed but produced no program records");
            } else {
                let sample: Vec<&str> = records
                    .iter()
                    .take(10)
                    .map(|r| r.cipher_code.as_str())
                    .collect();
                info!(?sample, "sample cipher codes");
            }
            info!(records = records.len(), "loaded program records");
            RecordSet::new(records, path)
        }
        Err(e) => {
            error!(error = %format!("{:#}", e), "failed to load programs, serving an empty table");
            RecordSet::empty(path)
        }
    }
}
