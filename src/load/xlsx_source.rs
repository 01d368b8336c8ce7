// src/load/xlsx_source.rs
use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::{iter, path::Path};
use tracing::debug;

use super::{RawRow, RawTable};

/// Read the first worksheet of a workbook positionally. Cells are rendered
/// as text; empty and error cells (`#N/A`, ...) become missing cells.
pub fn read_table(path: &Path) -> Result<RawTable> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Failed to open workbook {:?}", path))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("workbook {:?} has no worksheets", path))?
        .with_context(|| format!("Failed to read first worksheet of {:?}", path))?;

    // the range starts at the first used cell; pad so column A stays column 1
    let col_offset = range.start().map(|(_, col)| col as usize).unwrap_or(0);
    let column_count = if range.is_empty() {
        0
    } else {
        col_offset + range.width()
    };

    let mut table = RawTable {
        column_count,
        rows: Vec::with_capacity(range.height()),
    };
    for row in range.rows() {
        let cells = iter::repeat(None)
            .take(col_offset)
            .chain(row.iter().map(cell));
        table.rows.push(RawRow::from_cells(cells));
    }

    debug!(rows = table.rows.len(), columns = column_count, "read worksheet");
    Ok(table)
}

fn cell(data: &Data) -> Option<String> {
    match data {
        Data::Empty | Data::Error(_) => None,
        other => Some(other.to_string()),
    }
}
