// src/load/csv_source.rs
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::{
    fs::File,
    io::{Cursor, Read},
    path::Path,
};
use tracing::debug;

use super::{RawRow, RawTable};

/// Read a headerless CSV file. Rows may differ in length; cells are decoded
/// lossily so a stray non-UTF-8 byte does not sink the whole table. The
/// delimiter (`,`, `;` or tab) is sniffed from the data.
pub fn read_table(path: &Path) -> Result<RawTable> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    read_from(file).with_context(|| format!("Failed to read CSV {:?}", path))
}

/// Delimiters tried when sniffing, in tie-break order.
const DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

/// Lines inspected by [`sniff_delimiter`].
const SNIFF_LINES: usize = 20;

pub fn read_from<R: Read>(mut reader: R) -> Result<RawTable> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data).context("reading CSV bytes")?;
    let delimiter = sniff_delimiter(&data);

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(Cursor::new(data));

    let mut table = RawTable::default();
    for (idx, result) in rdr.byte_records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        table.column_count = table.column_count.max(record.len());
        let row = RawRow::from_cells(
            record
                .iter()
                .map(|cell| Some(String::from_utf8_lossy(cell).into_owned())),
        );
        table.rows.push(row);
    }

    debug!(
        delimiter = %(delimiter as char).escape_default(),
        rows = table.rows.len(),
        columns = table.column_count,
        "read CSV table"
    );
    Ok(table)
}

/// Pick the delimiter seen most often outside quotes in the first non-empty
/// lines. Ties, including no delimiter at all, go to `,`.
pub fn sniff_delimiter(data: &[u8]) -> u8 {
    let mut counts = [0usize; DELIMITERS.len()];
    let lines = data
        .split(|&b| b == b'\n')
        .filter(|line| line.iter().any(|b| !b.is_ascii_whitespace()))
        .take(SNIFF_LINES);
    for line in lines {
        let mut quoted = false;
        for &b in line {
            if b == b'"' {
                quoted = !quoted;
            } else if !quoted {
                if let Some(i) = DELIMITERS.iter().position(|&d| d == b) {
                    counts[i] += 1;
                }
            }
        }
    }

    let mut best = 0;
    for i in 1..DELIMITERS.len() {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    DELIMITERS[best]
}
