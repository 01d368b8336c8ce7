// src/load/parquet_source.rs
use anyhow::{Context, Result};
use arrow::{
    array::{Array, ArrayRef},
    util::display::array_value_to_string,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::{fs::File, path::Path};
use tracing::debug;

use super::{RawRow, RawTable};

/// Only code, name, cipher code and cipher name are read.
const USED_COLUMNS: usize = 4;

/// Read a Parquet file positionally. Column names are ignored; any column
/// type is rendered to text, nulls become missing cells.
pub fn read_table(path: &Path) -> Result<RawTable> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("Failed to read Parquet metadata {:?}", path))?;
    let column_count = builder.schema().fields().len();
    let reader = builder.with_batch_size(1024).build()?;

    let mut table = RawTable {
        column_count,
        rows: Vec::new(),
    };
    for batch in reader {
        let batch = batch.with_context(|| format!("Failed to decode batch in {:?}", path))?;
        let used = batch.num_columns().min(USED_COLUMNS);
        for row in 0..batch.num_rows() {
            let cells = (0..used)
                .map(|col| cell(batch.column(col), row))
                .collect::<Result<Vec<_>>>()?;
            table.rows.push(RawRow::from_cells(cells));
        }
    }

    debug!(rows = table.rows.len(), columns = column_count, "read Parquet table");
    Ok(table)
}

fn cell(column: &ArrayRef, row: usize) -> Result<Option<String>> {
    if column.is_null(row) {
        return Ok(None);
    }
    Ok(Some(array_value_to_string(column.as_ref(), row)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load;
    use arrow::{
        array::{Int64Array, StringArray},
        datatypes::{DataType, Field, Schema},
        record_batch::RecordBatch,
    };
    use parquet::arrow::ArrowWriter;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn write_parquet(path: &Path, batch: RecordBatch) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(())
    }

    #[test]
    fn test_read_parquet_with_nulls() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("programs.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("code", DataType::Utf8, true),
            Field::new("name", DataType::Utf8, true),
            Field::new("cipher", DataType::Utf8, true),
            Field::new("cipher_name", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![Some("A"), None, Some("B")])),
                Arc::new(StringArray::from(vec![Some("Alpha"), None, Some("Beta")])),
                Arc::new(StringArray::from(vec![Some("101"), Some("102"), Some("201")])),
                Arc::new(StringArray::from(vec![None::<&str>, None, None])),
            ],
        )?;
        write_parquet(&path, batch)?;

        let table = read_table(&path)?;
        assert_eq!(table.column_count, 4);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1].ep_code, None);

        let set = load::load(&path);
        assert_eq!(set.count(), 3);
        assert_eq!(set.search("102"), vec!["A - Alpha"]);
        Ok(())
    }

    #[test]
    fn test_numeric_cipher_column_is_rendered() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("numeric.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("code", DataType::Utf8, false),
            Field::new("name", DataType::Utf8, false),
            Field::new("cipher", DataType::Int64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["A"])),
                Arc::new(StringArray::from(vec!["Alpha"])),
                Arc::new(Int64Array::from(vec![Some(70107)])),
            ],
        )?;
        write_parquet(&path, batch)?;

        let set = load::load(&path);
        assert_eq!(set.search("70107"), vec!["A - Alpha"]);
        Ok(())
    }

    #[test]
    fn test_two_column_parquet_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("narrow.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("code", DataType::Utf8, false),
            Field::new("name", DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["A"])),
                Arc::new(StringArray::from(vec!["Alpha"])),
            ],
        )?;
        write_parquet(&path, batch)?;

        assert!(load::try_load(&path).is_err());
        assert!(load::load(&path).is_empty());
        Ok(())
    }
}
