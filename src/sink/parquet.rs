// src/sink/parquet.rs

use anyhow::{anyhow, Context, Result};
use arrow::array::{
    ArrayRef, Date32Builder, Float64Builder, StringBuilder, Time64MicrosecondBuilder,
    TimestampMicrosecondBuilder,
};
use arrow::datatypes::{DataType, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, Timelike};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};
use tempfile::{NamedTempFile, TempPath};
use tracing::{debug, info};

use crate::handler::RowHandler;
use crate::record::{Record, TypedValue};
use crate::schema::{build_arrow_schema_with_raw, map_to_arrow_type, raw_column_name, ColumnSchema};

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// One Arrow builder per column, matching `map_to_arrow_type`.
enum ColumnBuffer {
    Utf8(StringBuilder),
    Float64(Float64Builder),
    Date32(Date32Builder),
    Time64(Time64MicrosecondBuilder),
    Timestamp(TimestampMicrosecondBuilder),
}

impl ColumnBuffer {
    fn for_type(dt: &DataType) -> Self {
        match dt {
            DataType::Float64 => ColumnBuffer::Float64(Float64Builder::new()),
            DataType::Date32 => ColumnBuffer::Date32(Date32Builder::new()),
            DataType::Time64(_) => ColumnBuffer::Time64(Time64MicrosecondBuilder::new()),
            DataType::Timestamp(_, _) => {
                ColumnBuffer::Timestamp(TimestampMicrosecondBuilder::new())
            }
            _ => ColumnBuffer::Utf8(StringBuilder::new()),
        }
    }

    /// Values that do not fit the column's type (nulls, failure markers) become null,
    /// except in text columns, which keep a readable rendering. The raw text of a
    /// failure in a typed column goes to its companion column instead.
    fn append(&mut self, value: &TypedValue) -> Result<()> {
        match (self, value) {
            (ColumnBuffer::Float64(b), TypedValue::Number(n)) => b.append_value(*n),
            (ColumnBuffer::Date32(b), TypedValue::Date(d)) => {
                b.append_value(d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
            }
            (ColumnBuffer::Time64(b), TypedValue::Time(t)) => b.append_value(
                t.num_seconds_from_midnight() as i64 * 1_000_000
                    + (t.nanosecond() / 1_000) as i64,
            ),
            (ColumnBuffer::Timestamp(b), TypedValue::Timestamp(ts)) => {
                b.append_value(ts.and_utc().timestamp_micros())
            }
            (ColumnBuffer::Utf8(b), TypedValue::Null) => b.append_null(),
            (ColumnBuffer::Utf8(b), TypedValue::Text(s)) => b.append_value(s),
            (ColumnBuffer::Utf8(b), TypedValue::Invalid(e)) => b.append_value(&e.raw),
            (ColumnBuffer::Utf8(b), other) => {
                b.append_value(serde_json::to_string(other).context("rendering cell as JSON")?)
            }
            (ColumnBuffer::Float64(b), _) => b.append_null(),
            (ColumnBuffer::Date32(b), _) => b.append_null(),
            (ColumnBuffer::Time64(b), _) => b.append_null(),
            (ColumnBuffer::Timestamp(b), _) => b.append_null(),
        }
        Ok(())
    }

    fn finish(&mut self) -> ArrayRef {
        match self {
            ColumnBuffer::Utf8(b) => Arc::new(b.finish()) as ArrayRef,
            ColumnBuffer::Float64(b) => Arc::new(b.finish()) as ArrayRef,
            ColumnBuffer::Date32(b) => Arc::new(b.finish()) as ArrayRef,
            ColumnBuffer::Time64(b) => Arc::new(b.finish()) as ArrayRef,
            ColumnBuffer::Timestamp(b) => Arc::new(b.finish()) as ArrayRef,
        }
    }
}

/// A column's typed builder plus, for non-text columns, the raw text of failed cells.
struct ColumnSlot {
    values: ColumnBuffer,
    raw: Option<StringBuilder>,
}

impl ColumnSlot {
    fn append(&mut self, value: &TypedValue) -> Result<()> {
        self.values.append(value)?;
        if let Some(raw) = self.raw.as_mut() {
            match value {
                TypedValue::Invalid(e) => raw.append_value(&e.raw),
                _ => raw.append_null(),
            }
        }
        Ok(())
    }

    fn finish_into(&mut self, arrays: &mut Vec<ArrayRef>) {
        arrays.push(self.values.finish());
        if let Some(raw) = self.raw.as_mut() {
            arrays.push(Arc::new(raw.finish()) as ArrayRef);
        }
    }
}

struct OpenFile {
    schema: Arc<ColumnSchema>,
    arrow_schema: Arc<ArrowSchema>,
    writer: ArrowWriter<File>,
    // removed on drop unless persisted by `finish`
    temp: TempPath,
    columns: Vec<ColumnSlot>,
}

/// Writes records to one Parquet file, flushing a record batch every `batch_rows` rows.
///
/// Every NUMBER, DATE, TIME and TIMESTAMP column `X` gets a text column `X__raw`
/// next to it, holding the original text of cells that could not be converted.
///
/// Rows go to a temporary file in the output directory. Only
/// [`ParquetSink::finish`] moves it to the output path; a sink dropped without
/// finishing leaves nothing behind.
pub struct ParquetSink {
    path: PathBuf,
    batch_rows: usize,
    open: Option<OpenFile>,
    buffered: usize,
    rows_written: u64,
}

impl ParquetSink {
    pub fn new<P: AsRef<Path>>(path: P, batch_rows: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            batch_rows: batch_rows.max(1),
            open: None,
            buffered: 0,
            rows_written: 0,
        }
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    fn output_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    fn open(&mut self, schema: &Arc<ColumnSchema>) -> Result<&mut OpenFile> {
        if self.open.is_none() {
            for col in schema.iter() {
                if let Some(raw) = raw_column_name(col) {
                    if schema.position(&raw).is_some() {
                        return Err(anyhow!(
                            "column {:?} clashes with the raw-text column of {:?}",
                            raw,
                            col.name
                        ));
                    }
                }
            }
            let arrow_schema = build_arrow_schema_with_raw(schema);
            let (file, temp) = NamedTempFile::new_in(self.output_dir())
                .with_context(|| format!("creating temporary file for {:?}", self.path))?
                .into_parts();
            let props = WriterProperties::builder()
                .set_compression(Compression::SNAPPY)
                .build();
            let writer = ArrowWriter::try_new(file, Arc::clone(&arrow_schema), Some(props))
                .context("creating Arrow writer")?;
            let columns = schema
                .iter()
                .map(|col| {
                    let dt = map_to_arrow_type(col);
                    ColumnSlot {
                        values: ColumnBuffer::for_type(&dt),
                        raw: raw_column_name(col).map(|_| StringBuilder::new()),
                    }
                })
                .collect();
            debug!(path = %self.path.display(), columns = schema.len(), "opened parquet output");
            self.open = Some(OpenFile {
                schema: Arc::clone(schema),
                arrow_schema,
                writer,
                temp,
                columns,
            });
        }
        self.open
            .as_mut()
            .ok_or_else(|| anyhow!("parquet output not open"))
    }

    fn flush_batch(&mut self) -> Result<()> {
        if self.buffered == 0 {
            return Ok(());
        }
        let Some(open) = self.open.as_mut() else {
            return Ok(());
        };
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(open.arrow_schema.fields().len());
        for col in open.columns.iter_mut() {
            col.finish_into(&mut arrays);
        }
        let batch = RecordBatch::try_new(Arc::clone(&open.arrow_schema), arrays)
            .context("building record batch")?;
        open.writer.write(&batch).context("writing record batch")?;
        // close the row group so the writer does not keep the rows in memory
        open.writer.flush().context("flushing row group")?;
        debug!(rows = self.buffered, "flushed batch");
        self.rows_written += self.buffered as u64;
        self.buffered = 0;
        Ok(())
    }

    /// Flush buffered rows, write the footer and move the file to its output path.
    /// If no record ever arrived, an empty file with `schema`'s columns is written.
    pub fn finish(mut self, schema: &Arc<ColumnSchema>) -> Result<u64> {
        self.open(schema)?;
        self.flush_batch()?;
        if let Some(open) = self.open.take() {
            open.writer.close().context("closing parquet writer")?;
            open.temp
                .persist(&self.path)
                .with_context(|| format!("moving parquet output into {:?}", self.path))?;
        }
        info!(path = %self.path.display(), rows = self.rows_written, "parquet written");
        Ok(self.rows_written)
    }
}

impl RowHandler for ParquetSink {
    fn import_node(&mut self, record: Record) -> Result<()> {
        let open = self.open(record.schema())?;
        if !Arc::ptr_eq(&open.schema, record.schema()) && *open.schema != **record.schema() {
            return Err(anyhow!("record schema differs from the parquet file's schema"));
        }
        for (col, (_, value)) in open.columns.iter_mut().zip(record.iter()) {
            col.append(value)?;
        }
        self.buffered += 1;
        if self.buffered >= self.batch_rows {
            self.flush_batch()?;
        }
        Ok(())
    }
}
