// src/process/row_builder.rs

use std::sync::Arc;
use tracing::{trace, warn};

use crate::coerce::Coercer;
use crate::error::RowError;
use crate::record::{Record, TypedValue};
use crate::schema::ColumnSchema;

/// Where the builder is within the RESULTSET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    /// Between rows.
    AwaitingRow,
    /// Inside `<ROW>`, between cells.
    InRow,
    /// Inside `<COL>`, buffering `<DATA>` text.
    InCell,
}

/// What closing a row produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Complete(Record),
    Skipped(RowError),
}

#[derive(Debug)]
struct OpenRow {
    record: Record,
    cells_started: usize,
    /// Index of the first cell beyond the schema, if any.
    overflow: Option<usize>,
}

/// Buffers for the cell being read; reused from cell to cell.
#[derive(Debug, Default)]
struct CellBuffer {
    index: usize,
    data: Vec<String>,
    in_data: bool,
    discard: bool,
}

/// Rebuilds rows from ROW/COL/DATA events, binding the `i`-th `<COL>` to the
/// `i`-th declared column. Holds at most one row at a time.
#[derive(Debug)]
pub struct RowBuilder {
    schema: Arc<ColumnSchema>,
    state: RowState,
    row: Option<OpenRow>,
    cell: CellBuffer,
}

impl RowBuilder {
    pub fn new(schema: Arc<ColumnSchema>) -> Self {
        Self {
            schema,
            state: RowState::AwaitingRow,
            row: None,
            cell: CellBuffer::default(),
        }
    }

    pub fn state(&self) -> RowState {
        self.state
    }

    pub fn schema(&self) -> &Arc<ColumnSchema> {
        &self.schema
    }

    /// Cells currently held in memory: the open record plus buffered repetitions.
    pub fn footprint(&self) -> usize {
        self.row.as_ref().map_or(0, |r| r.record.len()) + self.cell.data.len()
    }

    /// `AwaitingRow` → `InRow`
    pub fn start_row(&mut self, record_id: Option<u64>, mod_id: Option<u64>) {
        if self.state != RowState::AwaitingRow {
            warn!(state = ?self.state, "ROW opened inside another row, ignoring");
            return;
        }
        self.row = Some(OpenRow {
            record: Record::empty(Arc::clone(&self.schema), record_id, mod_id),
            cells_started: 0,
            overflow: None,
        });
        self.state = RowState::InRow;
    }

    /// `InRow` → `InCell`; the cell's index is the number of cells already started.
    pub fn start_cell(&mut self) {
        let Some(row) = self.row.as_mut().filter(|_| self.state == RowState::InRow) else {
            trace!(state = ?self.state, "COL outside a row, ignoring");
            return;
        };
        let index = row.cells_started;
        row.cells_started += 1;

        let discard = index >= self.schema.len();
        if discard && row.overflow.is_none() {
            row.overflow = Some(index);
        }

        self.cell.index = index;
        self.cell.data.clear();
        self.cell.in_data = false;
        self.cell.discard = discard;
        self.state = RowState::InCell;
    }

    /// `<DATA>` inside the open cell starts a new repetition.
    pub fn start_data(&mut self) {
        if self.state != RowState::InCell {
            return;
        }
        self.cell.in_data = true;
        if !self.cell.discard {
            self.cell.data.push(String::new());
        }
    }

    /// Character data; may arrive in several chunks for one `<DATA>`.
    pub fn text(&mut self, chunk: &str) {
        if self.state != RowState::InCell || !self.cell.in_data || self.cell.discard {
            return;
        }
        if let Some(buf) = self.cell.data.last_mut() {
            buf.push_str(chunk);
        }
    }

    pub fn end_data(&mut self) {
        self.cell.in_data = false;
    }

    /// `InCell` → `InRow`: coerce the buffered text and store it under its column.
    pub fn end_cell(&mut self, coercer: &Coercer) {
        if self.state != RowState::InCell {
            return;
        }
        self.state = RowState::InRow;
        if self.cell.discard {
            return;
        }
        let Some(row) = self.row.as_mut() else {
            return;
        };

        let def = &self.schema[self.cell.index];
        let value = coercer.coerce_cell(def, &self.cell.data);
        report_failures(row.record.record_id(), &def.name, &value);
        row.record.set(self.cell.index, value);
        self.cell.data.clear();
    }

    /// `InRow` → `AwaitingRow`. Columns the row never supplied stay `Null`.
    /// Returns `None` if no row was open.
    pub fn end_row(&mut self) -> Option<RowOutcome> {
        if self.state == RowState::InCell {
            warn!("ROW closed inside an open COL");
        }
        self.state = RowState::AwaitingRow;
        self.cell.data.clear();
        let row = self.row.take()?;

        if let Some(index) = row.overflow {
            return Some(RowOutcome::Skipped(RowError::ColumnIndexOutOfRange {
                record_id: row.record.record_id(),
                index,
                columns: self.schema.len(),
            }));
        }
        if row.cells_started < self.schema.len() {
            trace!(
                record_id = ?row.record.record_id(),
                cells = row.cells_started,
                columns = self.schema.len(),
                "short row padded with nulls"
            );
        }
        Some(RowOutcome::Complete(row.record))
    }
}

fn report_failures(record_id: Option<u64>, field: &str, value: &TypedValue) {
    match value {
        TypedValue::Invalid(e) => {
            warn!(record_id = ?record_id, field = %field, kind = %e.kind, raw = %e.raw, "cell failed coercion");
        }
        TypedValue::Repeated(vs) => {
            for v in vs {
                report_failures(record_id, field, v);
            }
        }
        _ => {}
    }
}
