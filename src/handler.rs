// src/handler.rs

use crate::error::RowError;
use crate::record::Record;

/// Caller-supplied per-row logic.
///
/// `import_node` runs once per completed row, synchronously; returning an error stops
/// the import. The record's `schema()` gives the column order if the caller needs it.
///
/// Any `FnMut(Record) -> anyhow::Result<()>` closure is a handler.
pub trait RowHandler {
    fn import_node(&mut self, record: Record) -> anyhow::Result<()>;

    /// Called for each row that was skipped instead of dispatched.
    fn row_skipped(&mut self, _error: &RowError) {}
}

impl<F> RowHandler for F
where
    F: FnMut(Record) -> anyhow::Result<()>,
{
    fn import_node(&mut self, record: Record) -> anyhow::Result<()> {
        self(record)
    }
}
