// src/process/dispatch.rs

use tracing::{trace, warn};

use super::row_builder::RowOutcome;
use crate::error::{ImportError, RowError};
use crate::handler::RowHandler;
use crate::record::Record;

/// Hands finished rows to the caller's handler and keeps the tallies.
pub struct RowDispatcher<'h, H: RowHandler + ?Sized> {
    handler: &'h mut H,
    rows_dispatched: u64,
    rows_skipped: u64,
    cell_errors: u64,
}

impl<'h, H: RowHandler + ?Sized> RowDispatcher<'h, H> {
    pub fn new(handler: &'h mut H) -> Self {
        Self {
            handler,
            rows_dispatched: 0,
            rows_skipped: 0,
            cell_errors: 0,
        }
    }

    pub fn rows_dispatched(&self) -> u64 {
        self.rows_dispatched
    }

    pub fn rows_skipped(&self) -> u64 {
        self.rows_skipped
    }

    /// Cells dispatched with a failure marker.
    pub fn cell_errors(&self) -> u64 {
        self.cell_errors
    }

    /// Call the handler exactly once. Its failure is fatal and is not retried.
    pub fn dispatch(&mut self, record: Record) -> Result<(), ImportError> {
        let record_id = record.record_id();
        let errors = record.error_count() as u64;
        trace!(record_id = ?record_id, "dispatching row");
        self.handler.import_node(record).map_err(|e| {
            warn!(record_id = ?record_id, error = %e, "row handler failed, stopping");
            ImportError::Handler(e)
        })?;
        self.rows_dispatched += 1;
        self.cell_errors += errors;
        Ok(())
    }

    pub fn skip(&mut self, error: RowError) {
        warn!(error = %error, "skipping row");
        self.rows_skipped += 1;
        self.handler.row_skipped(&error);
    }

    pub fn handle(&mut self, outcome: RowOutcome) -> Result<(), ImportError> {
        match outcome {
            RowOutcome::Complete(record) => self.dispatch(record),
            RowOutcome::Skipped(error) => {
                self.skip(error);
                Ok(())
            }
        }
    }
}
