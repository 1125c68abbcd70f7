// src/import.rs

use std::{
    io::{self, BufRead},
    path::Path,
    sync::Arc,
    time::Instant,
};
use tracing::{info, instrument, warn};

use crate::coerce::Coercer;
use crate::config::ImportOptions;
use crate::error::ImportError;
use crate::handler::RowHandler;
use crate::process::{events::FmpEvent, FmpReader, ParseContext, RowDispatcher};
use crate::schema::{ColumnSchema, DocumentInfo};

/// Whether any non-fatal problems were met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    Clean,
    CompletedWithErrors { cell_errors: u64, rows_skipped: u64 },
}

/// Result of an import that ran to the end of the document.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub rows_dispatched: u64,
    pub rows_skipped: u64,
    pub cell_errors: u64,
    pub schema: Arc<ColumnSchema>,
    pub document: DocumentInfo,
    pub status: ImportStatus,
}

impl ImportSummary {
    pub fn is_clean(&self) -> bool {
        self.status == ImportStatus::Clean
    }
}

/// Stream the FMPXMLRESULT file at `path` into `handler`, one row at a time.
///
/// The file is closed on every exit path, including handler and stream failures.
#[instrument(level = "info", skip(handler, options), fields(path = %path.as_ref().display()))]
pub fn import_file<P, H>(
    path: P,
    handler: &mut H,
    options: &ImportOptions,
) -> Result<ImportSummary, ImportError>
where
    P: AsRef<Path>,
    H: RowHandler + ?Sized,
{
    options.validate().map_err(ImportError::Config)?;
    let reader = FmpReader::from_file(&path)?;
    run(reader, handler, Coercer::new(options.clone()))
}

/// Same as [`import_file`] over any buffered reader.
pub fn import_reader<R, H>(
    reader: R,
    handler: &mut H,
    options: &ImportOptions,
) -> Result<ImportSummary, ImportError>
where
    R: BufRead,
    H: RowHandler + ?Sized,
{
    options.validate().map_err(ImportError::Config)?;
    run(FmpReader::from_reader(reader), handler, Coercer::new(options.clone()))
}

/// Import with a pre-built [`Coercer`], e.g. one carrying custom strategies.
pub fn import_with<R, H>(
    reader: R,
    handler: &mut H,
    coercer: Coercer,
) -> Result<ImportSummary, ImportError>
where
    R: BufRead,
    H: RowHandler + ?Sized,
{
    coercer.options().validate().map_err(ImportError::Config)?;
    run(FmpReader::from_reader(reader), handler, coercer)
}

/// Drive a parse from any event source. Stops at the first fatal error.
pub fn import_events<I, H>(
    events: I,
    handler: &mut H,
    coercer: Coercer,
) -> Result<ImportSummary, ImportError>
where
    I: IntoIterator<Item = Result<FmpEvent, ImportError>>,
    H: RowHandler + ?Sized,
{
    coercer.options().validate().map_err(ImportError::Config)?;
    run(events, handler, coercer)
}

fn run<I, H>(events: I, handler: &mut H, coercer: Coercer) -> Result<ImportSummary, ImportError>
where
    I: IntoIterator<Item = Result<FmpEvent, ImportError>>,
    H: RowHandler + ?Sized,
{
    let start = Instant::now();
    let mut ctx = ParseContext::new(coercer);
    let mut dispatcher = RowDispatcher::new(handler);

    for event in events {
        if let Some(outcome) = ctx.feed(event?)? {
            dispatcher.handle(outcome)?;
        }
    }

    if ctx.depth() != 0 {
        return Err(ImportError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("document ended with {} unclosed element(s)", ctx.depth()),
        )));
    }
    let schema = ctx.schema().cloned().ok_or_else(|| {
        ImportError::MalformedSchema("document has no METADATA section".into())
    })?;

    let rows_dispatched = dispatcher.rows_dispatched();
    let rows_skipped = dispatcher.rows_skipped();
    let cell_errors = dispatcher.cell_errors();
    let document = ctx.into_document();

    if let Some(found) = document.found {
        if found != rows_dispatched + rows_skipped {
            warn!(
                found,
                rows = rows_dispatched + rows_skipped,
                "row count differs from RESULTSET FOUND"
            );
        }
    }

    let status = if cell_errors == 0 && rows_skipped == 0 {
        ImportStatus::Clean
    } else {
        ImportStatus::CompletedWithErrors {
            cell_errors,
            rows_skipped,
        }
    };
    info!(
        rows = rows_dispatched,
        skipped = rows_skipped,
        cell_errors,
        elapsed = ?start.elapsed(),
        "import finished"
    );

    Ok(ImportSummary {
        rows_dispatched,
        rows_skipped,
        cell_errors,
        schema,
        document,
        status,
    })
}
