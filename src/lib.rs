//! Streaming importer for FileMaker Pro `FMPXMLRESULT` exports.
//!
//! The document is read one event at a time; each `<ROW>` becomes a typed
//! [`Record`] handed to a caller's [`RowHandler`] and then dropped, so memory
//! stays at one schema plus one row whatever the size of the export.
//!
//! ```rust,no_run
//! use fmpxml::{import_file, ImportOptions, Record};
//!
//! let opts = ImportOptions::default().with_date_format("%d/%m/%Y");
//! let mut count = 0;
//! let summary = import_file("people.xml", &mut |r: Record| -> anyhow::Result<()> {
//!     count += 1;
//!     println!("{:?}", r.get("NAME"));
//!     Ok(())
//! }, &opts)?;
//! println!("{} rows, clean: {}", summary.rows_dispatched, summary.is_clean());
//! # Ok::<(), fmpxml::ImportError>(())
//! ```
pub mod coerce;
pub mod config;
pub mod error;
pub mod handler;
pub mod import;
pub mod process;
pub mod record;
pub mod schema;
pub mod sink;

pub use coerce::{coerce, Coercer};
pub use config::ImportOptions;
pub use error::{CoercionError, CoercionErrorKind, ImportError, RowError};
pub use handler::RowHandler;
pub use import::{import_events, import_file, import_reader, import_with, ImportStatus, ImportSummary};
pub use record::{RawCell, RawRow, Record, TypedValue};
pub use schema::{ColumnDef, ColumnSchema, DocumentInfo, FieldType};
