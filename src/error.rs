// src/error.rs

use std::fmt;
use thiserror::Error;

/// Fatal errors: any of these stops the import and releases the input.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The METADATA section cannot be trusted for positional binding.
    #[error("malformed schema: {0}")]
    MalformedSchema(String),

    /// The XML token stream itself failed (bad markup, bad encoding).
    #[error("XML stream error: {0}")]
    Stream(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised by the caller's row handler; parsing stops here.
    #[error("row handler failed: {0:#}")]
    Handler(#[source] anyhow::Error),

    #[error("invalid import options: {0}")]
    Config(String),
}

impl From<quick_xml::events::attributes::AttrError> for ImportError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        ImportError::Stream(e.into())
    }
}

/// Row-level errors: the row is skipped and the import carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("row {} has cell #{index} but only {columns} columns are declared", fmt_record_id(.record_id))]
    ColumnIndexOutOfRange {
        record_id: Option<u64>,
        index: usize,
        columns: usize,
    },
}

fn fmt_record_id(id: &Option<u64>) -> String {
    id.map(|i| i.to_string()).unwrap_or_else(|| "<no RECORDID>".into())
}

/// Which conversion failed for a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum CoercionErrorKind {
    NumberFormat,
    DateFormat,
    TimeFormat,
    TimestampFormat,
}

impl fmt::Display for CoercionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CoercionErrorKind::NumberFormat => "number",
            CoercionErrorKind::DateFormat => "date",
            CoercionErrorKind::TimeFormat => "time",
            CoercionErrorKind::TimestampFormat => "timestamp",
        };
        f.write_str(s)
    }
}

/// Cell-level error: the raw text is kept and the row is still dispatched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot read {raw:?} as a {kind}")]
pub struct CoercionError {
    pub kind: CoercionErrorKind,
    pub raw: String,
}

impl CoercionError {
    pub fn new(kind: CoercionErrorKind, raw: impl Into<String>) -> Self {
        Self {
            kind,
            raw: raw.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let e = RowError::ColumnIndexOutOfRange {
            record_id: Some(12),
            index: 3,
            columns: 3,
        };
        assert_eq!(
            e.to_string(),
            "row 12 has cell #3 but only 3 columns are declared"
        );

        let e = RowError::ColumnIndexOutOfRange {
            record_id: None,
            index: 5,
            columns: 2,
        };
        assert!(e.to_string().starts_with("row <no RECORDID>"));

        let c = CoercionError::new(CoercionErrorKind::NumberFormat, "x");
        assert_eq!(c.to_string(), "cannot read \"x\" as a number");
    }

    #[test]
    fn test_handler_error_keeps_context() {
        let inner = anyhow::anyhow!("disk full").context("writing row 3");
        let e = ImportError::Handler(inner);
        assert_eq!(e.to_string(), "row handler failed: writing row 3: disk full");
    }
}
