// src/coerce/mod.rs
pub mod date_parser;
pub mod number;
pub mod time_parser;

use std::{collections::HashMap, fmt, sync::Arc};
use tracing::debug;

use crate::config::ImportOptions;
use crate::error::{CoercionError, CoercionErrorKind, RowError};
use crate::record::{RawRow, Record, TypedValue};
use crate::schema::{ColumnDef, ColumnSchema, FieldType};

/// A conversion for one declared type, replacing the built-in one.
pub type CoerceFn =
    Arc<dyn Fn(&str, &ImportOptions) -> Result<TypedValue, CoercionError> + Send + Sync>;

/// Built-in conversion of raw cell text according to its declared type.
///
/// - TEXT / CONTAINER: unchanged, empty allowed
/// - NUMBER: decimal notation → `f64`
/// - DATE: `options.date_format`
/// - TIME: `options.time_format`, then the loose time reader
/// - TIMESTAMP: `"{date_format} {time_format}"`
///
/// Empty (or blank) NUMBER/DATE/TIME/TIMESTAMP text is `Null`, never zero or today.
pub fn coerce(
    raw: &str,
    ty: FieldType,
    options: &ImportOptions,
) -> Result<TypedValue, CoercionError> {
    match ty {
        FieldType::Text | FieldType::Container => Ok(TypedValue::Text(raw.to_string())),
        _ if raw.trim().is_empty() => Ok(TypedValue::Null),
        FieldType::Number => number::parse_number(raw)
            .map(TypedValue::Number)
            .ok_or_else(|| CoercionError::new(CoercionErrorKind::NumberFormat, raw)),
        FieldType::Date => date_parser::parse_date(raw, &options.date_format)
            .map(TypedValue::Date)
            .ok_or_else(|| CoercionError::new(CoercionErrorKind::DateFormat, raw)),
        FieldType::Time => time_parser::parse_time(raw, &options.time_format)
            .map(TypedValue::Time)
            .ok_or_else(|| CoercionError::new(CoercionErrorKind::TimeFormat, raw)),
        FieldType::Timestamp => {
            date_parser::parse_timestamp(raw, &options.date_format, &options.time_format)
                .map(TypedValue::Timestamp)
                .ok_or_else(|| CoercionError::new(CoercionErrorKind::TimestampFormat, raw))
        }
    }
}

/// Type coercion with per-type strategy overrides.
#[derive(Clone, Default)]
pub struct Coercer {
    options: ImportOptions,
    strategies: HashMap<FieldType, CoerceFn>,
}

impl fmt::Debug for Coercer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut overridden: Vec<_> = self.strategies.keys().map(FieldType::as_str).collect();
        overridden.sort_unstable();
        f.debug_struct("Coercer")
            .field("options", &self.options)
            .field("overridden", &overridden)
            .finish()
    }
}

impl Coercer {
    pub fn new(options: ImportOptions) -> Self {
        Self {
            options,
            strategies: HashMap::new(),
        }
    }

    /// Replace the conversion used for every column declared as `ty`.
    pub fn with_strategy<F>(mut self, ty: FieldType, f: F) -> Self
    where
        F: Fn(&str, &ImportOptions) -> Result<TypedValue, CoercionError> + Send + Sync + 'static,
    {
        self.strategies.insert(ty, Arc::new(f));
        self
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn coerce(&self, raw: &str, ty: FieldType) -> Result<TypedValue, CoercionError> {
        match self.strategies.get(&ty) {
            Some(f) => f(raw, &self.options),
            None => coerce(raw, ty, &self.options),
        }
    }

    fn coerce_or_mark(&self, raw: &str, def: &ColumnDef) -> TypedValue {
        self.coerce(raw, def.ty).unwrap_or_else(|e| {
            debug!(field = %def.name, error = %e, "cell kept as raw text");
            TypedValue::Invalid(e)
        })
    }

    /// Convert the `<DATA>` texts of one `<COL>`.
    ///
    /// Ordinary fields use the first `DATA` (none means empty text). Repeating
    /// fields yield one value per `DATA`, or `Null` if there are none.
    pub fn coerce_cell(&self, def: &ColumnDef, data: &[String]) -> TypedValue {
        if def.is_repeating() {
            if data.is_empty() {
                return TypedValue::Null;
            }
            return TypedValue::Repeated(
                data.iter().map(|d| self.coerce_or_mark(d, def)).collect(),
            );
        }
        let raw = data.first().map(String::as_str).unwrap_or("");
        self.coerce_or_mark(raw, def)
    }

    /// Convert a whole raw row at once; same rules as the streaming path.
    pub fn format_node(&self, schema: &Arc<ColumnSchema>, raw: &RawRow) -> Result<Record, RowError> {
        let mut record = Record::empty(Arc::clone(schema), raw.record_id, raw.mod_id);
        for cell in &raw.cells {
            let def = schema
                .get(cell.index)
                .ok_or(RowError::ColumnIndexOutOfRange {
                    record_id: raw.record_id,
                    index: cell.index,
                    columns: schema.len(),
                })?;
            record.set(cell.index, self.coerce_cell(def, &cell.data));
        }
        Ok(record)
    }

    /// Format a value back to text with the configured patterns.
    /// `None` for `Null` and repeated values.
    pub fn render(&self, value: &TypedValue) -> Option<String> {
        match value {
            TypedValue::Text(s) => Some(s.clone()),
            TypedValue::Number(n) => Some(n.to_string()),
            TypedValue::Date(d) => Some(d.format(&self.options.date_format).to_string()),
            TypedValue::Time(t) => Some(t.format(&self.options.time_format).to_string()),
            TypedValue::Timestamp(ts) => {
                Some(ts.format(&self.options.timestamp_format()).to_string())
            }
            TypedValue::Invalid(e) => Some(e.raw.clone()),
            TypedValue::Repeated(_) | TypedValue::Null => None,
        }
    }
}
