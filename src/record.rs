// src/record.rs

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::ser::{SerializeMap, SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};
use std::sync::Arc;

use crate::error::CoercionError;
use crate::schema::ColumnSchema;

/// A cell value after coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    /// One value per `<DATA>` of a repeating field.
    Repeated(Vec<TypedValue>),
    /// Empty NUMBER/DATE/TIME cell, or a column the row never supplied.
    Null,
    /// Coercion failed; the raw text is kept in the error.
    Invalid(CoercionError),
}

impl TypedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            TypedValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            TypedValue::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            TypedValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&CoercionError> {
        match self {
            TypedValue::Invalid(e) => Some(e),
            _ => None,
        }
    }

    /// Number of failure markers in this value, repetitions included.
    pub fn error_count(&self) -> usize {
        match self {
            TypedValue::Invalid(_) => 1,
            TypedValue::Repeated(vs) => vs.iter().map(TypedValue::error_count).sum(),
            _ => 0,
        }
    }
}

impl Serialize for TypedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TypedValue::Text(s) => serializer.serialize_str(s),
            TypedValue::Number(n) => serializer.serialize_f64(*n),
            TypedValue::Date(d) => d.serialize(serializer),
            TypedValue::Time(t) => t.serialize(serializer),
            TypedValue::Timestamp(t) => t.serialize(serializer),
            TypedValue::Repeated(vs) => {
                let mut seq = serializer.serialize_seq(Some(vs.len()))?;
                for v in vs {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            TypedValue::Null => serializer.serialize_none(),
            TypedValue::Invalid(e) => {
                let mut st = serializer.serialize_struct("Invalid", 2)?;
                st.serialize_field("error", &e.kind)?;
                st.serialize_field("raw", &e.raw)?;
                st.end()
            }
        }
    }
}

/// One converted row: exactly one value per declared column, in column order.
///
/// Keys are never absent; a column the row did not supply holds [`TypedValue::Null`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Arc<ColumnSchema>,
    record_id: Option<u64>,
    mod_id: Option<u64>,
    values: Vec<TypedValue>,
}

impl Record {
    /// A record with every column set to `Null`.
    pub fn empty(schema: Arc<ColumnSchema>, record_id: Option<u64>, mod_id: Option<u64>) -> Self {
        let values = vec![TypedValue::Null; schema.len()];
        Self {
            schema,
            record_id,
            mod_id,
            values,
        }
    }

    pub(crate) fn set(&mut self, index: usize, value: TypedValue) {
        self.values[index] = value;
    }

    pub fn schema(&self) -> &Arc<ColumnSchema> {
        &self.schema
    }

    /// `ROW RECORDID`
    pub fn record_id(&self) -> Option<u64> {
        self.record_id
    }

    /// `ROW MODID`
    pub fn mod_id(&self) -> Option<u64> {
        self.mod_id
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.schema.position(name).map(|i| &self.values[i])
    }

    /// Value of the `index`-th declared column.
    pub fn value_at(&self, index: usize) -> Option<&TypedValue> {
        self.values.get(index)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.schema.names()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.schema.names().zip(self.values.iter())
    }

    /// Cells that failed coercion, with their column names.
    pub fn errors(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.iter().filter(|(_, v)| v.error_count() > 0)
    }

    pub fn error_count(&self) -> usize {
        self.values.iter().map(TypedValue::error_count).sum()
    }

    pub fn into_values(self) -> Vec<TypedValue> {
        self.values
    }
}

/// Serialises as a map `{column name: value}` in column order.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// The literal `<DATA>` texts of one `<COL>`, with its position in the row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawCell {
    pub index: usize,
    pub data: Vec<String>,
}

impl RawCell {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            data: vec![text.into()],
        }
    }
}

/// An unconverted row, as handed to `Coercer::format_node`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRow {
    pub record_id: Option<u64>,
    pub mod_id: Option<u64>,
    pub cells: Vec<RawCell>,
}

impl RawRow {
    /// Convenience for single-valued rows: cell `i` gets `texts[i]`.
    pub fn from_texts<I, S>(record_id: Option<u64>, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cells = texts
            .into_iter()
            .enumerate()
            .map(|(i, t)| RawCell::new(i, t))
            .collect();
        Self {
            record_id,
            mod_id: None,
            cells,
        }
    }
}
