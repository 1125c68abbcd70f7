// src/schema/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use std::str::FromStr;
use thiserror::Error;

/// Declared FileMaker field type, from `<FIELD TYPE="...">`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Time,
    Timestamp,
    Container,
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::Number => "NUMBER",
            FieldType::Date => "DATE",
            FieldType::Time => "TIME",
            FieldType::Timestamp => "TIMESTAMP",
            FieldType::Container => "CONTAINER",
        }
    }
}

/// A `TYPE` attribute outside the FileMaker vocabulary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown field type {0:?}")]
pub struct UnknownFieldType(pub String);

impl FromStr for FieldType {
    type Err = UnknownFieldType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TEXT" => Ok(FieldType::Text),
            "NUMBER" => Ok(FieldType::Number),
            "DATE" => Ok(FieldType::Date),
            "TIME" => Ok(FieldType::Time),
            "TIMESTAMP" => Ok(FieldType::Timestamp),
            "CONTAINER" => Ok(FieldType::Container),
            _ => Err(UnknownFieldType(s.to_string())),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single column definition as declared by a `<FIELD>` element.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq, Hash)]
pub struct ColumnDef {
    pub name: String,
    pub ty: FieldType,
    /// `EMPTYOK="YES"`
    pub empty_ok: bool,
    /// `MAXREPEAT`, 1 for ordinary fields.
    pub max_repeat: u32,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            empty_ok: true,
            max_repeat: 1,
        }
    }

    pub fn is_repeating(&self) -> bool {
        self.max_repeat > 1
    }
}

/// Ordered column definitions. Position `i` binds to the `i`-th `<COL>` of every row.
///
/// Only [`SchemaCollector`](super::SchemaCollector) builds one from a document, and it
/// is shared read-only (behind an `Arc`) once the METADATA section has closed.
#[derive(Debug, Serialize, PartialEq, Clone, Default)]
#[serde(transparent)]
pub struct ColumnSchema {
    columns: Vec<ColumnDef>,
}

impl ColumnSchema {
    /// Build a schema directly, rejecting duplicate names.
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self, String> {
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(format!("duplicate column name `{}`", col.name));
            }
        }
        Ok(Self { columns })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ColumnDef> {
        self.columns.get(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnDef> {
        self.columns.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

impl Index<usize> for ColumnSchema {
    type Output = ColumnDef;

    fn index(&self, index: usize) -> &ColumnDef {
        &self.columns[index]
    }
}

impl<'a> IntoIterator for &'a ColumnSchema {
    type Item = &'a ColumnDef;
    type IntoIter = std::slice::Iter<'a, ColumnDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

/// `<PRODUCT>` attributes.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct ProductInfo {
    pub name: Option<String>,
    pub version: Option<String>,
    pub build: Option<String>,
}

/// `<DATABASE>` attributes. The formats are FileMaker patterns (`M/d/yyyy`),
/// reported as-is; coercion uses the chrono patterns in `ImportOptions`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct DatabaseInfo {
    pub name: Option<String>,
    pub layout: Option<String>,
    pub records: Option<u64>,
    pub date_format: Option<String>,
    pub time_format: Option<String>,
}

/// Everything the document says about itself besides the columns.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct DocumentInfo {
    pub error_code: Option<i64>,
    pub product: Option<ProductInfo>,
    pub database: Option<DatabaseInfo>,
    /// RESULTSET `FOUND`, the number of rows FileMaker says it exported.
    pub found: Option<u64>,
}
