// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema, TimeUnit};
use std::sync::Arc;

use super::types::{ColumnDef, ColumnSchema, FieldType};

/// Map a FileMaker column into an Arrow DataType.
///
/// - TEXT, CONTAINER → Utf8
/// - NUMBER          → Float64
/// - DATE            → Date32
/// - TIME            → Time64(µs)
/// - TIMESTAMP       → Timestamp(µs), no zone (FileMaker exports local time)
/// - repeating field → Utf8 (JSON array of the repetitions)
pub fn map_to_arrow_type(col: &ColumnDef) -> DataType {
    if col.is_repeating() {
        return DataType::Utf8;
    }
    match col.ty {
        FieldType::Text | FieldType::Container => DataType::Utf8,
        FieldType::Number => DataType::Float64,
        FieldType::Date => DataType::Date32,
        FieldType::Time => DataType::Time64(TimeUnit::Microsecond),
        FieldType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
    }
}

/// Build an ArrowSchema (inside an Arc) from a FileMaker column schema.
/// Every field is nullable: empty and failed cells are written as nulls.
pub fn build_arrow_schema(schema: &ColumnSchema) -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = schema
        .iter()
        .map(|col| ArrowField::new(&col.name, map_to_arrow_type(col), /* nullable = */ true))
        .collect();

    Arc::new(ArrowSchema::new(fields))
}

/// Suffix of the text column kept beside each typed column.
pub const RAW_SUFFIX: &str = "__raw";

/// Name of the raw-text companion of `col`, or `None` if `col` is already Utf8.
pub fn raw_column_name(col: &ColumnDef) -> Option<String> {
    match map_to_arrow_type(col) {
        DataType::Utf8 => None,
        _ => Some(format!("{}{}", col.name, RAW_SUFFIX)),
    }
}

/// Like [`build_arrow_schema`], but every non-text column is followed by a
/// nullable Utf8 column holding the original text of cells that failed coercion.
pub fn build_arrow_schema_with_raw(schema: &ColumnSchema) -> Arc<ArrowSchema> {
    let mut fields = Vec::with_capacity(schema.len() * 2);
    for col in schema {
        fields.push(ArrowField::new(&col.name, map_to_arrow_type(col), true));
        if let Some(raw) = raw_column_name(col) {
            fields.push(ArrowField::new(raw, DataType::Utf8, true));
        }
    }
    Arc::new(ArrowSchema::new(fields))
}
