pub mod arrow;
pub mod collector;
pub mod types;

pub use self::arrow::{
    build_arrow_schema, build_arrow_schema_with_raw, map_to_arrow_type, raw_column_name,
};
pub use collector::SchemaCollector;
pub use types::{
    ColumnDef, ColumnSchema, DatabaseInfo, DocumentInfo, FieldType, ProductInfo, UnknownFieldType,
};
