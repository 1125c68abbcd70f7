//! Ready-made row handlers.
pub mod json;
pub mod parquet;

pub use json::JsonLinesSink;
pub use self::parquet::ParquetSink;
