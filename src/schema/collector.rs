// src/schema/collector.rs

use tracing::{debug, trace, warn};

use super::types::{ColumnDef, ColumnSchema, FieldType};
use crate::error::ImportError;
use crate::process::events::attr;

/// Accumulates `<FIELD>` declarations while the METADATA section is open.
#[derive(Debug, Default)]
pub struct SchemaCollector {
    columns: Vec<ColumnDef>,
}

impl SchemaCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fields declared so far.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Append one column from a `<FIELD>` start event's attributes.
    ///
    /// `NAME` and `TYPE` are required. `EMPTYOK` defaults to yes and `MAXREPEAT` to 1.
    pub fn add_field(&mut self, attrs: &[(String, String)]) -> Result<(), ImportError> {
        let index = self.columns.len();
        let name = attr(attrs, "NAME").ok_or_else(|| {
            ImportError::MalformedSchema(format!("FIELD #{} has no NAME attribute", index))
        })?;
        let raw_ty = attr(attrs, "TYPE").ok_or_else(|| {
            ImportError::MalformedSchema(format!("FIELD `{}` has no TYPE attribute", name))
        })?;

        let ty = raw_ty.parse::<FieldType>().unwrap_or_else(|e| {
            warn!(field = %name, error = %e, "reading as TEXT");
            FieldType::Text
        });

        let max_repeat = match attr(attrs, "MAXREPEAT") {
            None => 1,
            Some(s) => s.trim().parse::<u32>().map_err(|_| {
                ImportError::MalformedSchema(format!(
                    "FIELD `{}` has a non-numeric MAXREPEAT {:?}",
                    name, s
                ))
            })?,
        };
        let empty_ok = attr(attrs, "EMPTYOK")
            .map(|s| s.eq_ignore_ascii_case("YES"))
            .unwrap_or(true);

        trace!(index, name = %name, ty = %ty, max_repeat, "Parsed field");
        self.columns.push(ColumnDef {
            name: name.to_string(),
            ty,
            empty_ok,
            max_repeat: max_repeat.max(1),
        });
        Ok(())
    }

    /// Freeze the collected columns into the schema rows are bound against.
    pub fn finish(self) -> Result<ColumnSchema, ImportError> {
        if self.columns.is_empty() {
            return Err(ImportError::MalformedSchema(
                "METADATA declares no fields".into(),
            ));
        }
        let schema = ColumnSchema::new(self.columns).map_err(ImportError::MalformedSchema)?;
        debug!(columns = schema.len(), "schema frozen");
        Ok(schema)
    }
}
