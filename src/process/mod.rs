// src/process/mod.rs
pub mod dispatch;
pub mod events;
pub mod reader;
pub mod row_builder;

use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::coerce::Coercer;
use crate::error::ImportError;
use crate::schema::{ColumnSchema, DatabaseInfo, DocumentInfo, ProductInfo, SchemaCollector};
use events::{attr, Element, FmpEvent};
use row_builder::{RowBuilder, RowOutcome};

pub use dispatch::RowDispatcher;
pub use reader::FmpReader;
pub use row_builder::RowState;

/// Which part of the document the parser is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Before METADATA: ERRORCODE, PRODUCT, DATABASE.
    Prolog,
    /// Inside METADATA, collecting FIELDs.
    Metadata,
    /// Schema frozen; rows are being read.
    Data,
    /// The root element has closed.
    Done,
}

/// All state of one parse: nesting depth, section, the schema once known and the
/// row being built. Fed one event at a time; owns nothing shared.
#[derive(Debug)]
pub struct ParseContext {
    depth: usize,
    section: Section,
    collector: Option<SchemaCollector>,
    schema: Option<Arc<ColumnSchema>>,
    rows: Option<RowBuilder>,
    coercer: Coercer,
    document: DocumentInfo,
    /// ERRORCODE text while that element is open.
    error_code_text: Option<String>,
}

impl ParseContext {
    pub fn new(coercer: Coercer) -> Self {
        Self {
            depth: 0,
            section: Section::Prolog,
            collector: None,
            schema: None,
            rows: None,
            coercer,
            document: DocumentInfo::default(),
            error_code_text: None,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn section(&self) -> Section {
        self.section
    }

    /// The frozen schema, once the METADATA section has closed.
    pub fn schema(&self) -> Option<&Arc<ColumnSchema>> {
        self.schema.as_ref()
    }

    pub fn document(&self) -> &DocumentInfo {
        &self.document
    }

    pub fn into_document(self) -> DocumentInfo {
        self.document
    }

    pub fn row_state(&self) -> RowState {
        self.rows
            .as_ref()
            .map_or(RowState::AwaitingRow, RowBuilder::state)
    }

    /// Schema columns plus cells of the open row: the parser's whole live footprint.
    pub fn footprint(&self) -> usize {
        self.schema.as_ref().map_or(0, |s| s.len())
            + self.rows.as_ref().map_or(0, RowBuilder::footprint)
    }

    /// Advance the state machine by one event. A closing `</ROW>` yields its outcome.
    pub fn feed(&mut self, event: FmpEvent) -> Result<Option<RowOutcome>, ImportError> {
        match event {
            FmpEvent::Start { name, attrs } => {
                self.depth += 1;
                self.on_start(&name, &attrs)?;
                Ok(None)
            }
            FmpEvent::Text(text) => {
                if let Some(buf) = self.error_code_text.as_mut() {
                    buf.push_str(&text);
                } else if let Some(rows) = self.rows.as_mut() {
                    rows.text(&text);
                }
                Ok(None)
            }
            FmpEvent::End { name } => {
                self.depth = self.depth.saturating_sub(1);
                self.on_end(&name)
            }
        }
    }

    fn on_start(&mut self, name: &str, attrs: &[(String, String)]) -> Result<(), ImportError> {
        let Some(element) = Element::from_name(name) else {
            trace!(element = %name, "ignoring unknown element");
            return Ok(());
        };
        match element {
            Element::FmpXmlResult => {}
            Element::ErrorCode => self.error_code_text = Some(String::new()),
            Element::Product => {
                self.document.product = Some(ProductInfo {
                    name: attr(attrs, "NAME").map(str::to_owned),
                    version: attr(attrs, "VERSION").map(str::to_owned),
                    build: attr(attrs, "BUILD").map(str::to_owned),
                });
            }
            Element::Database => {
                self.document.database = Some(DatabaseInfo {
                    name: attr(attrs, "NAME").map(str::to_owned),
                    layout: attr(attrs, "LAYOUT").map(str::to_owned),
                    records: attr(attrs, "RECORDS").and_then(|s| s.trim().parse().ok()),
                    date_format: attr(attrs, "DATEFORMAT").map(str::to_owned),
                    time_format: attr(attrs, "TIMEFORMAT").map(str::to_owned),
                });
            }
            Element::Metadata => {
                if self.schema.is_some() {
                    return Err(ImportError::MalformedSchema(
                        "second METADATA section".into(),
                    ));
                }
                self.section = Section::Metadata;
                self.collector = Some(SchemaCollector::new());
            }
            Element::Field => match self.collector.as_mut() {
                Some(c) if self.section == Section::Metadata => c.add_field(attrs)?,
                _ => warn!("FIELD outside METADATA, ignoring"),
            },
            Element::ResultSet => {
                self.document.found = attr(attrs, "FOUND").and_then(|s| s.trim().parse().ok());
                debug!(found = ?self.document.found, "result set opened");
            }
            Element::Row => {
                let Some(rows) = self.rows.as_mut() else {
                    return Err(ImportError::MalformedSchema(
                        "ROW before the METADATA section closed".into(),
                    ));
                };
                let record_id = attr(attrs, "RECORDID").and_then(|s| s.trim().parse().ok());
                let mod_id = attr(attrs, "MODID").and_then(|s| s.trim().parse().ok());
                rows.start_row(record_id, mod_id);
            }
            Element::Col => {
                if let Some(rows) = self.rows.as_mut() {
                    rows.start_cell();
                }
            }
            Element::Data => {
                if let Some(rows) = self.rows.as_mut() {
                    rows.start_data();
                }
            }
        }
        Ok(())
    }

    fn on_end(&mut self, name: &str) -> Result<Option<RowOutcome>, ImportError> {
        let Some(element) = Element::from_name(name) else {
            return Ok(None);
        };
        match element {
            Element::ErrorCode => {
                let text = self.error_code_text.take().unwrap_or_default();
                let code = text.trim().parse::<i64>().ok();
                if code.is_none() {
                    warn!(text = %text.trim(), "unreadable ERRORCODE");
                }
                if let Some(c) = code.filter(|c| *c != 0) {
                    warn!(code = c, "document reports a FileMaker export error");
                }
                self.document.error_code = code;
            }
            Element::Metadata => {
                let collector = self.collector.take().unwrap_or_default();
                let schema = Arc::new(collector.finish()?);
                self.rows = Some(RowBuilder::new(Arc::clone(&schema)));
                self.schema = Some(schema);
                self.section = Section::Data;
            }
            Element::Data => {
                if let Some(rows) = self.rows.as_mut() {
                    rows.end_data();
                }
            }
            Element::Col => {
                if let Some(rows) = self.rows.as_mut() {
                    rows.end_cell(&self.coercer);
                }
            }
            Element::Row => {
                return Ok(self.rows.as_mut().and_then(RowBuilder::end_row));
            }
            Element::FmpXmlResult => self.section = Section::Done,
            Element::Product | Element::Database | Element::Field | Element::ResultSet => {}
        }
        Ok(None)
    }
}
