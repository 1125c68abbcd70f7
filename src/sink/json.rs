// src/sink/json.rs

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

use crate::handler::RowHandler;
use crate::record::Record;

#[derive(Serialize)]
struct Line<'a> {
    #[serde(rename = "_recordid", skip_serializing_if = "Option::is_none")]
    record_id: Option<u64>,
    #[serde(rename = "_modid", skip_serializing_if = "Option::is_none")]
    mod_id: Option<u64>,
    #[serde(flatten)]
    fields: &'a Record,
}

/// Writes every record as one JSON object per line, columns in declaration order.
pub struct JsonLinesSink<W: Write> {
    out: W,
    rows: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, rows: 0 }
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flush and hand back the writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.out.flush().context("flushing JSON output")?;
        Ok(self.out)
    }
}

impl<W: Write> RowHandler for JsonLinesSink<W> {
    fn import_node(&mut self, record: Record) -> Result<()> {
        let line = Line {
            record_id: record.record_id(),
            mod_id: record.mod_id(),
            fields: &record,
        };
        serde_json::to_writer(&mut self.out, &line)
            .with_context(|| format!("writing record {:?} as JSON", record.record_id()))?;
        self.out.write_all(b"\n")?;
        self.rows += 1;
        Ok(())
    }
}
