use anyhow::{Context, Result};
use fmpxml::{
    process::{FmpReader, ParseContext},
    schema::{ColumnDef, DocumentInfo},
    Coercer, ImportOptions,
};
use serde::Serialize;
use std::env;

/// What gets printed: the document header and its column declarations.
#[derive(Serialize)]
struct SchemaReport<'a> {
    document: &'a DocumentInfo,
    columns: Vec<&'a ColumnDef>,
}

/// Reads an export only as far as the end of METADATA and prints its schema as YAML.
fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <export.xml>", args[0]);
        std::process::exit(1);
    }
    let path = &args[1];

    let mut reader = FmpReader::from_file(path).with_context(|| format!("opening {}", path))?;
    let mut ctx = ParseContext::new(Coercer::new(ImportOptions::default()));
    while ctx.schema().is_none() {
        let event = reader
            .next_event()
            .with_context(|| format!("reading {} at byte {}", path, reader.position()))?
            .with_context(|| format!("{} ended before its METADATA section closed", path))?;
        ctx.feed(event)?;
    }

    let schema = ctx.schema().context("schema missing after METADATA")?;
    let report = SchemaReport {
        document: ctx.document(),
        columns: schema.iter().collect(),
    };
    print!("{}", serde_yaml::to_string(&report)?);
    Ok(())
}
