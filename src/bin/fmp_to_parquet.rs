use anyhow::{Context, Result};
use fmpxml::{import_file, sink::ParquetSink, ImportOptions};
use std::{env, path::Path, time::Instant};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const BATCH_ROWS: usize = 10_000;

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 || args.len() > 4 {
        eprintln!(
            "Usage: {} <export.xml> <output.parquet> [options.yaml]",
            args[0]
        );
        std::process::exit(1);
    }
    let input = Path::new(&args[1]);
    let output = Path::new(&args[2]);
    let options = match args.get(3) {
        Some(p) => ImportOptions::from_yaml_file(p)?,
        None => ImportOptions::default(),
    };

    let start = Instant::now();
    let mut sink = ParquetSink::new(output, BATCH_ROWS);
    let summary = import_file(input, &mut sink, &options)
        .with_context(|| format!("importing {}", input.display()))?;
    let rows = sink.finish(&summary.schema)?;

    info!(
        input = %input.display(),
        output = %output.display(),
        rows,
        skipped = summary.rows_skipped,
        cell_errors = summary.cell_errors,
        elapsed = ?start.elapsed(),
        "converted"
    );
    Ok(())
}
