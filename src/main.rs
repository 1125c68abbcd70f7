use anyhow::{bail, Context, Result};
use fmpxml::{import_file, sink::JsonLinesSink, ImportOptions, ImportStatus};
use glob::glob;
use std::{
    env,
    io::{self, BufWriter},
    path::PathBuf,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging (stderr; stdout carries the records) ─────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    // ─── 2) arguments ────────────────────────────────────────────────
    let mut patterns = Vec::new();
    let mut options_path: Option<PathBuf> = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--options" {
            options_path = Some(args.next().context("--options needs a file")?.into());
        } else {
            patterns.push(arg);
        }
    }
    if patterns.is_empty() {
        eprintln!("Usage: fmpxml <export.xml | 'dir/*.xml'>... [--options options.yaml]");
        std::process::exit(2);
    }

    let options = match &options_path {
        Some(p) => ImportOptions::from_yaml_file(p)?,
        None => ImportOptions::default(),
    };
    info!(date_format = %options.date_format, time_format = %options.time_format, "options");

    // ─── 3) expand globs ─────────────────────────────────────────────
    let mut files: Vec<PathBuf> = Vec::new();
    for pattern in &patterns {
        let matched: Vec<PathBuf> = glob(pattern)
            .with_context(|| format!("invalid glob pattern {:?}", pattern))?
            .filter_map(Result::ok)
            .collect();
        if matched.is_empty() {
            warn!(pattern = %pattern, "no files matched");
        }
        files.extend(matched);
    }

    // ─── 4) stream every file to stdout as JSON lines ────────────────
    let stdout = io::stdout();
    let mut sink = JsonLinesSink::new(BufWriter::new(stdout.lock()));
    let mut failed = 0;

    for path in &files {
        match import_file(path, &mut sink, &options) {
            Ok(summary) => match summary.status {
                ImportStatus::Clean => {
                    info!(file = %path.display(), rows = summary.rows_dispatched, "clean import")
                }
                ImportStatus::CompletedWithErrors {
                    cell_errors,
                    rows_skipped,
                } => warn!(
                    file = %path.display(),
                    rows = summary.rows_dispatched,
                    cell_errors,
                    rows_skipped,
                    "import completed with errors"
                ),
            },
            Err(e) => {
                error!(file = %path.display(), "import failed: {}", e);
                failed += 1;
            }
        }
    }
    sink.into_inner()?;

    if failed > 0 {
        bail!("{} of {} file(s) failed", failed, files.len());
    }
    info!("all done");
    Ok(())
}
