//! mdimage CLI
//!
//! Converts dropped image files into `![tag](data:image/...;base64,...)`
//! references that fit the configured size budget, prints them, and places
//! them on the system clipboard.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use mdimage_core::{convert_file, EncodeAttempt, EncodingParameters};

mod cli;

use cli::Args;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

/// Returns `Ok(false)` when at least one file failed to convert.
fn run(args: &Args) -> anyhow::Result<bool> {
    let settings = args.resolve_settings();

    if args.save_settings {
        let path = args
            .settings_path()
            .context("no settings location available; pass --config")?;
        settings
            .save_to(&path)
            .with_context(|| format!("failed to save settings to {}", path.display()))?;
        log::info!("Saved settings to {}", path.display());
    }

    let params = settings.to_params().context("invalid settings")?;
    log::debug!("Using {params:?}");

    let batch = convert_all(&args.inputs, &params, &args.tag);
    for markdown in &batch.converted {
        println!("{markdown}");
    }

    if !batch.converted.is_empty() && !args.no_clipboard {
        copy_to_clipboard(&batch.converted.join("\n")).context("failed to copy to clipboard")?;
        log::info!("Copied {} image reference(s) to the clipboard", batch.converted.len());
    }

    Ok(batch.failures == 0)
}

/// Outcome of converting a list of files.
#[derive(Debug, Default)]
struct Batch {
    /// Markdown references of the files that converted, in input order.
    converted: Vec<String>,
    failures: usize,
}

/// Convert each file independently; a failure is reported and skipped.
fn convert_all(inputs: &[PathBuf], params: &EncodingParameters, tag: &str) -> Batch {
    let mut batch = Batch::default();

    for path in inputs {
        log::info!("Processing {}", path.display());
        match convert_file(path, params, tag, |attempt| report_attempt(path, attempt)) {
            Ok(image) => {
                log::info!(
                    "{}: {}x{} image/{} ({:.1} KiB)",
                    path.display(),
                    image.result.width,
                    image.result.height,
                    image.result.mime_subtype(),
                    image.result.size_kib()
                );
                batch.converted.push(image.markdown);
            }
            Err(e) => {
                batch.failures += 1;
                eprintln!("{}: conversion failed: {e}", path.display());
            }
        }
    }

    batch
}

fn report_attempt(path: &Path, attempt: &EncodeAttempt) {
    if attempt.within_budget {
        log::debug!(
            "{}: attempt {} fits at {:.1} KiB",
            path.display(),
            attempt.index,
            attempt.size_kib()
        );
    } else {
        log::info!(
            "{}: compressing (attempt {}), current size {:.1} KiB",
            path.display(),
            attempt.index,
            attempt.size_kib()
        );
    }
}

fn copy_to_clipboard(text: &str) -> Result<(), arboard::Error> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text)
}
