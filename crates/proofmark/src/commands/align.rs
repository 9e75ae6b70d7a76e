//! Align command: token-level edits between two files.

use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use proofmark_core::align::edits;
use proofmark_core::promote::promote_punctuation;
use proofmark_core::{AlignmentOp, Diagnostic, EditKind};

/// Arguments for the `align` subcommand.
#[derive(Args, Debug)]
pub struct AlignArgs {
    /// The original text.
    pub original: Utf8PathBuf,

    /// The corrected text.
    pub corrected: Utf8PathBuf,
}

#[derive(Serialize)]
struct AlignReport {
    edits: Vec<AlignmentOp>,
    punctuation: Vec<Diagnostic>,
}

/// Print the edits that turn `original` into `corrected`.
#[instrument(name = "cmd_align", skip_all, fields(original = %args.original, corrected = %args.corrected))]
pub fn cmd_align(
    args: AlignArgs,
    global_json: bool,
    max_input: Option<usize>,
) -> anyhow::Result<()> {
    let original = super::read_input_file(&args.original, max_input)?;
    let corrected = super::read_input_file(&args.corrected, max_input)?;
    let original = original.trim();
    let corrected = corrected.trim();

    let ops = edits(original, corrected);
    let promotion = promote_punctuation(&ops, &[]);
    debug!(
        edits = ops.len(),
        punctuation = promotion.diagnostics.len(),
        "alignment complete"
    );

    if global_json {
        let report = AlignReport {
            edits: ops,
            punctuation: promotion.diagnostics,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if ops.is_empty() {
        println!("{}: no differences", args.original);
        return Ok(());
    }

    println!("{}: {} edits", args.original, ops.len());
    for (index, op) in ops.iter().enumerate() {
        let kind = match op.kind {
            EditKind::Insert => "insert".green().to_string(),
            EditKind::Delete => "delete".red().to_string(),
            EditKind::Replace => "replace".yellow().to_string(),
            EditKind::Equal => "equal".dimmed().to_string(),
        };
        let marker = if promotion.is_absorbed(index) {
            format!(" {}", "(punctuation)".dimmed())
        } else {
            String::new()
        };
        println!(
            "  {:>8} [{kind}] \"{}\" -> \"{}\"{marker}",
            op.original_span.to_string(),
            op.original_text,
            op.corrected_text,
        );
    }

    Ok(())
}
