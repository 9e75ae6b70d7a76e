//! Evaluate command: run the full pipeline on one text.

use std::io::IsTerminal;
use std::time::Duration;

use anyhow::{Context, bail};
use camino::Utf8PathBuf;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use proofmark_core::{
    Category, Config, Diagnostic, EditKind, EvaluationResult, Evaluator, ResolutionPolicy,
};

/// Arguments for the `evaluate` subcommand.
#[derive(Args, Debug, Default)]
pub struct EvaluateArgs {
    /// File to evaluate (reads stdin when omitted or `-`).
    pub file: Option<Utf8PathBuf>,

    /// Fail when either sub-score is below this value (0-100).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub min_score: Option<u8>,

    /// How overlapping diagnostics are resolved.
    #[arg(long, value_enum)]
    pub resolution: Option<ResolutionPolicy>,
}

/// Evaluate a text and print the report.
#[instrument(name = "cmd_evaluate", skip_all, fields(file = ?args.file))]
pub async fn cmd_evaluate(
    args: EvaluateArgs,
    global_json: bool,
    show_progress: bool,
    config: &Config,
) -> anyhow::Result<()> {
    debug!(min_score = ?args.min_score, resolution = ?args.resolution, "executing evaluate command");

    let text = super::read_input(args.file.as_deref(), config.input_limit())?;

    let mut evaluator = Evaluator::from_config(config).context("failed to configure services")?;
    if let Some(policy) = args.resolution {
        evaluator = evaluator.with_policy(policy);
    }

    let spinner = (show_progress && std::io::stderr().is_terminal()).then(spinner);
    let result = evaluator.evaluate(&text).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let result = result.context("evaluation failed")?;

    if global_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let label = args
            .file
            .as_ref()
            .filter(|f| f.as_str() != "-")
            .map_or_else(|| "<stdin>".to_string(), ToString::to_string);
        print_report(&label, &result);
    }

    if let Some(min) = args.min_score.or(config.min_score)
        && !result.passes(min)
    {
        bail!(
            "score below minimum: grammar {}, spelling {} (min: {min})",
            result.score.grammar,
            result.score.spelling,
        );
    }

    Ok(())
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message("Waiting on services...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn print_report(label: &str, result: &EvaluationResult) {
    let score = &result.score;
    println!(
        "{}: grammar {}/100, spelling {}/100, band {}/4",
        label.bold(),
        colored_score(score.grammar),
        colored_score(score.spelling),
        score.band,
    );

    if result.reconciled_diagnostics.is_empty() {
        println!("  Issues: none detected");
    } else {
        println!("  Issues: {}", result.reconciled_diagnostics.len());
        for diag in &result.reconciled_diagnostics {
            print_diagnostic(&result.original, diag);
        }
    }

    let unlocated: Vec<&str> = result
        .grammar_diagnostics
        .iter()
        .chain(&result.mechanics_diagnostics)
        .filter(|d| d.span.is_none())
        .map(|d| d.message.as_str())
        .collect();
    if !unlocated.is_empty() {
        println!("  General: {}", unlocated.join(", "));
    }

    if !result.suggestions.is_empty() {
        println!("  Suggestions:");
        for op in &result.suggestions {
            let line = match op.kind {
                EditKind::Insert => format!("add \"{}\"", op.corrected_text),
                EditKind::Delete => format!("remove \"{}\"", op.original_text),
                _ => format!("\"{}\" -> \"{}\"", op.original_text, op.corrected_text),
            };
            println!("    {} {line}", op.original_span.to_string().dimmed());
        }
    }

    for note in &result.notes {
        println!(
            "  {} {} {}: {}",
            "note:".yellow(),
            note.source.as_str(),
            note.status.as_str(),
            note.message.dimmed()
        );
    }
}

fn print_diagnostic(text: &str, diag: &Diagnostic) {
    let tag = match diag.category {
        Category::Grammar => "GRAMMAR".red().to_string(),
        Category::Mechanics => "MECHANICS".yellow().to_string(),
        Category::Spelling => "SPELLING".magenta().to_string(),
        Category::Assistive => "EDIT".cyan().to_string(),
    };
    let excerpt = diag
        .span
        .and_then(|span| span.slice(text))
        .filter(|s| !s.is_empty())
        .map(|s| format!(" \"{s}\""))
        .unwrap_or_default();
    print!("    [{tag}]{excerpt} {}", diag.message);
    if diag.suggestion.is_empty() {
        println!();
    } else {
        println!(" ({})", diag.suggestion.green());
    }
}

fn colored_score(value: u8) -> String {
    match value {
        100 => value.green().to_string(),
        50..=99 => value.yellow().to_string(),
        _ => value.red().to_string(),
    }
}
