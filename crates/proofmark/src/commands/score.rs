//! Score command: the scoring table applied to explicit counts.

use clap::Args;
use owo_colors::OwoColorize;
use tracing::instrument;

use proofmark_core::score::{ErrorCounts, score};

/// Arguments for the `score` subcommand.
#[derive(Args, Debug, Default)]
pub struct ScoreArgs {
    /// Number of grammar diagnostics.
    #[arg(long, default_value_t = 0)]
    pub grammar: usize,

    /// Number of located mechanics diagnostics.
    #[arg(long, default_value_t = 0)]
    pub mechanics: usize,

    /// Number of distinct misspelled words.
    #[arg(long, default_value_t = 0)]
    pub spelling: usize,
}

/// Print the score for the given counts.
#[instrument(name = "cmd_score", skip_all)]
pub fn cmd_score(args: ScoreArgs, global_json: bool) -> anyhow::Result<()> {
    let counts = ErrorCounts {
        grammar: args.grammar,
        mechanics: args.mechanics,
        spelling: args.spelling,
    };
    let result = score(counts);

    if global_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}: {}/100", "Grammar".dimmed(), result.grammar);
    println!("{}: {}/100", "Spelling".dimmed(), result.spelling);
    println!("{}: {}/4", "Band".dimmed(), result.band);
    Ok(())
}
