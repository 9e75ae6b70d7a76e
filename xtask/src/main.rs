//! Build helpers: man pages and shell completions for `proofmark`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "xtask", about = "proofmark build helpers")]
struct Xtask {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Generate man pages
    Man {
        /// Output directory
        #[arg(long, default_value = "target/man")]
        out: PathBuf,
    },
    /// Generate shell completion scripts
    Completions {
        /// Output directory
        #[arg(long, default_value = "target/completions")]
        out: PathBuf,
    },
}

fn main() -> io::Result<()> {
    match Xtask::parse().command {
        Task::Man { out } => man(&out),
        Task::Completions { out } => completions(&out),
    }
}

/// One page for the root command and one per subcommand.
fn man(out: &Path) -> io::Result<()> {
    fs::create_dir_all(out)?;
    let cmd = proofmark::command();
    let name = cmd.get_name().to_string();

    render_page(&cmd, &out.join(format!("{name}.1")))?;
    for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
        let sub = sub.clone().name(format!("{name}-{}", sub.get_name()));
        render_page(&sub, &out.join(format!("{}.1", sub.get_name())))?;
    }
    println!("man pages written to {}", out.display());
    Ok(())
}

fn render_page(cmd: &clap::Command, path: &Path) -> io::Result<()> {
    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd.clone()).render(&mut buffer)?;
    fs::write(path, buffer)
}

fn completions(out: &Path) -> io::Result<()> {
    fs::create_dir_all(out)?;
    let mut cmd = proofmark::command();
    for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell, Shell::Elvish] {
        let path = clap_complete::generate_to(shell, &mut cmd, "proofmark", out)?;
        println!("{}", path.display());
    }
    Ok(())
}
