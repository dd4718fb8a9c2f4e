mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    commit, compile, history, parse, patch, revert, show, validate, CommitArgs, CompileArgs,
    HistoryArgs, ParseArgs, PatchArgs, RevertArgs, ShowArgs, ValidateArgs,
};
use tracing_subscriber::EnvFilter;

/// dui - declarative UI surfaces: parse, validate, compile and evolve them
#[derive(Parser, Debug)]
#[command(name = "dui")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a .dui file and print it canonically
    Parse(ParseArgs),

    /// Validate a .dui file
    Validate(ValidateArgs),

    /// Compile a .dui file to a manifest
    Compile(CompileArgs),

    /// Show the current revision of a surface
    Show(ShowArgs),

    /// List the manifest revisions of a surface
    History(HistoryArgs),

    /// Commit a .dui file as the next revision of a surface
    Commit(CommitArgs),

    /// Propose (and optionally commit) a patch plan
    Patch(PatchArgs),

    /// Re-issue an earlier revision as the next one
    Revert(RevertArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Parse(args) => parse(args, &cwd),
        Command::Validate(args) => validate(args, &cwd),
        Command::Compile(args) => compile(args, &cwd),
        Command::Show(args) => show(args, &cwd),
        Command::History(args) => history(args, &cwd),
        Command::Commit(args) => commit(args, &cwd),
        Command::Patch(args) => patch(args, &cwd),
        Command::Revert(args) => revert(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
