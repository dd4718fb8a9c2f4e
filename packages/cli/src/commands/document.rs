use super::{load_document, print_issues};
use crate::config::Config;
use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use dui_compiler::compile_checked;
use dui_parser::serialize;
use dui_validator::validate_document;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Input .dui file
    pub input: PathBuf,

    /// Print the document as JSON instead of canonical source
    #[arg(long)]
    pub json: bool,
}

pub fn parse(args: ParseArgs, _cwd: &Path) -> Result<()> {
    let document = load_document(&args.input)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        print!("{}", serialize(&document));
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Input .dui file
    pub input: PathBuf,
}

pub fn validate(args: ValidateArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let document = load_document(&args.input)?;
    let result = validate_document(&document, &config.limits);

    println!("{}", args.input.display());
    print_issues(result.issues());
    println!(
        "   {} nodes, {} actions, {} bindings",
        result.stats.node_count, result.stats.action_count, result.stats.binding_count
    );

    if !result.valid {
        bail!("{} validation error(s)", result.errors.len());
    }
    println!("{} {}", "✓".green(), "valid".green().bold());
    Ok(())
}

#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Input .dui file
    pub input: PathBuf,

    /// Revision stamped on the manifest
    #[arg(short, long, default_value_t = 1)]
    pub revision: u64,
}

pub fn compile(args: CompileArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let document = load_document(&args.input)?;
    match compile_checked(&document, args.revision, None, &config.limits) {
        Ok(manifest) => {
            println!("{}", serde_json::to_string_pretty(&manifest)?);
            Ok(())
        }
        Err(err) => {
            let dui_compiler::CompileError::Invalid { errors } = &err;
            print_issues(errors);
            Err(err.into())
        }
    }
}
