use super::{load_document, open_store, report};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use dui_workspace::{DslService, UiService};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Input .dui file
    pub input: PathBuf,

    #[arg(short, long)]
    pub surface: Option<String>,

    /// Recorded as the document author
    #[arg(long)]
    pub approved_by: Option<String>,

    /// Refuse the commit unless this is the current manifest revision
    #[arg(long)]
    pub expect_manifest: Option<u64>,

    /// Refuse the commit unless this is the current document revision
    #[arg(long)]
    pub expect_dsl: Option<u64>,
}

pub fn commit(args: CommitArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let surface = config.surface(args.surface.as_deref());
    let document = load_document(&args.input)?;

    let service = DslService::new(open_store(cwd, &config)?, config.service_options());
    let outcome = service
        .commit(
            &document,
            surface,
            args.approved_by.as_deref(),
            args.expect_manifest,
            args.expect_dsl,
        )
        .map_err(report)?;

    println!(
        "{} {} at manifest revision {} (document revision {})",
        "✓".green(),
        surface,
        outcome.manifest.revision,
        outcome.document.meta.revision
    );
    Ok(())
}

#[derive(Args, Debug)]
pub struct RevertArgs {
    /// Manifest revision to restore
    pub revision: u64,

    #[arg(short, long)]
    pub surface: Option<String>,

    #[arg(long)]
    pub approved_by: Option<String>,
}

pub fn revert(args: RevertArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let surface = config.surface(args.surface.as_deref());

    let service = UiService::new(open_store(cwd, &config)?, config.service_options());
    let outcome = service
        .revert(args.revision, surface, args.approved_by.as_deref())
        .map_err(report)?;

    println!(
        "{} {} reverted to revision {} as revision {}",
        "✓".green(),
        surface,
        args.revision,
        outcome.manifest.revision
    );
    Ok(())
}
