use super::open_store;
use crate::config::Config;
use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use dui_parser::serialize;
use std::path::Path;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShowFormat {
    /// Current document as dui-lang source
    #[default]
    Dsl,
    /// Current manifest as JSON
    Json,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    #[arg(short, long)]
    pub surface: Option<String>,

    #[arg(short, long, value_enum, default_value_t = ShowFormat::Dsl)]
    pub format: ShowFormat,
}

pub fn show(args: ShowArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let surface = config.surface(args.surface.as_deref());
    let store = open_store(cwd, &config)?;
    let mut store = store.lock().map_err(|_| anyhow::anyhow!("store lock poisoned"))?;

    match args.format {
        ShowFormat::Dsl => print!("{}", serialize(&store.current_document(surface)?)),
        ShowFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&store.current_manifest(surface)?)?
        ),
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    #[arg(short, long)]
    pub surface: Option<String>,
}

pub fn history(args: HistoryArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let surface = config.surface(args.surface.as_deref());
    let store = open_store(cwd, &config)?;
    let mut store = store.lock().map_err(|_| anyhow::anyhow!("store lock poisoned"))?;

    println!("{} {}", "Surface".bold(), surface);
    for manifest in store.list_revisions(surface)? {
        let source = manifest
            .metadata
            .get("write_source")
            .map(String::as_str)
            .unwrap_or("seed");
        println!(
            "  {:>4}  {}  {:<10}  {}/{}  {} widgets  {}",
            manifest.revision.to_string().bold(),
            manifest.created_at.format("%Y-%m-%d %H:%M:%S"),
            source,
            manifest.theme.profile,
            manifest.theme.density,
            manifest.widgets.len(),
            manifest.manifest_id.dimmed()
        );
    }
    Ok(())
}
