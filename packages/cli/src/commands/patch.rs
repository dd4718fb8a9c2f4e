use super::{open_store, report};
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use dui_editor::{Mode, PatchOperation};
use dui_workspace::{PatchProducer, PlanRequest, ProvidedOperations, RuleBasedPatchProducer, UiService};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct PatchArgs {
    /// JSON file holding an array of patch operations
    #[arg(required_unless_present = "prompt", conflicts_with = "prompt")]
    pub operations: Option<PathBuf>,

    /// Derive operations from a short instruction instead, e.g. "minimal, hide sidebar"
    #[arg(short, long)]
    pub prompt: Option<String>,

    #[arg(short, long)]
    pub surface: Option<String>,

    /// Overrides the configured mode
    #[arg(short, long)]
    pub mode: Option<Mode>,

    /// Commit the plan right away when policy accepts it
    #[arg(long)]
    pub commit: bool,
}

pub fn patch(args: PatchArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let surface = config.surface(args.surface.as_deref()).to_string();
    let mode = args.mode.unwrap_or(config.mode);

    let (prompt, producer): (String, Box<dyn PatchProducer>) = match (&args.operations, &args.prompt) {
        (Some(path), _) => {
            let content = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
            let operations: Vec<PatchOperation> =
                serde_json::from_str(&content).with_context(|| format!("Invalid operations in {}", path.display()))?;
            (
                path.display().to_string(),
                Box::new(ProvidedOperations(operations)) as Box<dyn PatchProducer>,
            )
        }
        (None, Some(prompt)) => (
            prompt.clone(),
            Box::new(RuleBasedPatchProducer) as Box<dyn PatchProducer>,
        ),
        (None, None) => anyhow::bail!("either an operations file or --prompt is required"),
    };

    let service = UiService::new(open_store(cwd, &config)?, config.service_options());
    let proposal = service
        .propose(PlanRequest::new(prompt, surface.clone()).with_mode(mode), producer.as_ref())
        .map_err(report)?;

    println!(
        "{} patch plan {} ({} operation(s), mode {})",
        "✓".green(),
        proposal.plan.patch_plan_id.bold(),
        proposal.plan.operations.len(),
        mode
    );
    for operation in &proposal.plan.operations {
        println!("   {}", operation.kind());
    }
    for warning in &proposal.warnings {
        println!("   {} {}", "warning".yellow().bold(), warning);
    }

    if args.commit {
        let outcome = service
            .commit(&proposal.plan.patch_plan_id, &surface, None, None)
            .map_err(report)?;
        println!(
            "{} committed {} at revision {}",
            "✓".green(),
            surface,
            outcome.manifest.revision
        );
    } else {
        println!(
            "   preview: {} widgets, {} sections",
            proposal.preview.widgets.len(),
            proposal.preview.sections.len()
        );
    }
    Ok(())
}
