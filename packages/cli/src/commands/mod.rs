pub mod commit;
pub mod document;
pub mod history;
pub mod patch;

pub use commit::{commit, revert, CommitArgs, RevertArgs};
pub use document::{compile, parse, validate, CompileArgs, ParseArgs, ValidateArgs};
pub use history::{history, show, HistoryArgs, ShowArgs};
pub use patch::{patch, PatchArgs};

use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use dui_parser::{format_error, Document};
use dui_validator::{Issue, Severity};
use dui_workspace::{shared, RevisionStore, ServiceError, SharedStore};
use std::fs;
use std::path::Path;

/// Read and parse a dui-lang file, printing a source excerpt on parse errors.
pub(crate) fn load_document(path: &Path) -> Result<Document> {
    let source = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    dui_parser::parse(&source).map_err(|err| {
        eprintln!("{}", format_error(&source, &path.to_string_lossy(), &err));
        anyhow!("Failed to parse {}", path.display())
    })
}

pub(crate) fn open_store(cwd: &Path, config: &Config) -> Result<SharedStore> {
    let path = config.state_path(cwd);
    let store = RevisionStore::open(&path).with_context(|| format!("Cannot open store {}", path.display()))?;
    Ok(shared(store))
}

pub(crate) fn print_issues<'a>(issues: impl IntoIterator<Item = &'a Issue>) {
    for issue in issues {
        let level = match issue.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
        };
        println!("  {} [{}] {} {}", level, issue.code, issue.message, issue.path.dimmed());
    }
}

/// Print the details a service error carries before handing it to `main`.
pub(crate) fn report(err: ServiceError) -> anyhow::Error {
    match &err {
        ServiceError::Invalid { issues, .. } => print_issues(issues),
        ServiceError::Rejected { errors, .. } => {
            for message in errors {
                eprintln!("  {} {}", "✗".red(), message);
            }
        }
        _ => {}
    }
    anyhow::Error::new(err)
}
