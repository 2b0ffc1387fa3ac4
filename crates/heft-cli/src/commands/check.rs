//! `heft check <FILE>`: one analysis run, printed to the terminal.

use crate::formatters::{self, CheckReport};
use anyhow::{bail, Context, Result};
use heft_core::Document;
use heft_lsp::{Backends, SetupOptions};
use heft_orchestrator::{Orchestrator, ProcessOutcome, Recorder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;

#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub file: PathBuf,
    /// Editor language id; guessed from the extension when absent
    pub language_id: Option<String>,
    pub json: bool,
    pub setup: SetupOptions,
}

/// Language id an editor would report for `path`.
pub fn language_id_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "ts" | "mts" | "cts" => "typescript",
        "tsx" => "typescriptreact",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "javascriptreact",
        "html" | "htm" => "html",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        _ => "plaintext",
    }
}

pub fn handle_check_command(options: CheckOptions) -> Result<()> {
    let path = options
        .file
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", options.file.display()))?;
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let language_id = options
        .language_id
        .clone()
        .unwrap_or_else(|| language_id_for(&path).to_string());

    let runtime = Runtime::new().context("Failed to create tokio runtime")?;
    let report = runtime.block_on(run_check(
        Document::new(path, language_id, text),
        &options.setup,
    ))?;

    if options.json {
        formatters::json::print_json(&report);
    } else {
        formatters::human::print_report(&report);
    }
    Ok(())
}

/// Runs one session for `document` and waits until it has delivered
/// everything.
pub async fn run_check(document: Document, setup: &SetupOptions) -> Result<CheckReport> {
    let backends = Backends::load(setup).await.context("Failed to set up heft")?;
    let recorder = Arc::new(Recorder::new());
    let (inbox, mut rx) = heft_orchestrator::inbox();
    let mut orchestrator = Orchestrator::new(backends.collaborators(recorder.clone()), inbox);

    let category = match orchestrator.process(&document) {
        ProcessOutcome::Started { category, .. } => category,
        ProcessOutcome::Inapplicable => bail!(
            "{} ({}) is not a script, HTML, package.json or YAML document",
            document.path.display(),
            document.language_id
        ),
        ProcessOutcome::SkippedDirty => bail!("{} has unsaved changes", document.path.display()),
    };

    while !orchestrator.is_settled(&document.path) {
        let input = rx.recv().await.context("Analysis stopped unexpectedly")?;
        let _ = orchestrator.handle(input);
    }

    Ok(CheckReport::from_calls(
        document.path,
        category,
        &recorder.take(),
    ))
}
