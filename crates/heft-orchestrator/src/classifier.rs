//! Decides which analysis, if any, applies to a document.

use heft_config::{ConfigSource, ExtensionPatterns};
use heft_core::{Category, Document};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Manifest file name recognized for the `json` language id.
pub const MANIFEST_FILE_NAME: &str = "package.json";

fn matches_any(path: &str, patterns: &[String], category: &str) -> bool {
    patterns.iter().any(|pattern| match Regex::new(pattern) {
        Ok(re) => re.is_match(path),
        Err(e) => {
            tracing::warn!(category, pattern, error = %e, "ignoring invalid file pattern");
            false
        }
    })
}

/// Classifies `document` against `patterns`. First match wins:
///
/// 1. `typescript`/`typescriptreact`, or a TypeScript pattern
/// 2. `javascript`/`javascriptreact`, or a JavaScript pattern
/// 3. `html`, or an HTML pattern
/// 4. `json` and a path ending in `package.json`
/// 5. `yaml`, or an infrastructure pattern
///
/// Anything else is inapplicable (`None`).
pub fn classify(document: &Document, patterns: &ExtensionPatterns) -> Option<Category> {
    let language = document.language_id.as_str();
    let path = document.path.to_string_lossy();

    if matches!(language, "typescript" | "typescriptreact")
        || matches_any(&path, &patterns.typescript, "typescript")
    {
        return Some(Category::TypeScript);
    }
    if matches!(language, "javascript" | "javascriptreact")
        || matches_any(&path, &patterns.javascript, "javascript")
    {
        return Some(Category::JavaScript);
    }
    if language == "html" || matches_any(&path, &patterns.html, "html") {
        return Some(Category::Markup);
    }
    if language == "json" && path.ends_with(MANIFEST_FILE_NAME) {
        return Some(Category::Manifest);
    }
    if language == "yaml" || matches_any(&path, &patterns.infrastructure, "infrastructure") {
        return Some(Category::Infrastructure);
    }
    None
}

/// [`classify`] bound to a live configuration.
///
/// Patterns are read from the source on every call.
#[derive(Clone)]
pub struct DocumentClassifier {
    config: Arc<dyn ConfigSource>,
}

impl fmt::Debug for DocumentClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentClassifier").finish_non_exhaustive()
    }
}

impl DocumentClassifier {
    pub fn new(config: Arc<dyn ConfigSource>) -> Self {
        Self { config }
    }

    pub fn classify(&self, document: &Document) -> Option<Category> {
        classify(document, &self.config.patterns())
    }
}
