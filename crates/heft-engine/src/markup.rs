//! Package references inside HTML documents.

use crate::imports::{extract_imports_at, line_of, ImportRef};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn script_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").expect("script pattern is valid")
    })
}

fn cdn_src() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)\bsrc\s*=\s*["']?(?:https?:)?//(?:unpkg\.com|cdn\.jsdelivr\.net/npm)/((?:@[^/@\s"']+/)?[^/@\s"'>]+)(?:@([^/\s"'>]+))?"#,
        )
        .expect("cdn pattern is valid")
    })
}

/// Extracts packages from `<script>` tags.
///
/// Inline scripts are scanned like JavaScript; `src` attributes pointing at
/// unpkg or jsDelivr contribute the package (and version, when pinned).
pub fn extract_markup_imports(html: &str) -> Vec<ImportRef> {
    let mut found = Vec::new();

    for cap in script_block().captures_iter(html) {
        let (Some(attrs), Some(body)) = (cap.get(1), cap.get(2)) else {
            continue;
        };

        if let Some(src) = cdn_src().captures(attrs.as_str()) {
            if let Some(name) = src.get(1) {
                found.push(ImportRef {
                    name: name.as_str().to_string(),
                    line: line_of(html, attrs.start()),
                    version: src.get(2).map(|v| v.as_str().to_string()),
                });
            }
        }

        found.extend(extract_imports_at(body.as_str(), line_of(html, body.start())));
    }

    let mut seen = HashSet::new();
    found.retain(|r| seen.insert(r.name.clone()));
    found
}
