//! Dependency declarations in `package.json`.

use crate::error::{EngineError, Result};
use crate::imports::ImportRef;
use serde_json::Value;

const SECTIONS: [&str; 2] = ["dependencies", "devDependencies"];

/// Strips range operators that still name one exact version.
///
/// Returns `None` for requirements that do not pin anything (`*`, `latest`,
/// empty), which resolve to the latest published version.
pub fn lookup_version(requirement: &str) -> Option<String> {
    let version = requirement.trim().trim_start_matches(['^', '~', '=']).trim();
    match version {
        "" | "*" | "latest" | "x" => None,
        v => Some(v.to_string()),
    }
}

/// Line of `"name"` inside the object that starts after `"section"`.
fn find_key_line(lines: &[&str], section: &str, name: &str) -> Option<u32> {
    let section_key = format!("\"{}\"", section);
    let name_key = format!("\"{}\"", name);

    let start = lines.iter().position(|line| line.contains(&section_key))?;
    let mut depth = 0i32;
    for (index, line) in lines.iter().enumerate().skip(start) {
        if index > start && depth == 1 && line.trim_start().starts_with(&name_key) {
            return Some(index as u32);
        }
        // Single-line sections: "dependencies": { "a": "1" }
        if index == start && line.contains(&name_key) {
            return Some(index as u32);
        }
        depth += line.matches('{').count() as i32 - line.matches('}').count() as i32;
        if index > start && depth <= 0 {
            break;
        }
    }
    None
}

/// Extracts runtime and development dependencies from manifest text.
///
/// Entries are ordered by line. Each carries the version to look up, when
/// the requirement pins one.
pub fn extract_manifest_dependencies(text: &str) -> Result<Vec<ImportRef>> {
    let manifest: Value = serde_json::from_str(text).map_err(EngineError::Manifest)?;
    let lines: Vec<&str> = text.lines().collect();

    let mut deps = Vec::new();
    for section in SECTIONS {
        let Some(entries) = manifest.get(section).and_then(Value::as_object) else {
            continue;
        };
        for (name, requirement) in entries {
            let line = find_key_line(&lines, section, name).unwrap_or(0);
            deps.push(ImportRef {
                name: name.clone(),
                line,
                version: requirement.as_str().and_then(lookup_version),
            });
        }
    }

    deps.sort_by_key(|dep| dep.line);
    Ok(deps)
}
