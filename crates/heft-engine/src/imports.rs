//! Import extraction from script and markup text.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// A package referenced by a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRef {
    /// Package name, reduced from the specifier (`lodash/fp` → `lodash`)
    pub name: String,
    /// 0-based line of the referencing statement
    pub line: u32,
    /// Version pinned by the reference itself (CDN URLs, manifests)
    pub version: Option<String>,
}

impl ImportRef {
    fn new(name: String, line: u32) -> Self {
        Self {
            name,
            line,
            version: None,
        }
    }
}

/// Node built-in modules, which never resolve to a registry package.
const NODE_BUILTINS: &[&str] = &[
    "assert", "async_hooks", "buffer", "child_process", "cluster", "console", "constants",
    "crypto", "dgram", "diagnostics_channel", "dns", "domain", "events", "fs", "http", "http2",
    "https", "inspector", "module", "net", "os", "path", "perf_hooks", "process", "punycode",
    "querystring", "readline", "repl", "stream", "string_decoder", "sys", "timers", "tls",
    "trace_events", "tty", "url", "util", "v8", "vm", "wasi", "worker_threads", "zlib",
];

fn import_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // import x from 'y', import {a, b} from 'y', import 'y'
            r#"\bimport\s+(?:[\w*{}\s,$]+?\s+from\s+)?['"]([^'"\n]+)['"]"#,
            // export * from 'y', export {a} from 'y'
            r#"\bexport\s+(?:type\s+)?(?:\*(?:\s+as\s+\w+)?|\{[^}]*\})\s+from\s+['"]([^'"\n]+)['"]"#,
            r#"\brequire\s*\(\s*['"]([^'"\n]+)['"]\s*\)"#,
            r#"\bimport\s*\(\s*['"]([^'"\n]+)['"]\s*\)"#,
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("import pattern is valid"))
        .collect()
    })
}

/// Reduces a module specifier to the package it belongs to.
///
/// Returns `None` for relative or absolute paths, URLs, `node:` specifiers
/// and Node built-ins.
pub fn package_name(specifier: &str) -> Option<String> {
    let specifier = specifier.trim();
    if specifier.is_empty()
        || specifier.starts_with('.')
        || specifier.starts_with('/')
        || specifier.starts_with("node:")
        || specifier.contains("://")
    {
        return None;
    }

    let mut parts = specifier.split('/');
    let first = parts.next()?;
    let name = if first.starts_with('@') {
        let second = parts.next().filter(|s| !s.is_empty())?;
        format!("{}/{}", first, second)
    } else {
        first.to_string()
    };

    if NODE_BUILTINS.contains(&name.as_str()) {
        return None;
    }
    Some(name)
}

/// 0-based line of byte `offset` in `text`.
pub(crate) fn line_of(text: &str, offset: usize) -> u32 {
    text[..offset.min(text.len())].matches('\n').count() as u32
}

/// Overwrites `out[from..to]` with `fill`, keeping line breaks.
fn fill(out: &mut [u8], from: usize, to: usize, with: u8) {
    let to = to.min(out.len());
    if from >= to {
        return;
    }
    for byte in &mut out[from..to] {
        if *byte != b'\n' {
            *byte = with;
        }
    }
}

/// Index of the closing `quote` of a string starting at `start`, or of the
/// line break or end of text that cuts it short.
fn string_end(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i,
            b if b == quote => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// End (after the closing slash) of a regex literal starting at `start`.
fn regex_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut in_class = false;
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'\n' => return None,
            b'[' => in_class = true,
            b']' => in_class = false,
            b'/' if !in_class => return Some(i + 1),
            _ => {}
        }
        i += 1;
    }
    None
}

/// A `/` after these starts a regex literal rather than a division.
fn regex_allowed(prev: Option<u8>) -> bool {
    match prev {
        None => true,
        Some(b) => b"(,=:[!&|?{};+-*%<>~^".contains(&b),
    }
}

/// Blanks template text from `start`. Returns the index after the closing
/// backtick or after `${`, and whether an expression was opened.
fn template_text(bytes: &[u8], out: &mut [u8], start: usize) -> (usize, bool) {
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                fill(out, i, i + 2, b'_');
                i += 2;
            }
            b'`' => return (i + 1, false),
            b'$' if bytes.get(i + 1) == Some(&b'{') => return (i + 2, true),
            _ => {
                fill(out, i, i + 1, b'_');
                i += 1;
            }
        }
    }
    (bytes.len(), false)
}

/// Blanks comments and the contents of string, template and regex literals.
///
/// Byte offsets and line breaks are preserved and quotes are kept, so a
/// specifier matched in the result can be read back from `text` at the same
/// range. Code inside template expressions stays visible.
fn mask_non_code(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = bytes.to_vec();
    // Open braces inside each enclosing `${ ... }`
    let mut templates: Vec<usize> = Vec::new();
    let mut prev: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                let end = bytes[i..]
                    .iter()
                    .position(|&c| c == b'\n')
                    .map_or(bytes.len(), |p| i + p);
                fill(&mut out, i, end, b' ');
                i = end;
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = text[i + 2..].find("*/").map_or(bytes.len(), |p| i + 2 + p + 2);
                fill(&mut out, i, end, b' ');
                i = end;
                continue;
            }
            b'/' if regex_allowed(prev) => {
                if let Some(end) = regex_end(bytes, i) {
                    fill(&mut out, i + 1, end - 1, b'_');
                    prev = Some(b')');
                    i = end;
                    continue;
                }
            }
            b'\'' | b'"' => {
                let close = string_end(bytes, i + 1, b);
                fill(&mut out, i + 1, close, b'_');
                prev = Some(b);
                i = if bytes.get(close) == Some(&b) { close + 1 } else { close };
                continue;
            }
            b'`' => {
                let (next, opened) = template_text(bytes, &mut out, i + 1);
                if opened {
                    templates.push(0);
                }
                prev = Some(b);
                i = next;
                continue;
            }
            b'{' => {
                if let Some(depth) = templates.last_mut() {
                    *depth += 1;
                }
            }
            b'}' if templates.last() == Some(&0) => {
                templates.pop();
                let (next, opened) = template_text(bytes, &mut out, i + 1);
                if opened {
                    templates.push(0);
                }
                prev = Some(b'`');
                i = next;
                continue;
            }
            b'}' => {
                if let Some(depth) = templates.last_mut() {
                    *depth -= 1;
                }
            }
            _ => {}
        }
        if !b.is_ascii_whitespace() {
            prev = Some(b);
        }
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Extracts imported packages from JavaScript or TypeScript source.
///
/// Results are ordered by position; a package imported several times is
/// reported once, at its first line. Comments and literal text are ignored.
pub fn extract_imports(text: &str) -> Vec<ImportRef> {
    extract_imports_at(text, 0)
}

/// Like [`extract_imports`], with every line shifted by `line_offset`.
pub(crate) fn extract_imports_at(text: &str, line_offset: u32) -> Vec<ImportRef> {
    let code = mask_non_code(text);
    let mut found: Vec<(usize, String)> = import_patterns()
        .iter()
        .flat_map(|re| re.captures_iter(&code))
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let specifier = text.get(cap.get(1)?.range())?;
            let name = package_name(specifier)?;
            Some((whole.start(), name))
        })
        .collect();
    found.sort_by_key(|(offset, _)| *offset);

    let mut seen = HashSet::new();
    found
        .into_iter()
        .filter(|(_, name)| seen.insert(name.clone()))
        .map(|(offset, name)| ImportRef::new(name, line_offset + line_of(text, offset)))
        .collect()
}
