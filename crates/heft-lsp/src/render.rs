//! Conversions from analysis results to LSP types.

use heft_core::{format_bytes, IacIssue, PackageInfo, Severity, Vulnerability};
use tower_lsp::lsp_types::{
    Diagnostic, DiagnosticSeverity, InlayHint, InlayHintKind, InlayHintLabel, InlayHintTooltip,
    NumberOrString, Position, Range,
};

pub const SOURCE: &str = "heft";

/// Text shown after an import.
pub fn hint_label(package: &PackageInfo) -> String {
    match (&package.error, package.size) {
        (Some(_), _) => "size unavailable".to_string(),
        (None, Some(size)) => match &package.version {
            Some(version) => format!("{} ({})", format_bytes(size), version),
            None => format_bytes(size),
        },
        (None, None) => "calculating…".to_string(),
    }
}

/// Number of UTF-16 code units on `line` of `text`, or 0 past the end.
pub fn line_end_character(text: &str, line: u32) -> u32 {
    text.lines()
        .nth(line as usize)
        .map(|l| l.encode_utf16().count() as u32)
        .unwrap_or(0)
}

/// Inlay hint at the end of the import line.
pub fn package_hint(package: &PackageInfo, text: &str) -> InlayHint {
    InlayHint {
        position: Position::new(package.line, line_end_character(text, package.line)),
        label: InlayHintLabel::String(hint_label(package)),
        kind: Some(InlayHintKind::TYPE),
        text_edits: None,
        tooltip: package.error.clone().map(InlayHintTooltip::String),
        padding_left: Some(true),
        padding_right: None,
        data: None,
    }
}

fn line_range(line: u32) -> Range {
    Range::new(Position::new(line, 0), Position::new(line + 1, 0))
}

fn diagnostic_severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Critical | Severity::High => DiagnosticSeverity::ERROR,
        Severity::Medium => DiagnosticSeverity::WARNING,
        Severity::Low => DiagnosticSeverity::INFORMATION,
    }
}

pub fn vulnerability_diagnostic(package: &PackageInfo, vulnerability: &Vulnerability) -> Diagnostic {
    Diagnostic {
        range: line_range(package.line),
        severity: Some(diagnostic_severity(vulnerability.severity)),
        code: Some(NumberOrString::String(vulnerability.id.clone())),
        source: Some(SOURCE.to_string()),
        message: format!(
            "{} in {}@{} ({} severity)",
            vulnerability.title, vulnerability.package_name, vulnerability.version, vulnerability.severity
        ),
        ..Default::default()
    }
}

pub fn iac_diagnostic(issue: &IacIssue) -> Diagnostic {
    let mut message = format!("{} [{}]", issue.title, issue.path);
    if !issue.resolve.is_empty() {
        message.push('\n');
        message.push_str(&issue.resolve);
    }

    Diagnostic {
        range: line_range(issue.line),
        severity: Some(diagnostic_severity(issue.severity)),
        code: Some(NumberOrString::String(issue.id.clone())),
        source: Some(SOURCE.to_string()),
        message,
        ..Default::default()
    }
}

/// Marker at the end of a line with an infrastructure issue.
pub fn iac_hint(issue: &IacIssue, text: &str) -> InlayHint {
    InlayHint {
        position: Position::new(issue.line, line_end_character(text, issue.line)),
        label: InlayHintLabel::String(format!("⚠ {} ({})", issue.id, issue.severity)),
        kind: None,
        text_edits: None,
        tooltip: Some(InlayHintTooltip::String(issue.title.clone())),
        padding_left: Some(true),
        padding_right: None,
        data: None,
    }
}

/// One-line notification for a newly found infrastructure issue.
pub fn iac_notice(issue: &IacIssue) -> String {
    format!(
        "{} ({} severity) on line {}: {}",
        issue.id,
        issue.severity,
        issue.line + 1,
        issue.title
    )
}

/// One-line notification for a newly found vulnerability.
pub fn vulnerability_notice(vulnerability: &Vulnerability) -> String {
    format!(
        "{}@{} has a {} severity vulnerability: {}",
        vulnerability.package_name, vulnerability.version, vulnerability.severity, vulnerability.title
    )
}
