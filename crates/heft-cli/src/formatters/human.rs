//! Human-readable formatter for check reports.

use super::CheckReport;
use colored::*;
use heft_core::{format_bytes, IacIssue, PackageInfo, Severity};

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::Critical => "critical".red().bold(),
        Severity::High => "high".red(),
        Severity::Medium => "medium".yellow(),
        Severity::Low => "low".bright_black(),
    }
}

fn package_line(package: &PackageInfo) -> String {
    let name = match &package.version {
        Some(version) => format!("{}@{}", package.name, version),
        None => package.name.clone(),
    };
    let size = match (&package.error, package.size) {
        (Some(e), _) => format!("{} ({})", "unavailable".bright_black(), e),
        (None, Some(size)) => format_bytes(size).cyan().to_string(),
        (None, None) => "unresolved".bright_black().to_string(),
    };

    let mut line = format!("  {:4} {:32} {}", package.line + 1, name, size);
    if let Some(worst) = package.max_severity() {
        line.push_str(&format!(
            "  {} {} {}",
            "✗".red(),
            package.vulnerabilities.len(),
            severity_label(worst)
        ));
    }
    line
}

fn issue_line(issue: &IacIssue) -> String {
    format!(
        "  {:4} {:8} {} {}\n       {}",
        issue.line + 1,
        severity_label(issue.severity),
        issue.title,
        format!("[{}]", issue.id).bright_black(),
        issue.path.bright_black()
    )
}

/// Renders the report as terminal text.
pub fn format_report(report: &CheckReport) -> String {
    let mut out = format!(
        "{} ({})\n",
        report.path.display().to_string().bold(),
        report.category.display_name()
    );

    if report.category.is_package_route() {
        if report.packages.is_empty() {
            out.push_str(&format!("  {}\n", "No packages imported.".bright_black()));
            return out;
        }
        for package in &report.packages {
            out.push_str(&package_line(package));
            out.push('\n');
        }
        out.push_str(&format!(
            "\n{} package(s), {} total, {} vulnerabilit{}\n",
            report.packages.len(),
            format_bytes(report.total_size()),
            report.vulnerability_count(),
            if report.vulnerability_count() == 1 { "y" } else { "ies" }
        ));
    } else if report.issues.is_empty() {
        out.push_str(&format!("  {} No issues found.\n", "✓".green()));
    } else {
        for issue in &report.issues {
            out.push_str(&issue_line(issue));
            out.push('\n');
        }
        out.push_str(&format!("\n{} issue(s)\n", report.issues.len()));
    }
    out
}

pub fn print_report(report: &CheckReport) {
    print!("{}", format_report(report));
}
