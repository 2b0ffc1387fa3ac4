//! Core data types for heft analysis.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A text document as seen by the editor host.
///
/// The host owns documents; the pipeline only reads (clones) them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Absolute path, the unique key of the document.
    pub path: PathBuf,
    /// Language identifier declared by the editor (e.g. `typescriptreact`).
    pub language_id: String,
    /// Current text, possibly unsaved.
    pub text: String,
    /// Whether the buffer has unsaved changes.
    pub is_dirty: bool,
}

impl Document {
    /// Creates a saved (clean) document.
    pub fn new(
        path: impl Into<PathBuf>,
        language_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            language_id: language_id.into(),
            text: text.into(),
            is_dirty: false,
        }
    }

    /// Returns the same document flagged as dirty.
    pub fn dirty(mut self) -> Self {
        self.is_dirty = true;
        self
    }

    /// Path as a borrowed [`Path`].
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Analysis category of a document.
///
/// Documents that fit none of these are inapplicable and never analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// TypeScript sources
    TypeScript,
    /// JavaScript sources
    JavaScript,
    /// HTML documents with script tags
    Markup,
    /// `package.json`
    Manifest,
    /// Infrastructure manifests (YAML)
    Infrastructure,
}

impl Category {
    /// Returns all categories in classification order
    pub fn all() -> &'static [Category] {
        &[
            Category::TypeScript,
            Category::JavaScript,
            Category::Markup,
            Category::Manifest,
            Category::Infrastructure,
        ]
    }

    /// Returns the display name for this category
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::TypeScript => "TypeScript",
            Category::JavaScript => "JavaScript",
            Category::Markup => "HTML",
            Category::Manifest => "package.json",
            Category::Infrastructure => "Infrastructure",
        }
    }

    /// Whether results are package costs (as opposed to IaC issues).
    pub fn is_package_route(&self) -> bool {
        !matches!(self, Category::Infrastructure)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Severity shared by vulnerabilities and IaC issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Parses a severity label, defaulting unknown labels to `Low`.
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "medium" | "moderate" => Severity::Medium,
            _ => Severity::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A known vulnerability affecting a package version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    /// Advisory identifier
    pub id: String,
    /// Short advisory title
    pub title: String,
    pub severity: Severity,
    /// Affected package
    pub package_name: String,
    /// Affected version
    pub version: String,
    /// Advisory page, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One imported package and, once resolved, its cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Package name (`lodash`, `@scope/pkg`)
    pub name: String,
    /// 0-based line of the import in the document
    pub line: u32,
    /// Requested or resolved version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Unpacked size in bytes; `None` until resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vulnerabilities: Vec<Vulnerability>,
    /// Resolution failure, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PackageInfo {
    /// Creates an unresolved package entry.
    pub fn pending(name: impl Into<String>, line: u32) -> Self {
        Self {
            name: name.into(),
            line,
            version: None,
            size: None,
            vulnerabilities: Vec::new(),
            error: None,
        }
    }

    /// Sets the requested version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the resolved size.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// A package is resolved once it has a size or a resolution error.
    pub fn is_resolved(&self) -> bool {
        self.size.is_some() || self.error.is_some()
    }

    /// Highest severity among the package's vulnerabilities.
    pub fn max_severity(&self) -> Option<Severity> {
        self.vulnerabilities.iter().map(|v| v.severity).max()
    }
}

/// A configuration issue found in an infrastructure manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IacIssue {
    /// Rule identifier
    pub id: String,
    pub title: String,
    pub severity: Severity,
    /// 0-based line the issue points at
    pub line: u32,
    /// Resource path, e.g. `spec.containers[0].securityContext.privileged`
    pub path: String,
    /// What can go wrong
    pub impact: String,
    /// How to fix it
    pub resolve: String,
}

/// Events emitted by one analysis session.
///
/// Ordering within a session: `Start` precedes every `Calculated`, and `Done`
/// follows every `Calculated`. `CalculatedIac` may arrive at any point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Non-fatal failure inside the session.
    Error(String),
    /// A dependency manifest discovered during resolution.
    Package(PathBuf),
    /// Initial, unresolved package list.
    Start(Vec<PackageInfo>),
    /// One resolved package.
    Calculated(PackageInfo),
    /// Final resolved package list.
    Done(Vec<PackageInfo>),
    /// One infrastructure issue.
    CalculatedIac(IacIssue),
}

impl SessionEvent {
    /// Short event name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::Error(_) => "error",
            SessionEvent::Package(_) => "package",
            SessionEvent::Start(_) => "start",
            SessionEvent::Calculated(_) => "calculated",
            SessionEvent::Done(_) => "done",
            SessionEvent::CalculatedIac(_) => "calculatedIaC",
        }
    }
}

/// A pre-computed report the user can flush to the output log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportItem {
    pub title: String,
    pub report: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_resolution_state() {
        let pending = PackageInfo::pending("lodash", 0);
        assert!(!pending.is_resolved());

        let sized = pending.clone().with_size(71_000);
        assert!(sized.is_resolved());

        let failed = PackageInfo {
            error: Some("not found".to_string()),
            ..pending
        };
        assert!(failed.is_resolved());
    }

    #[test]
    fn test_max_severity() {
        let mut pkg = PackageInfo::pending("minimist", 3);
        assert_eq!(pkg.max_severity(), None);

        for severity in [Severity::Medium, Severity::Critical, Severity::Low] {
            pkg.vulnerabilities.push(Vulnerability {
                id: format!("ID-{}", severity),
                title: "Prototype Pollution".to_string(),
                severity,
                package_name: "minimist".to_string(),
                version: "0.0.8".to_string(),
                url: None,
            });
        }

        assert_eq!(pkg.max_severity(), Some(Severity::Critical));
    }

    #[test]
    fn test_severity_labels() {
        assert_eq!(Severity::from_label("HIGH"), Severity::High);
        assert_eq!(Severity::from_label("moderate"), Severity::Medium);
        assert_eq!(Severity::from_label("whatever"), Severity::Low);
    }

    #[test]
    fn test_only_infrastructure_leaves_package_route() {
        for category in Category::all() {
            assert_eq!(
                category.is_package_route(),
                *category != Category::Infrastructure
            );
        }
    }

    #[test]
    fn test_dirty_document() {
        let doc = Document::new("/p/deploy.yaml", "yaml", "kind: Pod").dirty();
        assert!(doc.is_dirty);
        assert_eq!(doc.path(), Path::new("/p/deploy.yaml"));
    }
}
