//! Output formatters for `heft check`.

pub mod human;
pub mod json;

use heft_core::{Category, IacIssue, PackageInfo};
use heft_orchestrator::Call;
use serde::Serialize;
use std::path::PathBuf;

/// What one analysis run rendered, collected from the recorded calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub path: PathBuf,
    pub category: Category,
    pub packages: Vec<PackageInfo>,
    pub issues: Vec<IacIssue>,
}

impl CheckReport {
    /// Replays `calls` for `path` the way an editor would display them.
    pub fn from_calls(path: PathBuf, category: Category, calls: &[Call]) -> Self {
        let mut packages: Vec<PackageInfo> = Vec::new();
        let mut issues = Vec::new();

        for call in calls {
            match call {
                Call::Pending { path: p, packages: list } | Call::Final { path: p, packages: list }
                    if *p == path =>
                {
                    packages = list.clone();
                }
                Call::Package { path: p, package } if *p == path => {
                    match packages.iter_mut().find(|existing| existing.name == package.name) {
                        Some(existing) => *existing = package.clone(),
                        None => packages.push(package.clone()),
                    }
                }
                Call::IacIssue { path: p, issue } if *p == path => issues.push(issue.clone()),
                Call::ClearDiagnostics { path: p } if *p == path => issues.clear(),
                _ => {}
            }
        }

        Self {
            path,
            category,
            packages,
            issues,
        }
    }

    /// Sum of every resolved package size.
    pub fn total_size(&self) -> u64 {
        self.packages.iter().filter_map(|p| p.size).sum()
    }

    pub fn vulnerability_count(&self) -> usize {
        self.packages.iter().map(|p| p.vulnerabilities.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heft_core::Severity;

    #[test]
    fn test_replays_latest_package_state() {
        let path = PathBuf::from("/p/app.ts");
        let calls = vec![
            Call::Pending {
                path: path.clone(),
                packages: vec![PackageInfo::pending("lodash", 0), PackageInfo::pending("react", 1)],
            },
            Call::Package {
                path: path.clone(),
                package: PackageInfo::pending("react", 1).with_size(2048),
            },
            Call::Package {
                path: PathBuf::from("/p/other.ts"),
                package: PackageInfo::pending("lodash", 0).with_size(1),
            },
        ];

        let report = CheckReport::from_calls(path, Category::TypeScript, &calls);
        assert_eq!(report.packages[0].size, None);
        assert_eq!(report.packages[1].size, Some(2048));
        assert_eq!(report.total_size(), 2048);
    }

    #[test]
    fn test_clear_drops_earlier_issues() {
        let path = PathBuf::from("/p/deploy.yaml");
        let issue = IacIssue {
            id: "HEFT-K8S-005".to_string(),
            title: "Container shares the host PID namespace".to_string(),
            severity: Severity::High,
            line: 3,
            path: "spec.hostPID".to_string(),
            impact: String::new(),
            resolve: String::new(),
        };
        let calls = vec![
            Call::IacIssue {
                path: path.clone(),
                issue: issue.clone(),
            },
            Call::ClearDiagnostics { path: path.clone() },
            Call::IacIssue {
                path: path.clone(),
                issue: issue.clone(),
            },
        ];

        let report = CheckReport::from_calls(path, Category::Infrastructure, &calls);
        assert_eq!(report.issues, vec![issue]);
    }
}
