//! Configuration checks for Kubernetes workload manifests.

use crate::error::EngineError;
use heft_core::{IacIssue, Severity};
use serde_yaml::Value;

/// A check applied to every workload.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub id: &'static str,
    pub title: &'static str,
    pub severity: Severity,
    pub impact: &'static str,
    pub resolve: &'static str,
}

pub const PRIVILEGED: Rule = Rule {
    id: "HEFT-K8S-001",
    title: "Container is running in privileged mode",
    severity: Severity::High,
    impact: "A privileged container has full access to the host and can escape its isolation",
    resolve: "Set `securityContext.privileged` to `false`",
};

pub const PRIVILEGE_ESCALATION: Rule = Rule {
    id: "HEFT-K8S-002",
    title: "Container allows privilege escalation",
    severity: Severity::Medium,
    impact: "Processes in the container can gain more privileges than their parent",
    resolve: "Set `securityContext.allowPrivilegeEscalation` to `false`",
};

pub const RUN_AS_ROOT: Rule = Rule {
    id: "HEFT-K8S-003",
    title: "Container may run as root",
    severity: Severity::Medium,
    impact: "A compromised root process has more leverage over the node",
    resolve: "Set `securityContext.runAsNonRoot` to `true`",
};

pub const HOST_NETWORK: Rule = Rule {
    id: "HEFT-K8S-004",
    title: "Pod shares the host network namespace",
    severity: Severity::High,
    impact: "The pod can observe and bind to every network interface of the node",
    resolve: "Remove `hostNetwork` or set it to `false`",
};

pub const HOST_PID: Rule = Rule {
    id: "HEFT-K8S-005",
    title: "Pod shares the host process namespace",
    severity: Severity::High,
    impact: "The pod can see and signal every process running on the node",
    resolve: "Remove `hostPID` or set it to `false`",
};

pub const MUTABLE_IMAGE: Rule = Rule {
    id: "HEFT-K8S-006",
    title: "Image uses the latest tag or no tag",
    severity: Severity::Low,
    impact: "Deployments are not reproducible and may silently pick up a different image",
    resolve: "Pin the image to a specific version tag or digest",
};

pub const MEMORY_LIMIT: Rule = Rule {
    id: "HEFT-K8S-007",
    title: "Container has no memory limit",
    severity: Severity::Low,
    impact: "A runaway container can exhaust memory on the node",
    resolve: "Set `resources.limits.memory`",
};

pub const CPU_LIMIT: Rule = Rule {
    id: "HEFT-K8S-008",
    title: "Container has no CPU limit",
    severity: Severity::Low,
    impact: "A busy container can starve its neighbours of CPU",
    resolve: "Set `resources.limits.cpu`",
};

/// Outcome of scanning one file.
#[derive(Debug, Default)]
pub struct IacScan {
    pub issues: Vec<IacIssue>,
    /// Documents that failed to parse; the rest are still scanned.
    pub errors: Vec<EngineError>,
}

/// Where the pod spec lives for a workload kind.
fn pod_spec_path(kind: &str) -> Option<&'static [&'static str]> {
    match kind {
        "Pod" => Some(&["spec"]),
        "Deployment" | "StatefulSet" | "DaemonSet" | "Job" | "ReplicaSet" => {
            Some(&["spec", "template", "spec"])
        }
        "CronJob" => Some(&["spec", "jobTemplate", "spec", "template", "spec"]),
        _ => None,
    }
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

fn is_true(value: Option<&Value>) -> bool {
    value.and_then(Value::as_bool) == Some(true)
}

fn is_false(value: Option<&Value>) -> bool {
    value.and_then(Value::as_bool) == Some(false)
}

/// Whether an image reference is pinned to something other than `latest`.
pub fn is_pinned_image(image: &str) -> bool {
    if image.contains('@') {
        return true;
    }
    let last_segment = image.rsplit('/').next().unwrap_or(image);
    match last_segment.split_once(':') {
        Some((_, tag)) => !tag.is_empty() && tag != "latest",
        None => false,
    }
}

/// Source lines of one YAML document, used to point issues at a line.
struct DocLines<'a> {
    lines: Vec<&'a str>,
    first_line: u32,
}

impl<'a> DocLines<'a> {
    fn key_value(line: &str) -> Option<(&str, &str)> {
        let trimmed = line.trim_start().trim_start_matches("- ").trim_start();
        let (key, value) = trimmed.split_once(':')?;
        Some((key.trim(), value.trim().trim_matches(['"', '\''])))
    }

    /// Index of the first line at or after `from` whose key is `key`.
    fn find_key(&self, from: usize, key: &str) -> Option<usize> {
        (from..self.lines.len()).find(|&i| Self::key_value(self.lines[i]).is_some_and(|(k, _)| k == key))
    }

    /// Index of the first line at or after `from` reading `key: value`.
    fn find_entry(&self, from: usize, key: &str, value: &str) -> Option<usize> {
        (from..self.lines.len())
            .find(|&i| Self::key_value(self.lines[i]).is_some_and(|(k, v)| k == key && v == value))
    }

    fn absolute(&self, index: usize) -> u32 {
        self.first_line + index as u32
    }
}

struct Scanner<'a> {
    doc: DocLines<'a>,
    kind_line: usize,
    issues: Vec<IacIssue>,
}

impl Scanner<'_> {
    fn report(&mut self, rule: Rule, index: usize, path: String) {
        self.issues.push(IacIssue {
            id: rule.id.to_string(),
            title: rule.title.to_string(),
            severity: rule.severity,
            line: self.doc.absolute(index),
            path,
            impact: rule.impact.to_string(),
            resolve: rule.resolve.to_string(),
        });
    }

    fn scan_pod_spec(&mut self, pod_spec: &Value, prefix: &str) {
        if is_true(pod_spec.get("hostNetwork")) {
            let line = self.doc.find_key(0, "hostNetwork").unwrap_or(self.kind_line);
            self.report(HOST_NETWORK, line, format!("{}.hostNetwork", prefix));
        }
        if is_true(pod_spec.get("hostPID")) {
            let line = self.doc.find_key(0, "hostPID").unwrap_or(self.kind_line);
            self.report(HOST_PID, line, format!("{}.hostPID", prefix));
        }

        let pod_non_root = is_true(lookup(pod_spec, &["securityContext", "runAsNonRoot"]));

        for field in ["initContainers", "containers"] {
            let Some(containers) = pod_spec.get(field).and_then(Value::as_sequence) else {
                continue;
            };
            let list_line = self.doc.find_key(0, field).unwrap_or(self.kind_line);

            for (i, container) in containers.iter().enumerate() {
                let path = format!("{}.{}[{}]", prefix, field, i);
                let anchor = container
                    .get("name")
                    .and_then(Value::as_str)
                    .and_then(|name| self.doc.find_entry(list_line, "name", name))
                    .unwrap_or(list_line);
                self.scan_container(container, &path, anchor, pod_non_root);
            }
        }
    }

    fn scan_container(&mut self, container: &Value, path: &str, anchor: usize, pod_non_root: bool) {
        let security = container.get("securityContext");
        let security_field = |key: &str| security.and_then(|s| s.get(key));

        if is_true(security_field("privileged")) {
            let line = self.doc.find_key(anchor, "privileged").unwrap_or(anchor);
            self.report(PRIVILEGED, line, format!("{}.securityContext.privileged", path));
        }

        if !is_false(security_field("allowPrivilegeEscalation")) {
            self.report(
                PRIVILEGE_ESCALATION,
                anchor,
                format!("{}.securityContext.allowPrivilegeEscalation", path),
            );
        }

        if !pod_non_root && !is_true(security_field("runAsNonRoot")) {
            self.report(RUN_AS_ROOT, anchor, format!("{}.securityContext.runAsNonRoot", path));
        }

        if let Some(image) = container.get("image").and_then(Value::as_str) {
            if !is_pinned_image(image) {
                let line = self.doc.find_key(anchor, "image").unwrap_or(anchor);
                self.report(MUTABLE_IMAGE, line, format!("{}.image", path));
            }
        }

        let limits = lookup(container, &["resources", "limits"]);
        if limits.and_then(|l| l.get("memory")).is_none() {
            self.report(MEMORY_LIMIT, anchor, format!("{}.resources.limits.memory", path));
        }
        if limits.and_then(|l| l.get("cpu")).is_none() {
            self.report(CPU_LIMIT, anchor, format!("{}.resources.limits.cpu", path));
        }
    }
}

/// Splits a multi-document YAML file into `(first line, text)` chunks.
fn split_documents(text: &str) -> Vec<(u32, String)> {
    let mut documents = Vec::new();
    let mut start = 0u32;
    let mut current = String::new();

    for (index, line) in text.lines().enumerate() {
        if line.trim_end() == "---" || line.starts_with("--- ") {
            documents.push((start, std::mem::take(&mut current)));
            start = index as u32 + 1;
            continue;
        }
        current.push_str(line);
        current.push('\n');
    }
    documents.push((start, current));
    documents
}

/// Scans every YAML document in `text` for workload misconfigurations.
pub fn scan_infrastructure(text: &str) -> IacScan {
    let mut scan = IacScan::default();

    for (first_line, chunk) in split_documents(text) {
        if chunk.trim().is_empty() {
            continue;
        }

        let value: Value = match serde_yaml::from_str(&chunk) {
            Ok(value) => value,
            Err(e) => {
                scan.errors.push(EngineError::Yaml {
                    line: first_line,
                    source: e,
                });
                continue;
            }
        };

        let Some(kind) = value.get("kind").and_then(Value::as_str) else {
            continue;
        };
        let Some(spec_path) = pod_spec_path(kind) else {
            tracing::trace!(kind, "skipping non-workload resource");
            continue;
        };
        let Some(pod_spec) = lookup(&value, spec_path) else {
            continue;
        };

        let doc = DocLines {
            lines: chunk.lines().collect(),
            first_line,
        };
        let kind_line = doc.find_key(0, "kind").unwrap_or(0);
        let mut scanner = Scanner {
            doc,
            kind_line,
            issues: Vec::new(),
        };
        scanner.scan_pod_spec(pod_spec, &spec_path.join("."));
        scan.issues.append(&mut scanner.issues);
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;

    const HARDENED: &str = r#"apiVersion: v1
kind: Pod
metadata:
  name: hardened
spec:
  securityContext:
    runAsNonRoot: true
  containers:
    - name: app
      image: nginx:1.25.3
      securityContext:
        allowPrivilegeEscalation: false
      resources:
        limits:
          memory: 128Mi
          cpu: 500m
"#;

    fn ids(scan: &IacScan) -> Vec<&str> {
        scan.issues.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_hardened_pod_is_clean() {
        let scan = scan_infrastructure(HARDENED);
        assert!(scan.errors.is_empty());
        assert!(scan.issues.is_empty(), "unexpected issues: {:?}", ids(&scan));
    }

    #[test]
    fn test_privileged_deployment() {
        let text = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  template:
    spec:
      hostNetwork: true
      containers:
        - name: web
          image: nginx
          securityContext:
            privileged: true
"#;
        let scan = scan_infrastructure(text);
        let privileged = scan.issues.iter().find(|i| i.id == PRIVILEGED.id).unwrap();
        assert_eq!(privileged.line, 12);
        assert_eq!(
            privileged.path,
            "spec.template.spec.containers[0].securityContext.privileged"
        );
        assert_eq!(privileged.severity, Severity::High);

        let host_network = scan.issues.iter().find(|i| i.id == HOST_NETWORK.id).unwrap();
        assert_eq!(host_network.line, 7);

        let image = scan.issues.iter().find(|i| i.id == MUTABLE_IMAGE.id).unwrap();
        assert_eq!(image.line, 10);

        for rule in [PRIVILEGE_ESCALATION, RUN_AS_ROOT, MEMORY_LIMIT, CPU_LIMIT] {
            let issue = scan.issues.iter().find(|i| i.id == rule.id).unwrap();
            assert_eq!(issue.line, 9, "{} should point at the container", rule.id);
        }
    }

    #[test]
    fn test_multi_document_lines() {
        let text = format!(
            "apiVersion: v1\nkind: Service\nmetadata:\n  name: svc\n---\n{}",
            HARDENED.replace("nginx:1.25.3", "nginx:latest")
        );
        let scan = scan_infrastructure(&text);
        assert_eq!(ids(&scan), vec![MUTABLE_IMAGE.id]);
        assert_eq!(scan.issues[0].line, 5 + 9);
    }

    #[test]
    fn test_cronjob_path() {
        let text = r#"kind: CronJob
spec:
  jobTemplate:
    spec:
      template:
        spec:
          hostPID: true
          containers: []
"#;
        let scan = scan_infrastructure(text);
        assert_eq!(ids(&scan), vec![HOST_PID.id]);
        assert_eq!(scan.issues[0].path, "spec.jobTemplate.spec.template.spec.hostPID");
    }

    #[test]
    fn test_parse_error_keeps_other_documents() {
        let text = format!("kind: [unclosed\n---\n{}", HARDENED.replace("          memory: 128Mi\n", ""));
        let scan = scan_infrastructure(&text);
        assert_eq!(scan.errors.len(), 1);
        assert_eq!(ids(&scan), vec![MEMORY_LIMIT.id]);
    }

    #[test]
    fn test_image_pinning() {
        assert!(is_pinned_image("nginx:1.25"));
        assert!(is_pinned_image("registry:5000/team/app:v2"));
        assert!(is_pinned_image("nginx@sha256:abc"));
        assert!(!is_pinned_image("nginx"));
        assert!(!is_pinned_image("nginx:latest"));
        assert!(!is_pinned_image("registry:5000/team/app"));
    }
}
