//! End-to-end orchestration scenarios against controlled collaborators.

mod support;

use heft_config::{Credential, CredentialStore};
use heft_core::{Document, PackageInfo, ReportItem, SessionEvent, Severity, Vulnerability};
use heft_orchestrator::{Call, Command, EditorEvent, Input, ShownRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use support::{settle, FakeAuthenticator, Harness};
use tokio::sync::Notify;

const APP: &str = "/p/src/app.ts";
const MANIFEST: &str = "/p/package.json";

fn app() -> Document {
    Document::new(APP, "typescript", "import _ from 'lodash';\n")
}

fn focus(document: Document) -> Input {
    EditorEvent::ActiveDocumentChanged(Some(document)).into()
}

fn lodash_vulnerability() -> Vulnerability {
    Vulnerability {
        id: "SNYK-JS-LODASH-567746".to_string(),
        title: "Prototype Pollution".to_string(),
        severity: Severity::High,
        package_name: "lodash".to_string(),
        version: "4.17.15".to_string(),
        url: None,
    }
}

fn lodash_resolved() -> PackageInfo {
    let mut package = PackageInfo::pending("lodash", 0)
        .with_version("4.17.15")
        .with_size(1_412_415);
    package.vulnerabilities.push(lodash_vulnerability());
    package
}

/// Plays a full lodash session on engine session `index`.
fn play_lodash(h: &Harness, index: usize) {
    h.engine.emit(index, SessionEvent::Package(PathBuf::from(MANIFEST)));
    h.engine.emit(
        index,
        SessionEvent::Start(vec![PackageInfo::pending("lodash", 0)]),
    );
    h.engine.emit(index, SessionEvent::Calculated(lodash_resolved()));
    h.engine.emit(index, SessionEvent::Done(vec![lodash_resolved()]));
    h.engine.close(index);
}

#[tokio::test]
async fn test_lodash_session_renders_in_order() {
    let h = Harness::new();
    let (mut orch, mut rx) = h.orchestrator();

    let _ = orch.handle(focus(app()));
    assert_eq!(h.engine.started(), 1);
    assert_eq!(h.engine.request(0).text, app().text);

    play_lodash(&h, 0);
    settle(&mut orch, &mut rx).await;

    let path = PathBuf::from(APP);
    let key = ShownRegistry::vulnerability_key(&path, &lodash_vulnerability());
    assert_eq!(
        h.renders(),
        vec![
            Call::Pending {
                path: path.clone(),
                packages: vec![PackageInfo::pending("lodash", 0)],
            },
            Call::Package {
                path: path.clone(),
                package: lodash_resolved(),
            },
            Call::Final {
                path: path.clone(),
                packages: vec![lodash_resolved()],
            },
            Call::Vulnerabilities {
                path: path.clone(),
                packages: vec![lodash_resolved()],
                newly_shown: vec![key],
            },
        ]
    );
    assert_eq!(h.watcher.watch_count(), 1);
    assert!(orch.watchers().is_watching(Path::new(MANIFEST)));
    assert!(orch.is_settled(&path));
}

#[tokio::test]
async fn test_vulnerabilities_are_shown_once_until_recheck() {
    let h = Harness::new();
    let (mut orch, mut rx) = h.orchestrator();

    let _ = orch.handle(focus(app()));
    play_lodash(&h, 0);
    settle(&mut orch, &mut rx).await;

    let _ = orch.handle(EditorEvent::DocumentChanged(app()).into());
    play_lodash(&h, 1);
    settle(&mut orch, &mut rx).await;

    let _ = orch.handle(Command::Check.into());
    play_lodash(&h, 2);
    settle(&mut orch, &mut rx).await;

    let newly_shown: Vec<usize> = h
        .recorder
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Vulnerabilities { newly_shown, .. } => Some(newly_shown.len()),
            _ => None,
        })
        .collect();
    assert_eq!(newly_shown, vec![1, 0, 1]);
}

#[tokio::test]
async fn test_superseded_session_never_renders() {
    let h = Harness::new();
    let (mut orch, mut rx) = h.orchestrator();

    let _ = orch.handle(focus(app()));
    // Forwarded into the inbox before the second session starts
    h.engine.emit(0, SessionEvent::Start(vec![PackageInfo::pending("stale", 0)]));
    for _ in 0..3 {
        tokio::task::yield_now().await;
    }

    let _ = orch.handle(focus(app()));
    assert_eq!(h.engine.started(), 2);

    h.engine.emit(0, SessionEvent::Done(vec![PackageInfo::pending("stale", 0)]));
    h.engine.emit(1, SessionEvent::Start(vec![PackageInfo::pending("fresh", 0)]));
    settle(&mut orch, &mut rx).await;

    assert_eq!(
        h.renders(),
        vec![Call::Pending {
            path: PathBuf::from(APP),
            packages: vec![PackageInfo::pending("fresh", 0)],
        }]
    );
    assert_eq!(orch.sessions().len(), 1);
}

#[tokio::test]
async fn test_inapplicable_document_starts_nothing() {
    let h = Harness::new();
    let (mut orch, mut rx) = h.orchestrator();

    let _ = orch.handle(focus(Document::new("/p/README.md", "markdown", "# hi")));
    settle(&mut orch, &mut rx).await;

    assert_eq!(h.engine.started(), 0);
    assert!(h.recorder.is_empty());
    assert!(orch.current_document().is_some());
}

#[tokio::test]
async fn test_dirty_infrastructure_only_clears_diagnostics() {
    let h = Harness::new();
    let (mut orch, mut rx) = h.orchestrator();
    let deployment = Document::new("/p/k8s/deploy.yaml", "yaml", "kind: Pod\n").dirty();

    let _ = orch.handle(EditorEvent::DocumentChanged(deployment).into());
    settle(&mut orch, &mut rx).await;

    assert_eq!(h.engine.started(), 0);
    assert_eq!(
        h.recorder.calls(),
        vec![Call::ClearDiagnostics {
            path: PathBuf::from("/p/k8s/deploy.yaml")
        }]
    );
}

#[tokio::test]
async fn test_saved_infrastructure_renders_issues() {
    let h = Harness::new();
    let (mut orch, mut rx) = h.orchestrator();
    let path = PathBuf::from("/p/k8s/deploy.yaml");
    let issue = heft_core::IacIssue {
        id: "HEFT-K8S-004".to_string(),
        title: "Container is running with host networking".to_string(),
        severity: Severity::High,
        line: 5,
        path: "spec.hostNetwork".to_string(),
        impact: String::new(),
        resolve: String::new(),
    };

    let _ = orch.handle(focus(Document::new(&path, "yaml", "kind: Pod\n")));
    h.engine.emit(0, SessionEvent::Start(vec![]));
    h.engine.emit(0, SessionEvent::CalculatedIac(issue.clone()));
    h.engine.emit(0, SessionEvent::Done(vec![]));
    h.engine.close(0);
    settle(&mut orch, &mut rx).await;

    assert!(orch.shown().is_shown(&ShownRegistry::iac_key(&path, &issue)));
    assert_eq!(
        h.recorder.calls(),
        vec![
            Call::ClearDiagnostics { path: path.clone() },
            Call::DecorateExisting { path: path.clone() },
            Call::IacIssue { path, issue },
        ]
    );
}

#[tokio::test]
async fn test_manifest_change_rechecks_current_document() {
    let h = Harness::new();
    let (mut orch, mut rx) = h.orchestrator();

    let _ = orch.handle(focus(app()));
    play_lodash(&h, 0);
    settle(&mut orch, &mut rx).await;
    assert_eq!(orch.shown().len(), 1);

    assert_eq!(h.watcher.trigger(Path::new(MANIFEST)), 1);
    settle(&mut orch, &mut rx).await;

    assert_eq!(h.cache.invalidations(), 1);
    assert!(orch.shown().is_empty());
    assert_eq!(h.engine.started(), 2);
    assert_eq!(h.engine.request(1).path, PathBuf::from(APP));
}

#[tokio::test]
async fn test_manifest_discovered_twice_is_watched_once() {
    let h = Harness::new();
    let (mut orch, mut rx) = h.orchestrator();
    let other = Document::new("/p/src/util.js", "javascript", "require('react');");

    let _ = orch.handle(focus(app()));
    let _ = orch.handle(EditorEvent::DocumentChanged(other).into());
    h.engine.emit(0, SessionEvent::Package(PathBuf::from(MANIFEST)));
    h.engine.emit(1, SessionEvent::Package(PathBuf::from(MANIFEST)));
    settle(&mut orch, &mut rx).await;

    assert_eq!(h.watcher.watch_count(), 1);
    assert_eq!(orch.watchers().len(), 1);
}

#[tokio::test]
async fn test_failed_watch_is_retried_on_next_discovery() {
    let h = Harness::new();
    let (mut orch, mut rx) = h.orchestrator();

    h.watcher.set_fail_setup(true);
    let _ = orch.handle(focus(app()));
    h.engine.emit(0, SessionEvent::Package(PathBuf::from(MANIFEST)));
    settle(&mut orch, &mut rx).await;
    assert!(orch.watchers().is_empty());

    h.watcher.set_fail_setup(false);
    let _ = orch.handle(focus(app()));
    h.engine.emit(1, SessionEvent::Package(PathBuf::from(MANIFEST)));
    settle(&mut orch, &mut rx).await;
    assert!(orch.watchers().is_watching(Path::new(MANIFEST)));
}

#[tokio::test]
async fn test_toggle_suppresses_and_restores() {
    let h = Harness::new();
    let (mut orch, mut rx) = h.orchestrator();

    let _ = orch.handle(focus(app()));
    let _ = orch.handle(Command::Toggle.into());
    assert!(!orch.is_active());
    assert!(orch.sessions().is_empty());
    assert!(h.recorder.calls().contains(&Call::ClearAllDecorations));

    // The detached session keeps producing; nothing reaches the renderers.
    play_lodash(&h, 0);
    let other = Document::new("/p/src/other.ts", "typescript", "import 'react';");
    let _ = orch.handle(focus(other.clone()));
    settle(&mut orch, &mut rx).await;
    assert!(h.renders().is_empty());
    assert_eq!(h.engine.started(), 1);

    let _ = orch.handle(Command::Toggle.into());
    assert!(orch.is_active());
    assert_eq!(h.engine.started(), 2);
    assert_eq!(h.engine.request(1).path, other.path);
    assert_eq!(h.cache.invalidations(), 0);

    // The restored session renders again
    let react = PackageInfo::pending("react", 0);
    let sized = react.clone().with_size(2048);
    h.engine.emit(1, SessionEvent::Start(vec![react.clone()]));
    h.engine.emit(1, SessionEvent::Done(vec![sized.clone()]));
    h.engine.close(1);
    settle(&mut orch, &mut rx).await;
    assert_eq!(
        h.renders(),
        vec![
            Call::Pending {
                path: other.path.clone(),
                packages: vec![react],
            },
            Call::Final {
                path: other.path.clone(),
                packages: vec![sized.clone()],
            },
            Call::Vulnerabilities {
                path: other.path.clone(),
                packages: vec![sized],
                newly_shown: vec![],
            },
        ]
    );
}

#[tokio::test]
async fn test_closed_document_stops_rendering() {
    let h = Harness::new();
    let (mut orch, mut rx) = h.orchestrator();
    let other = Document::new("/p/src/other.ts", "typescript", "import 'react';");
    let app_path = PathBuf::from(APP);

    let _ = orch.handle(focus(app()));
    let _ = orch.handle(focus(other.clone()));
    let _ = orch.handle(
        EditorEvent::DocumentClosed {
            path: app_path.clone(),
            focus: Some(other.clone()),
        }
        .into(),
    );
    assert_eq!(orch.sessions().generation(&app_path), None);
    assert_eq!(orch.current_document(), Some(&other));

    // The closed document's session keeps producing; nothing is rendered
    play_lodash(&h, 0);
    settle(&mut orch, &mut rx).await;
    assert!(h.renders().is_empty());
    assert!(orch.watchers().is_empty());
    let calls = h.recorder.calls();
    assert!(calls.contains(&Call::ForgetDecorations {
        path: app_path.clone()
    }));
    assert!(calls.contains(&Call::ClearDiagnostics { path: app_path }));

    let _ = orch.handle(Command::Check.into());
    assert_eq!(h.engine.started(), 3);
    assert_eq!(h.engine.request(2).path, other.path);
}

#[tokio::test]
async fn test_closing_current_document_hands_focus_over() {
    let h = Harness::new();
    let (mut orch, _rx) = h.orchestrator();
    let other = Document::new("/p/src/other.ts", "typescript", "import 'react';");

    let _ = orch.handle(focus(app()));
    let _ = orch.handle(
        EditorEvent::DocumentClosed {
            path: PathBuf::from(APP),
            focus: Some(other.clone()),
        }
        .into(),
    );
    assert_eq!(orch.current_document(), Some(&other));

    let _ = orch.handle(Command::Check.into());
    assert_eq!(h.engine.started(), 2);
    assert_eq!(h.engine.request(1).path, other.path);

    let _ = orch.handle(
        EditorEvent::DocumentClosed {
            path: other.path.clone(),
            focus: None,
        }
        .into(),
    );
    assert!(orch.current_document().is_none());
    assert!(orch.sessions().is_empty());

    let _ = orch.handle(Command::Check.into());
    assert_eq!(h.engine.started(), 2);
}

#[tokio::test]
async fn test_check_while_suppressed_only_invalidates() {
    let h = Harness::new();
    let (mut orch, mut rx) = h.orchestrator();

    let _ = orch.handle(focus(app()));
    let _ = orch.handle(Command::Toggle.into());
    let _ = orch.handle(Command::Check.into());
    settle(&mut orch, &mut rx).await;

    assert_eq!(h.cache.invalidations(), 1);
    assert_eq!(h.engine.started(), 1);

    let _ = orch.handle(Command::Toggle.into());
    let _ = orch.handle(Command::Check.into());
    assert_eq!(h.cache.invalidations(), 2);
    assert_eq!(h.engine.started(), 3);
}

#[tokio::test]
async fn test_start_analyzes_already_open_document() {
    let h = Harness::new();
    let (mut orch, _rx) = h.orchestrator();

    orch.start();
    assert_eq!(h.engine.started(), 0);

    orch.set_current_document(Some(app()));
    orch.start();
    assert_eq!(h.engine.started(), 1);
}

#[tokio::test]
async fn test_sign_in_when_already_signed_in() {
    let h = Harness::new();
    h.credentials.store(Credential::new("existing")).unwrap();
    let (mut orch, mut rx) = h.orchestrator();

    let _ = orch.handle(Command::SignIn.into());
    settle(&mut orch, &mut rx).await;

    assert_eq!(
        h.recorder.calls(),
        vec![
            Call::Track("signIn".to_string()),
            Call::Info("Already signed in.".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_sign_in_stores_token_and_rechecks() {
    let h = Harness::new();
    let (mut orch, mut rx) = h.orchestrator();
    let _ = orch.handle(focus(app()));

    let _ = orch.handle(Command::SignIn.into());
    assert!(orch.is_sign_in_pending());
    settle(&mut orch, &mut rx).await;

    assert!(!orch.is_sign_in_pending());
    assert!(h.is_signed_in());
    assert_eq!(
        h.credentials.load().map(|c| c.token),
        Some("api-token".to_string())
    );

    let token = h.authenticator.tokens_seen.lock()[0].clone();
    let calls = h.recorder.calls();
    assert!(calls.contains(&Call::Open(format!(
        "https://app.example.com/login?token={}",
        token
    ))));
    assert!(calls.contains(&Call::Info("Signed in.".to_string())));
    assert_eq!(h.cache.invalidations(), 1);
    assert_eq!(h.engine.started(), 2);
}

#[tokio::test]
async fn test_sign_in_failure_reports_error() {
    let h = Harness::with_authenticator(FakeAuthenticator::failing("timed out"));
    let (mut orch, mut rx) = h.orchestrator();

    let _ = orch.handle(Command::SignIn.into());
    settle(&mut orch, &mut rx).await;

    assert!(!h.is_signed_in());
    assert!(!orch.is_sign_in_pending());
    assert!(h
        .recorder
        .calls()
        .iter()
        .any(|call| matches!(call, Call::Error(msg) if msg.starts_with("Sign-in failed"))));
}

#[tokio::test]
async fn test_concurrent_sign_in_is_refused() {
    let gate = Arc::new(Notify::new());
    let h = Harness::with_authenticator(FakeAuthenticator::gated("late-token", gate.clone()));
    let (mut orch, mut rx) = h.orchestrator();

    let _ = orch.handle(Command::SignIn.into());
    let _ = orch.handle(Command::SignIn.into());
    assert!(h
        .recorder
        .calls()
        .contains(&Call::Info("Sign-in is already in progress.".to_string())));
    assert_eq!(h.authenticator.tokens_seen.lock().len(), 1);

    gate.notify_one();
    settle(&mut orch, &mut rx).await;
    assert!(h.is_signed_in());
}

#[tokio::test]
async fn test_sign_out_forgets_credential() {
    let h = Harness::new();
    h.credentials.store(Credential::new("existing")).unwrap();
    let (mut orch, _rx) = h.orchestrator();

    let _ = orch.handle(Command::SignOut.into());

    assert!(!h.is_signed_in());
    assert!(h.recorder.calls().contains(&Call::Info("Signed out.".to_string())));
}

#[tokio::test]
async fn test_show_output() {
    let h = Harness::new();
    let (mut orch, _rx) = h.orchestrator();

    let _ = orch.handle(Command::ShowOutput(None).into());
    let _ = orch.handle(
        Command::ShowOutput(Some(ReportItem {
            title: "lodash@4.17.15".to_string(),
            report: "1 high severity vulnerability".to_string(),
        }))
        .into(),
    );

    assert_eq!(
        h.recorder.calls(),
        vec![
            Call::Track("showOutput".to_string()),
            Call::Reveal,
            Call::Track("showOutput".to_string()),
            Call::Append("lodash@4.17.15\n1 high severity vulnerability".to_string()),
            Call::Reveal,
        ]
    );
}

#[tokio::test]
async fn test_open_vuln_page() {
    let h = Harness::new();
    let (mut orch, _rx) = h.orchestrator();

    let _ = orch.handle(Command::OpenVulnPage("lodash".to_string()).into());
    let _ = orch.handle(Command::OpenVulnPage(String::new()).into());

    let calls = h.recorder.calls();
    assert_eq!(
        calls[1],
        Call::Open(
            "https://snyk.io/test/npm/lodash?utm_medium=referral&utm_source=heft&utm_campaign=editor"
                .to_string()
        )
    );
    assert!(matches!(calls.last(), Some(Call::Error(_))));
}

#[tokio::test]
async fn test_every_command_is_tracked() {
    let h = Harness::new();
    let (mut orch, _rx) = h.orchestrator();

    for command in [
        Command::Check,
        Command::Toggle,
        Command::Toggle,
        Command::SignOut,
        Command::ShowOutput(None),
        Command::OpenVulnPage("react".to_string()),
    ] {
        let _ = orch.handle(command.into());
    }

    let tracked: Vec<String> = h
        .recorder
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Track(action) => Some(action),
            _ => None,
        })
        .collect();
    assert_eq!(
        tracked,
        vec!["check", "toggle", "toggle", "signOut", "showOutput", "openVulnPage"]
    );
}

#[tokio::test]
async fn test_shutdown_breaks_the_loop() {
    let h = Harness::new();
    let (tx, rx) = heft_orchestrator::inbox();
    let orch = heft_orchestrator::Orchestrator::new(h.collaborators(), tx.clone());
    let task = tokio::spawn(orch.run(rx));

    tx.send(focus(app())).unwrap();
    tx.send(Input::Shutdown).unwrap();

    tokio::time::timeout(std::time::Duration::from_secs(1), task)
        .await
        .expect("run should stop after shutdown")
        .unwrap();
    assert_eq!(h.engine.started(), 1);
}
