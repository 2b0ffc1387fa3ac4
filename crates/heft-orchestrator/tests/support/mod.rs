//! Shared fakes for the orchestrator scenario tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::StreamExt;
use heft_config::{CredentialStore, MemoryCredentialStore, SharedConfig};
use heft_core::{AnalysisEngine, AnalysisRequest, CostCache, SessionEvent, SessionStream};
use heft_fs::ManualWatcher;
use heft_info::Authenticator;
use heft_orchestrator::{Call, Collaborators, InboxReceiver, Orchestrator, Recorder};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use url::Url;

pub const VULN_REGISTRY: &str = "https://snyk.io";

/// Engine whose sessions are fed by the test.
#[derive(Debug, Default)]
pub struct ControlledEngine {
    sessions: Mutex<Vec<(AnalysisRequest, mpsc::UnboundedSender<SessionEvent>)>>,
}

impl ControlledEngine {
    pub fn started(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn request(&self, index: usize) -> AnalysisRequest {
        self.sessions.lock()[index].0.clone()
    }

    pub fn emit(&self, index: usize, event: SessionEvent) {
        let _ = self.sessions.lock()[index].1.unbounded_send(event);
    }

    pub fn close(&self, index: usize) {
        self.sessions.lock()[index].1.close_channel();
    }
}

impl AnalysisEngine for ControlledEngine {
    fn name(&self) -> &str {
        "controlled"
    }

    fn start(&self, request: AnalysisRequest) -> SessionStream {
        let (tx, rx) = mpsc::unbounded();
        self.sessions.lock().push((request, tx));
        rx.boxed()
    }
}

#[derive(Debug, Default)]
pub struct CountingCache {
    invalidations: AtomicUsize,
}

impl CountingCache {
    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

impl CostCache for CountingCache {
    fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}

/// Authenticator answering with a fixed result, optionally after a gate opens.
#[derive(Default)]
pub struct FakeAuthenticator {
    result: Mutex<Option<Result<String, String>>>,
    gate: Option<Arc<Notify>>,
    pub tokens_seen: Mutex<Vec<String>>,
}

impl FakeAuthenticator {
    pub fn approving(token: &str) -> Self {
        Self {
            result: Mutex::new(Some(Ok(token.to_string()))),
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Mutex::new(Some(Err(message.to_string()))),
            ..Default::default()
        }
    }

    pub fn gated(token: &str, gate: Arc<Notify>) -> Self {
        Self {
            result: Mutex::new(Some(Ok(token.to_string()))),
            gate: Some(gate),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Authenticator for FakeAuthenticator {
    fn login_url(&self, session_token: &str) -> heft_info::Result<Url> {
        self.tokens_seen.lock().push(session_token.to_string());
        Ok(Url::parse(&format!("https://app.example.com/login?token={}", session_token))?)
    }

    async fn wait_for_token(&self, _session_token: &str) -> heft_info::Result<String> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match self.result.lock().clone() {
            Some(Ok(token)) => Ok(token),
            Some(Err(message)) => Err(heft_info::Error::other(message)),
            None => Err(heft_info::Error::AuthTimeout(0)),
        }
    }
}

pub struct Harness {
    pub recorder: Arc<Recorder>,
    pub engine: Arc<ControlledEngine>,
    pub cache: Arc<CountingCache>,
    pub credentials: Arc<MemoryCredentialStore>,
    pub watcher: Arc<ManualWatcher>,
    pub authenticator: Arc<FakeAuthenticator>,
    pub config: SharedConfig,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_authenticator(FakeAuthenticator::approving("api-token"))
    }

    pub fn with_authenticator(authenticator: FakeAuthenticator) -> Self {
        Self {
            recorder: Arc::new(Recorder::new()),
            engine: Arc::new(ControlledEngine::default()),
            cache: Arc::new(CountingCache::default()),
            credentials: Arc::new(MemoryCredentialStore::new()),
            watcher: Arc::new(ManualWatcher::new()),
            authenticator: Arc::new(authenticator),
            config: SharedConfig::default(),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            engine: self.engine.clone(),
            cache: self.cache.clone(),
            config: Arc::new(self.config.clone()),
            credentials: self.credentials.clone(),
            watcher: self.watcher.clone(),
            authenticator: self.authenticator.clone(),
            decorations: self.recorder.clone(),
            diagnostics: self.recorder.clone(),
            telemetry: self.recorder.clone(),
            messenger: self.recorder.clone(),
            output: self.recorder.clone(),
            opener: self.recorder.clone(),
            vuln_registry_url: VULN_REGISTRY.to_string(),
        }
    }

    pub fn orchestrator(&self) -> (Orchestrator, InboxReceiver) {
        let (tx, rx) = heft_orchestrator::inbox();
        (Orchestrator::new(self.collaborators(), tx), rx)
    }

    /// Rendering calls only (no telemetry or messages).
    pub fn renders(&self) -> Vec<Call> {
        self.recorder.calls().into_iter().filter(Call::is_render).collect()
    }

    pub fn is_signed_in(&self) -> bool {
        self.credentials.is_authenticated()
    }
}

/// Handles queued inputs until the inbox stays quiet.
pub async fn settle(orchestrator: &mut Orchestrator, rx: &mut InboxReceiver) {
    while let Ok(Some(input)) = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await {
        let _ = orchestrator.handle(input);
    }
}
