//! Session driver: turns one analysis request into a stream of events.

use crate::cache::SizeCache;
use crate::error::{EngineError, Result};
use crate::iac::scan_infrastructure;
use crate::imports::{extract_imports, ImportRef};
use crate::manifest::extract_manifest_dependencies;
use crate::markup::extract_markup_imports;
use crate::resolver::PackageResolver;
use futures::stream::{self, StreamExt};
use heft_config::CredentialStore;
use heft_core::{AnalysisEngine, AnalysisRequest, Category, PackageInfo, SessionEvent, SessionStream};
use heft_fs::{find_upwards, FileSystem};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Default number of concurrent registry lookups per session.
pub const DEFAULT_CONCURRENCY: usize = 4;

const EVENT_BUFFER: usize = 64;

/// The heft analysis engine.
///
/// Every call to [`AnalysisEngine::start`] spawns a task that extracts the
/// packages of the document and resolves them through the shared
/// [`SizeCache`]. The task runs to completion even if the returned stream is
/// dropped, so abandoned sessions still warm the cache.
#[derive(Clone)]
pub struct HeftEngine {
    resolver: Arc<dyn PackageResolver>,
    credentials: Arc<dyn CredentialStore>,
    fs: Arc<dyn FileSystem>,
    cache: Arc<SizeCache>,
    concurrency: usize,
}

impl fmt::Debug for HeftEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeftEngine")
            .field("cached_sizes", &self.cache.len())
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

impl HeftEngine {
    pub fn new(
        resolver: Arc<dyn PackageResolver>,
        credentials: Arc<dyn CredentialStore>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            resolver,
            credentials,
            fs,
            cache: Arc::new(SizeCache::new()),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Use an existing cache instead of a private one.
    pub fn with_cache(mut self, cache: Arc<SizeCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// The size cache, for invalidation by the host.
    pub fn cache(&self) -> Arc<SizeCache> {
        Arc::clone(&self.cache)
    }

    async fn run(self, request: AnalysisRequest, tx: mpsc::Sender<SessionEvent>) {
        let session = Session { engine: self, tx };
        tracing::debug!(path = %request.path.display(), category = %request.category, "session started");

        match request.category {
            Category::Infrastructure => session.run_infrastructure(&request).await,
            _ => session.run_packages(&request).await,
        }

        tracing::debug!(path = %request.path.display(), "session finished");
    }
}

impl AnalysisEngine for HeftEngine {
    fn name(&self) -> &str {
        "heft"
    }

    fn start(&self, request: AnalysisRequest) -> SessionStream {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(self.clone().run(request, tx));
        ReceiverStream::new(rx).boxed()
    }
}

fn extract(category: Category, text: &str) -> Result<Vec<ImportRef>> {
    match category {
        Category::TypeScript | Category::JavaScript => Ok(extract_imports(text)),
        Category::Markup => Ok(extract_markup_imports(text)),
        Category::Manifest => extract_manifest_dependencies(text),
        Category::Infrastructure => Ok(Vec::new()),
    }
}

struct Session {
    engine: HeftEngine,
    tx: mpsc::Sender<SessionEvent>,
}

impl Session {
    async fn emit(&self, event: SessionEvent) {
        // A closed channel means nobody listens anymore; keep computing.
        if self.tx.send(event).await.is_err() {
            tracing::trace!("session stream dropped");
        }
    }

    async fn manifest_for(&self, request: &AnalysisRequest) -> Option<PathBuf> {
        if request.category == Category::Manifest {
            return Some(request.path.clone());
        }
        match find_upwards(self.engine.fs.as_ref(), &request.path, "package.json").await {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!(path = %request.path.display(), error = %e, "manifest lookup failed");
                None
            }
        }
    }

    async fn run_packages(&self, request: &AnalysisRequest) {
        if let Some(manifest) = self.manifest_for(request).await {
            self.emit(SessionEvent::Package(manifest)).await;
        }

        let refs = match extract(request.category, &request.text) {
            Ok(refs) => refs,
            Err(e) => {
                self.emit(SessionEvent::Error(e.to_string())).await;
                Vec::new()
            }
        };

        let pending: Vec<PackageInfo> = refs
            .into_iter()
            .map(|r| PackageInfo {
                version: r.version,
                ..PackageInfo::pending(r.name, r.line)
            })
            .collect();
        self.emit(SessionEvent::Start(pending.clone())).await;

        let token = self.engine.credentials.load().map(|c| c.token);
        let mut lookups = stream::iter(pending)
            .map(|pkg| self.resolve(pkg, token.as_deref()))
            .buffer_unordered(self.engine.concurrency);

        let mut resolved = Vec::new();
        while let Some((pkg, error)) = lookups.next().await {
            if let Some(e) = error {
                self.emit(SessionEvent::Error(e.to_string())).await;
            }
            self.emit(SessionEvent::Calculated(pkg.clone())).await;
            resolved.push(pkg);
        }

        resolved.sort_by_key(|pkg| pkg.line);
        self.emit(SessionEvent::Done(resolved)).await;
    }

    async fn resolve(
        &self,
        mut pkg: PackageInfo,
        token: Option<&str>,
    ) -> (PackageInfo, Option<EngineError>) {
        let requested = pkg.version.clone();
        let cache = &self.engine.cache;

        let size = match cache.get(&pkg.name, requested.as_deref()) {
            Some(size) => Ok(size),
            None => self
                .engine
                .resolver
                .size(&pkg.name, requested.as_deref())
                .await
                .inspect(|size| cache.insert(&pkg.name, requested.as_deref(), size.clone())),
        };

        match size {
            Ok(size) => {
                pkg.version = Some(size.version);
                pkg.size = Some(size.size);
            }
            Err(e) => {
                pkg.error = Some(e.to_string());
                let package = pkg.name.clone();
                return (pkg, Some(EngineError::Lookup { package, source: e }));
            }
        }

        if let (Some(token), Some(version)) = (token, pkg.version.clone()) {
            match self.engine.resolver.vulnerabilities(token, &pkg.name, &version).await {
                Ok(vulnerabilities) => pkg.vulnerabilities = vulnerabilities,
                Err(e) => {
                    tracing::warn!(package = %pkg.name, error = %e, "vulnerability lookup failed")
                }
            }
        }

        (pkg, None)
    }

    async fn run_infrastructure(&self, request: &AnalysisRequest) {
        self.emit(SessionEvent::Start(Vec::new())).await;

        let scan = scan_infrastructure(&request.text);
        for error in scan.errors {
            self.emit(SessionEvent::Error(error.to_string())).await;
        }
        for issue in scan.issues {
            self.emit(SessionEvent::CalculatedIac(issue)).await;
        }

        self.emit(SessionEvent::Done(Vec::new())).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use heft_config::{Credential, MemoryCredentialStore};
    use heft_core::{CostCache, Severity, Vulnerability};
    use heft_fs::MemoryFileSystem;
    use heft_info::PackageSize;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct FakeResolver {
        sizes: HashMap<String, (String, u64)>,
        size_calls: AtomicUsize,
        vuln_calls: AtomicUsize,
    }

    impl FakeResolver {
        fn with(packages: &[(&str, &str, u64)]) -> Self {
            Self {
                sizes: packages
                    .iter()
                    .map(|(n, v, s)| (n.to_string(), (v.to_string(), *s)))
                    .collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl PackageResolver for FakeResolver {
        async fn size(&self, name: &str, _version: Option<&str>) -> heft_info::Result<PackageSize> {
            self.size_calls.fetch_add(1, Ordering::SeqCst);
            let (version, size) = self
                .sizes
                .get(name)
                .cloned()
                .ok_or_else(|| heft_info::Error::PackageNotFound(name.to_string(), "npm".to_string()))?;
            Ok(PackageSize {
                name: name.to_string(),
                version,
                size,
            })
        }

        async fn vulnerabilities(
            &self,
            _token: &str,
            name: &str,
            version: &str,
        ) -> heft_info::Result<Vec<Vulnerability>> {
            self.vuln_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Vulnerability {
                id: format!("VULN-{}", name),
                title: "Prototype Pollution".to_string(),
                severity: Severity::High,
                package_name: name.to_string(),
                version: version.to_string(),
                url: None,
            }])
        }
    }

    fn engine(resolver: Arc<FakeResolver>, credentials: MemoryCredentialStore) -> HeftEngine {
        let fs = MemoryFileSystem::with_files([("/proj/package.json", "{}")]);
        HeftEngine::new(resolver, Arc::new(credentials), Arc::new(fs))
    }

    fn request(path: &str, text: &str, category: Category) -> AnalysisRequest {
        AnalysisRequest {
            path: PathBuf::from(path),
            text: text.to_string(),
            category,
        }
    }

    #[tokio::test]
    async fn test_package_session_event_order() {
        let resolver = Arc::new(FakeResolver::with(&[
            ("lodash", "4.17.21", 1_412_415),
            ("react", "18.2.0", 316_000),
        ]));
        let engine = engine(resolver, MemoryCredentialStore::new());

        let events: Vec<SessionEvent> = engine
            .start(request(
                "/proj/src/app.ts",
                "import _ from 'lodash';\nimport React from 'react';\n",
                Category::TypeScript,
            ))
            .collect()
            .await;

        let kinds: Vec<&str> = events.iter().map(SessionEvent::kind).collect();
        assert_eq!(kinds, vec!["package", "start", "calculated", "calculated", "done"]);
        assert_eq!(events[0], SessionEvent::Package(PathBuf::from("/proj/package.json")));

        let SessionEvent::Start(pending) = &events[1] else {
            panic!("expected start");
        };
        assert!(pending.iter().all(|p| !p.is_resolved()));

        let SessionEvent::Done(done) = &events[4] else {
            panic!("expected done");
        };
        let names: Vec<&str> = done.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["lodash", "react"]);
        assert_eq!(done[0].size, Some(1_412_415));
        assert_eq!(done[0].version.as_deref(), Some("4.17.21"));
        assert!(done[0].vulnerabilities.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_reported_per_package() {
        let resolver = Arc::new(FakeResolver::with(&[("react", "18.2.0", 316_000)]));
        let engine = engine(resolver, MemoryCredentialStore::new());

        let events: Vec<SessionEvent> = engine
            .start(request(
                "/elsewhere/app.js",
                "const a = require('react');\nconst b = require('nope-not-here');\n",
                Category::JavaScript,
            ))
            .collect()
            .await;

        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::Error(msg) if msg.contains("nope-not-here"))));
        assert!(!events.iter().any(|e| matches!(e, SessionEvent::Package(_))));

        let Some(SessionEvent::Done(done)) = events.last() else {
            panic!("expected done last");
        };
        assert_eq!(done.len(), 2);
        assert!(done[1].error.is_some());
        assert!(done[1].is_resolved());
    }

    #[tokio::test]
    async fn test_cache_reuse_and_invalidation() {
        let resolver = Arc::new(FakeResolver::with(&[("lodash", "4.17.21", 10)]));
        let engine = engine(Arc::clone(&resolver), MemoryCredentialStore::new());
        let req = request("/proj/a.ts", "import 'lodash';", Category::TypeScript);

        let _: Vec<_> = engine.start(req.clone()).collect().await;
        let _: Vec<_> = engine.start(req.clone()).collect().await;
        assert_eq!(resolver.size_calls.load(Ordering::SeqCst), 1);

        engine.cache().invalidate();
        let _: Vec<_> = engine.start(req).collect().await;
        assert_eq!(resolver.size_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_vulnerabilities_need_credential() {
        let resolver = Arc::new(FakeResolver::with(&[("minimist", "0.0.8", 20)]));
        let req = request("/proj/a.js", "require('minimist')", Category::JavaScript);

        let anonymous = engine(Arc::clone(&resolver), MemoryCredentialStore::new());
        let _: Vec<_> = anonymous.start(req.clone()).collect().await;
        assert_eq!(resolver.vuln_calls.load(Ordering::SeqCst), 0);

        let signed_in = engine(
            Arc::clone(&resolver),
            MemoryCredentialStore::with_credential(Credential::new("tok")),
        );
        let events: Vec<_> = signed_in.start(req).collect().await;
        let Some(SessionEvent::Done(done)) = events.last() else {
            panic!("expected done last");
        };
        assert_eq!(done[0].max_severity(), Some(Severity::High));
    }

    #[tokio::test]
    async fn test_manifest_session_watches_itself() {
        let resolver = Arc::new(FakeResolver::with(&[("lodash", "4.17.21", 10)]));
        let engine = engine(resolver, MemoryCredentialStore::new());

        let events: Vec<_> = engine
            .start(request(
                "/proj/package.json",
                "{\n  \"dependencies\": {\n    \"lodash\": \"^4.17.21\"\n  }\n}",
                Category::Manifest,
            ))
            .collect()
            .await;

        assert_eq!(events[0], SessionEvent::Package(PathBuf::from("/proj/package.json")));
        let SessionEvent::Start(pending) = &events[1] else {
            panic!("expected start");
        };
        assert_eq!(pending[0].line, 2);
        assert_eq!(pending[0].version.as_deref(), Some("4.17.21"));
    }

    #[tokio::test]
    async fn test_infrastructure_session() {
        let engine = engine(Arc::new(FakeResolver::default()), MemoryCredentialStore::new());
        let text = "kind: Pod\nspec:\n  hostPID: true\n  securityContext:\n    runAsNonRoot: true\n";

        let events: Vec<_> = engine
            .start(request("/proj/pod.yaml", text, Category::Infrastructure))
            .collect()
            .await;

        let kinds: Vec<&str> = events.iter().map(SessionEvent::kind).collect();
        assert_eq!(kinds, vec!["start", "calculatedIaC", "done"]);
        assert_eq!(events[0], SessionEvent::Start(vec![]));
    }

    #[tokio::test]
    async fn test_dropped_stream_still_warms_cache() {
        let resolver = Arc::new(FakeResolver::with(&[("lodash", "4.17.21", 10)]));
        let engine = engine(resolver, MemoryCredentialStore::new());

        drop(engine.start(request("/proj/a.ts", "import 'lodash';", Category::TypeScript)));

        let cache = engine.cache();
        tokio::time::timeout(Duration::from_secs(5), async {
            while cache.is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }
}
