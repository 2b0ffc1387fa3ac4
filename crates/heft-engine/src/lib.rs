//! Analysis engine for heft.
//!
//! Implements [`heft_core::AnalysisEngine`]: given a document it extracts the
//! packages the document pulls in (imports, CDN script tags, `package.json`
//! entries) and resolves their install size and advisories, or scans
//! Kubernetes manifests for risky settings.
//!
//! ```text
//! AnalysisRequest ──▶ extract ──▶ Start(pending)
//!                        │
//!                        ├──▶ resolve (SizeCache → PackageResolver) ──▶ Calculated × n
//!                        └──▶ Done(resolved)
//! ```

pub mod cache;
pub mod engine;
pub mod error;
pub mod iac;
pub mod imports;
pub mod manifest;
pub mod markup;
pub mod resolver;

pub use cache::SizeCache;
pub use engine::{HeftEngine, DEFAULT_CONCURRENCY};
pub use error::{EngineError, Result};
pub use iac::{scan_infrastructure, IacScan, Rule};
pub use imports::{extract_imports, package_name, ImportRef};
pub use manifest::{extract_manifest_dependencies, lookup_version};
pub use markup::extract_markup_imports;
pub use resolver::PackageResolver;
