//! Heft Core - Shared types for the import cost pipeline.
//!
//! This crate provides the foundational types and traits shared by every
//! other heft crate. It defines:
//!
//! - [`Document`] and [`Category`]: what the editor hands us and how it is classified
//! - [`PackageInfo`], [`Vulnerability`], [`IacIssue`]: the results an analysis produces
//! - [`SessionEvent`]: the event contract of one analysis run
//! - [`AnalysisEngine`] and [`CostCache`]: the seam to the resolution engine
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌─────────────┐
//! │ heft-lsp/cli     │   │ heft-engine │  (hosts / resolution engine)
//! └────────┬─────────┘   └──────┬──────┘
//!          │                    │
//!          ▼                    │
//! ┌──────────────────┐          │
//! │heft-orchestrator │◄─────────┘  (sessions, routing, watchers)
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │   heft-core      │  (This crate - shared types)
//! └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use heft_core::{Category, Document};
//!
//! let doc = Document::new("/project/src/index.ts", "typescript", "import React from 'react';");
//! assert!(!doc.is_dirty);
//! assert!(Category::TypeScript.is_package_route());
//! ```

pub mod engine;
pub mod error;
pub mod format;
pub mod types;

// Re-export core types for convenience
pub use engine::{AnalysisEngine, AnalysisRequest, CostCache, SessionStream};
pub use error::{Error, Result};
pub use format::format_bytes;
pub use types::{
    Category, Document, IacIssue, PackageInfo, ReportItem, SessionEvent, Severity, Vulnerability,
};
