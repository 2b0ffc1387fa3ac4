//! Analysis engine trait and cost cache seam.

use crate::types::{Category, SessionEvent};
use futures::stream::BoxStream;
use std::fmt;
use std::path::PathBuf;

/// Stream of events produced by one analysis session.
pub type SessionStream = BoxStream<'static, SessionEvent>;

/// Input to one analysis session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// Document path the session analyzes.
    pub path: PathBuf,
    /// Document text at the time the session was started.
    pub text: String,
    pub category: Category,
}

/// Trait for the engine that resolves import costs and IaC issues.
///
/// Engines are responsible for:
/// - Extracting packages (or infrastructure resources) from the text
/// - Resolving their cost asynchronously
/// - Reporting progress as a stream of [`SessionEvent`]s
///
/// `start` must not block: the work runs in the background and the returned
/// stream yields events as they become available. Dropping the stream stops
/// observation but is not required to stop the computation.
///
/// # Examples
///
/// ```
/// use heft_core::{AnalysisEngine, AnalysisRequest, SessionEvent, SessionStream};
/// use futures::stream::{self, StreamExt};
///
/// #[derive(Debug)]
/// struct Silent;
///
/// impl AnalysisEngine for Silent {
///     fn name(&self) -> &str {
///         "silent"
///     }
///
///     fn start(&self, _request: AnalysisRequest) -> SessionStream {
///         stream::iter(vec![SessionEvent::Start(vec![]), SessionEvent::Done(vec![])]).boxed()
///     }
/// }
/// ```
pub trait AnalysisEngine: Send + Sync + fmt::Debug {
    /// Returns the engine name, used in logs.
    fn name(&self) -> &str;

    /// Starts a session for the given request.
    fn start(&self, request: AnalysisRequest) -> SessionStream;
}

/// Global cache of resolved package costs.
pub trait CostCache: Send + Sync {
    /// Drops every cached entry.
    fn invalidate(&self);
}
