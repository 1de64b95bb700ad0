//! Per-call evaluation context.

use crate::error_map::{resolve_message, ErrorMap, ErrorMapCtx};
use crate::issue::{Issue, IssueData, PathSegment};
use crate::status::Status;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// How a parse call resolves async effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Every node must resolve immediately; async effects panic.
    Sync,
    /// Async effects are awaited; sibling elements run concurrently.
    Async,
}

/// Options for one parse call.
#[derive(Clone, Default)]
pub struct ParseParams {
    /// Prefix prepended to every issue path.
    pub path: Vec<PathSegment>,
    /// Contextual error map; takes precedence over schema maps.
    pub error_map: Option<ErrorMap>,
}

impl ParseParams {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    #[must_use]
    pub fn error_map<F>(mut self, map: F) -> Self
    where
        F: Fn(&IssueData, &ErrorMapCtx<'_>) -> String + Send + Sync + 'static,
    {
        self.error_map = Some(Arc::new(map));
        self
    }
}

impl fmt::Debug for ParseParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseParams")
            .field("path", &self.path)
            .field("error_map", &self.error_map.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

struct Shared {
    issues: Mutex<Vec<Issue>>,
    mode: Mode,
    contextual: Option<ErrorMap>,
}

/// Context handed down the schema tree.
///
/// Children get their own path by appending to the parent's; the issue sink
/// is shared by every node of the call.
#[derive(Clone)]
pub(crate) struct Ctx {
    shared: Arc<Shared>,
    path: Vec<PathSegment>,
    schema_map: Option<ErrorMap>,
}

impl Ctx {
    pub(crate) fn root(mode: Mode, params: ParseParams) -> Self {
        Self {
            shared: Arc::new(Shared {
                issues: Mutex::new(Vec::new()),
                mode,
                contextual: params.error_map,
            }),
            path: params.path,
            schema_map: None,
        }
    }

    pub(crate) fn mode(&self) -> Mode {
        self.shared.mode
    }

    pub(crate) fn path(&self) -> &[PathSegment] {
        &self.path
    }

    pub(crate) fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend_from_slice(&self.path);
        path.push(segment.into());
        Self {
            shared: Arc::clone(&self.shared),
            path,
            schema_map: self.schema_map.clone(),
        }
    }

    /// Context for a node carrying its own error map.
    pub(crate) fn for_node(&self, map: Option<&ErrorMap>) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            path: self.path.clone(),
            schema_map: map.cloned(),
        }
    }

    /// Same path and maps, separate issue sink.
    pub(crate) fn isolated(&self) -> Self {
        Self {
            shared: Arc::new(Shared {
                issues: Mutex::new(Vec::new()),
                mode: self.shared.mode,
                contextual: self.shared.contextual.clone(),
            }),
            path: self.path.clone(),
            schema_map: self.schema_map.clone(),
        }
    }

    /// Resolve the message of `data` and record it.
    pub(crate) fn add_issue(&self, input: Option<&Value>, mut data: IssueData) {
        let mut path = self.path.clone();
        path.append(&mut data.path);
        data.path = path;

        let message = resolve_message(
            &data,
            input,
            [
                self.shared.contextual.as_ref(),
                self.schema_map.as_ref(),
            ],
        );
        tracing::trace!(code = data.code.name(), path = ?data.path, "issue recorded");
        self.lock().push(Issue {
            code: data.code,
            path: data.path,
            message,
        });
    }

    pub(crate) fn extend_issues(&self, issues: Vec<Issue>) {
        self.lock().extend(issues);
    }

    pub(crate) fn take_issues(&self) -> Vec<Issue> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Issue>> {
        self.shared
            .issues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle passed to refinements and conversions for recording issues.
pub struct RefinementCtx {
    ctx: Ctx,
    input: Option<Value>,
    status: Status,
}

impl RefinementCtx {
    pub(crate) fn new(ctx: Ctx, input: Option<Value>) -> Self {
        Self {
            ctx,
            input,
            status: Status::Valid,
        }
    }

    /// Record an issue. A fatal issue aborts the node; any other dirties it.
    pub fn add_issue(&mut self, issue: IssueData) {
        if issue.fatal {
            self.status.abort();
        } else {
            self.status.dirty();
        }
        self.ctx.add_issue(self.input.as_ref(), issue);
    }

    /// Path of the node being refined.
    pub fn path(&self) -> &[PathSegment] {
        self.ctx.path()
    }

    pub(crate) fn status(&self) -> Status {
        self.status
    }
}

impl fmt::Debug for RefinementCtx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefinementCtx")
            .field("path", &self.ctx.path)
            .field("status", &self.status)
            .finish()
    }
}
