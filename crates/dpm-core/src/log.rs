//! Scoped, per-project logging context.
//!
//! §5 calls for "a process-wide context tag ... set at project entry and
//! cleared at exit for log attribution" and Design Note 9 asks for that to be
//! "a guarded scoped-acquisition primitive that unconditionally clears on
//! exit" rather than a global mutable variable. A `tracing::span` entered for
//! the lifetime of this guard satisfies both: the span is attached to every
//! log record emitted underneath it, and it is exited via `Drop` regardless
//! of which path (success, recovered error, panic-unwind) leaves the project.

use tracing::span::EnteredSpan;
use tracing::{info_span, Span};

/// Guard owning the tracing span for one project's pipeline run.
///
/// Holding this value keeps the span entered; dropping it exits the span.
/// There is deliberately no way to read back "the current project" from
/// global state — callers thread the guard (or just rely on its `Drop`)
/// rather than reaching for ambient context.
pub struct PipelineContext {
    _entered: EnteredSpan,
}

impl PipelineContext {
    /// Enter a new scoped logging context for `project`.
    pub fn enter(project: &str) -> Self {
        let span: Span = info_span!("project", project = %project);
        Self {
            _entered: span.entered(),
        }
    }
}
