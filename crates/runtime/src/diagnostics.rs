//! Diagnostics sink injected into the runtime by its host.
//!
//! Hook failures, rejected compositions and lifecycle anomalies are absorbed
//! by the runtime so a session keeps going. They are reported here instead of
//! being dropped. The host owns the sink and decides where reports go.

use std::sync::Mutex;

use tracing::{debug, error, warn};
use workout_core::BlockKey;

use crate::behavior::HookKind;
use crate::block::BlockPhase;

/// One absorbed problem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// A behavior hook returned an error; its actions were discarded.
    HookFailed {
        block: BlockKey,
        label: String,
        behavior: &'static str,
        hook: HookKind,
        error: String,
    },
    /// A block failed composition validation and was never pushed.
    CompositionRejected { label: String, errors: Vec<String> },
    /// A child group could not be compiled.
    CompileFailed {
        parent: Option<BlockKey>,
        error: String,
    },
    /// A lifecycle hook was requested out of order and ignored.
    LifecycleViolation {
        block: BlockKey,
        phase: BlockPhase,
        attempted: HookKind,
    },
    /// An action returned an error.
    ActionFailed { action: &'static str, error: String },
    /// The action queue exceeded its per-cycle budget and was cleared.
    DrainBudgetExceeded { executed: usize },
}

/// Receives diagnostics from the runtime.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn report(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::HookFailed {
                block,
                label,
                behavior,
                hook,
                error,
            } => error!(
                target: "runtime::behavior",
                %block,
                label = %label,
                behavior,
                hook = %hook,
                error = %error,
                "Behavior hook failed, continuing"
            ),
            Diagnostic::CompositionRejected { label, errors } => warn!(
                target: "runtime::validation",
                label = %label,
                errors = ?errors,
                "Block rejected by composition validator"
            ),
            Diagnostic::CompileFailed { parent, error } => warn!(
                target: "runtime::compiler",
                parent = ?parent,
                error = %error,
                "Child group failed to compile"
            ),
            Diagnostic::LifecycleViolation {
                block,
                phase,
                attempted,
            } => debug!(
                target: "runtime::block",
                %block,
                phase = %phase,
                attempted = %attempted,
                "Ignoring out-of-order lifecycle call"
            ),
            Diagnostic::ActionFailed { action, error } => warn!(
                target: "runtime::actions",
                action,
                error = %error,
                "Action failed"
            ),
            Diagnostic::DrainBudgetExceeded { executed } => error!(
                target: "runtime::actions",
                executed,
                "Action budget exceeded, remaining actions dropped"
            ),
        }
    }
}

/// Keeps every diagnostic in memory. Useful for hosts that surface problems
/// in their own UI, and for tests.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    entries: Mutex<Vec<Diagnostic>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of everything reported so far.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.is_empty())
            .unwrap_or(true)
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn report(&self, diagnostic: &Diagnostic) {
        TracingDiagnostics.report(diagnostic);
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(diagnostic.clone());
        }
    }
}
