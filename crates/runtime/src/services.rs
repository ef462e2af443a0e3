//! Shared session state handed to block hooks.

use std::sync::Arc;

use workout_core::{MemoryStore, OutputLog};

use crate::clock::Clock;
use crate::diagnostics::DiagnosticSink;
use crate::events::EventBus;

/// Everything a hook may touch besides its own block. Kept apart from the
/// stack so a block can be borrowed mutably alongside it.
pub(crate) struct Services {
    pub memory: MemoryStore,
    pub bus: EventBus,
    pub output: OutputLog,
    pub clock: Box<dyn Clock>,
    pub diagnostics: Arc<dyn DiagnosticSink>,
}

impl Services {
    pub fn new(clock: Box<dyn Clock>, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            memory: MemoryStore::new(),
            bus: EventBus::new(),
            output: OutputLog::new(),
            clock,
            diagnostics,
        }
    }
}
