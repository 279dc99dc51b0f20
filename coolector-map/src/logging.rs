//! Logger injecté dans le contrôleur
//!
//! Le logger ne doit jamais échouer ni paniquer : il est appelé depuis les
//! chemins d'erreur de chaque opération de la carte.

use std::cell::RefCell;
use std::error::Error;
use std::fmt::Debug;

/// Collaborateur de journalisation
pub trait Logger {
    /// Journalise une erreur sous une étiquette stable (ex: `map_draw_map`)
    fn error(&self, tag: &str, error: &dyn Error);

    /// Journalise une trace de diagnostic
    fn trace(&self, tag: &str, payload: &dyn Debug);
}

/// Logger basé sur `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn error(&self, tag: &str, error: &dyn Error) {
        tracing::error!(target: "coolector::map", tag, error = %error, "map operation failed");
    }

    fn trace(&self, tag: &str, payload: &dyn Debug) {
        tracing::trace!(target: "coolector::map", tag, payload = ?payload);
    }
}

/// Entrée enregistrée par [`RecordingLogger`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Error { tag: String, message: String },
    Trace { tag: String, payload: String },
}

/// Logger qui conserve les entrées en mémoire (tests, diagnostics)
///
/// Les entrées sont aussi transmises à `tracing`.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    entries: RefCell<Vec<LogEntry>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.borrow().clone()
    }

    /// Étiquettes des erreurs reçues, dans l'ordre
    pub fn error_tags(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter_map(|entry| match entry {
                LogEntry::Error { tag, .. } => Some(tag.clone()),
                LogEntry::Trace { .. } => None,
            })
            .collect()
    }

    pub fn trace_tags(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter_map(|entry| match entry {
                LogEntry::Trace { tag, .. } => Some(tag.clone()),
                LogEntry::Error { .. } => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl Logger for RecordingLogger {
    fn error(&self, tag: &str, error: &dyn Error) {
        TracingLogger.error(tag, error);
        self.entries.borrow_mut().push(LogEntry::Error {
            tag: tag.to_string(),
            message: error.to_string(),
        });
    }

    fn trace(&self, tag: &str, payload: &dyn Debug) {
        TracingLogger.trace(tag, payload);
        self.entries.borrow_mut().push(LogEntry::Trace {
            tag: tag.to_string(),
            payload: format!("{:?}", payload),
        });
    }
}
