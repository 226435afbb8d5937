//! Per-generator diagnostics sink.
//!
//! Warnings about individual tokens (unmatched tokens, failing handlers,
//! shortcut cycles) would flood the log if emitted on every occurrence.
//! Each [`Generator`](crate::Generator) owns one `Diagnostics` value that
//! remembers which messages it has already reported, so every distinct
//! message is logged and recorded exactly once for the generator's
//! lifetime.

use std::collections::HashSet;
use std::sync::Mutex;

/// Category of a recorded diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// No rule matched the token after variant peeling.
    Unmatched,
    /// The token hit a blocklist entry.
    Blocked,
    /// A rule, variant, shortcut or preflight handler failed.
    HandlerFailed,
    /// A shortcut expansion revisited a token already on its path.
    ShortcutCycle,
    /// A shortcut expansion exceeded the depth limit.
    ShortcutTooDeep,
    /// Variant peeling hit its iteration cap.
    VariantOverflow,
}

/// One recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Collects deduplicated diagnostics for one generator.
#[derive(Debug, Default)]
pub struct Diagnostics {
    seen: Mutex<HashSet<(DiagnosticKind, String)>>,
    recorded: Mutex<Vec<Diagnostic>>,
    /// Log unmatched tokens at `warn` instead of `debug`.
    warn_unmatched: bool,
}

impl Diagnostics {
    pub fn new(warn_unmatched: bool) -> Self {
        Self {
            warn_unmatched,
            ..Default::default()
        }
    }

    /// Records a diagnostic unless the same kind and message were already
    /// seen. Returns true when this call recorded it.
    pub fn report(&self, kind: DiagnosticKind, message: impl Into<String>) -> bool {
        let message = message.into();
        let fresh = self
            .seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((kind, message.clone()));
        if !fresh {
            return false;
        }

        match kind {
            DiagnosticKind::Unmatched if !self.warn_unmatched => log::debug!("{}", message),
            DiagnosticKind::Blocked => log::debug!("{}", message),
            _ => log::warn!("{}", message),
        }

        self.recorded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Diagnostic { kind, message });
        true
    }

    /// Returns every diagnostic recorded so far, in reporting order.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.recorded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Returns the recorded diagnostics of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> Vec<Diagnostic> {
        self.snapshot()
            .into_iter()
            .filter(|d| d.kind == kind)
            .collect()
    }

    /// Forgets everything, so messages can be reported again.
    pub fn clear(&self) {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).clear();
        self.recorded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_messages_are_recorded_once() {
        let diagnostics = Diagnostics::new(false);
        assert!(diagnostics.report(DiagnosticKind::Unmatched, "unmatched `foo`"));
        assert!(!diagnostics.report(DiagnosticKind::Unmatched, "unmatched `foo`"));
        assert!(diagnostics.report(DiagnosticKind::Unmatched, "unmatched `bar`"));
        assert_eq!(diagnostics.snapshot().len(), 2);
    }

    #[test]
    fn same_message_different_kind_is_distinct() {
        let diagnostics = Diagnostics::new(true);
        diagnostics.report(DiagnosticKind::Blocked, "x");
        diagnostics.report(DiagnosticKind::HandlerFailed, "x");
        assert_eq!(diagnostics.of_kind(DiagnosticKind::Blocked).len(), 1);
        assert_eq!(diagnostics.snapshot().len(), 2);
    }

    #[test]
    fn clear_allows_reporting_again() {
        let diagnostics = Diagnostics::default();
        diagnostics.report(DiagnosticKind::ShortcutCycle, "cycle");
        diagnostics.clear();
        assert!(diagnostics.snapshot().is_empty());
        assert!(diagnostics.report(DiagnosticKind::ShortcutCycle, "cycle"));
    }
}
