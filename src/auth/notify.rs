//! Process-wide session-expiry signal.
//!
//! The session owner (UI shell, CLI) registers one callback at startup and
//! the refresh coordinator fires it when the session is irrecoverably over.
//! One instance exists per process and is injected wherever it is needed;
//! no ambient globals.

use std::sync::Mutex;

type ExpiredCallback = Box<dyn Fn() + Send + Sync>;

/// Single-slot callback registry for "session expired" events.
///
/// Firing with no handler registered drops the event: registration before
/// the first authenticated request is the session owner's responsibility.
#[derive(Default)]
pub struct SessionNotifier {
    slot: Mutex<Option<ExpiredCallback>>,
}

impl SessionNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the session-expired handler, replacing any previous one.
    pub fn on_session_expired<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(Box::new(callback));
        }
    }

    /// Unregister the handler (session owner teardown).
    pub fn clear_handler(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }

    /// Fire the session-expired signal once.
    pub fn notify_expired(&self) {
        let slot = match self.slot.lock() {
            Ok(slot) => slot,
            Err(_) => return,
        };
        match slot.as_ref() {
            Some(callback) => callback(),
            None => tracing::debug!("session expired with no handler registered; event dropped"),
        }
    }
}

impl std::fmt::Debug for SessionNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered = self
            .slot
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false);
        f.debug_struct("SessionNotifier")
            .field("handler_registered", &registered)
            .finish()
    }
}
