//! Lifecycle hook for send cycles.

use shared::domain::ModelId;
use tracing::{debug, info, warn};

use crate::{dispatcher::Rejection, error::ChatError};

/// Invoked at fixed points of every send cycle. All methods default to no-ops.
pub trait SessionObserver: Send + Sync {
    fn send_accepted(&self, _session_id: &str, _route: &str, _context_len: usize) {}

    fn send_rejected(&self, _session_id: &str, _reason: Rejection) {}

    fn send_resolved(&self, _session_id: &str, _models: &[ModelId], _history_len: usize) {}

    fn send_failed(&self, _session_id: &str, _error: &ChatError) {}

    /// The session was torn down before the in-flight call resolved.
    fn send_discarded(&self, _session_id: &str) {}
}

pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn send_accepted(&self, session_id: &str, route: &str, context_len: usize) {
        info!("chat: send accepted session={session_id} route={route} context_len={context_len}");
    }

    fn send_rejected(&self, session_id: &str, reason: Rejection) {
        debug!("chat: send rejected session={session_id} reason={reason}");
    }

    fn send_resolved(&self, session_id: &str, models: &[ModelId], history_len: usize) {
        let models = models
            .iter()
            .map(ModelId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        info!("chat: send resolved session={session_id} models={models} history_len={history_len}");
    }

    fn send_failed(&self, session_id: &str, error: &ChatError) {
        warn!(
            "chat: send failed session={session_id} kind={} error={error}",
            error.kind()
        );
    }

    fn send_discarded(&self, session_id: &str) {
        debug!("chat: resolution discarded for closed session={session_id}");
    }
}
