use std::sync::{Arc, Mutex};

use tracing::debug;

/// Callback invoked when the session can no longer be recovered.
pub type UnauthorizedHandler = Arc<dyn Fn() + Send + Sync>;

/// A single handler slot through which the transport layer reports an
/// irrecoverable authentication failure without depending on the session
/// layer.
///
/// Holds zero or one handler. Invoking it while empty is a no-op.
#[derive(Default)]
pub struct UnauthorizedNotifier {
    handler: Mutex<Option<UnauthorizedHandler>>,
}

impl UnauthorizedNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler`, replacing any previously registered one.
    pub fn register(&self, handler: UnauthorizedHandler) {
        *self.slot() = Some(handler);
    }

    pub fn clear(&self) {
        *self.slot() = None;
    }

    pub fn is_registered(&self) -> bool {
        self.slot().is_some()
    }

    pub fn notify(&self) {
        // Release the slot before calling out so the handler may re-register.
        let handler = self.slot().clone();
        match handler {
            Some(handler) => handler(),
            None => debug!("Unauthorized with no handler registered"),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<UnauthorizedHandler>> {
        self.handler
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
