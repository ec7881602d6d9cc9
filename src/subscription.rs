//! Live-feed subscription handle
//!
//! A `Subscription` owns whatever keeps a listener alive (a polling task, a
//! registered callback) and tears it down exactly once, either on an explicit
//! `release()` or when dropped.

use std::fmt;

type ReleaseHook = Box<dyn FnOnce() + Send + Sync>;

pub struct Subscription {
    id: String,
    on_release: Option<ReleaseHook>,
}

impl Subscription {
    /// Wrap a listener; `on_release` runs once when the subscription ends
    pub fn new(id: impl Into<String>, on_release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id: id.into(),
            on_release: Some(Box::new(on_release)),
        }
    }

    /// Provider-assigned identifier of the listener
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_active(&self) -> bool {
        self.on_release.is_some()
    }

    /// Stop the listener. Calling this more than once is a no-op.
    pub fn release(&mut self) {
        if let Some(hook) = self.on_release.take() {
            log::debug!("🔕 Releasing subscription {}", self.id);
            hook();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
