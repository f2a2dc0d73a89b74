use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, warn};

type Listener = Arc<dyn Fn(&str) + Send + Sync>;

/// Handle returned by [`CulturePreference::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// The user's selected culture plus the callbacks to run when it changes.
///
/// Listeners run synchronously on the thread calling [`CulturePreference::select`],
/// after the new value is stored.
pub struct CulturePreference {
    current: RwLock<Option<String>>,
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl CulturePreference {
    pub fn new() -> Self {
        CulturePreference {
            current: RwLock::new(None),
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn with_culture(culture: &str) -> Self {
        let preference = CulturePreference::new();
        *preference.current.write() = Some(culture.trim().to_string());
        preference
    }

    pub fn current(&self) -> Option<String> {
        self.current.read().clone()
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Store `culture` and notify listeners. Returns `false` without notifying
    /// when the value is empty or unchanged.
    pub fn select(&self, culture: &str) -> bool {
        let culture = culture.trim();
        if culture.is_empty() {
            warn!("ignoring empty culture selection");
            return false;
        }
        {
            let mut current = self.current.write();
            if current.as_deref() == Some(culture) {
                return false;
            }
            *current = Some(culture.to_string());
        }

        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        debug!(culture = %culture, listeners = listeners.len(), "culture changed");
        for listener in listeners {
            listener(culture);
        }
        true
    }
}

impl Default for CulturePreference {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CulturePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CulturePreference")
            .field("current", &self.current())
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}
