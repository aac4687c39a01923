//! Shared connectivity state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Whether the engine believes the remote API is reachable.
///
/// Cloning shares the underlying flag.
#[derive(Clone, Debug)]
pub struct Connectivity {
    online: Arc<AtomicBool>,
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Update the flag, returning `true` when this was an offline to online
    /// transition.
    pub fn set_online(&self, online: bool) -> bool {
        let was_online = self.online.swap(online, Ordering::SeqCst);
        online && !was_online
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_reconnect_transitions_only() {
        let connectivity = Connectivity::default();
        assert!(connectivity.is_online());
        assert!(!connectivity.set_online(true));
        assert!(!connectivity.set_online(false));
        assert!(!connectivity.is_online());

        let shared = connectivity.clone();
        assert!(shared.set_online(true));
        assert!(connectivity.is_online());
    }
}
