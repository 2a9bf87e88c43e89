//! Hook switch tracking.

use crate::config::HandsetConfig;
use crate::events::Edge;

/// Derives the handset's off-hook state from hook switch edges.
///
/// `true` means off-hook (picked up) everywhere in this crate; the physical
/// mapping is [HandsetConfig]. Every edge is reported — the switch provides
/// whatever debounce there is, mirroring the physical line where anyone
/// listening hears the hook clatter.
#[derive(Debug)]
pub struct HandsetTracker {
    config: HandsetConfig,
    is_up: bool,
}

impl HandsetTracker {
    /// Starts on-hook.
    pub fn new(config: HandsetConfig) -> Self {
        Self {
            config,
            is_up: false,
        }
    }

    /// Feed a hook switch transition, returning the new state.
    pub fn on_receiver_edge(&mut self, edge: Edge) -> bool {
        self.is_up = edge == self.config.off_hook_edge;
        self.is_up
    }

    pub fn is_up(&self) -> bool {
        self.is_up
    }
}
