//! Cooperative Shutdown Signal
//!
//! Cloneable token shared between a monitor and its background emitter.
//! Requesting shutdown is sticky; the token cannot be re-armed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation token for background loops
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal all holders of this token to stop
    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check whether shutdown has been requested
    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_is_shared_across_clones() {
        let token = Shutdown::new();
        let clone = token.clone();
        assert!(!clone.is_requested());

        token.request();
        assert!(clone.is_requested());
    }

    #[test]
    fn test_request_is_sticky() {
        let token = Shutdown::new();
        token.request();
        token.request();
        assert!(token.is_requested());
    }
}
