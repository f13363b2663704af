//! Page-wide busy indicator
//!
//! Counts images still being processed. The indicator appears when the
//! first image starts and disappears when the last one finishes.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Counter of images in flight
#[derive(Debug, Default)]
pub struct BusyIndicator {
    pending: Mutex<usize>,
}

impl BusyIndicator {
    /// Register one unit of work; it ends when the guard drops
    pub fn begin(self: &Arc<Self>) -> BusyGuard {
        let mut pending = self.pending.lock();
        if *pending == 0 {
            info!("Processing images ...");
        }
        *pending += 1;
        BusyGuard {
            indicator: Arc::clone(self),
        }
    }

    /// Number of units still running
    pub fn pending(&self) -> usize {
        *self.pending.lock()
    }

    fn end(&self) {
        let mut pending = self.pending.lock();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            info!("All images processed");
        }
    }
}

/// Keeps the indicator raised while alive
#[derive(Debug)]
pub struct BusyGuard {
    indicator: Arc<BusyIndicator>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.indicator.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_while_guards_alive() {
        let indicator = Arc::new(BusyIndicator::default());
        assert_eq!(indicator.pending(), 0);

        let first = indicator.begin();
        let second = indicator.begin();
        assert_eq!(indicator.pending(), 2);

        drop(first);
        assert_eq!(indicator.pending(), 1);
        drop(second);
        assert_eq!(indicator.pending(), 0);
    }
}
