use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Granularity at which a sleeping watch loop notices cancellation
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// A cancellation handle for live watch loops.
///
/// Clones share one flag, so a signal handler on another thread can stop a
/// loop running on the calling thread.
#[derive(Debug, Clone, Default)]
pub struct WatchCancellation {
    flag: Arc<AtomicBool>,
}

impl WatchCancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Sleeps up to `timeout`; returns true as soon as cancellation is requested
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_cancelled() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            std::thread::sleep(WAIT_SLICE.min(deadline - now));
        }
    }
}
