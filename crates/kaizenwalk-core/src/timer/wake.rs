//! Screen wake-lock capability.
//!
//! Holding the lock keeps the device awake during a workout. Acquisition is
//! best-effort: a denied request is logged and the workout proceeds. The
//! guard releases on drop, so every exit path (stop, completion, start
//! failure) releases by construction.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WakeLockError {
    #[error("wake lock denied: {0}")]
    Denied(String),
    #[error("wake lock unsupported on this platform")]
    Unsupported,
}

/// Held lock. Dropping it releases the lock.
pub trait WakeLockGuard: Send {}

/// Platform wake-lock integration point.
pub trait WakeLockProvider: Send {
    fn request(&mut self) -> Result<Box<dyn WakeLockGuard>, WakeLockError>;
}

/// Provider for platforms without a wake-lock facility. Always succeeds
/// and holds nothing.
#[derive(Debug, Default)]
pub struct NoopWakeLock;

struct NoopGuard;

impl WakeLockGuard for NoopGuard {}

impl WakeLockProvider for NoopWakeLock {
    fn request(&mut self) -> Result<Box<dyn WakeLockGuard>, WakeLockError> {
        Ok(Box::new(NoopGuard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingGuard(Arc<AtomicUsize>);

    impl WakeLockGuard for CountingGuard {}

    impl Drop for CountingGuard {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn guard_drop_releases() {
        let releases = Arc::new(AtomicUsize::new(0));
        let guard: Box<dyn WakeLockGuard> = Box::new(CountingGuard(releases.clone()));
        assert_eq!(releases.load(Ordering::SeqCst), 0);
        drop(guard);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn noop_provider_always_grants() {
        let mut provider = NoopWakeLock;
        assert!(provider.request().is_ok());
    }
}
