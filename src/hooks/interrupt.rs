//! Cross-thread cancellation flag shared between a tracer and its owner.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Set once by `stop`; checked by every hook on entry
#[derive(Debug, Default)]
pub struct Interrupt {
    raised: AtomicBool,
    reason: Mutex<Option<String>>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag, keeping the first reason given
    pub fn stop(&self, reason: impl Into<String>) {
        if let Ok(mut slot) = self.reason.lock() {
            if slot.is_none() {
                *slot = Some(reason.into());
            }
        }
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    pub fn reason(&self) -> Option<String> {
        if !self.is_raised() {
            return None;
        }
        self.reason
            .lock()
            .ok()
            .and_then(|slot| slot.clone())
            .or_else(|| Some("interrupted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_stop_from_another_thread() {
        let interrupt = Arc::new(Interrupt::new());
        assert!(!interrupt.is_raised());
        assert_eq!(interrupt.reason(), None);

        let handle = {
            let interrupt = Arc::clone(&interrupt);
            thread::spawn(move || interrupt.stop("execution timeout"))
        };
        handle.join().unwrap();

        assert!(interrupt.is_raised());
        assert_eq!(interrupt.reason().as_deref(), Some("execution timeout"));
    }

    #[test]
    fn test_first_reason_wins() {
        let interrupt = Interrupt::new();
        interrupt.stop("first");
        interrupt.stop("second");
        assert_eq!(interrupt.reason().as_deref(), Some("first"));
    }
}
