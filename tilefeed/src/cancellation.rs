use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between a tile request and the task fetching it.
///
/// The flag starts as "not cancelled" and can be flipped only once. Clones share the same
/// flag, and two tokens are the [same](CancellationToken::same_as) only if one is a clone of
/// the other.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a new token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the token as cancelled.
    ///
    /// Returns `true` if this call flipped the flag, and `false` if the token had already been
    /// cancelled before.
    pub fn cancel(&self) -> bool {
        self.cancelled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Returns true if the token was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Returns true if both tokens share the same flag.
    pub fn same_as(&self, other: &CancellationToken) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_token_is_not_cancelled() {
        assert!(!CancellationToken::new().is_cancelled());
    }

    #[test]
    fn cancel_is_idempotent() {
        let token = CancellationToken::new();
        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(token.is_cancelled());
    }

    #[test]
    fn clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();

        assert!(token.is_cancelled());
        assert!(token.same_as(&clone));
        assert!(!token.same_as(&CancellationToken::new()));
    }

    #[test]
    fn only_one_of_racing_cancels_wins() {
        let token = CancellationToken::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let token = token.clone();
                std::thread::spawn(move || token.cancel())
            })
            .collect();

        let flipped = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread panicked"))
            .filter(|flipped| *flipped)
            .count();

        assert_eq!(flipped, 1);
        assert!(token.is_cancelled());
    }
}
