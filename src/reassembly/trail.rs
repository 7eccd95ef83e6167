//! Shared per-message diagnostic trail.
//!
//! Every fragment of one logical message funnels its log lines into the same
//! trail, so a caller inspecting a stalled or completed message sees its
//! whole history in one place. The trail is a handle: cloning it shares the
//! underlying buffer rather than duplicating it, which is what lets the
//! per-packet diagnostic sink be rebound to the owning buffer's trail.

use std::sync::{Arc, Mutex};

/// Cheaply cloneable handle to one growing per-message trail.
///
/// # Examples
///
/// ```
/// use splitwire::reassembly::MessageTrail;
/// let trail = MessageTrail::new();
/// let rebound = trail.clone();
/// rebound.record("fragment 0 placed");
/// assert_eq!(trail.lines(), vec!["fragment 0 placed".to_owned()]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MessageTrail {
    entries: Arc<Mutex<Vec<String>>>,
}

impl MessageTrail {
    /// Create an empty trail.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Append a line to the trail.
    pub fn record(&self, line: impl Into<String>) {
        self.lock().push(line.into());
    }

    /// Snapshot the recorded lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> Vec<String> { self.lock().clone() }

    /// Number of recorded lines.
    #[must_use]
    pub fn len(&self) -> usize { self.lock().len() }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.lock().is_empty() }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        // A poisoned lock still yields the recorded lines.
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
