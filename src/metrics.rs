//! Metric helpers for `splitwire`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. With the `metrics` feature
//! disabled the helpers compile to no-ops, so call sites stay unconditional.

#[cfg(feature = "metrics")]
use metrics::counter;

/// Name of the counter tracking accepted fragments.
pub const FRAGMENTS_ACCEPTED: &str = "splitwire_fragments_accepted_total";
/// Name of the counter tracking rejected fragments.
pub const FRAGMENTS_REJECTED: &str = "splitwire_fragments_rejected_total";
/// Name of the counter tracking fully reassembled messages.
pub const MESSAGES_COMPLETED: &str = "splitwire_messages_completed_total";
/// Name of the counter tracking timeout-evicted streams.
pub const STREAMS_EVICTED: &str = "splitwire_streams_evicted_total";

/// Record an accepted fragment placement.
pub fn inc_fragments_accepted() {
    #[cfg(feature = "metrics")]
    counter!(FRAGMENTS_ACCEPTED).increment(1);
}

/// Record a rejected fragment.
pub fn inc_fragments_rejected() {
    #[cfg(feature = "metrics")]
    counter!(FRAGMENTS_REJECTED).increment(1);
}

/// Record a completed reassembly.
pub fn inc_messages_completed() {
    #[cfg(feature = "metrics")]
    counter!(MESSAGES_COMPLETED).increment(1);
}

/// Record a timeout eviction.
pub fn inc_streams_evicted() {
    #[cfg(feature = "metrics")]
    counter!(STREAMS_EVICTED).increment(1);
}
