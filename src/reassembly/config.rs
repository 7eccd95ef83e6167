//! Configuration bounding reassembly resource usage.

use std::{
    num::{NonZeroU32, NonZeroUsize},
    time::Duration,
};

use super::ReliablePacket;

/// Settings that cap per-stream and per-connection reassembly state.
///
/// An attacker controls both the declared fragment count and the number of
/// streams it starts, so every dimension of buffered state is bounded here.
#[derive(Clone, Copy, Debug)]
pub struct ReassemblyConfig {
    /// Largest declared fragment count accepted for a single message.
    pub max_fragment_count: NonZeroU32,
    /// Hard cap on bytes received for a single message.
    pub max_message_size: NonZeroUsize,
    /// Maximum number of split streams buffered concurrently per connection.
    pub max_in_flight: NonZeroUsize,
    /// Duration after which incomplete streams are evicted.
    pub reassembly_timeout: Duration,
}

const DEFAULT_MAX_FRAGMENT_COUNT: u32 = 4_096;
const DEFAULT_MAX_MESSAGE_SIZE: usize = 8 * 1024 * 1024;
const DEFAULT_MAX_IN_FLIGHT: usize = 1_024;
const DEFAULT_REASSEMBLY_TIMEOUT: Duration = Duration::from_secs(30);

impl Default for ReassemblyConfig {
    fn default() -> Self {
        Self {
            max_fragment_count: NonZeroU32::new(DEFAULT_MAX_FRAGMENT_COUNT)
                .unwrap_or(NonZeroU32::MIN),
            max_message_size: NonZeroUsize::new(DEFAULT_MAX_MESSAGE_SIZE)
                .unwrap_or(NonZeroUsize::MIN),
            max_in_flight: NonZeroUsize::new(DEFAULT_MAX_IN_FLIGHT).unwrap_or(NonZeroUsize::MIN),
            reassembly_timeout: DEFAULT_REASSEMBLY_TIMEOUT,
        }
    }
}

impl ReassemblyConfig {
    /// Pre-allocation hint for a message's byte accumulator.
    ///
    /// Derived from the first fragment's bit-length and the declared count.
    /// The hint only sizes the initial allocation; it never bounds how many
    /// bytes the buffer accepts, so it is clamped to the configured maximum
    /// message size to keep a hostile declaration from reserving memory up
    /// front.
    #[must_use]
    pub fn capacity_hint(&self, packet: &ReliablePacket) -> usize {
        let per_fragment = usize::try_from(packet.length_in_bits)
            .map_or(usize::MAX, |bits| bits.div_ceil(8));
        let declared = usize::try_from(packet.split_count).unwrap_or(usize::MAX);
        per_fragment
            .saturating_mul(declared)
            .min(self.max_message_size.get())
    }
}
