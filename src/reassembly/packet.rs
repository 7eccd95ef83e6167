//! Input records consumed from the reliability sub-layer.
//!
//! The reliability layer deduplicates and orders raw datagrams into
//! [`ReliablePacket`]s before they reach this crate, so these types carry
//! already-parsed metadata rather than wire bytes. [`RawFrame`] survives
//! only as a per-fragment diagnostic record.

use bytes::Bytes;

use super::{FragmentIndex, SplitId};

/// A deduplicated reliable packet carrying one payload shard.
///
/// When `is_split` is false the packet holds a complete message on its own
/// and the split metadata fields are ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReliablePacket {
    /// Payload bytes carried by this shard.
    pub payload: Bytes,
    /// Whether the source message was fragmented at all.
    pub is_split: bool,
    /// Split-stream identifier, scoped to the sender.
    pub split_id: SplitId,
    /// Position of this shard within the message.
    pub split_index: FragmentIndex,
    /// Total number of shards the sender declared for the message.
    pub split_count: u32,
    /// Payload bit length reported by the reliability layer; used only as a
    /// pre-allocation hint for the reassembly accumulator.
    pub length_in_bits: u32,
}

impl ReliablePacket {
    /// Build a shard of a split message.
    #[must_use]
    pub fn split(
        payload: impl Into<Bytes>,
        split_id: SplitId,
        split_index: FragmentIndex,
        split_count: u32,
    ) -> Self {
        let payload = payload.into();
        let length_in_bits = bit_length(payload.len());
        Self {
            payload,
            is_split: true,
            split_id,
            split_index,
            split_count,
            length_in_bits,
        }
    }

    /// Build a packet that was never fragmented.
    #[must_use]
    pub fn unsplit(payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        let length_in_bits = bit_length(payload.len());
        Self {
            payload,
            is_split: false,
            split_id: SplitId::new(0),
            split_index: FragmentIndex::zero(),
            split_count: 1,
            length_in_bits,
        }
    }
}

fn bit_length(bytes: usize) -> u32 {
    u32::try_from(bytes.saturating_mul(8)).unwrap_or(u32::MAX)
}

/// Diagnostic record of the datagram that carried a shard.
///
/// Kept in arrival order by the owning buffer, not in split order; the slot
/// array is the authority on byte ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawFrame {
    /// Datagram sequence number assigned by the transport layer.
    pub sequence: u32,
    /// Number of payload bytes the datagram carried.
    pub payload_len: usize,
}

impl RawFrame {
    /// Create a new frame record.
    #[must_use]
    pub const fn new(sequence: u32, payload_len: usize) -> Self {
        Self {
            sequence,
            payload_len,
        }
    }
}
