//! Per-message accumulator that stitches fragments back into a byte stream.
//!
//! A [`SplitBuffer`] owns a slot array sized by the declared fragment count
//! and grows a contiguous prefix from index 0 as gaps fill in. UDP delivers
//! fragments in any order, possibly more than once, so only byte ordering
//! within the accumulator is guaranteed, never arrival order. Finalisation
//! consumes the buffer and yields an [`AssembledMessage`], expressing the
//! irreversible `Accumulating -> Final` transition through ownership.

use std::{io, time::Instant};

use bytes::Bytes;

use super::{FragmentIndex, FragmentStatus, MessageId, MessageTrail, RawFrame};

/// Accumulator for the fragments of one logical message.
///
/// Identified in the registry by (sender address, split-stream ID); a
/// non-split packet becomes a degenerate one-slot buffer that finalises on
/// its first and only placement.
#[derive(Debug)]
pub(crate) struct SplitBuffer {
    /// Fixed at creation from the declared fragment count; never resized.
    slots: Box<[Option<Bytes>]>,
    /// Raw frames in arrival order, for diagnostics only.
    arrival: Vec<RawFrame>,
    /// First unfilled slot; advances only across gap-free runs from 0.
    next_expected: u32,
    /// Every accepted placement counts here, duplicates included.
    received_bytes: usize,
    packet_type: Option<u8>,
    assembled: Vec<u8>,
    message_id: MessageId,
    started_at: Instant,
    trail: MessageTrail,
}

impl SplitBuffer {
    pub(crate) fn new(
        declared: u32,
        capacity_hint: usize,
        message_id: MessageId,
        started_at: Instant,
    ) -> Self {
        let declared_slots = usize::try_from(declared).unwrap_or(usize::MAX);
        Self {
            slots: vec![None; declared_slots].into_boxed_slice(),
            arrival: Vec::new(),
            next_expected: 0,
            received_bytes: 0,
            packet_type: None,
            assembled: Vec::with_capacity(capacity_hint),
            message_id,
            started_at,
            trail: MessageTrail::new(),
        }
    }

    /// Store `payload` at `index`, overwriting any earlier delivery.
    ///
    /// The caller validates `index` against [`declared`](Self::declared)
    /// before placing; the frame is appended to the arrival record
    /// unconditionally. The type tag is captured from the first byte of the
    /// fragment at index 0 and keeps its first captured value on
    /// re-delivery.
    pub(crate) fn place(&mut self, payload: Bytes, index: FragmentIndex, frame: RawFrame) {
        debug_assert!(index.get() < self.declared(), "index validated by caller");

        let shard_len = payload.len();
        self.received_bytes = self.received_bytes.saturating_add(shard_len);
        self.arrival.push(frame);

        if index.get() == 0 && self.packet_type.is_none() {
            self.packet_type = payload.first().copied();
        }

        let slot = usize::try_from(index.get()).unwrap_or(usize::MAX);
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = Some(payload);
        }
        self.trail
            .record(format!("fragment {index} placed ({shard_len} bytes)"));
    }

    /// Extend the contiguous prefix as far as the filled slots allow.
    ///
    /// Appends every contiguously present payload to the accumulator
    /// starting at the next-expected index, stopping at the first gap or the
    /// end of the slot array. The next-expected index never decreases and
    /// never skips a gap.
    pub(crate) fn extend_prefix(&mut self) -> FragmentStatus {
        loop {
            let slot = usize::try_from(self.next_expected).unwrap_or(usize::MAX);
            let Some(Some(payload)) = self.slots.get(slot) else {
                break;
            };
            self.assembled.extend_from_slice(payload);
            self.next_expected += 1;
        }

        if usize::try_from(self.next_expected).unwrap_or(usize::MAX) == self.slots.len() {
            FragmentStatus::Complete
        } else {
            FragmentStatus::Incomplete
        }
    }

    /// Consume the buffer, producing the reconstructed message.
    ///
    /// Callable exactly once, at the moment the prefix covers every declared
    /// slot; the registry drops its entry in the same step.
    pub(crate) fn finalize(self) -> AssembledMessage {
        self.trail.record("message finalised");
        AssembledMessage {
            message_id: self.message_id,
            packet_type: self.packet_type,
            payload: Bytes::from(self.assembled),
            received_bytes: self.received_bytes,
            frames: self.arrival,
            trail: self.trail,
        }
    }

    pub(crate) fn declared(&self) -> u32 {
        u32::try_from(self.slots.len()).unwrap_or(u32::MAX)
    }

    pub(crate) fn next_expected(&self) -> u32 { self.next_expected }

    pub(crate) fn received_bytes(&self) -> usize { self.received_bytes }

    pub(crate) fn message_id(&self) -> MessageId { self.message_id }

    pub(crate) fn started_at(&self) -> Instant { self.started_at }

    pub(crate) fn trail(&self) -> &MessageTrail { &self.trail }

    pub(crate) fn progress(&self) -> SplitProgress {
        SplitProgress {
            message_id: self.message_id,
            contiguous: self.next_expected,
            declared: self.declared(),
            received_bytes: self.received_bytes,
            trail: self.trail.clone(),
        }
    }
}

/// Snapshot of a still-accumulating stream, returned per accepted fragment.
///
/// Carries the shared [`MessageTrail`] handle so the caller can rebind its
/// per-packet diagnostic sink to the owning message's trail.
#[derive(Clone, Debug)]
pub struct SplitProgress {
    /// Message the fragment was routed to.
    pub message_id: MessageId,
    /// Length of the gap-free run of filled slots from index 0.
    pub contiguous: u32,
    /// Declared fragment count fixed at stream creation.
    pub declared: u32,
    /// Bytes received so far, duplicates included.
    pub received_bytes: usize,
    /// Shared handle to the message's diagnostic trail.
    pub trail: MessageTrail,
}

/// A fully reconstructed logical message.
///
/// Produced exactly once per stream, at the instant the contiguous prefix
/// reaches the declared fragment count; the registry's reference is dropped
/// in the same step, so this value is the only remaining owner.
#[derive(Clone, Debug)]
pub struct AssembledMessage {
    message_id: MessageId,
    packet_type: Option<u8>,
    payload: Bytes,
    received_bytes: usize,
    frames: Vec<RawFrame>,
    trail: MessageTrail,
}

impl AssembledMessage {
    /// Identifier assigned when the stream's first fragment arrived.
    #[must_use]
    pub const fn message_id(&self) -> MessageId { self.message_id }

    /// One-byte type tag captured from the fragment at index 0.
    ///
    /// `None` when that fragment carried no bytes.
    #[must_use]
    pub const fn packet_type(&self) -> Option<u8> { self.packet_type }

    /// Borrow the reconstructed payload.
    #[must_use]
    pub fn payload(&self) -> &[u8] { self.payload.as_ref() }

    /// Consume the message, returning the owned payload bytes.
    #[must_use]
    pub fn into_payload(self) -> Bytes { self.payload }

    /// Seekable reader over the reconstructed payload.
    ///
    /// Decoders wrap this in their own bit-level reader; this crate does not
    /// interpret the payload beyond the type tag.
    #[must_use]
    pub fn reader(&self) -> io::Cursor<&[u8]> { io::Cursor::new(self.payload.as_ref()) }

    /// Total bytes received for this message, duplicates included.
    ///
    /// May exceed `payload().len()` when fragments were re-delivered.
    #[must_use]
    pub const fn received_bytes(&self) -> usize { self.received_bytes }

    /// Raw frames in arrival order, for diagnostics.
    #[must_use]
    pub fn frames(&self) -> &[RawFrame] { &self.frames }

    /// Shared handle to the message's diagnostic trail.
    #[must_use]
    pub const fn trail(&self) -> &MessageTrail { &self.trail }
}
