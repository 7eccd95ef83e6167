//! Per-connection registry of in-flight split streams.
//!
//! [`SplitRegistry`] owns every reassembly buffer for one connection, keyed
//! first by sender address (distinct senders never share a split-ID
//! namespace) and then by split-stream ID. Buffers are created lazily on a
//! stream's first fragment and detach from the registry at the instant they
//! finalise, so ownership of a completed message transfers to the caller
//! with no dual-ownership window.

use std::{
    collections::{HashMap, hash_map::Entry},
    net::SocketAddr,
    time::Instant,
};

use tracing::{debug, trace, warn};

use super::{
    AssembledMessage,
    FragmentIndex,
    FragmentStatus,
    MessageId,
    RawFrame,
    ReassemblyConfig,
    ReassemblyError,
    ReliablePacket,
    SplitId,
    SplitProgress,
    buffer::SplitBuffer,
};
use crate::metrics;

/// Outcome of routing one reliable packet into the registry.
#[derive(Debug)]
pub enum SplitStatus {
    /// The stream still expects more fragments; the snapshot carries the
    /// trail handle for diagnostic rebinding.
    Pending(SplitProgress),
    /// The packet completed its message; the registry entry is already gone
    /// and this value is the only owner.
    Complete(AssembledMessage),
}

/// A stream removed by timeout eviction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvictedStream {
    /// Sender the stream belonged to.
    pub sender: SocketAddr,
    /// Sender-scoped stream identifier.
    pub split_id: SplitId,
    /// Message ID the stream had been assigned.
    pub message_id: MessageId,
}

/// Per-connection owner of all in-flight reassembly buffers.
///
/// The registry is plain `&mut self` bookkeeping with no blocking or I/O of
/// its own; the connection pump invokes it synchronously, which also
/// serialises fragments of the same stream. Wrap it in a mutex when several
/// workers share one connection.
///
/// # Examples
///
/// ```
/// use std::net::SocketAddr;
///
/// use splitwire::reassembly::{
///     RawFrame,
///     ReassemblyConfig,
///     ReliablePacket,
///     SplitRegistry,
///     SplitStatus,
/// };
///
/// let mut registry = SplitRegistry::new(ReassemblyConfig::default());
/// let sender: SocketAddr = "203.0.113.9:2400".parse().expect("address");
///
/// let packet = ReliablePacket::unsplit(&b"HELLO"[..]);
/// let status = registry
///     .handle_packet(packet, RawFrame::new(0, 5), sender)
///     .expect("packet accepted");
///
/// let SplitStatus::Complete(message) = status else {
///     panic!("non-split packets finalise immediately");
/// };
/// assert_eq!(message.packet_type(), Some(0x48));
/// assert_eq!(message.payload(), b"HELLO");
/// ```
#[derive(Debug)]
pub struct SplitRegistry {
    config: ReassemblyConfig,
    streams: HashMap<SocketAddr, HashMap<SplitId, SplitBuffer>>,
    next_message_id: u64,
}

impl SplitRegistry {
    /// Create an empty registry for one connection.
    #[must_use]
    pub fn new(config: ReassemblyConfig) -> Self {
        Self {
            config,
            streams: HashMap::new(),
            next_message_id: 0,
        }
    }

    /// Route one reliable packet using the current time.
    ///
    /// Must be called once per arriving reliable packet. Expired streams are
    /// purged before the packet is placed.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError`] when the fragment is rejected; the
    /// connection stays healthy and unrelated streams are unaffected.
    pub fn handle_packet(
        &mut self,
        packet: ReliablePacket,
        frame: RawFrame,
        sender: SocketAddr,
    ) -> Result<SplitStatus, ReassemblyError> {
        self.handle_packet_at(packet, frame, sender, Instant::now())
    }

    /// Route one reliable packet using an explicit clock reading.
    ///
    /// Accepting an explicit `now` keeps eviction deterministic in tests and
    /// lets callers co-ordinate sweeps with their own timers.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError`] when the fragment is rejected.
    pub fn handle_packet_at(
        &mut self,
        packet: ReliablePacket,
        frame: RawFrame,
        sender: SocketAddr,
        now: Instant,
    ) -> Result<SplitStatus, ReassemblyError> {
        self.purge_expired_at(now);

        if !packet.is_split {
            let message = self.assemble_unsplit(packet, frame, now);
            return Ok(SplitStatus::Complete(message));
        }

        self.guard_new_stream(&packet, sender)?;

        let max_message_size = self.config.max_message_size;
        let capacity_hint = self.config.capacity_hint(&packet);
        let counter = &mut self.next_message_id;

        let sender_streams = self.streams.entry(sender).or_default();
        let mut entry = match sender_streams.entry(packet.split_id) {
            Entry::Occupied(occupied) => occupied,
            Entry::Vacant(vacant) => {
                let id = MessageId::new(*counter);
                *counter += 1;
                trace!(
                    %sender,
                    split_id = %packet.split_id,
                    message_id = %id,
                    "split stream opened"
                );
                vacant.insert_entry(SplitBuffer::new(packet.split_count, capacity_hint, id, now))
            }
        };
        let buffer = entry.get_mut();

        if packet.split_index.get() >= buffer.declared() {
            let err = ReassemblyError::IndexOutOfRange {
                split_id: packet.split_id,
                index: packet.split_index,
                declared: buffer.declared(),
            };
            buffer.trail().record(err.to_string());
            warn!(%sender, %err, "fragment dropped");
            metrics::inc_fragments_rejected();
            return Err(err);
        }

        let attempted = buffer.received_bytes().saturating_add(packet.payload.len());
        if attempted > max_message_size.get() {
            let err = ReassemblyError::MessageTooLarge {
                message_id: buffer.message_id(),
                attempted,
                limit: max_message_size,
            };
            entry.remove();
            self.prune_sender(&sender);
            warn!(%sender, %err, "split stream dropped");
            metrics::inc_fragments_rejected();
            return Err(err);
        }

        buffer.place(packet.payload, packet.split_index, frame);
        metrics::inc_fragments_accepted();

        match buffer.extend_prefix() {
            FragmentStatus::Incomplete => Ok(SplitStatus::Pending(buffer.progress())),
            FragmentStatus::Complete => {
                let buffer = entry.remove();
                self.prune_sender(&sender);
                let message = buffer.finalize();
                debug!(
                    %sender,
                    split_id = %packet.split_id,
                    message_id = %message.message_id(),
                    bytes = message.payload().len(),
                    "split message reassembled"
                );
                metrics::inc_messages_completed();
                Ok(SplitStatus::Complete(message))
            }
        }
    }

    /// Return and advance the connection's message-ID counter.
    ///
    /// IDs are strictly increasing and never repeat for the connection's
    /// lifetime.
    pub fn next_message_id(&mut self) -> MessageId {
        let id = MessageId::new(self.next_message_id);
        self.next_message_id += 1;
        id
    }

    /// Remove streams that exceeded the configured timeout.
    ///
    /// Returns a record per evicted stream.
    pub fn purge_expired(&mut self) -> Vec<EvictedStream> { self.purge_expired_at(Instant::now()) }

    /// Remove expired streams using an explicit clock reading.
    ///
    /// Returns a record per evicted stream.
    pub fn purge_expired_at(&mut self, now: Instant) -> Vec<EvictedStream> {
        let timeout = self.config.reassembly_timeout;
        let mut evicted = Vec::new();

        self.streams.retain(|sender, streams| {
            streams.retain(|split_id, buffer| {
                let expired = now.saturating_duration_since(buffer.started_at()) >= timeout;
                if expired {
                    evicted.push(EvictedStream {
                        sender: *sender,
                        split_id: *split_id,
                        message_id: buffer.message_id(),
                    });
                }
                !expired
            });
            !streams.is_empty()
        });

        for stream in &evicted {
            debug!(
                sender = %stream.sender,
                split_id = %stream.split_id,
                message_id = %stream.message_id,
                "incomplete split stream evicted"
            );
            metrics::inc_streams_evicted();
        }

        evicted
    }

    /// Number of split streams currently buffered.
    #[must_use]
    pub fn in_flight(&self) -> usize { self.streams.values().map(HashMap::len).sum() }

    /// Borrow the registry's configuration.
    #[must_use]
    pub const fn config(&self) -> &ReassemblyConfig { &self.config }

    /// A non-split packet is a degenerate one-slot buffer that finalises
    /// immediately and never enters the stream map.
    fn assemble_unsplit(
        &mut self,
        packet: ReliablePacket,
        frame: RawFrame,
        now: Instant,
    ) -> AssembledMessage {
        let capacity_hint = packet.payload.len();
        let mut buffer = SplitBuffer::new(1, capacity_hint, self.next_message_id(), now);
        buffer.place(packet.payload, FragmentIndex::zero(), frame);
        buffer.extend_prefix();
        metrics::inc_fragments_accepted();
        metrics::inc_messages_completed();
        buffer.finalize()
    }

    /// Reject fragments that would open an unacceptable stream.
    ///
    /// Applies the declared-count, in-flight, and index-bound guards before
    /// any buffer is created, so a rejected first fragment strands nothing.
    fn guard_new_stream(
        &self,
        packet: &ReliablePacket,
        sender: SocketAddr,
    ) -> Result<(), ReassemblyError> {
        let exists = self
            .streams
            .get(&sender)
            .is_some_and(|streams| streams.contains_key(&packet.split_id));
        if exists {
            return Ok(());
        }

        let err = if packet.split_count == 0
            || packet.split_count > self.config.max_fragment_count.get()
        {
            ReassemblyError::CountOutOfRange {
                split_id: packet.split_id,
                declared: packet.split_count,
                limit: self.config.max_fragment_count,
            }
        } else if self.in_flight() >= self.config.max_in_flight.get() {
            ReassemblyError::TooManyStreams {
                limit: self.config.max_in_flight,
            }
        } else if packet.split_index.get() >= packet.split_count {
            ReassemblyError::IndexOutOfRange {
                split_id: packet.split_id,
                index: packet.split_index,
                declared: packet.split_count,
            }
        } else {
            return Ok(());
        };

        warn!(%sender, %err, "fragment dropped");
        metrics::inc_fragments_rejected();
        Err(err)
    }

    fn prune_sender(&mut self, sender: &SocketAddr) {
        if self.streams.get(sender).is_some_and(HashMap::is_empty) {
            self.streams.remove(sender);
        }
    }
}
