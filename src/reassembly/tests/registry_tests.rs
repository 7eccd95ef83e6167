//! Tests for registry routing, guard checks, and stream lifecycle.

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroUsize},
    time::{Duration, Instant},
};

use crate::reassembly::{
    FragmentIndex,
    MessageId,
    RawFrame,
    ReassemblyConfig,
    ReassemblyError,
    ReliablePacket,
    SplitId,
    SplitRegistry,
    SplitStatus,
};

fn sender(port: u16) -> SocketAddr {
    SocketAddr::from(([203, 0, 113, 7], port))
}

fn shard(split_id: u16, index: u32, count: u32, payload: &'static [u8]) -> ReliablePacket {
    ReliablePacket::split(payload, SplitId::new(split_id), FragmentIndex::new(index), count)
}

fn frame(sequence: u32) -> RawFrame { RawFrame::new(sequence, 0) }

fn small_config() -> ReassemblyConfig {
    ReassemblyConfig {
        max_fragment_count: NonZeroU32::new(8).expect("non-zero"),
        max_message_size: NonZeroUsize::new(64).expect("non-zero"),
        max_in_flight: NonZeroUsize::new(2).expect("non-zero"),
        reassembly_timeout: Duration::from_secs(30),
    }
}

#[test]
fn unsplit_packet_finalises_without_entering_the_map() {
    let mut registry = SplitRegistry::new(small_config());

    let status = registry
        .handle_packet(ReliablePacket::unsplit(&b"HELLO"[..]), frame(0), sender(1))
        .expect("packet accepted");

    let SplitStatus::Complete(message) = status else {
        panic!("unsplit packet must complete immediately");
    };
    assert_eq!(message.payload(), b"HELLO");
    assert_eq!(message.packet_type(), Some(0x48));
    assert_eq!(registry.in_flight(), 0);
}

#[test]
fn split_stream_created_lazily_and_detached_on_completion() {
    let mut registry = SplitRegistry::new(small_config());
    let from = sender(2);

    let status = registry
        .handle_packet(shard(9, 0, 2, b"AB"), frame(0), from)
        .expect("first fragment accepted");
    assert!(matches!(status, SplitStatus::Pending(_)));
    assert_eq!(registry.in_flight(), 1);

    let status = registry
        .handle_packet(shard(9, 1, 2, b"CD"), frame(1), from)
        .expect("second fragment accepted");
    let SplitStatus::Complete(message) = status else {
        panic!("last fragment must complete the message");
    };
    assert_eq!(message.payload(), b"ABCD");
    assert_eq!(registry.in_flight(), 0);
}

#[test]
fn pending_snapshot_reports_stream_state() {
    let mut registry = SplitRegistry::new(small_config());

    let status = registry
        .handle_packet(shard(3, 1, 3, b"BB"), frame(0), sender(3))
        .expect("fragment accepted");

    let SplitStatus::Pending(progress) = status else {
        panic!("stream with gaps must stay pending");
    };
    assert_eq!(progress.contiguous, 0);
    assert_eq!(progress.declared, 3);
    assert_eq!(progress.received_bytes, 2);
}

#[test]
fn message_ids_are_strictly_increasing_across_buffers() {
    let mut registry = SplitRegistry::new(small_config());
    let from = sender(4);

    let SplitStatus::Pending(first) = registry
        .handle_packet(shard(1, 0, 2, b"AA"), frame(0), from)
        .expect("fragment accepted")
    else {
        panic!("stream must stay pending");
    };
    let SplitStatus::Pending(second) = registry
        .handle_packet(shard(2, 0, 2, b"BB"), frame(1), from)
        .expect("fragment accepted")
    else {
        panic!("stream must stay pending");
    };

    assert!(second.message_id > first.message_id);
}

#[test]
fn counter_survives_handing_out_ids_directly() {
    let mut registry = SplitRegistry::new(small_config());

    let a = registry.next_message_id();
    let b = registry.next_message_id();
    assert_eq!(a, MessageId::new(0));
    assert_eq!(b, MessageId::new(1));

    let SplitStatus::Pending(progress) = registry
        .handle_packet(shard(1, 0, 2, b"AA"), frame(0), sender(5))
        .expect("fragment accepted")
    else {
        panic!("stream must stay pending");
    };
    assert_eq!(progress.message_id, MessageId::new(2));
}

#[test]
fn out_of_range_index_rejected_before_stream_creation() {
    let mut registry = SplitRegistry::new(small_config());

    let err = registry
        .handle_packet(shard(6, 5, 3, b"XX"), frame(0), sender(6))
        .expect_err("index beyond declared count must be rejected");

    assert_eq!(
        err,
        ReassemblyError::IndexOutOfRange {
            split_id: SplitId::new(6),
            index: FragmentIndex::new(5),
            declared: 3,
        }
    );
    assert_eq!(registry.in_flight(), 0, "rejected first fragment strands nothing");
}

#[test]
fn out_of_range_index_on_live_stream_leaves_it_intact() {
    let mut registry = SplitRegistry::new(small_config());
    let from = sender(7);

    registry
        .handle_packet(shard(6, 0, 2, b"AA"), frame(0), from)
        .expect("first fragment accepted");

    // Later shard disagrees about the count; the slot array fixed at
    // first-fragment time is the authority.
    let err = registry
        .handle_packet(shard(6, 4, 5, b"XX"), frame(1), from)
        .expect_err("index beyond the fixed slot array must be rejected");
    assert!(matches!(err, ReassemblyError::IndexOutOfRange { declared: 2, .. }));

    let status = registry
        .handle_packet(shard(6, 1, 2, b"BB"), frame(2), from)
        .expect("stream still completes");
    let SplitStatus::Complete(message) = status else {
        panic!("stream must complete after the stray fragment");
    };
    assert_eq!(message.payload(), b"AABB");
}

#[test]
fn zero_declared_count_rejected() {
    let mut registry = SplitRegistry::new(small_config());

    let err = registry
        .handle_packet(shard(1, 0, 0, b"XX"), frame(0), sender(8))
        .expect_err("zero declared count must be rejected");
    assert!(matches!(err, ReassemblyError::CountOutOfRange { declared: 0, .. }));
}

#[test]
fn oversized_declared_count_rejected() {
    let mut registry = SplitRegistry::new(small_config());

    let err = registry
        .handle_packet(shard(1, 0, 9, b"XX"), frame(0), sender(9))
        .expect_err("declared count above the cap must be rejected");
    assert!(matches!(err, ReassemblyError::CountOutOfRange { declared: 9, .. }));
    assert_eq!(registry.in_flight(), 0);
}

#[test]
fn in_flight_cap_rejects_new_streams_only() {
    let mut registry = SplitRegistry::new(small_config());
    let from = sender(10);

    registry
        .handle_packet(shard(1, 0, 2, b"AA"), frame(0), from)
        .expect("first stream accepted");
    registry
        .handle_packet(shard(2, 0, 2, b"BB"), frame(1), from)
        .expect("second stream accepted");

    let err = registry
        .handle_packet(shard(3, 0, 2, b"CC"), frame(2), from)
        .expect_err("third stream must hit the in-flight cap");
    assert!(matches!(err, ReassemblyError::TooManyStreams { .. }));

    // Fragments for existing streams still flow.
    let status = registry
        .handle_packet(shard(1, 1, 2, b"ZZ"), frame(3), from)
        .expect("existing stream unaffected by the cap");
    assert!(matches!(status, SplitStatus::Complete(_)));
}

#[test]
fn oversized_message_drops_only_its_own_stream() {
    let mut registry = SplitRegistry::new(small_config());
    let from = sender(11);

    registry
        .handle_packet(shard(1, 0, 2, b"AA"), frame(0), from)
        .expect("small stream accepted");
    registry
        .handle_packet(shard(2, 0, 3, &[0x42; 60]), frame(1), from)
        .expect("large stream accepted");

    let err = registry
        .handle_packet(shard(2, 1, 3, &[0x42; 60]), frame(2), from)
        .expect_err("stream crossing the byte cap must be dropped");
    assert!(matches!(err, ReassemblyError::MessageTooLarge { .. }));
    assert_eq!(registry.in_flight(), 1);

    let status = registry
        .handle_packet(shard(1, 1, 2, b"BB"), frame(3), from)
        .expect("unrelated stream unaffected");
    assert!(matches!(status, SplitStatus::Complete(_)));
}

#[test]
fn senders_with_equal_split_ids_accumulate_independently() {
    let mut registry = SplitRegistry::new(small_config());
    let alice = sender(12);
    let bob = sender(13);

    registry
        .handle_packet(shard(5, 0, 2, b"AL"), frame(0), alice)
        .expect("alice fragment accepted");
    registry
        .handle_packet(shard(5, 0, 2, b"BO"), frame(1), bob)
        .expect("bob fragment accepted");
    assert_eq!(registry.in_flight(), 2);

    let SplitStatus::Complete(from_alice) = registry
        .handle_packet(shard(5, 1, 2, b"IC"), frame(2), alice)
        .expect("alice stream completes")
    else {
        panic!("alice stream must complete");
    };
    assert_eq!(from_alice.payload(), b"ALIC");

    let SplitStatus::Complete(from_bob) = registry
        .handle_packet(shard(5, 1, 2, b"BB"), frame(3), bob)
        .expect("bob stream completes")
    else {
        panic!("bob stream must complete");
    };
    assert_eq!(from_bob.payload(), b"BOBB");
}

#[test]
fn late_fragment_after_finalisation_opens_a_fresh_stream() {
    let mut registry = SplitRegistry::new(small_config());
    let from = sender(14);

    registry
        .handle_packet(shard(5, 0, 2, b"AA"), frame(0), from)
        .expect("first fragment accepted");
    registry
        .handle_packet(shard(5, 1, 2, b"BB"), frame(1), from)
        .expect("stream completes");
    assert_eq!(registry.in_flight(), 0);

    let status = registry
        .handle_packet(shard(5, 1, 2, b"BB"), frame(2), from)
        .expect("late duplicate becomes a fresh stream");
    assert!(matches!(status, SplitStatus::Pending(_)));
    assert_eq!(registry.in_flight(), 1);
}

#[test]
fn purge_expired_at_evicts_only_stale_streams() {
    let mut registry = SplitRegistry::new(small_config());
    let start = Instant::now();

    registry
        .handle_packet_at(shard(1, 0, 2, b"AA"), frame(0), sender(15), start)
        .expect("stale stream accepted");
    registry
        .handle_packet_at(
            shard(2, 0, 2, b"BB"),
            frame(1),
            sender(15),
            start + Duration::from_secs(20),
        )
        .expect("fresh stream accepted");

    let evicted = registry.purge_expired_at(start + Duration::from_secs(35));
    assert_eq!(evicted.len(), 1);
    assert_eq!(evicted[0].split_id, SplitId::new(1));
    assert_eq!(registry.in_flight(), 1);
}

#[test]
fn packet_arrival_purges_expired_streams_inline() {
    let mut registry = SplitRegistry::new(small_config());
    let start = Instant::now();
    let from = sender(16);

    registry
        .handle_packet_at(shard(1, 0, 2, b"AA"), frame(0), from, start)
        .expect("stream accepted");

    // The stream expires before the next packet, so its slot 1 arrival
    // starts over instead of completing.
    let status = registry
        .handle_packet_at(
            shard(1, 1, 2, b"BB"),
            frame(1),
            from,
            start + Duration::from_secs(31),
        )
        .expect("fragment accepted into a fresh stream");
    assert!(matches!(status, SplitStatus::Pending(_)));
}
