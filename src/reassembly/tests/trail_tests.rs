//! Tests for the shared diagnostic trail handle.

use std::net::SocketAddr;

use crate::reassembly::{
    FragmentIndex,
    MessageTrail,
    RawFrame,
    ReassemblyConfig,
    ReliablePacket,
    SplitId,
    SplitRegistry,
    SplitStatus,
};

#[test]
fn clones_share_one_growing_trail() {
    let trail = MessageTrail::new();
    let rebound = trail.clone();

    trail.record("first");
    rebound.record("second");

    assert_eq!(trail.lines(), vec!["first".to_owned(), "second".to_owned()]);
    assert_eq!(rebound.len(), 2);
}

#[test]
fn empty_trail_reports_empty() {
    let trail = MessageTrail::new();
    assert!(trail.is_empty());
    trail.record("line");
    assert!(!trail.is_empty());
}

#[test]
fn fragments_of_one_message_accumulate_in_one_trail() {
    let mut registry = SplitRegistry::new(ReassemblyConfig::default());
    let sender = SocketAddr::from(([203, 0, 113, 20], 40_000));

    let first = ReliablePacket::split(
        &b"AA"[..],
        SplitId::new(1),
        FragmentIndex::zero(),
        2,
    );
    let SplitStatus::Pending(progress) = registry
        .handle_packet(first, RawFrame::new(0, 2), sender)
        .expect("fragment accepted")
    else {
        panic!("stream must stay pending");
    };

    // The caller rebinds its per-packet sink to the message's trail.
    let rebound = progress.trail.clone();
    rebound.record("decoder waiting on fragment 1");

    let last = ReliablePacket::split(&b"BB"[..], SplitId::new(1), FragmentIndex::new(1), 2);
    let SplitStatus::Complete(message) = registry
        .handle_packet(last, RawFrame::new(1, 2), sender)
        .expect("fragment accepted")
    else {
        panic!("stream must complete");
    };

    let lines = message.trail().lines();
    assert!(lines.iter().any(|line| line == "decoder waiting on fragment 1"));
    assert!(lines.iter().any(|line| line.contains("finalised")));
}
