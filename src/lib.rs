#![doc(html_root_url = "https://docs.rs/splitwire/latest")]
//! Public API for the `splitwire` library.
//!
//! This crate provides the fragment-reassembly layer of a client for a
//! UDP-based reliable transport: routing payload shards into per-message
//! buffers, growing each message's contiguous prefix as gaps fill in, and
//! handing the reconstructed byte stream to the decoding layer the moment
//! the last declared fragment lands. The raw frame decoder, the reliability
//! sub-layer, and the bit-level payload reader live outside this crate.

pub mod metrics;
pub mod reaper;
pub mod reassembly;
pub mod session;

pub use reassembly::{
    AssembledMessage,
    EvictedStream,
    FragmentIndex,
    FragmentStatus,
    MessageId,
    MessageTrail,
    RawFrame,
    ReassemblyConfig,
    ReassemblyError,
    ReliablePacket,
    SplitId,
    SplitProgress,
    SplitRegistry,
    SplitStatus,
};
pub use session::{ConnectionId, ConnectionTable, RegistryHandle};
