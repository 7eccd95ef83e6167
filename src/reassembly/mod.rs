//! Split-packet reassembly primitives.
//!
//! This module collects the domain types used to reconstruct application
//! messages from the fragments a sender split them into. Each sub-module
//! focuses on a single concept to keep the code small and easy to audit
//! while still providing a cohesive API at the crate root.

pub mod buffer;
pub mod config;
pub mod error;
pub mod id;
pub mod packet;
pub mod registry;
pub mod trail;

pub use buffer::{AssembledMessage, SplitProgress};
pub use config::ReassemblyConfig;
pub use error::{FragmentStatus, ReassemblyError};
pub use id::{FragmentIndex, MessageId, SplitId};
pub use packet::{RawFrame, ReliablePacket};
pub use registry::{EvictedStream, SplitRegistry, SplitStatus};
pub use trail::MessageTrail;
