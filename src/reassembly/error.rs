//! Error and status types emitted by the reassembly layer.
//!
//! None of these conditions is fatal to the owning connection: a rejected
//! fragment affects only its own logical message, so callers log the error
//! and keep pumping packets.

use std::num::{NonZeroU32, NonZeroUsize};

use thiserror::Error;

use super::{FragmentIndex, MessageId, SplitId};

/// Result of placing a fragment into a split buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FragmentStatus {
    /// The logical message still expects more fragments.
    Incomplete,
    /// The contiguous prefix now covers every declared fragment.
    Complete,
}

/// Errors produced while routing fragments into reassembly buffers.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// The fragment's index is not addressable within the declared count.
    #[error("fragment index {index} out of range for stream {split_id} with {declared} declared")]
    IndexOutOfRange {
        /// Stream the fragment claimed to belong to.
        split_id: SplitId,
        /// Index carried by the rejected fragment.
        index: FragmentIndex,
        /// Slot count fixed when the stream's first fragment arrived.
        declared: u32,
    },
    /// The declared fragment count is zero or above the configured cap.
    #[error("stream {split_id} declared {declared} fragments, limit is {limit}")]
    CountOutOfRange {
        /// Stream the fragment claimed to belong to.
        split_id: SplitId,
        /// Declared total that triggered the guard.
        declared: u32,
        /// Configured cap on declared counts.
        limit: NonZeroU32,
    },
    /// The connection already buffers the maximum number of split streams.
    #[error("too many split streams in flight, limit is {limit}")]
    TooManyStreams {
        /// Configured cap on concurrent streams.
        limit: NonZeroUsize,
    },
    /// The message's received bytes would exceed the configured cap.
    #[error("message {message_id} exceeds size limit: {attempted} bytes > {limit} bytes")]
    MessageTooLarge {
        /// Message whose stream was dropped.
        message_id: MessageId,
        /// Total that triggered the guard.
        attempted: usize,
        /// Configured size cap.
        limit: NonZeroUsize,
    },
}
