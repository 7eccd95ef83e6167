//! Identifier newtypes used by the reassembly layer.
//!
//! Split-stream identifiers are scoped per sender, so a [`SplitId`] on its
//! own never names a stream; the registry always pairs it with the sender's
//! network address.

use derive_more::{Display, From, Into};

/// Identifier assigned to a logical message by the registry.
///
/// IDs are handed out in buffer-creation order and are never reused for the
/// lifetime of the owning connection.
///
/// # Examples
///
/// ```
/// use splitwire::reassembly::MessageId;
/// let id = MessageId::new(42);
/// assert_eq!(id.get(), 42);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
#[display("{_0}")]
pub struct MessageId(u64);

impl MessageId {
    /// Create a new identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self { Self(value) }

    /// Return the inner numeric identifier.
    #[must_use]
    pub const fn get(self) -> u64 { self.0 }
}

/// Sender-scoped identifier shared by every fragment of one split packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, From, Into)]
#[display("{_0}")]
pub struct SplitId(u16);

impl SplitId {
    /// Create a new split-stream identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self { Self(value) }

    /// Return the underlying numeric value.
    #[must_use]
    pub const fn get(self) -> u16 { self.0 }
}

/// Zero-based ordinal describing a fragment's position within its message.
///
/// # Examples
///
/// ```
/// use splitwire::reassembly::FragmentIndex;
/// let index = FragmentIndex::new(3);
/// assert_eq!(index.get(), 3);
/// assert!(FragmentIndex::zero() < index);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
#[display("{_0}")]
pub struct FragmentIndex(u32);

impl FragmentIndex {
    /// Construct an index from a `u32` value.
    #[must_use]
    pub const fn new(value: u32) -> Self { Self(value) }

    /// Return the first valid fragment index.
    #[must_use]
    pub const fn zero() -> Self { Self(0) }

    /// Return the underlying numeric value.
    #[must_use]
    pub const fn get(self) -> u32 { self.0 }
}

impl From<FragmentIndex> for u32 {
    fn from(value: FragmentIndex) -> Self { value.0 }
}
