use alloc::string::String;
use core::fmt;

/// A failure reported by a host item while creating, updating or destroying its handle.
///
/// Item failures never propagate out of the engine: they are logged and the affected index is
/// skipped or shown as a blank placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemError {
    message: String,
}

impl ItemError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl core::error::Error for ItemError {}

impl From<&str> for ItemError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ItemError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

/// The item lifecycle hook that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    Create,
    Update,
    Destroy,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Update => f.write_str("update"),
            Self::Destroy => f.write_str("destroy"),
        }
    }
}

/// A logged item failure, tagged with the index it happened at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderFailure {
    pub index: usize,
    pub phase: Phase,
    pub error: ItemError,
}

impl fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed at index {}: {}", self.phase, self.index, self.error)
    }
}

/// Outcome of [`crate::RecyclingPool::acquire`] when the item could not be bound cleanly.
pub enum AcquireError<H> {
    /// `create` failed; no handle exists for the index.
    Create(ItemError),
    /// A handle was obtained but `update` failed. The handle has been blanked and can still be
    /// bound as a placeholder.
    Update { handle: H, error: ItemError },
}

impl<H> AcquireError<H> {
    pub fn error(&self) -> &ItemError {
        match self {
            Self::Create(error) => error,
            Self::Update { error, .. } => error,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Self::Create(_) => Phase::Create,
            Self::Update { .. } => Phase::Update,
        }
    }
}

impl<H> fmt::Debug for AcquireError<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create(error) => f.debug_tuple("Create").field(error).finish(),
            Self::Update { error, .. } => f
                .debug_struct("Update")
                .field("error", error)
                .finish_non_exhaustive(),
        }
    }
}

impl<H> fmt::Display for AcquireError<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.phase(), self.error())
    }
}
