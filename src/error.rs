use thiserror::Error;

/// Failures surfaced by the memory-management and scheduling core.
///
/// Every operation reports to its direct caller; nothing is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Bad or stale region id, zero-length request, or a slot that is not in
    /// the state the operation expects.
    #[error("invalid region {0}")]
    InvalidRegion(usize),

    #[error("invalid vm area {0}")]
    InvalidVma(usize),

    /// Access to an address that no vm area or region covers.
    #[error("address {0:#010x} is not mapped")]
    InvalidAddress(usize),

    #[error("cannot grow vm area {vma} by {increment} bytes")]
    OutOfSpace { vma: usize, increment: usize },

    #[error("page {0} faulted with no resident page to evict")]
    NoVictim(usize),

    #[error("physical memory operation failed: {0}")]
    IoFailure(String),

    #[error("ready queue is empty")]
    QueueEmpty,

    #[error("ready queue is full ({0} slots)")]
    QueueFull(usize),
}

pub type Result<T> = std::result::Result<T, SimError>;
