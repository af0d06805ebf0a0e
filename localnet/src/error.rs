//! Error types for the localnet simulation.
//!
//! Structural misuse (releasing an address that was never handed out,
//! unlinking a server that was never linked) is surfaced to the caller.
//! Routing misses are not errors: a message from an unlinked sender or to
//! an unknown destination is dropped silently, matching the best-effort,
//! no-acknowledgment delivery model.

use crate::address::Address;
use thiserror::Error;

/// Errors from address pool operations.
#[derive(Debug, Error)]
pub enum AllocatorError {
    /// Every value in `[1, counter]` is already assigned. The pool
    /// guarantees a free value whenever its bookkeeping is intact, so this
    /// indicates a counter/assigned-set defect, not a normal outcome.
    #[error("address pool inconsistency: all {counter} addresses assigned")]
    PoolInconsistency {
        /// High-water counter at the time of the failed allocation.
        counter: u32,
    },

    /// Release of an address that is not currently assigned.
    #[error("address not assigned: {address}")]
    NotAssigned {
        /// The address the caller tried to release.
        address: Address,
    },
}

/// Errors from router operations.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Unlink of a server whose address is not linked to this router.
    #[error("address not linked: {address}")]
    NotLinked {
        /// The address the caller tried to unlink.
        address: Address,
    },
}
