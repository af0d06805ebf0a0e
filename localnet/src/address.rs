//! Address allocation: unique integer addresses for live servers.
//!
//! The pool is the simulation's single source of address uniqueness. It is
//! an explicit, injectable service rather than process-global state: every
//! component that needs an address takes a handle to the same pool.
//!
//! # Design
//!
//! - [`AddressAllocator`] is a trait so implementations can range from the
//!   in-memory pool here to something backed by external bookkeeping.
//! - [`AddressPool`] tracks a high-water counter plus the set of assigned
//!   addresses. `allocate` bumps the counter and hands out the smallest
//!   value in `[1, counter]` not currently assigned; `release` removes the
//!   value from the set and shrinks the counter, so the counter always
//!   equals the number of live addresses.
//! - Selection is smallest-available, not random, so allocation sequences
//!   are deterministic and reproducible in tests.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AllocatorError;

/// Unique integer address assigned to a live server.
///
/// Addresses are positive, start at 1, and are unique among all
/// simultaneously-live servers drawing from the same pool. A released
/// address becomes eligible for reuse by later allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub u32);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allocator service issuing and reclaiming unique addresses.
///
/// Servers hold a shared handle (`Rc<dyn AddressAllocator>`) and call
/// `allocate` at construction and `release` when their lifetime ends.
pub trait AddressAllocator: fmt::Debug {
    /// Hand out an address not currently assigned.
    ///
    /// Returns `AllocatorError::PoolInconsistency` only when the pool's
    /// bookkeeping is broken; with the release precondition enforced this
    /// cannot happen.
    fn allocate(&self) -> Result<Address, AllocatorError>;

    /// Return a previously allocated address to the pool.
    ///
    /// Returns `AllocatorError::NotAssigned` if `address` is not currently
    /// assigned.
    fn release(&self, address: Address) -> Result<(), AllocatorError>;
}

#[derive(Debug, Default)]
struct PoolState {
    /// High-water counter: equals the number of live addresses.
    counter: u32,
    assigned: BTreeSet<Address>,
}

/// Shared in-memory address pool.
///
/// All operations are O(log n) set lookups plus a linear scan bounded by
/// the live-address count. No persistence, no background work. Share it as
/// `Rc<AddressPool>`; it coerces to `Rc<dyn AddressAllocator>` where the
/// trait object is expected.
#[derive(Debug, Default)]
pub struct AddressPool {
    state: RefCell<PoolState>,
}

impl AddressPool {
    /// Create a new empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of addresses currently assigned.
    pub fn live_count(&self) -> usize {
        self.state.borrow().assigned.len()
    }

    /// Whether `address` is currently assigned.
    pub fn is_assigned(&self, address: Address) -> bool {
        self.state.borrow().assigned.contains(&address)
    }
}

impl AddressAllocator for AddressPool {
    fn allocate(&self) -> Result<Address, AllocatorError> {
        let mut state = self.state.borrow_mut();
        state.counter += 1;
        let counter = state.counter;
        // Smallest value in [1, counter] not yet assigned. The counter just
        // grew past the assigned count, so the window always has a hole.
        let free = (1..=counter)
            .map(Address)
            .find(|addr| !state.assigned.contains(addr))
            .ok_or(AllocatorError::PoolInconsistency { counter })?;
        state.assigned.insert(free);
        tracing::debug!(address = %free, "allocated address");
        Ok(free)
    }

    fn release(&self, address: Address) -> Result<(), AllocatorError> {
        let mut state = self.state.borrow_mut();
        if !state.assigned.remove(&address) {
            return Err(AllocatorError::NotAssigned { address });
        }
        state.counter -= 1;
        tracing::debug!(address = %address, "released address");
        Ok(())
    }
}
