//! Server: an addressed host that originates and receives messages.
//!
//! A server owns nothing but its inbound buffer. The address it carries
//! belongs to the shared pool and goes back to it when the server is
//! dropped; the router link is a `Weak` relation, never an ownership edge,
//! so a router and its servers can be destroyed independently.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::address::{Address, AddressAllocator};
use crate::data::Data;
use crate::error::AllocatorError;
use crate::router::Router;

/// A host with a unique address, a FIFO inbound buffer, and an optional
/// link to one [`Router`].
///
/// Servers are shared as `Rc<Server>`: the router keeps a strong reference
/// to every linked server, while the server keeps only a weak
/// back-reference to the router.
#[derive(Debug)]
pub struct Server {
    address: Address,
    inbound: RefCell<VecDeque<Data>>,
    linked_router: RefCell<Weak<Router>>,
    allocator: Rc<dyn AddressAllocator>,
}

impl Server {
    /// Create a server with a freshly allocated address, an empty buffer,
    /// and no router link.
    pub fn new(allocator: Rc<dyn AddressAllocator>) -> Result<Rc<Self>, AllocatorError> {
        let address = allocator.allocate()?;
        Ok(Rc::new(Self {
            address,
            inbound: RefCell::new(VecDeque::new()),
            linked_router: RefCell::new(Weak::new()),
            allocator,
        }))
    }

    /// This server's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Link this server to `router`.
    ///
    /// Convenience for [`Router::link`]; both sides of the relation are
    /// always maintained together.
    pub fn link(self: &Rc<Self>, router: &Rc<Router>) {
        router.link(self);
    }

    /// Whether this server currently has a live router link.
    pub fn is_linked(&self) -> bool {
        self.linked_router.borrow().upgrade().is_some()
    }

    /// Hand `data` to the linked router, tagged with this server's address
    /// as the sender.
    ///
    /// Synchronous and best-effort: a server with no live link drops the
    /// message silently.
    pub fn send(&self, data: Data) {
        let router = self.linked_router.borrow().upgrade();
        match router {
            Some(router) => router.receive(self.address, data),
            None => {
                tracing::debug!(sender = %self.address, "send without router link, dropping");
            }
        }
    }

    /// Append `data` to the inbound buffer.
    ///
    /// Always succeeds; the buffer is unbounded.
    pub fn receive(&self, data: Data) {
        self.inbound.borrow_mut().push_back(data);
    }

    /// Return and clear the inbound buffer, preserving arrival order.
    pub fn drain(&self) -> Vec<Data> {
        self.inbound.borrow_mut().drain(..).collect()
    }

    pub(crate) fn set_router(&self, router: Weak<Router>) {
        *self.linked_router.borrow_mut() = router;
    }

    pub(crate) fn clear_router(&self) {
        *self.linked_router.borrow_mut() = Weak::new();
    }

    pub(crate) fn linked_router(&self) -> Option<Rc<Router>> {
        self.linked_router.borrow().upgrade()
    }
}

impl Drop for Server {
    /// The address is released exactly when the server's lifetime ends.
    fn drop(&mut self) {
        if let Err(err) = self.allocator.release(self.address) {
            // Cannot happen while the pool invariants hold, but a Drop impl
            // has nowhere to propagate an error.
            tracing::warn!(address = %self.address, %err, "failed to release address on drop");
        }
    }
}
