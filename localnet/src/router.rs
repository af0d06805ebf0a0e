//! Router: store-and-forward delivery among linked servers.
//!
//! # Flow
//!
//! 1. A linked server hands its message to [`Router::receive`], tagged
//!    with its own address as the sender
//! 2. The router buffers the message only while the sender is linked
//! 3. [`Router::flush`] drains the buffer in arrival order, delivering
//!    each message to the linked server matching its destination and
//!    dropping the rest
//!
//! # Link policy
//!
//! Link and unlink are fully bidirectional: the router's membership map
//! and the server's back-reference are always updated together, so a
//! server never points at a router that does not list it. Linking a
//! server that is already linked elsewhere moves it; unlinking an address
//! that is not present is a caller error.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::address::Address;
use crate::data::Data;
use crate::error::RouterError;
use crate::server::Server;

/// Routing node mediating delivery among the servers linked to it.
///
/// Routers are shared as `Rc<Router>` so linked servers can hold weak
/// back-references. Dropping a router never destroys or blocks on its
/// servers; their back-references simply stop upgrading.
#[derive(Debug, Default)]
pub struct Router {
    linked: RefCell<HashMap<Address, Rc<Server>>>,
    inbound: RefCell<VecDeque<Data>>,
}

impl Router {
    /// Create a router with no linked servers and an empty buffer.
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Link `server` to this router, keyed by its address.
    ///
    /// Idempotent for the same pair. A server holds at most one router
    /// link, so linking a server currently linked to a different router
    /// removes it from that router first.
    pub fn link(self: &Rc<Self>, server: &Rc<Server>) {
        if let Some(previous) = server.linked_router() {
            if !Rc::ptr_eq(&previous, self) {
                previous.linked.borrow_mut().remove(&server.address());
            }
        }
        self.linked
            .borrow_mut()
            .insert(server.address(), Rc::clone(server));
        server.set_router(Rc::downgrade(self));
        tracing::debug!(address = %server.address(), "server linked");
    }

    /// Remove `server` from this router and clear its back-reference.
    ///
    /// Returns `RouterError::NotLinked` if the server's address is not
    /// currently linked here; unlinking a never-linked server is a caller
    /// error, not a silent no-op.
    pub fn unlink(&self, server: &Server) -> Result<(), RouterError> {
        let removed = self.linked.borrow_mut().remove(&server.address());
        if removed.is_none() {
            return Err(RouterError::NotLinked {
                address: server.address(),
            });
        }
        server.clear_router();
        tracing::debug!(address = %server.address(), "server unlinked");
        Ok(())
    }

    /// Accept `data` into the inbound buffer if `sender` is currently
    /// linked; drop it silently otherwise.
    pub fn receive(&self, sender: Address, data: Data) {
        if !self.linked.borrow().contains_key(&sender) {
            tracing::debug!(sender = %sender, "message from unlinked sender, dropping");
            return;
        }
        self.inbound.borrow_mut().push_back(data);
    }

    /// Deliver every buffered message once, in arrival order, then clear
    /// the buffer.
    ///
    /// A message whose destination is linked lands in that server's
    /// inbound buffer; anything else is dropped without error or retry.
    /// The buffer is snapshotted up front, so a message buffered after the
    /// snapshot lands in the next flush, never duplicated or lost.
    pub fn flush(&self) {
        let pending = std::mem::take(&mut *self.inbound.borrow_mut());
        for data in pending {
            let target = self.linked.borrow().get(&data.destination()).cloned();
            match target {
                Some(server) => server.receive(data),
                None => {
                    tracing::debug!(
                        destination = %data.destination(),
                        "no linked server for destination, dropping"
                    );
                }
            }
        }
    }

    /// Whether `address` is currently linked to this router.
    pub fn is_linked(&self, address: Address) -> bool {
        self.linked.borrow().contains_key(&address)
    }

    /// Number of servers currently linked.
    pub fn linked_count(&self) -> usize {
        self.linked.borrow().len()
    }

    /// Number of messages buffered and awaiting the next flush.
    pub fn pending(&self) -> usize {
        self.inbound.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressPool;
    use crate::error::AllocatorError;

    fn server(pool: &Rc<AddressPool>) -> Rc<Server> {
        Server::new(pool.clone()).expect("new should succeed")
    }

    #[test]
    fn test_link_is_idempotent() {
        let pool = Rc::new(AddressPool::new());
        let router = Router::new();
        let s1 = server(&pool);

        router.link(&s1);
        router.link(&s1);

        assert_eq!(router.linked_count(), 1);
        assert!(router.is_linked(s1.address()));
        assert!(s1.is_linked());
    }

    #[test]
    fn test_unlink_clears_both_sides() {
        let pool = Rc::new(AddressPool::new());
        let router = Router::new();
        let s1 = server(&pool);

        router.link(&s1);
        router.unlink(&s1).expect("unlink should succeed");

        assert_eq!(router.linked_count(), 0);
        assert!(!s1.is_linked());
    }

    #[test]
    fn test_unlink_never_linked_fails() {
        let pool = Rc::new(AddressPool::new());
        let router = Router::new();
        let s1 = server(&pool);

        let result = router.unlink(&s1);
        assert!(matches!(result, Err(RouterError::NotLinked { .. })));
    }

    #[test]
    fn test_unlink_twice_fails() {
        let pool = Rc::new(AddressPool::new());
        let router = Router::new();
        let s1 = server(&pool);

        router.link(&s1);
        router.unlink(&s1).expect("first unlink should succeed");

        let result = router.unlink(&s1);
        assert!(matches!(result, Err(RouterError::NotLinked { .. })));
    }

    #[test]
    fn test_receive_from_unlinked_sender_is_dropped() {
        let pool = Rc::new(AddressPool::new());
        let router = Router::new();
        let s1 = server(&pool);

        // Never linked: send reaches no router at all.
        s1.send(Data::new("x", s1.address()));
        assert_eq!(router.pending(), 0);

        // Linked then unlinked: send reaches no router either, and a
        // direct receive with a stale sender address is dropped.
        router.link(&s1);
        router.unlink(&s1).expect("unlink should succeed");
        s1.send(Data::new("y", s1.address()));
        router.receive(s1.address(), Data::new("z", s1.address()));
        assert_eq!(router.pending(), 0);
    }

    #[test]
    fn test_flush_delivers_in_fifo_order() {
        let pool = Rc::new(AddressPool::new());
        let router = Router::new();
        let s1 = server(&pool);
        let s2 = server(&pool);
        router.link(&s1);
        router.link(&s2);

        s1.send(Data::new("a", s2.address()));
        s1.send(Data::new("b", s2.address()));
        assert_eq!(router.pending(), 2);

        router.flush();

        let drained = s2.drain();
        let payloads: Vec<&str> = drained.iter().map(Data::payload).collect();
        assert_eq!(payloads, ["a", "b"]);
        assert_eq!(router.pending(), 0);
    }

    #[test]
    fn test_flush_drops_unknown_destination() {
        let pool = Rc::new(AddressPool::new());
        let router = Router::new();
        let s1 = server(&pool);
        router.link(&s1);

        s1.send(Data::new("x", Address(99)));
        assert_eq!(router.pending(), 1);

        router.flush();

        assert_eq!(router.pending(), 0);
        assert!(s1.drain().is_empty());
    }

    #[test]
    fn test_buffered_message_for_since_unlinked_destination_is_dropped() {
        let pool = Rc::new(AddressPool::new());
        let router = Router::new();
        let s1 = server(&pool);
        let s2 = server(&pool);
        router.link(&s1);
        router.link(&s2);

        // Accepted while s2 was linked, destination gone by flush time.
        s1.send(Data::new("late", s2.address()));
        router.unlink(&s2).expect("unlink should succeed");

        router.flush();

        assert!(s2.drain().is_empty());
        assert_eq!(router.pending(), 0);
    }

    #[test]
    fn test_link_to_second_router_moves_the_server() {
        let pool = Rc::new(AddressPool::new());
        let r1 = Router::new();
        let r2 = Router::new();
        let s1 = server(&pool);

        r1.link(&s1);
        r2.link(&s1);

        assert!(!r1.is_linked(s1.address()));
        assert!(r2.is_linked(s1.address()));

        // Sends now land in the second router only.
        s1.send(Data::new("moved", s1.address()));
        assert_eq!(r1.pending(), 0);
        assert_eq!(r2.pending(), 1);
    }

    #[test]
    fn test_router_drop_leaves_servers_alive_and_unlinked() {
        let pool = Rc::new(AddressPool::new());
        let s1 = server(&pool);

        {
            let router = Router::new();
            router.link(&s1);
            assert!(s1.is_linked());
        }

        assert!(!s1.is_linked());
        // The server still works; sending is just a silent no-op now.
        s1.send(Data::new("void", s1.address()));
        assert!(s1.drain().is_empty());
    }

    #[test]
    fn test_linked_server_address_stays_unique_after_reuse() -> Result<(), AllocatorError> {
        let pool = Rc::new(AddressPool::new());
        let router = Router::new();

        let first = {
            let s1 = Server::new(pool.clone())?;
            router.link(&s1);
            let addr = s1.address();
            router.unlink(&s1).expect("unlink should succeed");
            addr
        };

        // The dropped server's address comes back for the next one.
        let s2 = Server::new(pool.clone())?;
        assert_eq!(s2.address(), first);
        router.link(&s2);
        assert_eq!(router.linked_count(), 1);
        Ok(())
    }
}
