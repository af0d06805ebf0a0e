//! # localnet
//!
//! An in-process simulation of a small local network: servers obtain unique
//! integer addresses from a shared pool, attach to a router, and exchange
//! discrete messages by address using store-and-forward delivery.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  send   ┌──────────────┐  flush  ┌──────────┐
//! │ Server 1 │ ───────>│    Router    │ ───────>│ Server 2 │
//! └──────────┘         │ linked map + │         └──────────┘
//!      │               │ FIFO buffer  │              │
//!      │               └──────────────┘              │
//!      └────────────── AddressPool (shared) ─────────┘
//! ```
//!
//! - [`AddressPool`] issues and reclaims unique [`Address`] values; every
//!   server takes a handle to the same pool via the [`AddressAllocator`]
//!   trait, so address uniqueness holds across the whole simulation.
//! - [`Server`] holds an address, a FIFO inbound buffer, and an optional
//!   link to one [`Router`].
//! - [`Router`] keeps the set of linked servers keyed by address plus its
//!   own FIFO buffer of messages awaiting delivery.
//! - [`Data`] is an immutable message envelope: payload plus destination.
//!
//! ## Delivery model
//!
//! Delivery is best-effort store-and-forward. A linked server hands its
//! message to the router synchronously; the router buffers it only while
//! the sender is linked. A later [`Router::flush`] drains the buffer in
//! arrival order, delivering each message to the linked server matching
//! its destination and silently dropping the rest. Nothing is retried or
//! acknowledged.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use localnet::{AddressPool, Data, Router, Server};
//!
//! # fn main() -> Result<(), localnet::AllocatorError> {
//! let pool = Rc::new(AddressPool::new());
//! let router = Router::new();
//!
//! let alice = Server::new(pool.clone())?;
//! let bob = Server::new(pool.clone())?;
//! router.link(&alice);
//! router.link(&bob);
//!
//! alice.send(Data::new("hello", bob.address()));
//! router.flush();
//! assert_eq!(bob.drain()[0].payload(), "hello");
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency Model
//!
//! The simulation is single-threaded and synchronous: every operation runs
//! to completion without suspension. Shared state lives behind
//! `Rc`/`RefCell`, no borrow is held across a call into another component,
//! and the types are deliberately `!Send`/`!Sync`. A host driving many
//! servers does so from one thread of control (or one cooperative task
//! set), which serializes the allocator and the router's membership checks
//! by construction.

#![deny(missing_docs)]

mod address;
mod data;
mod error;
mod router;
mod server;

pub use address::{Address, AddressAllocator, AddressPool};
pub use data::Data;
pub use error::{AllocatorError, RouterError};
pub use router::Router;
pub use server::Server;
