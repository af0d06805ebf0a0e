//! The `Data` message envelope.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Immutable message envelope: a payload plus the destination address.
///
/// `Data` has no owner of its own. It is handed from a server to a router
/// and on to the destination server by value, resting in whichever FIFO
/// buffer currently holds it. Fields are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    payload: String,
    destination: Address,
}

impl Data {
    /// Create a new message for `destination`.
    pub fn new(payload: impl Into<String>, destination: Address) -> Self {
        Self {
            payload: payload.into(),
            destination,
        }
    }

    /// The message payload.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// The address this message should be delivered to.
    pub fn destination(&self) -> Address {
        self.destination
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Data<{}>", self.payload)
    }
}
