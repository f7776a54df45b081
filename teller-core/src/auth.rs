//! Authentication collaborator
//!
//! PIN verification happens once per session, before any teller operation is
//! permitted. The core only consumes this capability; real credential
//! storage lives outside.

use crate::account::CustomerNumber;
use dashmap::DashMap;

/// Session authentication capability
pub trait Authentication: Send + Sync {
    /// Whether the PIN matches the customer's record
    fn verify(&self, customer: CustomerNumber, pin: u32) -> bool;
}

/// In-memory PIN store (dev/testing)
#[derive(Debug, Default)]
pub struct MemoryAuthentication {
    pins: DashMap<CustomerNumber, u32>,
}

impl MemoryAuthentication {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a customer's PIN (fluent, for wiring dev fixtures)
    pub fn seed(self, customer: CustomerNumber, pin: u32) -> Self {
        self.pins.insert(customer, pin);
        self
    }
}

impl Authentication for MemoryAuthentication {
    fn verify(&self, customer: CustomerNumber, pin: u32) -> bool {
        self.pins.get(&customer).map(|stored| *stored) == Some(pin)
    }
}
