//! Per-instance driver slots.

use tracing::debug;

use provideo_core::error::{Error, Result};

/// Holds the driver table registered for one command domain.
///
/// A device owns one slot per domain. Registering replaces whatever was
/// there before; looking up an empty slot fails with
/// [`Error::NoDriver`]. Slots are only mutated through `&mut self`, so a
/// registration can never race with a call into the domain.
pub struct DriverSlot<T: ?Sized> {
    domain: &'static str,
    table: Option<Box<T>>,
}

impl<T: ?Sized> DriverSlot<T> {
    /// An empty slot for the named domain.
    pub const fn new(domain: &'static str) -> Self {
        DriverSlot {
            domain,
            table: None,
        }
    }

    pub fn domain(&self) -> &'static str {
        self.domain
    }

    /// Install a driver table, returning the one it replaces.
    pub fn register(&mut self, table: Box<T>) -> Option<Box<T>> {
        let previous = self.table.replace(table);
        debug!(
            domain = self.domain,
            replaced = previous.is_some(),
            "driver registered"
        );
        previous
    }

    /// Remove the driver table, returning it.
    pub fn unregister(&mut self) -> Option<Box<T>> {
        let previous = self.table.take();
        if previous.is_some() {
            debug!(domain = self.domain, "driver unregistered");
        }
        previous
    }

    /// The registered table.
    pub fn get(&self) -> Result<&T> {
        self.table.as_deref().ok_or(Error::NoDriver(self.domain))
    }

    pub fn is_registered(&self) -> bool {
        self.table.is_some()
    }
}

impl<T: ?Sized> std::fmt::Debug for DriverSlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverSlot")
            .field("domain", &self.domain)
            .field("registered", &self.is_registered())
            .finish()
    }
}
