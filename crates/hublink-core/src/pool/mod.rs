//! Pooled device connections.
//!
//! Devices that share an authentication scope (e.g. a shared-access-key
//! name) can share physical connections. Each scope gets a fixed-size array
//! of slots; a slot holds at most one connection and counts the device
//! units attached to it:
//!
//! ```text
//! Empty -> Opening -> Open (units > 0) -> Closing -> Empty
//! ```
//!
//! New units take the first empty slot, otherwise join the least-loaded
//! holder. The connection is opened by the unit that claimed the empty slot,
//! outside the scope lock; units joining a holder that is still opening wait
//! for that open to finish. The last unit to leave closes the connection
//! and frees the slot.
//!
//! Devices with pooling disabled get a dedicated connection that never
//! enters a slot array.

mod error;
mod holder;
mod identity;
mod manager;
mod scope;
mod settings;
mod store;
mod unit;

pub use error::PoolError;
pub use holder::{ConnectionHolder, SlotState};
pub use identity::{DeviceIdentity, PhysicalConnection};
pub use manager::ConnectionPool;
pub use scope::{PoolStats, ScopeSlots};
pub use settings::{PoolSettings, ABSOLUTE_MAX_POOL_SIZE, DEFAULT_POOL_SIZE};
pub use store::{HolderStore, InMemoryHolderStore};
pub use unit::DeviceUnit;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock ignoring poison: every critical section leaves the state consistent
/// before doing anything that could panic.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
