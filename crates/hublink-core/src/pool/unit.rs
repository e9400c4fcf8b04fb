//! A device's claim on a connection.

use std::fmt;
use std::mem;
use std::sync::Arc;

use super::holder::{ConnectionHolder, Detached};
use super::identity::PhysicalConnection;
use super::scope::{ClearSlot, ScopeSlots};

/// One device's claim on a pooled or dedicated connection.
///
/// Obtained from [`ConnectionPool::create_unit`](super::ConnectionPool::create_unit)
/// and given back with [`ConnectionPool::remove_unit`](super::ConnectionPool::remove_unit).
/// A unit dropped without being removed still releases its claim; if it was
/// the last one, the connection is closed on a background task.
#[must_use = "a unit holds a pool slot until it is removed or dropped"]
pub struct DeviceUnit<C: PhysicalConnection> {
    device_id: String,
    holder: Arc<ConnectionHolder<C>>,
    scope: Option<Arc<ScopeSlots<C>>>,
    removed: bool,
}

type UnitParts<C> = (String, Arc<ConnectionHolder<C>>, Option<Arc<ScopeSlots<C>>>);

impl<C: PhysicalConnection> DeviceUnit<C> {
    pub(crate) fn pooled(
        device_id: &str,
        holder: Arc<ConnectionHolder<C>>,
        scope: Arc<ScopeSlots<C>>,
    ) -> Self {
        Self {
            device_id: device_id.to_string(),
            holder,
            scope: Some(scope),
            removed: false,
        }
    }

    pub(crate) fn dedicated(device_id: &str, holder: Arc<ConnectionHolder<C>>) -> Self {
        Self {
            device_id: device_id.to_string(),
            holder,
            scope: None,
            removed: false,
        }
    }

    /// Disarm the drop release; the caller takes over the claim.
    pub(crate) fn into_parts(mut self) -> UnitParts<C> {
        self.removed = true;
        (
            mem::take(&mut self.device_id),
            Arc::clone(&self.holder),
            self.scope.take(),
        )
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn is_pooled(&self) -> bool {
        self.scope.is_some()
    }

    pub fn scope_key(&self) -> Option<&str> {
        self.scope.as_deref().map(ScopeSlots::key)
    }

    pub fn slot(&self) -> Option<usize> {
        self.holder.slot()
    }

    /// Units currently sharing this unit's connection (including this one).
    pub fn shared_with(&self) -> usize {
        self.holder.units()
    }

    /// Run `f` against the connection. `None` once it is closing.
    ///
    /// The connection is only lent for the call, so a unit never hands out
    /// a handle that outlives its claim.
    pub fn with_connection<R>(&self, f: impl FnOnce(&C) -> R) -> Option<R> {
        let conn = self.holder.connection()?;
        Some(f(&conn))
    }
}

impl<C: PhysicalConnection> Drop for DeviceUnit<C> {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        let detached = match &self.scope {
            Some(scope) => scope.release(&self.holder),
            None => self.holder.detach(),
        };
        if let Detached::Close(conn) = detached {
            tracing::debug!(
                device_id = %self.device_id,
                scope = ?self.scope_key(),
                "unit dropped without removal; closing in background"
            );
            let clear = self
                .scope
                .as_ref()
                .map(|scope| ClearSlot::new(Arc::clone(scope), Arc::clone(&self.holder)));
            close_in_background(conn, clear);
        }
    }
}

/// Close `conn` on the current runtime, clearing its slot afterwards.
/// Without a runtime the slot is cleared and the connection just dropped.
pub(crate) fn close_in_background<C: PhysicalConnection>(
    conn: Arc<C>,
    clear: Option<ClearSlot<C>>,
) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                let _clear = clear;
                conn.close().await;
            });
        }
        Err(_) => drop(clear),
    }
}

impl<C: PhysicalConnection> fmt::Debug for DeviceUnit<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceUnit")
            .field("device_id", &self.device_id)
            .field("scope", &self.scope_key())
            .field("slot", &self.slot())
            .finish()
    }
}
