//! Creating and removing device units.

use std::sync::Arc;

use tokio::sync::watch;

use super::error::PoolError;
use super::holder::{ConnectionHolder, Detached, OpenSignal, SlotState};
use super::identity::{DeviceIdentity, PhysicalConnection};
use super::scope::{Claim, ClearSlot, PoolStats, ScopeSlots};
use super::store::{HolderStore, InMemoryHolderStore};
use super::unit::{close_in_background, DeviceUnit};

/// Hands out device units backed by pooled or dedicated connections.
///
/// Constructed explicitly and owned by whatever creates transports; several
/// pools can coexist (e.g. one per test).
pub struct ConnectionPool<C> {
    store: Arc<dyn HolderStore<C>>,
}

impl<C: PhysicalConnection> Default for ConnectionPool<C> {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl<C: PhysicalConnection> ConnectionPool<C> {
    pub fn new(store: Arc<dyn HolderStore<C>>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryHolderStore::new()))
    }

    /// Scope keys that have a slot array, sorted.
    pub fn scopes(&self) -> Vec<String> {
        self.store.keys()
    }

    /// Slot states for `key`, or `None` if no pooled unit ever used it.
    pub fn slot_states(&self, key: &str) -> Option<Vec<SlotState>> {
        self.store.get(key).map(|scope| scope.slot_states())
    }

    pub fn stats(&self, key: &str) -> Option<PoolStats> {
        self.store.get(key).map(|scope| scope.stats())
    }

    /// Attach a unit for `identity`.
    ///
    /// With pooling disabled this opens a dedicated connection. Otherwise the
    /// unit takes the first empty slot of the identity's scope (opening its
    /// connection) or joins the least-loaded holder. Open failures are
    /// returned to the caller; no retry happens here.
    pub async fn create_unit<I>(&self, identity: &I) -> Result<DeviceUnit<C>, PoolError>
    where
        I: DeviceIdentity<Connection = C> + ?Sized,
    {
        if !identity.is_pooling_enabled() {
            return create_dedicated(identity).await;
        }

        let scope = self
            .store
            .get_or_create(identity.auth_scope_key(), identity.max_pool_size());

        let claim = loop {
            let freed = scope.freed().notified();
            tokio::pin!(freed);
            freed.as_mut().enable();
            match scope.claim() {
                Some(claim) => break claim,
                None => {
                    tracing::debug!(scope = scope.key(), "all slots closing; waiting");
                    freed.await;
                }
            }
        };

        match claim {
            Claim::Joined(holder) => Ok(DeviceUnit::pooled(identity.device_id(), holder, scope)),
            Claim::Opener(holder, tx) => open_slot(identity, scope, holder, tx).await,
            Claim::Waiting(holder, rx) => {
                wait_for_open(identity.device_id(), scope, holder, rx).await
            }
        }
    }

    /// Detach `unit`. The last unit on a holder closes its connection and
    /// returns the slot to `Empty` before this resolves.
    pub async fn remove_unit(&self, unit: DeviceUnit<C>) {
        let (device_id, holder, scope) = unit.into_parts();
        let Some(scope) = scope else {
            if let Detached::Close(conn) = holder.detach() {
                conn.close().await;
                tracing::info!(device_id = %device_id, "closed dedicated connection");
            }
            return;
        };

        match scope.release(&holder) {
            Detached::InUse(units) => {
                tracing::debug!(
                    device_id = %device_id,
                    scope = scope.key(),
                    slot = ?holder.slot(),
                    units,
                    "detached unit"
                );
            }
            Detached::Close(conn) => {
                let slot = holder.slot();
                let _clear = ClearSlot::new(Arc::clone(&scope), holder);
                conn.close().await;
                tracing::info!(
                    device_id = %device_id,
                    scope = scope.key(),
                    slot = ?slot,
                    "closed pooled connection"
                );
            }
            Detached::Gone => {}
        }
    }
}

async fn create_dedicated<C, I>(identity: &I) -> Result<DeviceUnit<C>, PoolError>
where
    C: PhysicalConnection,
    I: DeviceIdentity<Connection = C> + ?Sized,
{
    let conn = identity
        .open_physical_connection()
        .await
        .map_err(|e| PoolError::open(identity.device_id(), None, e))?;
    tracing::info!(device_id = identity.device_id(), "opened dedicated connection");
    Ok(DeviceUnit::dedicated(
        identity.device_id(),
        ConnectionHolder::dedicated(conn),
    ))
}

/// Rolls the slot back to `Empty` unless the open completed.
struct OpenGuard<C> {
    scope: Arc<ScopeSlots<C>>,
    holder: Arc<ConnectionHolder<C>>,
    tx: watch::Sender<OpenSignal>,
    settled: bool,
}

impl<C> OpenGuard<C> {
    fn succeed(mut self) {
        self.settled = true;
        self.tx.send_replace(OpenSignal::Ready);
    }

    fn fail(mut self, reason: String) {
        self.settled = true;
        self.scope.discard(&self.holder);
        self.tx.send_replace(OpenSignal::Failed(reason));
    }
}

impl<C> Drop for OpenGuard<C> {
    fn drop(&mut self) {
        if !self.settled {
            self.scope.discard(&self.holder);
            self.tx.send_replace(OpenSignal::Failed("open was cancelled".to_string()));
        }
    }
}

async fn open_slot<C, I>(
    identity: &I,
    scope: Arc<ScopeSlots<C>>,
    holder: Arc<ConnectionHolder<C>>,
    tx: watch::Sender<OpenSignal>,
) -> Result<DeviceUnit<C>, PoolError>
where
    C: PhysicalConnection,
    I: DeviceIdentity<Connection = C> + ?Sized,
{
    let guard = OpenGuard {
        scope: Arc::clone(&scope),
        holder: Arc::clone(&holder),
        tx,
        settled: false,
    };

    match identity.open_physical_connection().await {
        Ok(conn) => {
            if let Err(conn) = holder.mark_open(conn) {
                // Only reachable if the holder was discarded under us.
                conn.close().await;
                guard.fail("holder discarded during open".to_string());
                return Err(PoolError::OpenAbandoned {
                    scope: scope.key().to_string(),
                    slot: holder.slot().unwrap_or_default(),
                    reason: "holder discarded during open".to_string(),
                });
            }
            guard.succeed();
            tracing::info!(
                device_id = identity.device_id(),
                scope = scope.key(),
                slot = ?holder.slot(),
                "opened pooled connection"
            );
            Ok(DeviceUnit::pooled(identity.device_id(), holder, scope))
        }
        Err(e) => {
            tracing::warn!(
                device_id = identity.device_id(),
                scope = scope.key(),
                slot = ?holder.slot(),
                error = %e,
                "failed to open pooled connection"
            );
            guard.fail(format!("{e:#}"));
            Err(PoolError::open(identity.device_id(), Some(scope.key()), e))
        }
    }
}

/// Gives the claim back if the waiter is dropped before the open settles.
struct PendingAttach<C: PhysicalConnection> {
    scope: Arc<ScopeSlots<C>>,
    holder: Arc<ConnectionHolder<C>>,
    armed: bool,
}

impl<C: PhysicalConnection> Drop for PendingAttach<C> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Detached::Close(conn) = self.scope.release(&self.holder) {
            let clear = ClearSlot::new(Arc::clone(&self.scope), Arc::clone(&self.holder));
            close_in_background(conn, Some(clear));
        }
    }
}

async fn wait_for_open<C: PhysicalConnection>(
    device_id: &str,
    scope: Arc<ScopeSlots<C>>,
    holder: Arc<ConnectionHolder<C>>,
    mut rx: watch::Receiver<OpenSignal>,
) -> Result<DeviceUnit<C>, PoolError> {
    let mut pending = PendingAttach {
        scope: Arc::clone(&scope),
        holder: Arc::clone(&holder),
        armed: true,
    };

    let signal = match rx.wait_for(OpenSignal::is_settled).await {
        Ok(signal) => signal.clone(),
        Err(_) => OpenSignal::Failed("opener went away".to_string()),
    };
    // Settled either way: a failed holder was already discarded by its opener.
    pending.armed = false;

    let reason = match signal {
        OpenSignal::Ready => return Ok(DeviceUnit::pooled(device_id, holder, scope)),
        OpenSignal::Failed(reason) => reason,
        OpenSignal::Pending => "open never settled".to_string(),
    };
    tracing::debug!(device_id, scope = scope.key(), reason = %reason, "shared open failed");
    Err(PoolError::OpenAbandoned {
        scope: scope.key().to_string(),
        slot: holder.slot().unwrap_or_default(),
        reason,
    })
}
