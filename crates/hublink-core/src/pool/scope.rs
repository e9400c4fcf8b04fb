//! Fixed-size slot array for one authentication scope.

use std::sync::{Arc, Mutex};

use tokio::sync::{watch, Notify};

use super::holder::{Attach, ConnectionHolder, Detached, OpenSignal, SlotState};
use super::lock;

/// Outcome of slot selection.
pub(crate) enum Claim<C> {
    /// Took an empty slot; the caller opens the connection and settles the signal.
    Opener(Arc<ConnectionHolder<C>>, watch::Sender<OpenSignal>),
    /// Joined an open holder.
    Joined(Arc<ConnectionHolder<C>>),
    /// Joined a holder whose open is still in flight.
    Waiting(Arc<ConnectionHolder<C>>, watch::Receiver<OpenSignal>),
}

/// Counters for one scope, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub slots: usize,
    pub opening: usize,
    pub open: usize,
    pub closing: usize,
    pub units: usize,
}

/// The slots of one scope key.
///
/// All slot selection and unit counting happens under `slots`; the lock is
/// never held across an await.
pub struct ScopeSlots<C> {
    key: String,
    slots: Mutex<Vec<Option<Arc<ConnectionHolder<C>>>>>,
    freed: Notify,
}

impl<C> ScopeSlots<C> {
    pub fn new(key: impl Into<String>, size: usize) -> Self {
        let mut slots = Vec::with_capacity(size);
        slots.resize_with(size, || None);
        Self {
            key: key.into(),
            slots: Mutex::new(slots),
            freed: Notify::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Number of slots (the configured pool size).
    pub fn size(&self) -> usize {
        lock(&self.slots).len()
    }

    pub fn slot_states(&self) -> Vec<SlotState> {
        lock(&self.slots)
            .iter()
            .map(|s| s.as_ref().map_or(SlotState::Empty, |h| h.state()))
            .collect()
    }

    pub fn stats(&self) -> PoolStats {
        let slots = lock(&self.slots);
        let mut stats = PoolStats {
            slots: slots.len(),
            ..PoolStats::default()
        };
        for holder in slots.iter().flatten() {
            match holder.state() {
                SlotState::Opening => stats.opening += 1,
                SlotState::Open => stats.open += 1,
                SlotState::Closing => stats.closing += 1,
                SlotState::Empty => {}
            }
            stats.units += holder.units();
        }
        stats
    }

    /// Signalled whenever a slot returns to `Empty`.
    pub(crate) fn freed(&self) -> &Notify {
        &self.freed
    }

    /// Pick a slot for a new unit: the first empty slot, otherwise the
    /// attachable holder with the fewest units (lowest index on ties).
    /// `None` when every slot is closing.
    pub(crate) fn claim(&self) -> Option<Claim<C>> {
        let mut slots = lock(&self.slots);

        if let Some(index) = slots.iter().position(Option::is_none) {
            let (holder, tx) = ConnectionHolder::opening(Some(index));
            slots[index] = Some(Arc::clone(&holder));
            tracing::debug!(scope = %self.key, slot = index, "claimed empty slot");
            return Some(Claim::Opener(holder, tx));
        }

        let holder = slots
            .iter()
            .flatten()
            .filter(|h| h.is_attachable())
            .min_by_key(|h| h.units())
            .cloned()?;
        let claim = match holder.attach()? {
            Attach::Ready => Claim::Joined(Arc::clone(&holder)),
            Attach::Pending(rx) => Claim::Waiting(Arc::clone(&holder), rx),
        };
        tracing::debug!(
            scope = %self.key,
            slot = ?holder.slot(),
            units = holder.units(),
            "joined shared holder"
        );
        Some(claim)
    }

    /// Detach one unit. On `Close` the slot stays `Closing` until
    /// [`ScopeSlots::clear`] runs after the connection is closed.
    pub(crate) fn release(&self, holder: &Arc<ConnectionHolder<C>>) -> Detached<C> {
        let mut slots = lock(&self.slots);
        let detached = holder.detach();
        if matches!(detached, Detached::Gone) && Self::take_slot(&mut slots, holder) {
            drop(slots);
            self.freed.notify_waiters();
        }
        detached
    }

    /// Roll a failed or cancelled open back to `Empty`.
    pub(crate) fn discard(&self, holder: &Arc<ConnectionHolder<C>>) {
        let mut slots = lock(&self.slots);
        holder.discard();
        Self::take_slot(&mut slots, holder);
        drop(slots);
        self.freed.notify_waiters();
    }

    /// `Closing -> Empty`.
    pub(crate) fn clear(&self, holder: &Arc<ConnectionHolder<C>>) {
        let mut slots = lock(&self.slots);
        Self::take_slot(&mut slots, holder);
        drop(slots);
        self.freed.notify_waiters();
    }

    fn take_slot(
        slots: &mut [Option<Arc<ConnectionHolder<C>>>],
        holder: &Arc<ConnectionHolder<C>>,
    ) -> bool {
        let Some(index) = holder.slot() else {
            return false;
        };
        match slots.get_mut(index) {
            Some(slot) if slot.as_ref().is_some_and(|h| Arc::ptr_eq(h, holder)) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }
}

/// Clears a closing holder's slot when dropped, so a cancelled close still
/// frees the slot.
pub(crate) struct ClearSlot<C> {
    scope: Arc<ScopeSlots<C>>,
    holder: Arc<ConnectionHolder<C>>,
}

impl<C> ClearSlot<C> {
    pub(crate) fn new(scope: Arc<ScopeSlots<C>>, holder: Arc<ConnectionHolder<C>>) -> Self {
        Self { scope, holder }
    }
}

impl<C> Drop for ClearSlot<C> {
    fn drop(&mut self) {
        self.scope.clear(&self.holder);
    }
}
