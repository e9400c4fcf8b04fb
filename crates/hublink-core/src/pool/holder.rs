//! One slot's connection and the units attached to it.

use std::mem;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use super::lock;

/// Observable state of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Opening,
    Open,
    Closing,
}

/// Completion signal shared by everyone attached to an opening holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OpenSignal {
    Pending,
    Ready,
    Failed(String),
}

impl OpenSignal {
    pub(crate) fn is_settled(&self) -> bool {
        !matches!(self, OpenSignal::Pending)
    }
}

enum HolderState<C> {
    Opening(watch::Receiver<OpenSignal>),
    Open(Arc<C>),
    Closing,
}

struct HolderInner<C> {
    state: HolderState<C>,
    units: usize,
}

/// Result of attaching to an existing holder.
pub(crate) enum Attach {
    Ready,
    Pending(watch::Receiver<OpenSignal>),
}

/// Result of detaching a unit.
pub(crate) enum Detached<C> {
    /// Other units remain.
    InUse(usize),
    /// Last unit left; the caller must close this connection.
    Close(Arc<C>),
    /// Holder was already discarded or never opened.
    Gone,
}

/// Owns at most one physical connection and counts its units.
///
/// Units reach the connection only through their holder. Mutations of the
/// unit count happen under the owning scope's lock.
pub struct ConnectionHolder<C> {
    slot: Option<usize>,
    inner: Mutex<HolderInner<C>>,
}

impl<C> ConnectionHolder<C> {
    /// New holder in `Opening` with the opener already counted.
    pub(crate) fn opening(slot: Option<usize>) -> (Arc<Self>, watch::Sender<OpenSignal>) {
        let (tx, rx) = watch::channel(OpenSignal::Pending);
        let holder = Arc::new(Self {
            slot,
            inner: Mutex::new(HolderInner {
                state: HolderState::Opening(rx),
                units: 1,
            }),
        });
        (holder, tx)
    }

    /// Holder for a dedicated (unpooled) connection, already open.
    pub(crate) fn dedicated(conn: C) -> Arc<Self> {
        Arc::new(Self {
            slot: None,
            inner: Mutex::new(HolderInner {
                state: HolderState::Open(Arc::new(conn)),
                units: 1,
            }),
        })
    }

    /// Slot index within the scope array; `None` for dedicated holders.
    pub fn slot(&self) -> Option<usize> {
        self.slot
    }

    pub fn units(&self) -> usize {
        lock(&self.inner).units
    }

    pub fn state(&self) -> SlotState {
        match lock(&self.inner).state {
            HolderState::Opening(_) => SlotState::Opening,
            HolderState::Open(_) => SlotState::Open,
            HolderState::Closing => SlotState::Closing,
        }
    }

    pub(crate) fn is_attachable(&self) -> bool {
        !matches!(lock(&self.inner).state, HolderState::Closing)
    }

    pub(crate) fn connection(&self) -> Option<Arc<C>> {
        match &lock(&self.inner).state {
            HolderState::Open(conn) => Some(Arc::clone(conn)),
            _ => None,
        }
    }

    /// Count one more unit. `None` if the holder is closing.
    pub(crate) fn attach(&self) -> Option<Attach> {
        let mut inner = lock(&self.inner);
        let attach = match &inner.state {
            HolderState::Closing => return None,
            HolderState::Open(_) => Attach::Ready,
            HolderState::Opening(rx) => Attach::Pending(rx.clone()),
        };
        inner.units += 1;
        Some(attach)
    }

    /// `Opening -> Open`. Hands the connection back if the holder was
    /// discarded in the meantime.
    pub(crate) fn mark_open(&self, conn: C) -> Result<(), C> {
        let mut inner = lock(&self.inner);
        if !matches!(inner.state, HolderState::Opening(_)) {
            return Err(conn);
        }
        inner.state = HolderState::Open(Arc::new(conn));
        Ok(())
    }

    /// Drop every claim; used when the open fails or is cancelled.
    pub(crate) fn discard(&self) {
        let mut inner = lock(&self.inner);
        inner.state = HolderState::Closing;
        inner.units = 0;
    }

    pub(crate) fn detach(&self) -> Detached<C> {
        let mut inner = lock(&self.inner);
        if inner.units == 0 {
            return Detached::Gone;
        }
        inner.units -= 1;
        if inner.units > 0 {
            return Detached::InUse(inner.units);
        }
        match mem::replace(&mut inner.state, HolderState::Closing) {
            HolderState::Open(conn) => Detached::Close(conn),
            HolderState::Opening(_) | HolderState::Closing => Detached::Gone,
        }
    }
}
