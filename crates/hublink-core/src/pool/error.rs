//! Pool errors.

use std::error::Error as StdError;
use std::io;

use crate::retry::{ErrorInfo, Transient};

/// Failure to obtain a device unit.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// This caller tried to open the physical connection and it failed.
    /// The slot has been returned to `Empty`.
    #[error("failed to open connection for device {device_id}")]
    Open {
        device_id: String,
        scope: Option<String>,
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },

    /// This caller joined a holder whose open was started by another caller,
    /// and that open failed or was cancelled.
    #[error("shared connection for scope {scope} (slot {slot}) did not open: {reason}")]
    OpenAbandoned {
        scope: String,
        slot: usize,
        reason: String,
    },
}

impl PoolError {
    pub(crate) fn open(device_id: &str, scope: Option<&str>, source: anyhow::Error) -> Self {
        PoolError::Open {
            device_id: device_id.to_string(),
            scope: scope.map(str::to_string),
            source: source.into(),
        }
    }
}

/// Open failures are transient unless the cause chain says otherwise
/// (an [`ErrorInfo`] or `io::Error` somewhere in it decides).
impl Transient for PoolError {
    fn is_transient(&self) -> bool {
        match self {
            PoolError::OpenAbandoned { .. } => true,
            PoolError::Open { source, .. } => {
                let mut cur: Option<&(dyn StdError + 'static)> = Some(source.as_ref());
                while let Some(e) = cur {
                    if let Some(info) = e.downcast_ref::<ErrorInfo>() {
                        return info.is_transient();
                    }
                    if let Some(io) = e.downcast_ref::<io::Error>() {
                        return io.is_transient();
                    }
                    cur = e.source();
                }
                true
            }
        }
    }
}
