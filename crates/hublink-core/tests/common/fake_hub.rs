//! In-process stand-in for an IoT hub transport.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hublink::pool::{DeviceIdentity, PhysicalConnection, PoolSettings};

#[derive(Debug, Default)]
pub struct FakeHub {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
}

impl FakeHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn live(&self) -> usize {
        self.opened.load(Ordering::SeqCst) - self.closed.load(Ordering::SeqCst)
    }
}

pub struct HubConnection {
    hub: Arc<FakeHub>,
}

#[async_trait]
impl PhysicalConnection for HubConnection {
    async fn close(&self) {
        self.hub.closed.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Device {
    pub id: String,
    pub key_name: String,
    pub settings: PoolSettings,
    pub hub: Arc<FakeHub>,
}

impl Device {
    pub fn new(id: &str, key_name: &str, settings: PoolSettings, hub: &Arc<FakeHub>) -> Self {
        Self {
            id: id.to_string(),
            key_name: key_name.to_string(),
            settings,
            hub: Arc::clone(hub),
        }
    }
}

#[async_trait]
impl DeviceIdentity for Device {
    type Connection = HubConnection;

    fn device_id(&self) -> &str {
        &self.id
    }

    fn auth_scope_key(&self) -> &str {
        &self.key_name
    }

    fn pool_settings(&self) -> PoolSettings {
        self.settings
    }

    async fn open_physical_connection(&self) -> anyhow::Result<HubConnection> {
        self.hub.opened.fetch_add(1, Ordering::SeqCst);
        Ok(HubConnection {
            hub: Arc::clone(&self.hub),
        })
    }
}
