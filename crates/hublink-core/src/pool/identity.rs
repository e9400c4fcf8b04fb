//! Collaborators supplied by the transport layer.

use async_trait::async_trait;

use super::settings::PoolSettings;

/// A physical transport connection (an AMQP connection, say).
///
/// Owned by exactly one [`ConnectionHolder`](super::ConnectionHolder);
/// `close` is called once, when the last unit detaches.
#[async_trait]
pub trait PhysicalConnection: Send + Sync + 'static {
    async fn close(&self);
}

/// What the pool needs to know about a device.
#[async_trait]
pub trait DeviceIdentity: Send + Sync {
    type Connection: PhysicalConnection;

    fn device_id(&self) -> &str;

    /// Identifier grouping devices onto shared connections.
    fn auth_scope_key(&self) -> &str;

    fn pool_settings(&self) -> PoolSettings;

    fn is_pooling_enabled(&self) -> bool {
        self.pool_settings().pooling()
    }

    fn max_pool_size(&self) -> usize {
        self.pool_settings().max_pool_size()
    }

    /// Open a new physical connection. Timeouts are the implementor's job.
    async fn open_physical_connection(&self) -> anyhow::Result<Self::Connection>;
}
