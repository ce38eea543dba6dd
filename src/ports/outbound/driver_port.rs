use crate::shared::error::ChannelError;
use async_trait::async_trait;
use std::time::Duration;

/// DriverPort port for opening the minifilter communication port
///
/// Implementations own the platform handle. The wire channel above them
/// decides when to connect, tear down and reconnect.
#[async_trait]
pub trait DriverPort: Send + Sync {
    /// Opens a new connection to the named port
    ///
    /// # Arguments
    /// * `port_name` - Well-known port name (e.g. `\InstallGuardPort`)
    ///
    /// # Errors
    /// Returns [`ChannelError::ConnectFailed`] when the port cannot be opened and
    /// [`ChannelError::Unsupported`] on platforms without a minifilter
    async fn connect(&self, port_name: &str) -> Result<Box<dyn PortConnection>, ChannelError>;
}

/// One live handle to the driver port.
#[async_trait]
pub trait PortConnection: Send {
    /// Waits up to `timeout` for the next raw request frame
    ///
    /// # Returns
    /// `Ok(None)` when no message arrived in time, which is not an error
    ///
    /// # Errors
    /// Any I/O failure on the handle
    async fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, ChannelError>;

    /// Writes one reply frame and returns the number of bytes accepted
    async fn reply(&mut self, frame: &[u8]) -> Result<usize, ChannelError>;

    /// Releases the handle. Must be safe to call more than once.
    fn close(&mut self);
}
