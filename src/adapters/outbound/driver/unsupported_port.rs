use crate::ports::outbound::{DriverPort, PortConnection};
use crate::shared::error::ChannelError;
use async_trait::async_trait;

/// Stand-in for targets without a filter manager. Every connect fails with
/// [`ChannelError::Unsupported`], which stops the driver worker.
pub struct UnsupportedDriverPort;

#[async_trait]
impl DriverPort for UnsupportedDriverPort {
    async fn connect(&self, port_name: &str) -> Result<Box<dyn PortConnection>, ChannelError> {
        Err(ChannelError::Unsupported {
            port: port_name.to_string(),
        })
    }
}
