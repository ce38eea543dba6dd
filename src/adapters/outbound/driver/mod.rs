/// Driver adapters for the minifilter communication port
#[cfg(windows)]
mod filter_port;
mod unsupported_port;

use crate::ports::outbound::DriverPort;
use std::sync::Arc;

#[cfg(windows)]
pub use filter_port::FilterDriverPort;
pub use unsupported_port::UnsupportedDriverPort;

/// The transport available on the current target.
pub fn platform_driver_port() -> Arc<dyn DriverPort> {
    #[cfg(windows)]
    {
        Arc::new(FilterDriverPort)
    }
    #[cfg(not(windows))]
    {
        Arc::new(UnsupportedDriverPort)
    }
}
