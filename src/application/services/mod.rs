/// Background services: the driver channel, the cleanup drain and the
/// long-running worker loops that feed the use cases.
mod cleanup_queue;
mod driver_worker;
mod monitor_worker;
mod ping_worker;
mod shutdown;
mod wire_channel;

pub use cleanup_queue::{
    CleanupQueue, CleanupScheduler, DrainReport, DEFAULT_CLEANUP_DELAY, DEFAULT_CLEANUP_TICK,
};
pub use driver_worker::{DriverWorker, DriverWorkerSettings, RequestOutcome};
pub use monitor_worker::{MonitorWorker, MonitorWorkerSettings, PollReport};
pub use ping_worker::{PingWorker, PingWorkerSettings};
pub use shutdown::{shutdown_signal, sleep_or_stop, stop_channel};
pub use wire_channel::{ConnectionState, WireChannel};
