/// System adapters for host facts
mod host_identity;

pub use host_identity::detect_host_identity;
