/// Outbound adapters - Infrastructure implementations of outbound ports
pub mod console;
pub mod driver;
pub mod filesystem;
pub mod network;
pub mod system;
