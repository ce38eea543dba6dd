/// Ports module defining interfaces for hexagonal architecture
///
/// Only driven (outbound) ports exist: the agent is started by its CLI and
/// background loops, never called into by another system.
pub mod outbound;
