/// Type alias for Result with anyhow::Error as the error type.
/// Used by the bootstrap, configuration and CLI surfaces; pipeline components
/// return their own typed errors from `shared::error`.
pub type Result<T> = std::result::Result<T, anyhow::Error>;
