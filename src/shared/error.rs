use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Exit codes for the agent binary.
///
/// These codes let service managers distinguish a clean shutdown from
/// a configuration mistake or an unrecoverable startup failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Clean shutdown or successful one-shot command
    Success = 0,
    /// A one-shot verification returned a deny decision
    Denied = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Startup or application error (config, driver port, backend, I/O)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::Denied => write!(f, "Denied (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Errors raised by the privileged wire channel.
///
/// Every variant except [`ChannelError::NotConnected`] flips the channel to
/// `Disconnected`; the owning loop reconnects after its backoff.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Wire channel is not connected")]
    NotConnected,

    #[error("Failed to connect to driver port {port}: {details}\n\n💡 Hint: Verify that the InstallGuard minifilter is loaded (fltmc filters) and that the agent runs with administrative rights")]
    ConnectFailed { port: String, details: String },

    #[error("Driver port I/O failure: {details}")]
    Io { details: String },

    #[error("Short write to driver port: wrote {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    #[error("Malformed wire message: {details}")]
    Malformed { details: String },

    #[error("Driver port {port} is not available on this platform")]
    Unsupported { port: String },
}

impl ChannelError {
    /// Returns true when the error means the current handle is unusable.
    pub fn is_connection_fault(&self) -> bool {
        !matches!(self, ChannelError::NotConnected)
    }
}

/// Errors from the remote policy authority. The verification gate turns
/// every one of them into a deny decision.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Policy backend unreachable: {details}")]
    Transport { details: String },

    #[error("Policy backend did not answer within {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("Policy backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Policy backend returned a malformed response: {details}")]
    MalformedResponse { details: String },
}

/// Filesystem failures, classified so the cleanup queue can decide between
/// retry, drop and log.
#[derive(Debug, Error)]
pub enum FileSystemError {
    #[error("File is in use: {path}")]
    InUse { path: PathBuf },

    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Filesystem operation failed on {path}: {details}")]
    Other { path: PathBuf, details: String },
}

// ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
#[cfg(windows)]
const IN_USE_OS_CODES: &[i32] = &[32, 33];
// EBUSY / ETXTBSY
#[cfg(not(windows))]
const IN_USE_OS_CODES: &[i32] = &[16, 26];

impl FileSystemError {
    /// Classifies an I/O error raised while operating on `path`.
    pub fn classify(path: &Path, error: io::Error) -> Self {
        let path = path.to_path_buf();
        if let Some(code) = error.raw_os_error() {
            if IN_USE_OS_CODES.contains(&code) {
                return FileSystemError::InUse { path };
            }
        }
        match error.kind() {
            io::ErrorKind::NotFound => FileSystemError::NotFound { path },
            io::ErrorKind::PermissionDenied => FileSystemError::PermissionDenied { path },
            _ => FileSystemError::Other {
                path,
                details: error.to_string(),
            },
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            FileSystemError::InUse { path }
            | FileSystemError::NotFound { path }
            | FileSystemError::PermissionDenied { path }
            | FileSystemError::Other { path, .. } => path,
        }
    }
}

/// Reporting failures. Logged and counted, never escalated.
#[derive(Debug, Error)]
pub enum ReportingError {
    #[error("Failed to report {software}: {source}")]
    Rejected {
        software: String,
        #[source]
        source: PolicyError,
    },
}

/// Startup and configuration errors for the agent process.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Invalid configuration: {message}\n\n💡 Hint: {hint}")]
    InvalidConfig { message: String, hint: String },

    #[error("Driver channel is required but unavailable: {source}")]
    DriverRequired {
        #[source]
        source: ChannelError,
    },

    #[error("Invalid path: {path}\nReason: {reason}")]
    InvalidPath { path: PathBuf, reason: String },
}
