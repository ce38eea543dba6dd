use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Invalid log level: {}. Please specify one of error, warn, info, debug, trace",
                s
            )),
        }
    }
}

impl LogLevel {
    /// Returns the directive used as the `EnvFilter` default
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Detect software installations, verify them against the policy backend and enforce the decision
#[derive(Parser, Debug)]
#[command(name = "install-guard")]
#[command(version)]
#[command(about = "Endpoint agent that verifies software installations against a policy backend", long_about = None)]
pub struct Args {
    /// Configuration file (defaults to ./install-guard.config.yml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info", value_name = "LEVEL")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the agent until interrupted (default)
    Run,
    /// List installed applications with their risk assessment
    Scan,
    /// Ask the policy backend whether a file or bundle may be installed
    Verify {
        /// File or application bundle to verify
        path: PathBuf,
    },
    /// Move a quarantined application back into place
    Restore {
        /// Name or path of the quarantined item
        path: PathBuf,
        /// Destination directory (defaults to monitor.restore_dir)
        #[arg(long, value_name = "DIR")]
        to: Option<PathBuf>,
    },
    /// Probe the policy backend health endpoint
    Health,
}

impl Args {
    pub fn selected_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_log_level_from_str_case_insensitive() {
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("Warning").unwrap(), LogLevel::Warn);
    }

    #[test]
    fn test_log_level_from_str_invalid() {
        let error = LogLevel::from_str("loud").unwrap_err();
        assert!(error.contains("Invalid log level"));
        assert!(error.contains("loud"));
    }

    #[test]
    fn test_default_command_is_run() {
        let args = Args::try_parse_from(["install-guard"]).unwrap();
        assert_eq!(args.selected_command(), Command::Run);
        assert_eq!(args.log_level, LogLevel::Info);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "install-guard",
            "scan",
            "--config",
            "agent.yml",
            "--log-level",
            "trace",
        ])
        .unwrap();
        assert_eq!(args.selected_command(), Command::Scan);
        assert_eq!(args.config, Some(PathBuf::from("agent.yml")));
        assert_eq!(args.log_level.as_directive(), "trace");
    }

    #[test]
    fn test_restore_with_destination() {
        let args = Args::try_parse_from(["install-guard", "restore", "Foo.app", "--to", "/Applications"]).unwrap();
        assert_eq!(
            args.selected_command(),
            Command::Restore {
                path: PathBuf::from("Foo.app"),
                to: Some(PathBuf::from("/Applications")),
            }
        );
    }

    #[test]
    fn test_verify_requires_path() {
        assert!(Args::try_parse_from(["install-guard", "verify"]).is_err());
    }
}
