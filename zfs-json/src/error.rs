use snafu::Snafu;
use std::{process::ExitStatus, time::Duration};

/// Errors which can be encountered whilst querying the zfs/zpool tools.
/// Every variant carries the command line which was attempted.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Failed to start command '{command}': {source}"))]
    Launch {
        command: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to read output of '{command}': {source}"))]
    Io {
        command: String,
        source: std::io::Error,
    },
    #[snafu(display(
        "Failed to execute command '{command}' ({status}); output: '{stderr}'"
    ))]
    Execution {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
    #[snafu(display("Failed to json parse '{command}' output: {source}"))]
    Decode {
        command: String,
        source: serde_json::Error,
    },
    #[snafu(display("Command '{command}' did not complete within {timeout:?}"))]
    Timeout { command: String, timeout: Duration },
    #[snafu(display(
        "Command '{command}' emitted output version {found}, expected major version {expected}"
    ))]
    IncompatibleVersion {
        command: String,
        expected: u32,
        found: String,
    },
}

impl Error {
    /// The command line which produced this error.
    pub fn command(&self) -> &str {
        match self {
            Error::Launch {
                command,
                ..
            } => command,
            Error::Io {
                command,
                ..
            } => command,
            Error::Execution {
                command,
                ..
            } => command,
            Error::Decode {
                command,
                ..
            } => command,
            Error::Timeout {
                command,
                ..
            } => command,
            Error::IncompatibleVersion {
                command,
                ..
            } => command,
        }
    }
}
