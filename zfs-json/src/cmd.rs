use crate::{
    envelope::{self, Envelope},
    error::{self, Error},
};

use serde::de::DeserializeOwned;
use snafu::ResultExt;
use std::{
    fmt,
    io,
    process::{ExitStatus, Stdio},
    time::Duration,
};
use strum_macros::{AsRefStr, Display, EnumString};
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::{Child, Command},
};

/// The zpool subcommands we query.
#[derive(AsRefStr, EnumString, Display)]
pub(crate) enum ZpoolSubCmd {
    /// Display the detailed health status of pools.
    #[strum(serialize = "status")]
    Status,
    /// List pools along with their properties.
    #[strum(serialize = "list")]
    List,
}

/// The zfs subcommands we query.
#[derive(AsRefStr, EnumString, Display)]
pub(crate) enum ZfsSubCmd {
    /// Display the userland and kernel module versions.
    #[strum(serialize = "version")]
    Version,
}

/// Wrapper over `Command` which captures the stdout and stderr of the child
/// concurrently and maps failures to `Error`.
#[derive(Debug, Clone)]
pub struct ZfsCmd {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl fmt::Display for ZfsCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// What was collected from a child which ran to completion.
struct Drained {
    stdout: io::Result<Vec<u8>>,
    stderr: Vec<u8>,
    status: io::Result<ExitStatus>,
}

impl ZfsCmd {
    /// Prepare to run `program`, which may be a name looked up in `PATH`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }
    /// Prepare a `ZpoolSubCmd::Status` with json output and integer values.
    pub(crate) fn zpool_status(program: &str) -> Self {
        Self::new(program)
            .arg(ZpoolSubCmd::Status)
            .args(["--json", "--json-int"])
    }
    /// Prepare a `ZpoolSubCmd::List` of pool names only. Used for the output
    /// version which it emits like any other json subcommand.
    pub(crate) fn zpool_list(program: &str) -> Self {
        Self::new(program)
            .args(["--json", "--json-int"])
            .arg(ZpoolSubCmd::List)
            .args(["-Ho", "name"])
    }
    /// Prepare a `ZfsSubCmd::Version` with json output.
    pub(crate) fn zfs_version(program: &str) -> Self {
        Self::new(program).arg(ZfsSubCmd::Version).arg("--json")
    }
    /// Append a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }
    /// Append the arguments in order.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_string()));
        self
    }
    /// Kill the child and fail with `Error::Timeout` if it has not completed
    /// within the given time.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs the command and returns the type `T` envelope decoded from the
    /// json output.
    ///
    /// # Errors
    ///
    /// See `ZfsCmd::output`, plus:
    /// `Error::Decode` => StdOut output is not a valid json for `T`.
    pub async fn output_json<T: DeserializeOwned>(
        self,
    ) -> Result<Envelope<T>, Error> {
        let command = self.to_string();
        let stdout = self.output().await?;
        envelope::decode(&command, &stdout)
    }

    /// Runs the command and returns its stdout, unmodified, in case of
    /// success. Both stdout and stderr are read at the same time so that a
    /// child filling the stderr pipe can't stall on us reading stdout.
    ///
    /// # Errors
    ///
    /// `Error::Launch` => Failed to start the program.
    /// `Error::Io` => Failed to read stdout or to wait for completion.
    /// `Error::Execution` => Completed with a non-zero exit status.
    /// `Error::Timeout` => Did not complete within the configured timeout.
    pub async fn output(self) -> Result<Vec<u8>, Error> {
        let command = self.to_string();
        tracing::trace!("{command}");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .context(error::LaunchSnafu {
                command: &command,
            })?;

        let drained = match self.timeout {
            None => Self::drain(&mut child).await,
            Some(timeout) => {
                match tokio::time::timeout(timeout, Self::drain(&mut child))
                    .await
                {
                    Ok(drained) => drained,
                    Err(_) => {
                        // it may have exited already, nothing else to do
                        let _ = child.kill().await;
                        return Err(Error::Timeout {
                            command,
                            timeout,
                        });
                    }
                }
            }
        };

        let stdout = drained.stdout.context(error::IoSnafu {
            command: &command,
        })?;
        let status = drained.status.context(error::IoSnafu {
            command: &command,
        })?;
        if !status.success() {
            let stderr = String::from_utf8_lossy(&drained.stderr);
            return Err(Error::Execution {
                command,
                status,
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(stdout)
    }

    /// Read stdout and stderr to the end, concurrently, then reap the child.
    async fn drain(child: &mut Child) -> Drained {
        let (stdout, stderr) = tokio::join!(
            Self::read_all(child.stdout.take()),
            Self::read_lossy(child.stderr.take())
        );
        let status = child.wait().await;
        Drained {
            stdout,
            stderr,
            status,
        }
    }

    async fn read_all<R: AsyncRead + Unpin>(
        stream: Option<R>,
    ) -> io::Result<Vec<u8>> {
        let mut stream = stream.ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "stdout is not captured")
        })?;
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Stderr is only used to describe a failure so whatever was read before
    /// an error is good enough.
    async fn read_lossy<R: AsyncRead + Unpin>(stream: Option<R>) -> Vec<u8> {
        let mut buf = Vec::new();
        if let Some(mut stream) = stream {
            if let Err(error) = stream.read_to_end(&mut buf).await {
                tracing::trace!("Failed to read stderr: {error}");
            }
        }
        buf
    }
}
