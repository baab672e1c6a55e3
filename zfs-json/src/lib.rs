//! Status of ZFS pools and tools, extracted from the json output of the
//! `zfs` and `zpool` commands.
//!
//! Every json subcommand emits the same envelope: an `output_version`
//! describing the command and its output format, next to the command specific
//! payload. The command is run as a child process ([`ZfsCmd`]), its output is
//! decoded into an [`Envelope`] and a bounded [`Summary`] of the result is
//! handed to an [`Observer`].

#![cfg_attr(test, recursion_limit = "256")]

mod client;
mod cmd;
mod config;
mod envelope;
mod error;
mod pool;
mod summary;
#[cfg(test)]
mod test;
mod version;

/// Queries over the zfs tools.
pub use client::Zfs;
/// Runs a command capturing its output.
pub use cmd::ZfsCmd;
pub use config::{ZfsConfig, ZfsConfigBuilder, ZfsConfigBuilderError};
pub use envelope::{decode, CommandVersion, Discarded, Envelope, VersionCheck};
/// Errors encountered whilst running and decoding the zfs commands.
pub use error::Error;
pub use pool::{
    PoolStatus,
    PoolStatusPayload,
    ScanFunction,
    ScanStats,
    StatusOutput,
    VdevStatus,
    Vdevs,
};
pub use summary::{
    observe,
    FieldValue,
    NullObserver,
    Observer,
    Summarize,
    Summary,
    TracingObserver,
};
pub use version::{ToolVersion, ToolVersionPayload, VersionOutput};

pub type Result<T, E = Error> = std::result::Result<T, E>;
