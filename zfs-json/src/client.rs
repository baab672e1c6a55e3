use crate::{
    cmd::ZfsCmd,
    config::ZfsConfig,
    envelope::{CommandVersion, Discarded, Envelope},
    error::Error,
    pool::{PoolStatus, StatusOutput},
    summary::{self, Observer, Summarize, TracingObserver},
    version::VersionOutput,
};

use serde::de::DeserializeOwned;
use std::{collections::HashMap, sync::Arc};

/// Queries the zfs tools for their version and the status of the pools.
/// Every query spawns its own child process, nothing is shared between them.
#[derive(Clone)]
pub struct Zfs {
    config: ZfsConfig,
    observer: Arc<dyn Observer>,
}

impl std::fmt::Debug for Zfs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Zfs").field("config", &self.config).finish()
    }
}

impl Default for Zfs {
    fn default() -> Self {
        Self::new(ZfsConfig::default())
    }
}

impl Zfs {
    /// New client which traces the decoded output summaries.
    pub fn new(config: ZfsConfig) -> Self {
        Self::with_observer(config, Arc::new(TracingObserver))
    }
    /// New client which hands the decoded output summaries to `observer`.
    pub fn with_observer(
        config: ZfsConfig,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            config,
            observer,
        }
    }
    pub fn config(&self) -> &ZfsConfig {
        &self.config
    }

    /// The userland version of the zfs tools, example: "zfs-2.3.0-1".
    pub async fn tool_version(&self) -> Result<String, Error> {
        let output = self.tool_version_output().await?;
        Ok(output.payload.tool_version.userland)
    }

    /// The full output of `zfs version --json`.
    pub async fn tool_version_output(&self) -> Result<VersionOutput, Error> {
        let cmd = ZfsCmd::zfs_version(&self.config.zfs_bin);
        self.query(cmd, "zfs version output parsed").await
    }

    /// The json output version, as emitted by `zpool list`. Any json
    /// subcommand emits it so this is the cheap way to get it.
    pub async fn output_version(&self) -> Result<CommandVersion, Error> {
        let cmd = ZfsCmd::zpool_list(&self.config.zpool_bin);
        let output: Envelope<Discarded> =
            self.query(cmd, "zpool list output parsed").await?;
        Ok(output.output_version)
    }

    /// Status of all pools, keyed by pool name.
    pub async fn pool_status(
        &self,
    ) -> Result<HashMap<String, PoolStatus>, Error> {
        let output = self.pool_status_output().await?;
        Ok(output.payload.pools)
    }

    /// The full output of `zpool status --json --json-int`.
    pub async fn pool_status_output(&self) -> Result<StatusOutput, Error> {
        let cmd = ZfsCmd::zpool_status(&self.config.zpool_bin);
        let output: StatusOutput =
            self.query(cmd, "zpool status output parsed").await?;
        for pool in output.payload.pools.values() {
            summary::observe(self.observer.as_ref(), "zpool status pool", pool);
        }
        Ok(output)
    }

    /// Run `cmd`, decode its output and check its version.
    async fn query<T>(
        &self,
        cmd: ZfsCmd,
        event: &str,
    ) -> Result<Envelope<T>, Error>
    where
        T: DeserializeOwned + Summarize,
    {
        let command = cmd.to_string();
        let output: Envelope<T> =
            cmd.timeout(self.config.timeout).output_json().await?;
        summary::observe(self.observer.as_ref(), event, &output);

        self.config
            .version_check
            .verify(&command, &output.output_version)?;
        Ok(output)
    }
}
