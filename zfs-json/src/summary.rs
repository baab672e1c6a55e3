//! Bounded, flat views of the decoded entities for logging.
//! Scalars are reported as they are while mappings are only counted, so the
//! size of a summary does not depend on the depth or fan-out of the vdev tree.

use crate::{
    envelope::{CommandVersion, Discarded, Envelope},
    pool::{PoolStatus, PoolStatusPayload, ScanStats, VdevStatus},
    version::{ToolVersion, ToolVersionPayload},
};
use std::fmt;

/// Value of a single summary field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Str(String),
    UInt(u64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(value) => write!(f, "{value:?}"),
            FieldValue::UInt(value) => write!(f, "{value}"),
        }
    }
}

/// Ordered list of key/value observations.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    fields: Vec<(&'static str, FieldValue)>,
}

impl Summary {
    /// Add a string field.
    pub fn str(mut self, key: &'static str, value: &str) -> Self {
        self.fields.push((key, FieldValue::Str(value.to_string())));
        self
    }
    /// Add an unsigned integer field.
    pub fn uint(mut self, key: &'static str, value: u64) -> Self {
        self.fields.push((key, FieldValue::UInt(value)));
        self
    }
    /// Add the number of entries of a collection.
    pub fn count(self, key: &'static str, len: usize) -> Self {
        self.uint(key, len as u64)
    }
    /// Append all fields of `other`.
    pub fn extend(mut self, other: Summary) -> Self {
        self.fields.extend(other.fields);
        self
    }
    /// Get the value of the first field with the given key.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, value)| value)
    }
    pub fn iter(&self) -> impl Iterator<Item = &(&'static str, FieldValue)> {
        self.fields.iter()
    }
    pub fn len(&self) -> usize {
        self.fields.len()
    }
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (key, value)) in self.fields.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// Produce the bounded summary of an entity.
pub trait Summarize {
    fn summarize(&self) -> Summary;
}

/// Passive sink for the summaries of decoded command output.
pub trait Observer: Send + Sync {
    fn observe(&self, event: &str, summary: &Summary);
}

/// Logs each observation as a single debug trace event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn observe(&self, event: &str, summary: &Summary) {
        tracing::debug!(target: "zfs_json", "{event}: {summary}");
    }
}

/// Drops all observations.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn observe(&self, _event: &str, _summary: &Summary) {}
}

/// Hand the summary of `entity` over to the `observer`.
pub fn observe<S: Summarize + ?Sized>(
    observer: &dyn Observer,
    event: &str,
    entity: &S,
) {
    observer.observe(event, &entity.summarize());
}

impl Summarize for CommandVersion {
    fn summarize(&self) -> Summary {
        Summary::default()
            .str("command", &self.command)
            .uint("major", self.major.into())
            .uint("minor", self.minor.into())
    }
}

impl Summarize for ToolVersion {
    fn summarize(&self) -> Summary {
        Summary::default()
            .str("userland", &self.userland)
            .str("kernel", &self.kernel)
    }
}

impl Summarize for ToolVersionPayload {
    fn summarize(&self) -> Summary {
        Summary::default()
            .str("zfs_version.userland", &self.tool_version.userland)
            .str("zfs_version.kernel", &self.tool_version.kernel)
    }
}

impl Summarize for PoolStatusPayload {
    fn summarize(&self) -> Summary {
        Summary::default().count("num_pools", self.pools.len())
    }
}

impl Summarize for Discarded {
    fn summarize(&self) -> Summary {
        Summary::default()
    }
}

impl<T: Summarize> Summarize for Envelope<T> {
    fn summarize(&self) -> Summary {
        Summary::default()
            .str("output_version.command", &self.output_version.command)
            .uint("output_version.major", self.output_version.major.into())
            .uint("output_version.minor", self.output_version.minor.into())
            .extend(self.payload.summarize())
    }
}

impl Summarize for VdevStatus {
    fn summarize(&self) -> Summary {
        Summary::default()
            .str("name", &self.name)
            .str("vdev_type", &self.vdev_type)
            .uint("guid", self.guid)
            .str("path", &self.path)
            .str("phys_path", &self.phys_path)
            .str("devid", &self.devid)
            .str("class", &self.class)
            .str("state", &self.state)
            .str("parent", &self.parent)
            .uint("rep_dev_size", self.rep_dev_size)
            .uint("phys_space", self.phys_space)
            .uint("read_errors", self.read_errors)
            .uint("write_errors", self.write_errors)
            .uint("checksum_errors", self.checksum_errors)
            .uint("slow_ios", self.slow_ios)
            .count("num_vdevs", self.children.len())
    }
}

impl Summarize for ScanStats {
    fn summarize(&self) -> Summary {
        Summary::default()
            .str("function", &self.function)
            .str("state", &self.state)
            .uint("start_time", self.start_time)
            .uint("end_time", self.end_time)
            .uint("to_examine", self.to_examine)
            .uint("examined", self.examined)
            .uint("skipped", self.skipped)
            .uint("processed", self.processed)
            .uint("errors", self.errors)
            .uint("bytes_per_scan", self.bytes_per_scan)
            .uint("pass_start", self.pass_start)
            .uint("scrub_pause", self.scrub_pause)
            .uint("scrub_spent_paused", self.scrub_spent_paused)
            .uint("issued_bytes_per_scan", self.issued_bytes_per_scan)
            .uint("issued", self.issued)
    }
}

impl Summarize for PoolStatus {
    fn summarize(&self) -> Summary {
        Summary::default()
            .str("name", &self.name)
            .str("state", &self.state)
            .uint("pool_guid", self.pool_guid)
            .uint("txg", self.txg)
            .uint("spa_version", self.spa_version)
            .uint("zpl_version", self.zpl_version)
            .str("status", &self.status)
            .str("action", &self.action)
            .str("more_info", &self.more_info)
            .uint("error_count", self.error_count)
            .str("scan_stats.function", &self.scan_stats.function)
            .str("scan_stats.state", &self.scan_stats.state)
            .count("num_vdevs", self.vdevs.len())
            .count("num_logs", self.logs.len())
            .count("num_l2cache", self.l2cache.len())
            .count("num_spares", self.spares.len())
    }
}
