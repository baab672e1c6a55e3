//! Pool status as decoded from `zpool status --json --json-int`, example
//! (trimmed):
//!   {
//!       "output_version": {"command": "zpool status", "major": 0, "minor": 1},
//!       "pools": {
//!           "tank": {
//!               "name": "tank", "state": "ONLINE", "pool_guid": 1234,
//!               "scan_stats": {"function": "SCRUB", "state": "FINISHED"},
//!               "vdevs": {
//!                   "tank": {
//!                       "name": "tank", "vdev_type": "root",
//!                       "vdevs": {
//!                           "mirror-0": {
//!                               "name": "mirror-0", "vdev_type": "mirror",
//!                               "vdevs": {
//!                                   "sda": {"name": "sda", "vdev_type": "disk"},
//!                                   "sdb": {"name": "sdb", "vdev_type": "disk"}
//!                               }
//!                           }
//!                       }
//!                   }
//!               }
//!           }
//!       }
//!   }

use crate::envelope::{de, Envelope};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum_macros::{AsRefStr, Display, EnumString};

/// Virtual devices keyed by their name.
pub type Vdevs = HashMap<String, VdevStatus>;

/// A node of the pool's virtual device tree: a disk, a file, a mirror, a
/// raidz group, or the pool root itself. Children are owned by their parent,
/// the `parent` field is only the parent's name.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VdevStatus {
    #[serde(deserialize_with = "de::nullable")]
    pub name: String,
    /// Eg: "root", "mirror", "raidz", "disk", "file".
    #[serde(deserialize_with = "de::nullable")]
    pub vdev_type: String,
    #[serde(deserialize_with = "de::number")]
    pub guid: u64,
    /// Device node, leaf vdevs only.
    #[serde(deserialize_with = "de::nullable")]
    pub path: String,
    #[serde(deserialize_with = "de::nullable")]
    pub phys_path: String,
    #[serde(deserialize_with = "de::nullable")]
    pub devid: String,
    /// Allocation class, eg: "normal", "special", "log".
    #[serde(deserialize_with = "de::nullable")]
    pub class: String,
    /// Eg: "ONLINE", "DEGRADED", "FAULTED".
    #[serde(deserialize_with = "de::nullable")]
    pub state: String,
    /// Name of the parent vdev, empty for the root.
    #[serde(deserialize_with = "de::nullable")]
    pub parent: String,
    #[serde(deserialize_with = "de::number")]
    pub alloc_space: u64,
    #[serde(deserialize_with = "de::number")]
    pub total_space: u64,
    #[serde(deserialize_with = "de::number")]
    pub def_space: u64,
    #[serde(deserialize_with = "de::number")]
    pub rep_dev_size: u64,
    #[serde(deserialize_with = "de::number")]
    pub phys_space: u64,
    #[serde(deserialize_with = "de::number")]
    pub read_errors: u64,
    #[serde(deserialize_with = "de::number")]
    pub write_errors: u64,
    #[serde(deserialize_with = "de::number")]
    pub checksum_errors: u64,
    #[serde(deserialize_with = "de::number")]
    pub slow_ios: u64,
    /// Child vdevs, empty for leaf devices.
    #[serde(rename = "vdevs", deserialize_with = "de::nullable")]
    pub children: Vdevs,
}

impl VdevStatus {
    /// Whether this vdev has no children, ie: it's a physical device.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// The function of a background scan pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum ScanFunction {
    #[strum(serialize = "NONE")]
    None,
    #[strum(serialize = "SCRUB")]
    Scrub,
    #[strum(serialize = "RESILVER")]
    Resilver,
    #[strum(serialize = "ERRORSCRUB")]
    ErrorScrub,
}

/// Progress of the most recent, or in progress, scrub or resilver.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanStats {
    #[serde(deserialize_with = "de::nullable")]
    pub function: String,
    /// Eg: "SCANNING", "FINISHED", "CANCELED".
    #[serde(deserialize_with = "de::nullable")]
    pub state: String,
    #[serde(deserialize_with = "de::number")]
    pub start_time: u64,
    #[serde(deserialize_with = "de::number")]
    pub end_time: u64,
    #[serde(deserialize_with = "de::number")]
    pub to_examine: u64,
    #[serde(deserialize_with = "de::number")]
    pub examined: u64,
    #[serde(deserialize_with = "de::number")]
    pub skipped: u64,
    #[serde(deserialize_with = "de::number")]
    pub processed: u64,
    #[serde(deserialize_with = "de::number")]
    pub errors: u64,
    #[serde(deserialize_with = "de::number")]
    pub bytes_per_scan: u64,
    #[serde(deserialize_with = "de::number")]
    pub pass_start: u64,
    #[serde(deserialize_with = "de::number")]
    pub scrub_pause: u64,
    #[serde(deserialize_with = "de::number")]
    pub scrub_spent_paused: u64,
    #[serde(deserialize_with = "de::number")]
    pub issued_bytes_per_scan: u64,
    #[serde(deserialize_with = "de::number")]
    pub issued: u64,
}

impl ScanStats {
    /// The scan function, `None` if the tool reported one we don't know.
    pub fn scan_function(&self) -> Option<ScanFunction> {
        self.function.parse().ok()
    }
    /// Whether a scan pass is currently running.
    pub fn in_progress(&self) -> bool {
        self.state.eq_ignore_ascii_case("SCANNING")
    }
}

/// Status of a single pool.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolStatus {
    #[serde(deserialize_with = "de::nullable")]
    pub name: String,
    /// Eg: "ONLINE", "DEGRADED", "SUSPENDED".
    #[serde(deserialize_with = "de::nullable")]
    pub state: String,
    #[serde(deserialize_with = "de::number")]
    pub pool_guid: u64,
    /// Last synced transaction group.
    #[serde(deserialize_with = "de::number")]
    pub txg: u64,
    /// On-disk format version.
    #[serde(deserialize_with = "de::number")]
    pub spa_version: u64,
    /// Filesystem format version.
    #[serde(deserialize_with = "de::number")]
    pub zpl_version: u64,
    /// Description of any problem with the pool.
    #[serde(deserialize_with = "de::nullable")]
    pub status: String,
    /// Suggested remedy for `status`.
    #[serde(deserialize_with = "de::nullable")]
    pub action: String,
    #[serde(deserialize_with = "de::nullable")]
    pub msgid: String,
    #[serde(rename = "moreinfo", deserialize_with = "de::nullable")]
    pub more_info: String,
    #[serde(deserialize_with = "de::number")]
    pub error_count: u64,
    #[serde(deserialize_with = "de::nullable")]
    pub scan_stats: ScanStats,
    /// Top level vdevs.
    #[serde(deserialize_with = "de::nullable")]
    pub vdevs: Vdevs,
    #[serde(deserialize_with = "de::nullable")]
    pub logs: Vdevs,
    #[serde(deserialize_with = "de::nullable")]
    pub l2cache: Vdevs,
    #[serde(deserialize_with = "de::nullable")]
    pub spares: Vdevs,
}

/// Payload of `zpool status --json`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolStatusPayload {
    #[serde(deserialize_with = "de::nullable")]
    pub pools: HashMap<String, PoolStatus>,
}

/// Decoded output of `zpool status --json`.
pub type StatusOutput = Envelope<PoolStatusPayload>;
