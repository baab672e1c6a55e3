use crate::envelope::VersionCheck;
use derive_builder::Builder;
use serde::Deserialize;
use std::time::Duration;

/// How to reach and trust the zfs tools, example:
///
/// ```
/// use zfs_json::{VersionCheck, ZfsConfigBuilder};
/// use std::time::Duration;
///
/// let config = ZfsConfigBuilder::default()
///     .zpool_bin("/usr/sbin/zpool")
///     .timeout(Duration::from_secs(30))
///     .version_check(VersionCheck::Major(0))
///     .build()
///     .unwrap();
/// assert_eq!(config.zfs_bin, "zfs");
/// ```
#[derive(Debug, Clone, Builder, Deserialize)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct ZfsConfig {
    /// The zfs program, name or path.
    pub zfs_bin: String,
    /// The zpool program, name or path.
    pub zpool_bin: String,
    /// Time limit for each command, none by default.
    #[builder(setter(strip_option))]
    pub timeout: Option<Duration>,
    pub version_check: VersionCheck,
}

impl Default for ZfsConfig {
    fn default() -> Self {
        Self {
            zfs_bin: "zfs".to_string(),
            zpool_bin: "zpool".to_string(),
            timeout: None,
            version_check: VersionCheck::Ignore,
        }
    }
}
