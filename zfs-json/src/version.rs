use crate::envelope::{de, Envelope};
use serde::{Deserialize, Serialize};

/// Versions of the zfs userland tools and of the loaded kernel module.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolVersion {
    /// Eg: "zfs-2.3.0-1".
    #[serde(deserialize_with = "de::nullable")]
    pub userland: String,
    /// Eg: "zfs-kmod-2.3.0-1".
    #[serde(deserialize_with = "de::nullable")]
    pub kernel: String,
}

/// Payload of `zfs version --json`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolVersionPayload {
    #[serde(rename = "zfs_version", deserialize_with = "de::nullable")]
    pub tool_version: ToolVersion,
}

/// Decoded output of `zfs version --json`.
pub type VersionOutput = Envelope<ToolVersionPayload>;
