//! The versioned json envelope which every zfs/zpool subcommand emits when
//! asked for json output, example:
//! zfs version --json
//!   {
//!       "output_version": {
//!           "command": "zfs version",
//!           "major": 0,
//!           "minor": 1
//!       },
//!       "zfs_version": {
//!           "userland": "zfs-2.3.0-1",
//!           "kernel": "zfs-kmod-2.3.0-1"
//!       }
//!   }

use crate::error::{self, Error};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use snafu::ResultExt;
use std::fmt;

/// Identifies the subcommand which produced an envelope and the version of
/// its output format.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandVersion {
    /// The subcommand, eg: "zpool status".
    #[serde(deserialize_with = "de::nullable")]
    pub command: String,
    #[serde(deserialize_with = "de::number")]
    pub major: u32,
    #[serde(deserialize_with = "de::number")]
    pub minor: u32,
}

impl fmt::Display for CommandVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{}", self.command, self.major, self.minor)
    }
}

/// Command output: the shared version descriptor plus the command specific
/// payload `T`, whose fields sit next to `output_version` on the wire.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default, deserialize_with = "de::nullable")]
    pub output_version: CommandVersion,
    #[serde(flatten)]
    pub payload: T,
}

/// Payload of commands whose output is only wanted for the shared
/// `output_version`, eg: `zpool list`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Discarded {}

/// Whether, and how, the envelope version is checked before the payload is
/// handed out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionCheck {
    /// Record the version but accept any.
    #[default]
    Ignore,
    /// Reject output whose major version differs.
    Major(u32),
}

impl VersionCheck {
    /// Check the `version` emitted by `command` against this policy.
    ///
    /// # Errors
    ///
    /// `Error::IncompatibleVersion` => The major version does not match.
    pub fn verify(
        &self,
        command: &str,
        version: &CommandVersion,
    ) -> Result<(), Error> {
        match *self {
            VersionCheck::Ignore => Ok(()),
            VersionCheck::Major(expected) if expected == version.major => {
                Ok(())
            }
            VersionCheck::Major(expected) => Err(Error::IncompatibleVersion {
                command: command.to_string(),
                expected,
                found: format!("{}.{}", version.major, version.minor),
            }),
        }
    }
}

/// Decode the raw `output` of `command` into an envelope carrying `T`.
/// The nesting depth is not limited as vdev trees may nest arbitrarily.
///
/// # Errors
///
/// `Error::Decode` => The output is not valid json, or a field has an
/// incompatible type.
pub fn decode<T: DeserializeOwned>(
    command: &str,
    output: &[u8],
) -> Result<Envelope<T>, Error> {
    let mut deserializer = serde_json::Deserializer::from_slice(output);
    deserializer.disable_recursion_limit();

    let envelope = Envelope::<T>::deserialize(&mut deserializer)
        .and_then(|envelope| deserializer.end().map(|_| envelope))
        .context(error::DecodeSnafu {
            command,
        })?;

    Ok(envelope)
}

/// Serde deserializer helpers to help decode the zfs json output.
/// A json `null` decodes as the zero value of the field.
pub(crate) mod de {
    use serde::de::{self, Deserialize, Deserializer, Visitor};
    use std::{fmt::Display, marker::PhantomData};

    /// Decode a field which may be `null`, example: "status": null.
    pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: Deserialize<'de> + Default,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
    }

    /// Decode an integer into `T`, failing if it does not fit, example: 10.
    /// Numbers within strings are rejected.
    pub(crate) fn number<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: Default + TryFrom<u64> + TryFrom<i64>,
        <T as TryFrom<u64>>::Error: Display,
        <T as TryFrom<i64>>::Error: Display,
        D: Deserializer<'de>,
    {
        struct Number<T>(PhantomData<T>);

        impl<'de, T> Visitor<'de> for Number<T>
        where
            T: Default + TryFrom<u64> + TryFrom<i64>,
            <T as TryFrom<u64>>::Error: Display,
            <T as TryFrom<i64>>::Error: Display,
        {
            type Value = T;

            fn expecting(
                &self,
                formatter: &mut std::fmt::Formatter,
            ) -> std::fmt::Result {
                formatter.write_str("an integer")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                <T as TryFrom<u64>>::try_from(v).map_err(de::Error::custom)
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                <T as TryFrom<i64>>::try_from(v).map_err(de::Error::custom)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(T::default())
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(T::default())
            }
        }

        deserializer.deserialize_any(Number(PhantomData))
    }
}
