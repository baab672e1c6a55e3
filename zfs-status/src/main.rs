use clap::{Parser, Subcommand};
use snafu::{ResultExt, Snafu};
use std::{collections::BTreeMap, time::Duration};
use zfs_json::{Summarize, VersionCheck, Zfs, ZfsConfigBuilder};

mod logger;

#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
enum CliError {
    #[snafu(display("{source}"))]
    Query { source: zfs_json::Error },
    #[snafu(display("Invalid configuration: {source}"))]
    Config {
        source: zfs_json::ZfsConfigBuilderError,
    },
    #[snafu(display("Failed to print the output: {source}"))]
    Print { source: serde_json::Error },
}

type Result<T, E = CliError> = std::result::Result<T, E>;

#[derive(Parser, Debug)]
#[command(version, about)]
struct CliArgs {
    /// The zfs program.
    #[arg(long, env = "ZFS_BIN", default_value = "zfs")]
    zfs_bin: String,
    /// The zpool program.
    #[arg(long, env = "ZPOOL_BIN", default_value = "zpool")]
    zpool_bin: String,
    /// Give up on a command which takes longer than this, eg: 30s.
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,
    /// Reject json output of a different major version.
    #[arg(long)]
    require_major: Option<u32>,
    /// Log level, overridden by RUST_LOG.
    #[arg(long, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the version of the zfs userland tools.
    Version {
        /// Print the json output version as emitted by `zpool list` instead.
        #[arg(long)]
        via_list: bool,
    },
    /// Print the status of the pools.
    Status {
        /// Only these pools, all of them by default.
        pools: Vec<String>,
        /// One summary line per pool rather than the whole vdev tree.
        #[arg(long)]
        summary: bool,
    },
}

impl CliArgs {
    fn zfs(&self) -> Result<Zfs> {
        let mut builder = ZfsConfigBuilder::default();
        builder
            .zfs_bin(self.zfs_bin.as_str())
            .zpool_bin(self.zpool_bin.as_str());
        if let Some(timeout) = self.timeout {
            builder.timeout(timeout);
        }
        if let Some(major) = self.require_major {
            builder.version_check(VersionCheck::Major(major));
        }
        Ok(Zfs::new(builder.build().context(Config)?))
    }
}

async fn run(args: CliArgs) -> Result<()> {
    let zfs = args.zfs()?;
    match args.command {
        Command::Version {
            via_list: false,
        } => {
            println!("{}", zfs.tool_version().await.context(Query)?);
        }
        Command::Version {
            via_list: true,
        } => {
            println!("{}", zfs.output_version().await.context(Query)?);
        }
        Command::Status {
            pools,
            summary,
        } => {
            let status = zfs.pool_status().await.context(Query)?;
            let status = status
                .into_iter()
                .filter(|(name, _)| pools.is_empty() || pools.contains(name))
                .collect::<BTreeMap<_, _>>();
            if summary {
                for pool in status.values() {
                    println!("{}", pool.summarize());
                }
            } else {
                let json =
                    serde_json::to_string_pretty(&status).context(Print)?;
                println!("{json}");
            }
        }
    }
    Ok(())
}

#[tokio::main(worker_threads = 2)]
async fn main() {
    let args = CliArgs::parse();
    logger::init(&args.log_level);

    if let Err(error) = run(args).await {
        eprintln!("{error}");
        std::process::exit(1);
    }
}
