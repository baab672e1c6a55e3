//! Unit tests for decoding and summarising the zfs json output.

use super::*;
use assert_matches::assert_matches;
use serde_json::json;

const CMD: &str = "zpool status --json --json-int";

fn decode_status(output: &serde_json::Value) -> Result<StatusOutput, Error> {
    decode(CMD, output.to_string().as_bytes())
}

fn disk(name: &str, parent: &str, guid: u64) -> serde_json::Value {
    json!({
        "name": name,
        "vdev_type": "disk",
        "guid": guid,
        "path": format!("/dev/{name}1"),
        "phys_path": format!("pci-0000:00:1f.2-ata-{guid}"),
        "devid": format!("ata-DISK_{guid}-part1"),
        "class": "normal",
        "state": "ONLINE",
        "parent": parent,
        "rep_dev_size": 1_000_198_897_664u64,
        "phys_space": 1_000_204_886_016u64,
        "read_errors": 1,
        "write_errors": 3,
        "checksum_errors": 2,
        "slow_ios": 5
    })
}

fn scan_stats() -> serde_json::Value {
    json!({
        "function": "RESILVER",
        "state": "SCANNING",
        "start_time": 1_717_171_717,
        "end_time": 1_717_175_317,
        "to_examine": 4_000_000,
        "examined": 1_000_000,
        "skipped": 10,
        "processed": 250_000,
        "errors": 3,
        "bytes_per_scan": 11,
        "pass_start": 1_717_171_800,
        "scrub_pause": 1_717_172_000,
        "scrub_spent_paused": 120,
        "issued_bytes_per_scan": 13,
        "issued": 900_000
    })
}

/// A raidz group holding a replacing vdev and two disks.
fn raidz() -> serde_json::Value {
    let replacing = json!({
        "name": "replacing-0",
        "vdev_type": "replacing",
        "guid": 43,
        "state": "DEGRADED",
        "parent": "raidz1-0",
        "vdevs": {
            "sda": disk("sda", "replacing-0", 1),
            "sdd": disk("sdd", "replacing-0", 4)
        }
    });
    json!({
        "name": "raidz1-0",
        "vdev_type": "raidz",
        "guid": 42,
        "class": "normal",
        "state": "DEGRADED",
        "parent": "tank",
        "vdevs": {
            "replacing-0": replacing,
            "sdb": disk("sdb", "raidz1-0", 2),
            "sdc": disk("sdc", "raidz1-0", 3)
        }
    })
}

/// A pool with a root, a raidz group with a nested replacing vdev and disks.
fn tank() -> serde_json::Value {
    let root = json!({
        "name": "tank",
        "vdev_type": "root",
        "guid": 17_437_981_094_617_812_873u64,
        "class": "normal",
        "state": "DEGRADED",
        "alloc_space": 1_234_567,
        "total_space": 2_000_000_000_000u64,
        "def_space": 1_990_000_000_000u64,
        "vdevs": {"raidz1-0": raidz()}
    });
    let pool = json!({
        "name": "tank",
        "state": "DEGRADED",
        "pool_guid": 17_437_981_094_617_812_873u64,
        "txg": 8_231_554,
        "spa_version": 5000,
        "zpl_version": 5,
        "status": "One or more devices is currently being resilvered.",
        "action": "Wait for the resilver to complete.",
        "msgid": "ZFS-8000-9P",
        "moreinfo": "https://openzfs.github.io/openzfs-docs/msg/ZFS-8000-9P",
        "error_count": 7,
        "scan_stats": scan_stats(),
        "vdevs": {"tank": root},
        "logs": {"nvme0n1": disk("nvme0n1", "tank", 5)},
        "l2cache": {},
        "spares": {"sde": disk("sde", "tank", 6)}
    });
    json!({
        "output_version": {
            "command": "zpool status",
            "vers_major": 99,
            "major": 0,
            "minor": 1
        },
        "pools": {"tank": pool}
    })
}

#[test]
fn minimal_status() {
    let output = br#"{"output_version":{"command":"zpool status","major":0,"minor":1},"pools":{"tank":{"name":"tank","state":"ONLINE","vdevs":{}}}}"#;
    let status: StatusOutput = decode(CMD, output).unwrap();

    assert_eq!(status.output_version.command, "zpool status");
    assert_eq!(status.output_version.major, 0);
    assert_eq!(status.output_version.minor, 1);
    assert_eq!(status.payload.pools.len(), 1);
    let tank = &status.payload.pools["tank"];
    assert_eq!(tank.name, "tank");
    assert_eq!(tank.state, "ONLINE");
    assert!(tank.vdevs.is_empty());
    // missing fields are defaulted
    assert_eq!(tank.pool_guid, 0);
    assert_eq!(tank.scan_stats.function, "");
}

#[test]
fn nested_status() {
    let status = decode_status(&tank()).unwrap();
    let tank = &status.payload.pools["tank"];

    assert_eq!(tank.name, "tank");
    assert_eq!(tank.state, "DEGRADED");
    assert_eq!(tank.pool_guid, 17_437_981_094_617_812_873);
    assert_eq!(tank.txg, 8_231_554);
    assert_eq!(tank.spa_version, 5000);
    assert_eq!(tank.zpl_version, 5);
    assert_eq!(
        tank.status,
        "One or more devices is currently being resilvered."
    );
    assert_eq!(tank.action, "Wait for the resilver to complete.");
    assert_eq!(tank.msgid, "ZFS-8000-9P");
    assert_eq!(
        tank.more_info,
        "https://openzfs.github.io/openzfs-docs/msg/ZFS-8000-9P"
    );
    assert_eq!(tank.error_count, 7);

    let scan = &tank.scan_stats;
    assert_eq!(scan.function, "RESILVER");
    assert_eq!(scan.scan_function(), Some(ScanFunction::Resilver));
    assert_eq!(scan.state, "SCANNING");
    assert!(scan.in_progress());
    assert_eq!(scan.start_time, 1_717_171_717);
    assert_eq!(scan.end_time, 1_717_175_317);
    assert_eq!(scan.to_examine, 4_000_000);
    assert_eq!(scan.examined, 1_000_000);
    assert_eq!(scan.skipped, 10);
    assert_eq!(scan.processed, 250_000);
    assert_eq!(scan.errors, 3);
    assert_eq!(scan.bytes_per_scan, 11);
    assert_eq!(scan.pass_start, 1_717_171_800);
    assert_eq!(scan.scrub_pause, 1_717_172_000);
    assert_eq!(scan.scrub_spent_paused, 120);
    assert_eq!(scan.issued_bytes_per_scan, 13);
    assert_eq!(scan.issued, 900_000);

    let root = &tank.vdevs["tank"];
    assert_eq!(root.vdev_type, "root");
    assert_eq!(root.guid, 17_437_981_094_617_812_873);
    assert_eq!(root.alloc_space, 1_234_567);
    assert_eq!(root.total_space, 2_000_000_000_000);
    assert_eq!(root.def_space, 1_990_000_000_000);
    assert_eq!(root.parent, "");
    assert_eq!(root.children.len(), 1);

    let raidz = &root.children["raidz1-0"];
    assert_eq!(raidz.guid, 42);
    assert_eq!(raidz.parent, "tank");
    assert_eq!(raidz.children.len(), 3);

    let replacing = &raidz.children["replacing-0"];
    assert_eq!(replacing.vdev_type, "replacing");
    assert_eq!(replacing.state, "DEGRADED");
    assert_eq!(replacing.children.len(), 2);

    let sdd = &replacing.children["sdd"];
    assert!(sdd.is_leaf());
    assert_eq!(sdd.name, "sdd");
    assert_eq!(sdd.vdev_type, "disk");
    assert_eq!(sdd.guid, 4);
    assert_eq!(sdd.path, "/dev/sdd1");
    assert_eq!(sdd.phys_path, "pci-0000:00:1f.2-ata-4");
    assert_eq!(sdd.devid, "ata-DISK_4-part1");
    assert_eq!(sdd.class, "normal");
    assert_eq!(sdd.state, "ONLINE");
    assert_eq!(sdd.parent, "replacing-0");
    assert_eq!(sdd.rep_dev_size, 1_000_198_897_664);
    assert_eq!(sdd.phys_space, 1_000_204_886_016);
    assert_eq!(sdd.read_errors, 1);
    assert_eq!(sdd.write_errors, 3);
    assert_eq!(sdd.checksum_errors, 2);
    assert_eq!(sdd.slow_ios, 5);

    assert_eq!(tank.logs["nvme0n1"].guid, 5);
    assert!(tank.l2cache.is_empty());
    assert_eq!(tank.spares["sde"].parent, "tank");
}

/// Check every value of `expected` is reproduced at the same place in
/// `output`. Fields absent from `expected` are ignored.
fn assert_reproduced(
    expected: &serde_json::Value,
    output: &serde_json::Value,
    at: &str,
) {
    match expected.as_object() {
        Some(fields) => {
            for (key, value) in fields {
                let at = format!("{at}.{key}");
                let found = output.get(key);
                assert!(found.is_some(), "{at} missing");
                assert_reproduced(value, found.unwrap(), &at);
            }
        }
        None => assert_eq!(expected, output, "{at}"),
    }
}

#[test]
fn status_round_trip() {
    let mut expected = tank();
    let status = decode_status(&expected).unwrap();
    let output = serde_json::to_value(&status).unwrap();

    // not modelled
    expected["output_version"]
        .as_object_mut()
        .unwrap()
        .remove("vers_major");
    assert_reproduced(&expected, &output, "");
    assert_eq!(output["pools"]["tank"]["l2cache"], json!({}));
}

#[test]
fn leaf_vdev() {
    let status = decode_status(&json!({
        "pools": {
            "scratch": {
                "name": "scratch",
                "vdevs": {
                    "/var/tmp/file0": {
                        "name": "/var/tmp/file0",
                        "vdev_type": "file",
                        "vdevs": {}
                    },
                    "/var/tmp/file1": {
                        "name": "/var/tmp/file1",
                        "vdev_type": "file"
                    }
                }
            }
        }
    }))
    .unwrap();

    let scratch = &status.payload.pools["scratch"];
    assert_eq!(scratch.vdevs.len(), 2);
    assert!(scratch.vdevs.values().all(|vdev| vdev.children.is_empty()));
    assert_eq!(status.output_version, CommandVersion::default());
}

#[test]
fn null_fields() {
    let output = br#"{"pools":{"tank":{"name":"tank","status":null,"vdevs":null}}}"#;
    let status: StatusOutput = decode(CMD, output).unwrap();
    let tank = &status.payload.pools["tank"];
    assert_eq!(tank.name, "tank");
    assert_eq!(tank.status, "");
    assert!(tank.vdevs.is_empty());

    let status = decode_status(&json!({
        "output_version": null,
        "pools": {
            "tank": {
                "txg": null,
                "scan_stats": null,
                "logs": null,
                "vdevs": {
                    "sda": {"guid": null, "path": null, "vdevs": null}
                }
            },
            "scratch": {
                "scan_stats": {"function": null, "errors": null}
            }
        }
    }))
    .unwrap();

    assert_eq!(status.output_version, CommandVersion::default());
    let tank = &status.payload.pools["tank"];
    assert_eq!(tank.txg, 0);
    assert_eq!(tank.scan_stats.function, "");
    assert!(tank.logs.is_empty());
    let sda = &tank.vdevs["sda"];
    assert_eq!((sda.guid, sda.path.as_str()), (0, ""));
    assert!(sda.is_leaf());
    let scratch = &status.payload.pools["scratch"].scan_stats;
    assert_eq!((scratch.function.as_str(), scratch.errors), ("", 0));

    let status = decode_status(&json!({"pools": null})).unwrap();
    assert!(status.payload.pools.is_empty());
}

#[test]
fn numbers_as_strings() {
    let bad = [
        json!({"output_version": {"major": "0"}}),
        json!({"pools": {"tank": {"txg": "42"}}}),
        json!({"pools": {"tank": {"pool_guid": "18446744073709551615"}}}),
        json!({"pools": {"tank": {"vdevs": {"sda": {"read_errors": "7"}}}}}),
    ];
    for output in bad {
        assert_matches!(
            decode_status(&output),
            Err(Error::Decode { .. }),
            "{output}"
        );
    }
}

#[test]
fn incompatible_field_types() {
    let bad = [
        json!({"pools": {"tank": {"txg": "not a number"}}}),
        json!({"pools": {"tank": {"txg": -1}}}),
        json!({"pools": {"tank": {"txg": 1.5}}}),
        json!({"pools": {"tank": {"vdevs": "sda"}}}),
        json!({"pools": {"tank": {"vdevs": {"sda": {"vdevs": []}}}}}),
        json!({"pools": ["tank"]}),
        json!({"output_version": {"major": 4_294_967_296u64}}),
    ];
    for output in bad {
        assert_matches!(
            decode_status(&output),
            Err(Error::Decode { command, .. }) if command == CMD,
            "{output}"
        );
    }
}

#[test]
fn malformed_output() {
    let bad: [&[u8]; 6] = [
        b"",
        b"   \n",
        b"null",
        b"[]",
        br#"{"output_version": {"command": "zpool status""#,
        br#"{"pools": {}} trailing"#,
    ];
    for output in bad {
        assert_matches!(
            decode::<PoolStatusPayload>(CMD, output),
            Err(Error::Decode { .. })
        );
    }
}

#[test]
fn tool_version() {
    let output = br#"{
        "output_version": {"command": "zfs version", "major": 0, "minor": 1},
        "zfs_version": {"userland": "zfs-2.3.0-1", "kernel": "zfs-kmod-2.3.0-1"}
    }"#;
    let version: VersionOutput = decode("zfs version --json", output).unwrap();

    assert_eq!(version.output_version.command, "zfs version");
    assert_eq!(version.payload.tool_version.userland, "zfs-2.3.0-1");
    assert_eq!(version.payload.tool_version.kernel, "zfs-kmod-2.3.0-1");
}

#[test]
fn list_version_only() {
    let output = br#"{
        "output_version": {"command": "zpool list", "major": 0, "minor": 1},
        "pools": {"tank": {"name": "tank", "type": "POOL", "properties": {}}}
    }"#;
    let list: Envelope<Discarded> =
        decode("zpool --json --json-int list -Ho name", output).unwrap();

    assert_eq!(
        list.output_version,
        CommandVersion {
            command: "zpool list".into(),
            major: 0,
            minor: 1,
        }
    );
}

#[test]
fn deep_vdev_tree() {
    const DEPTH: usize = 100;

    let mut vdev = json!({"name": "leaf", "vdev_type": "disk"});
    for level in (0 .. DEPTH).rev() {
        let name = format!("level-{level}");
        vdev = json!({"name": name, "vdevs": {"child": vdev}});
    }
    let output = json!({"pools": {"deep": {"vdevs": {"root": vdev}}}});

    // each level nests two json objects, well past serde_json's default limit
    let handle = std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(move || {
            let status = decode_status(&output).unwrap();
            let mut vdev = &status.payload.pools["deep"].vdevs["root"];
            let mut depth = 0;
            while let Some(child) = vdev.children.get("child") {
                vdev = child;
                depth += 1;
            }
            (depth, vdev.name.clone())
        })
        .unwrap();

    assert_eq!(handle.join().unwrap(), (DEPTH, "leaf".to_string()));
}

#[test]
fn pool_summary_is_bounded() {
    let vdevs = (0 .. 5)
        .map(|index| {
            let name = format!("mirror-{index}");
            let children = json!({
                format!("hidden-disk-{index}-a"): disk("hidden-a", &name, 1),
                format!("hidden-disk-{index}-b"): disk("hidden-b", &name, 2),
            });
            (name.clone(), json!({"name": name, "vdevs": children}))
        })
        .collect::<serde_json::Map<_, _>>();
    let status = decode_status(&json!({
        "pools": {"tank": {"name": "tank", "state": "ONLINE", "vdevs": vdevs}}
    }))
    .unwrap();

    let tank = &status.payload.pools["tank"];
    let summary = tank.summarize();
    assert_eq!(summary.get("num_vdevs"), Some(&FieldValue::UInt(5)));
    assert_eq!(
        summary.get("state"),
        Some(&FieldValue::Str("ONLINE".to_string()))
    );

    let text = summary.to_string();
    assert!(text.contains("num_vdevs=5"), "{text}");
    assert!(!text.contains("hidden"), "{text}");
    assert!(!text.contains("mirror-"), "{text}");

    let summary = status.summarize();
    assert_eq!(summary.get("num_pools"), Some(&FieldValue::UInt(1)));
    assert!(!summary.to_string().contains("hidden"));
}

#[test]
fn envelope_summary() {
    let status = decode_status(&tank()).unwrap();
    let summary = status.summarize();

    assert_eq!(
        summary.to_string(),
        r#"output_version.command="zpool status" output_version.major=0 output_version.minor=1 num_pools=1"#
    );

    let raidz = &status.payload.pools["tank"].vdevs["tank"].children["raidz1-0"];
    let summary = raidz.summarize();
    assert_eq!(summary.get("num_vdevs"), Some(&FieldValue::UInt(3)));
    assert_eq!(summary.len(), 16);
    assert!(!summary.to_string().contains("sdb"));

    let summary = status.payload.pools["tank"].scan_stats.summarize();
    assert_eq!(summary.get("issued"), Some(&FieldValue::UInt(900_000)));
}

#[test]
fn version_check() {
    let version = CommandVersion {
        command: "zpool status".into(),
        major: 1,
        minor: 3,
    };

    assert_matches!(VersionCheck::Ignore.verify(CMD, &version), Ok(()));
    assert_matches!(VersionCheck::Major(1).verify(CMD, &version), Ok(()));
    assert_matches!(
        VersionCheck::Major(0).verify(CMD, &version),
        Err(Error::IncompatibleVersion {
            expected: 0,
            found,
            ..
        }) if found == "1.3"
    );
}

#[test]
fn error_display() {
    let error = decode_status(&json!({"pools": 1})).unwrap_err();
    assert_eq!(error.command(), CMD);
    assert!(error.to_string().starts_with(&format!(
        "Failed to json parse '{CMD}' output"
    )));
}
