#![cfg(all(unix, feature = "cli"))]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/mcuspi-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn mcuspi(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mcuspi"))
        .args(["--log-level", "error", "--format", "json"])
        .args(args)
        .output()
        .expect("mcuspi should run")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp path should be utf-8")
}

#[test]
fn encode_then_decode_prints_message() {
    let dir = unique_temp_dir("encode");
    let frame = dir.join("frame.bin");

    let out = mcuspi(&[
        "encode",
        "--out",
        path_str(&frame),
        "--serial",
        "9",
        "--descriptor",
        "c0ffee",
        "--data",
        "HELLO",
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let bytes = std::fs::read(&frame).expect("frame file should exist");
    assert_eq!(bytes.len(), 1096);
    assert_eq!(&bytes[..2], &[0xAA, 9]);
    assert_eq!(&bytes[66..68], &[5, 0]);

    let out = mcuspi(&["decode", path_str(&frame)]);
    assert!(out.status.success());
    let line: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json output");
    assert_eq!(line["serial"], 9);
    assert_eq!(line["descriptor"], "c0ffee");
    assert_eq!(line["payload_size"], 5);
    assert_eq!(line["payload"], "HELLO");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn send_writes_one_frame_to_device() {
    let dir = unique_temp_dir("send");
    let device = dir.join("mcuspi0");
    std::fs::write(&device, b"").expect("device stand-in should be creatable");

    let out = mcuspi(&[
        "send",
        path_str(&device),
        "--chunk",
        "2",
        "--hex",
        "fffe010203",
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let out = mcuspi(&["decode", path_str(&device)]);
    assert!(out.status.success());
    let line: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json output");
    assert_eq!(line["serial"], 0);
    assert_eq!(line["payload_size"], 5);
    assert_eq!(line["payload"], "<binary 5 bytes>");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn listen_reads_capture_until_count() {
    let dir = unique_temp_dir("listen");
    let capture = dir.join("capture.bin");
    let mut bytes = Vec::new();
    for (serial, word) in ["one", "two", "three"].iter().enumerate() {
        let frame = dir.join(format!("f{serial}.bin"));
        let out = mcuspi(&[
            "encode",
            "--out",
            path_str(&frame),
            "--serial",
            &serial.to_string(),
            "--data",
            word,
        ]);
        assert!(out.status.success());
        bytes.extend(std::fs::read(&frame).expect("frame should exist"));
    }
    std::fs::write(&capture, &bytes).expect("capture should be writable");

    let out = mcuspi(&["listen", path_str(&capture), "--count", "2"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let payloads: Vec<String> = stdout
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).expect("json line");
            value["payload"].as_str().unwrap_or_default().to_string()
        })
        .collect();
    assert_eq!(payloads, vec!["one", "two"]);

    let out = mcuspi(&["listen", path_str(&capture), "--stats"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    let last = stdout.lines().last().expect("stats line");
    let stats: serde_json::Value = serde_json::from_str(last).expect("stats json");
    assert_eq!(stats["queued"], 3);
    assert_eq!(stats["read_failures"], 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn corrupted_frame_exits_data_invalid() {
    let dir = unique_temp_dir("corrupt");
    let frame = dir.join("frame.bin");
    let out = mcuspi(&["encode", "--out", path_str(&frame), "--data", "payload"]);
    assert!(out.status.success());

    let mut bytes = std::fs::read(&frame).expect("frame should exist");
    bytes[70] ^= 0x01;
    std::fs::write(&frame, &bytes).expect("frame should be writable");

    let out = mcuspi(&["decode", path_str(&frame)]);
    assert_eq!(out.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&out.stderr).contains("checksum mismatch"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn open_of_missing_device_fails() {
    let out = mcuspi(&["send", "/nonexistent/mcuspi-test-device", "--data", "x"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("open failed"));
}

#[test]
fn version_prints_name() {
    let out = mcuspi(&["version"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("mcuspi "));
}

#[test]
fn encode_without_out_writes_frame_to_stdout() {
    let out = mcuspi(&["encode", "--serial", "3", "--data", "hi"]);
    assert!(out.status.success());
    assert_eq!(out.stdout.len(), 1096);
    assert_eq!(&out.stdout[..2], &[0xAA, 3]);
    assert_eq!(&out.stdout[68..70], b"hi");
}

#[test]
fn extended_version_reports_build_and_wire_constants() {
    let out = mcuspi(&["version", "--extended"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("build_profile: "));
    assert!(stdout.contains("frame_size: 1096"));
    assert!(stdout.contains("max_payload: 1024"));
}
