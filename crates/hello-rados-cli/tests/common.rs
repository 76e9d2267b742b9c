#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::assert::Assert;
use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// The binary with every environment knob it reads cleared.
pub fn hello_cmd() -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("hello-rados");
    cmd.env_remove("CEPH_CONF")
        .env_remove("CEPH_ARGS")
        .env_remove("HELLO_RADOS_BACKEND")
        .env_remove("HELLO_RADOS_CLUSTER_DIR")
        .env_remove("HELLO_RADOS_FAULTS")
        .env("NO_COLOR", "1");
    cmd
}

pub fn parse_json(assert: &Assert) -> Value {
    serde_json::from_slice(&assert.get_output().stdout).expect("valid json")
}

pub fn stdout_of(assert: &Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}

pub fn stderr_of(assert: &Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stderr).into_owned()
}

/// A directory-backed cluster root, ready for `--backend dir`.
pub fn cluster_dir(prefix: &str) -> (TempDir, PathBuf) {
    let temp = tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("tempdir");
    let root = temp.path().join("cluster");
    std::fs::create_dir_all(&root).expect("cluster dir");
    (temp, root)
}

pub fn pool_path(root: &Path, pool: &str) -> PathBuf {
    root.join("pools").join(pool)
}
