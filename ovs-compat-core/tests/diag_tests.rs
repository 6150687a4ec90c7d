//! Diagnostic sink file layout.

use assert_fs::prelude::*;
use ovs_compat_core::diag::DIAG_LOG_FILE;
use ovs_compat_core::{DiagSink, Directories, DirectoryDefaults, Severity};
use predicates::prelude::*;

#[test]
fn sink_writes_fixed_file_in_resolved_log_dir() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let logdir = root.child("var/log/openvswitch");
    logdir.create_dir_all().expect("mkdir");

    let dirs = Directories::resolve_with(&DirectoryDefaults::default(), |name| {
        (name == "OVS_LOGDIR").then(|| logdir.path().as_os_str().to_owned())
    });

    let mut sink = DiagSink::open(dirs.logdir(), "ovs-vswitchd").expect("open");
    sink.write(Severity::Warning, "bridge br0 has no ports").expect("write");
    sink.close().expect("close");

    logdir
        .child(DIAG_LOG_FILE)
        .assert(predicate::str::contains("ovs-vswitchd[").and(predicate::str::contains(
            "WARNING bridge br0 has no ports",
        )));
}

#[test]
fn open_fails_when_directory_missing() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let missing = root.path().join("does-not-exist");
    let err = DiagSink::open(&missing, "x").unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}
