use std::fs;
use std::sync::{Arc, Mutex};

use hello_rados_core::backend::{DirClient, FaultPlan, MemoryCluster, Operation, CLUSTER_DIR_OPTION};
use hello_rados_core::{
    EnvSnapshot, Errno, FatalCleanupHandler, SessionConfig, SessionError, SessionState,
    StorageSession, Step,
};
use serial_test::serial;

const POOL: &str = "hello_world_pool";

fn admin() -> SessionConfig {
    SessionConfig::new("admin")
}

fn recording_handler() -> (FatalCleanupHandler, Arc<Mutex<Vec<SessionError>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let handler: FatalCleanupHandler = Arc::new(move |err: &SessionError| {
        sink.lock().expect("lock").push(err.clone());
    });
    (handler, seen)
}

#[test]
fn hello_world_scenario_round_trips_and_cleans_up() {
    let cluster = MemoryCluster::new();
    let mut session = StorageSession::open(cluster.client(), &admin(), POOL).expect("open");
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(cluster.pools(), vec![POOL.to_string()]);

    session.put("hello_object", b"hello world").expect("put");
    let data = session.get_balanced("hello_object").expect("get");
    assert_eq!(data, b"hello world");

    session.close().expect("close");
    assert!(cluster.pools().is_empty());
    assert_eq!(cluster.active_connections(), 0);
    assert_eq!(
        cluster.calls(),
        vec![
            Operation::Init,
            Operation::ParseArgs,
            Operation::Connect,
            Operation::CreatePool,
            Operation::CreateIoCtx,
            Operation::Write,
            Operation::Read,
            Operation::DeletePool,
            Operation::Shutdown,
        ]
    );
}

#[test]
fn open_then_drop_leaves_no_pool_behind() {
    let cluster = MemoryCluster::new();
    for _ in 0..3 {
        let session = StorageSession::open(cluster.client(), &admin(), POOL).expect("open");
        drop(session);
        assert!(cluster.pools().is_empty());
        assert_eq!(cluster.active_connections(), 0);
    }
}

#[test]
fn overwrite_replaces_the_whole_object() {
    let cluster = MemoryCluster::new();
    let mut session = StorageSession::open(cluster.client(), &admin(), POOL).expect("open");
    session.put("obj", b"a much longer first value").expect("first");
    session.put("obj", b"short").expect("second");
    assert_eq!(session.get_balanced("obj").expect("get"), b"short");
    session.put("empty", b"").expect("empty");
    assert!(session.get_balanced("empty").expect("get").is_empty());
}

#[test]
fn reading_an_unwritten_object_is_a_read_failure() {
    let cluster = MemoryCluster::new();
    let mut session = StorageSession::open(cluster.client(), &admin(), POOL).expect("open");
    let err = session.get_balanced("never_written").unwrap_err();
    assert_eq!(
        err,
        SessionError::ReadFailed {
            object: "never_written".into(),
            status: Errno::ENOENT,
        }
    );
    assert_eq!(session.state(), SessionState::Ready);
    session.put("after", b"still usable").expect("put");
}

#[test]
fn write_failures_carry_the_store_status() {
    let cluster = MemoryCluster::new();
    let mut session = StorageSession::open(cluster.client(), &admin(), POOL).expect("open");
    let err = session.put("", b"nameless").unwrap_err();
    assert_eq!(err.step(), Step::Write);
    assert_eq!(err.status(), Errno::EINVAL);

    cluster.set_faults(FaultPlan::new().fail(Operation::Write, Errno::EIO));
    let err = session.put("obj", b"x").unwrap_err();
    assert_eq!(err.to_string(), "[HR201] couldn't write object obj! error -5");
    cluster.reset_faults();
}

#[test]
fn pool_collision_skips_ioctx_and_deletion() {
    let cluster = MemoryCluster::new();
    cluster.seed_pool(POOL).expect("seed");

    let err = StorageSession::open(cluster.client(), &admin(), POOL).unwrap_err();
    assert!(matches!(err, SessionError::ContainerExists { .. }));
    assert!(err.is_pool_create_failure());
    assert_eq!(err.status(), Errno::EEXIST);

    let calls = cluster.calls();
    assert!(!calls.contains(&Operation::CreateIoCtx));
    assert!(!calls.contains(&Operation::DeletePool));
    assert_eq!(calls.last(), Some(&Operation::Shutdown));
    assert_eq!(cluster.pools(), vec![POOL.to_string()]);
    assert_eq!(cluster.active_connections(), 0);
}

#[test]
fn pool_create_failure_is_reported_with_status() {
    let cluster =
        MemoryCluster::with_faults(FaultPlan::new().fail(Operation::CreatePool, Errno::EIO));
    let err = StorageSession::open(cluster.client(), &admin(), POOL).unwrap_err();
    assert_eq!(
        err,
        SessionError::ContainerCreateFailed {
            pool: POOL.into(),
            status: Errno::EIO,
        }
    );
    assert!(!cluster.calls().contains(&Operation::CreateIoCtx));
    assert!(!cluster.calls().contains(&Operation::DeletePool));
}

#[test]
fn missing_config_file_fails_before_connecting() {
    let cluster = MemoryCluster::new();
    let config = admin().with_args(["--conf", "/nonexistent/path"]);
    let err = StorageSession::open(cluster.client(), &config, POOL).unwrap_err();
    assert_eq!(
        err,
        SessionError::ConfigFileFailed {
            path: "/nonexistent/path".into(),
            status: Errno::ENOENT,
        }
    );
    assert_eq!(
        cluster.calls(),
        vec![
            Operation::Init,
            Operation::ParseArgs,
            Operation::ReadConfigFile
        ]
    );
}

#[test]
fn conf_flag_without_path_is_a_parse_failure() {
    let cluster = MemoryCluster::new();
    let config = admin().with_args(["-c"]);
    let err = StorageSession::open(cluster.client(), &config, POOL).unwrap_err();
    assert_eq!(err, SessionError::ConfigParseFailed { status: Errno::EINVAL });
    assert!(!cluster.calls().contains(&Operation::Connect));
}

#[test]
fn dash_leading_option_values_are_accepted() {
    let cluster = MemoryCluster::new();
    let config = admin().with_args(["--debug", "-1"]);
    let session = StorageSession::open(cluster.client(), &config, POOL).expect("open");
    session.close().expect("close");

    let config = admin().with_args(["--conf", "-weird.toml"]);
    let err = StorageSession::open(cluster.client(), &config, POOL).unwrap_err();
    assert_eq!(
        err,
        SessionError::ConfigFileFailed {
            path: "-weird.toml".into(),
            status: Errno::ENOENT,
        }
    );
}

#[test]
fn empty_identity_fails_initialization() {
    let cluster = MemoryCluster::new();
    let err = StorageSession::open(cluster.client(), &SessionConfig::new(""), POOL).unwrap_err();
    assert_eq!(err.step(), Step::Init);
    assert_eq!(err.status(), Errno::EINVAL);
    assert_eq!(cluster.calls(), vec![Operation::Init]);
}

#[test]
fn each_open_step_maps_to_its_error() {
    let cases = [
        (Operation::Init, Step::Init),
        (Operation::ParseArgs, Step::ParseArgs),
        (Operation::Connect, Step::Connect),
        (Operation::CreatePool, Step::CreatePool),
        (Operation::CreateIoCtx, Step::CreateIoCtx),
    ];
    for (op, step) in cases {
        let cluster = MemoryCluster::with_faults(FaultPlan::new().fail(op, Errno::EIO));
        let err = StorageSession::open(cluster.client(), &admin(), POOL).unwrap_err();
        assert_eq!(err.step(), step, "{op:?}");
        assert_eq!(err.status(), Errno::EIO, "{op:?}");
        assert!(cluster.pools().is_empty(), "{op:?}");
        assert_eq!(cluster.active_connections(), 0, "{op:?}");
    }
}

#[test]
fn ioctx_failure_releases_pool_then_connection() {
    let cluster =
        MemoryCluster::with_faults(FaultPlan::new().fail(Operation::CreateIoCtx, Errno::ENOENT));
    let err = StorageSession::open(cluster.client(), &admin(), POOL).unwrap_err();
    assert!(matches!(err, SessionError::IoHandleFailed { .. }));
    let calls = cluster.calls();
    assert_eq!(
        &calls[calls.len() - 2..],
        &[Operation::DeletePool, Operation::Shutdown]
    );
    assert!(cluster.pools().is_empty());
}

#[test]
fn connect_failure_skips_shutdown() {
    let cluster =
        MemoryCluster::with_faults(FaultPlan::new().fail(Operation::Connect, Errno::ENOTCONN));
    let err = StorageSession::open(cluster.client(), &admin(), POOL).unwrap_err();
    assert_eq!(err.to_string(), "[HR104] couldn't connect to cluster! error -107");
    assert!(!cluster.calls().contains(&Operation::Shutdown));
}

#[test]
fn dropped_session_escalates_cleanup_failure_once() {
    let cluster = MemoryCluster::new();
    let (handler, seen) = recording_handler();
    let session = StorageSession::builder(cluster.client())
        .with_fatal_cleanup_handler(handler)
        .open(&admin(), POOL)
        .expect("open");
    cluster.set_faults(FaultPlan::new().fail(Operation::DeletePool, Errno::EIO));
    drop(session);

    let seen = seen.lock().expect("lock");
    assert_eq!(seen.len(), 1);
    assert!(seen[0].is_fatal_cleanup());
    assert_eq!(seen[0].status(), Errno::EIO);
    assert_eq!(cluster.active_connections(), 0);
    assert_eq!(cluster.pools(), vec![POOL.to_string()]);
}

#[test]
fn failed_open_escalates_cleanup_failure() {
    let cluster = MemoryCluster::with_faults(
        FaultPlan::new()
            .fail(Operation::CreateIoCtx, Errno::EIO)
            .fail(Operation::DeletePool, Errno::EIO),
    );
    let (handler, seen) = recording_handler();
    let err = StorageSession::builder(cluster.client())
        .with_fatal_cleanup_handler(handler)
        .open(&admin(), POOL)
        .unwrap_err();
    assert_eq!(err.step(), Step::CreateIoCtx);
    assert_eq!(seen.lock().expect("lock").len(), 1);
}

#[test]
fn close_returns_cleanup_failure_instead_of_escalating() {
    let cluster = MemoryCluster::new();
    let (handler, seen) = recording_handler();
    let session = StorageSession::builder(cluster.client())
        .with_fatal_cleanup_handler(handler)
        .open(&admin(), POOL)
        .expect("open");
    cluster.set_faults(FaultPlan::new().fail(Operation::DeletePool, Errno::EIO));

    let err = session.close().unwrap_err();
    assert_eq!(err.to_string(), "[HR901] failed to delete pool hello_world_pool! error -5");
    assert!(seen.lock().expect("lock").is_empty());
    let shutdowns = cluster
        .calls()
        .iter()
        .filter(|op| **op == Operation::Shutdown)
        .count();
    assert_eq!(shutdowns, 1);
}

#[test]
fn config_file_overrides_arguments() {
    let temp = tempfile::tempdir().expect("tempdir");
    let conf = temp.path().join("cluster.toml");
    fs::write(&conf, "[client.admin]\nosd_max_object_size = 4\n").expect("write conf");

    let cluster = MemoryCluster::new();
    let config = admin()
        .with_args(["--osd_max_object_size", "1024"])
        .with_conf(&conf);
    let mut session = StorageSession::open(cluster.client(), &config, POOL).expect("open");
    let err = session.put("obj", b"12345").unwrap_err();
    assert_eq!(err.status(), Errno::EFBIG);
}

#[test]
fn dir_backend_leaves_nothing_after_close() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = admin().with_args([
        format!("--{CLUSTER_DIR_OPTION}"),
        temp.path().display().to_string(),
    ]);
    let mut session = StorageSession::open(DirClient::new(), &config, POOL).expect("open");
    session.put("hello_object", b"hello world").expect("put");
    assert_eq!(session.get_balanced("hello_object").expect("get"), b"hello world");
    assert!(temp.path().join("pools").join(POOL).is_dir());
    session.close().expect("close");
    assert!(!temp.path().join("pools").join(POOL).exists());
}

#[test]
fn dir_backend_caps_object_names_to_fit_a_file_name() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = admin().with_args([
        format!("--{CLUSTER_DIR_OPTION}"),
        temp.path().display().to_string(),
        "--osd_max_object_name_len".to_string(),
        "4096".to_string(),
    ]);
    let mut session = StorageSession::open(DirClient::new(), &config, POOL).expect("open");

    let longest = "o".repeat(127);
    session.put(&longest, b"x").expect("put");
    assert_eq!(session.get_balanced(&longest).expect("get"), b"x");

    let err = session.put(&"o".repeat(128), b"x").unwrap_err();
    assert_eq!(err.status(), Errno::ENAMETOOLONG);
    let err = session.put(&"o".repeat(200), b"x").unwrap_err();
    assert_eq!(err.status(), Errno::ENAMETOOLONG);
    session.close().expect("close");
}

#[test]
fn dir_backend_keeps_foreign_pool_on_collision() {
    let temp = tempfile::tempdir().expect("tempdir");
    let foreign = temp.path().join("pools").join(POOL);
    fs::create_dir_all(&foreign).expect("foreign pool");
    fs::write(foreign.join("keep"), b"data").expect("foreign object");

    let config = admin().with_args([format!("--cluster_dir={}", temp.path().display())]);
    let err = StorageSession::open(DirClient::new(), &config, POOL).unwrap_err();
    assert!(matches!(err, SessionError::ContainerExists { .. }));
    assert!(foreign.join("keep").is_file());
}

#[test]
#[serial]
fn env_args_reach_the_client() {
    std::env::set_var("CEPH_ARGS", "--osd_max_object_size 2");
    let config = admin().with_env_args(&EnvSnapshot::capture());
    std::env::remove_var("CEPH_ARGS");

    let cluster = MemoryCluster::new();
    let mut session = StorageSession::open(cluster.client(), &config, POOL).expect("open");
    assert_eq!(session.put("obj", b"abc").unwrap_err().status(), Errno::EFBIG);
}
