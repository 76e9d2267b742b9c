use serde::{Deserialize, Serialize};

use crate::errno::Errno;

pub mod diagnostics {
    pub const INIT: &str = "HR101";
    pub const CONFIG_ARGS: &str = "HR102";
    pub const CONFIG_FILE: &str = "HR103";
    pub const CONNECT: &str = "HR104";
    pub const POOL_CREATE: &str = "HR105";
    pub const IOCTX: &str = "HR106";
    pub const WRITE: &str = "HR201";
    pub const READ: &str = "HR202";
    pub const CLEANUP: &str = "HR901";
}

/// Lifecycle step a failure originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Init,
    ParseArgs,
    ReadConfigFile,
    Connect,
    CreatePool,
    CreateIoCtx,
    Write,
    Read,
    DeletePool,
}

impl Step {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ParseArgs => "parse-args",
            Self::ReadConfigFile => "read-config-file",
            Self::Connect => "connect",
            Self::CreatePool => "create-pool",
            Self::CreateIoCtx => "create-ioctx",
            Self::Write => "write",
            Self::Read => "read",
            Self::DeletePool => "delete-pool",
        }
    }
}

/// Errors surfaced by a storage session. None of them are retried.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("[HR101] couldn't initialize rados! error {status}")]
    InitializationFailed { status: Errno },
    #[error("[HR102] failed to parse config options! error {status}")]
    ConfigParseFailed { status: Errno },
    #[error("[HR103] failed to parse config file {path}! error {status}")]
    ConfigFileFailed { path: String, status: Errno },
    #[error("[HR104] couldn't connect to cluster! error {status}")]
    ConnectFailed { status: Errno },
    #[error("[HR105] couldn't create pool {pool}, it already exists! error {status}")]
    ContainerExists { pool: String, status: Errno },
    #[error("[HR105] couldn't create pool {pool}! error {status}")]
    ContainerCreateFailed { pool: String, status: Errno },
    #[error("[HR106] couldn't set up ioctx for pool {pool}! error {status}")]
    IoHandleFailed { pool: String, status: Errno },
    #[error("[HR201] couldn't write object {object}! error {status}")]
    WriteFailed { object: String, status: Errno },
    #[error("[HR202] couldn't read object {object}! error {status}")]
    ReadFailed { object: String, status: Errno },
    #[error("[HR901] failed to delete pool {pool}! error {status}")]
    CleanupFailed { pool: String, status: Errno },
}

impl SessionError {
    #[must_use]
    pub fn step(&self) -> Step {
        match self {
            Self::InitializationFailed { .. } => Step::Init,
            Self::ConfigParseFailed { .. } => Step::ParseArgs,
            Self::ConfigFileFailed { .. } => Step::ReadConfigFile,
            Self::ConnectFailed { .. } => Step::Connect,
            Self::ContainerExists { .. } | Self::ContainerCreateFailed { .. } => Step::CreatePool,
            Self::IoHandleFailed { .. } => Step::CreateIoCtx,
            Self::WriteFailed { .. } => Step::Write,
            Self::ReadFailed { .. } => Step::Read,
            Self::CleanupFailed { .. } => Step::DeletePool,
        }
    }

    #[must_use]
    pub fn status(&self) -> Errno {
        match self {
            Self::InitializationFailed { status }
            | Self::ConfigParseFailed { status }
            | Self::ConfigFileFailed { status, .. }
            | Self::ConnectFailed { status }
            | Self::ContainerExists { status, .. }
            | Self::ContainerCreateFailed { status, .. }
            | Self::IoHandleFailed { status, .. }
            | Self::WriteFailed { status, .. }
            | Self::ReadFailed { status, .. }
            | Self::CleanupFailed { status, .. } => *status,
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self.step() {
            Step::Init => diagnostics::INIT,
            Step::ParseArgs => diagnostics::CONFIG_ARGS,
            Step::ReadConfigFile => diagnostics::CONFIG_FILE,
            Step::Connect => diagnostics::CONNECT,
            Step::CreatePool => diagnostics::POOL_CREATE,
            Step::CreateIoCtx => diagnostics::IOCTX,
            Step::Write => diagnostics::WRITE,
            Step::Read => diagnostics::READ,
            Step::DeletePool => diagnostics::CLEANUP,
        }
    }

    /// Pool creation failures, including the name collision case.
    #[must_use]
    pub fn is_pool_create_failure(&self) -> bool {
        self.step() == Step::CreatePool
    }

    #[must_use]
    pub fn is_fatal_cleanup(&self) -> bool {
        matches!(self, Self::CleanupFailed { .. })
    }
}
