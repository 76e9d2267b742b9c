use std::collections::HashMap;
use std::str::FromStr;

use crate::errno::Errno;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FaultSpecError {
    #[error("fault entry '{0}' must look like <operation>:<status>")]
    Malformed(String),
    #[error("unknown operation '{0}' in fault entry")]
    UnknownOperation(String),
    #[error("status '{0}' in fault entry is not a number")]
    BadStatus(String),
}

/// Client interface calls a backend can be told to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Init,
    ParseArgs,
    ReadConfigFile,
    Connect,
    CreatePool,
    DeletePool,
    CreateIoCtx,
    Write,
    Read,
    Shutdown,
}

impl Operation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ParseArgs => "parse-args",
            Self::ReadConfigFile => "read-config-file",
            Self::Connect => "connect",
            Self::CreatePool => "create-pool",
            Self::DeletePool => "delete-pool",
            Self::CreateIoCtx => "create-ioctx",
            Self::Write => "write",
            Self::Read => "read",
            Self::Shutdown => "shutdown",
        }
    }
}

impl FromStr for Operation {
    type Err = FaultSpecError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "init" => Ok(Self::Init),
            "parse-args" => Ok(Self::ParseArgs),
            "read-config-file" => Ok(Self::ReadConfigFile),
            "connect" => Ok(Self::Connect),
            "create-pool" => Ok(Self::CreatePool),
            "delete-pool" => Ok(Self::DeletePool),
            "create-ioctx" => Ok(Self::CreateIoCtx),
            "write" => Ok(Self::Write),
            "read" => Ok(Self::Read),
            "shutdown" => Ok(Self::Shutdown),
            other => Err(FaultSpecError::UnknownOperation(other.to_string())),
        }
    }
}

/// Statuses to return instead of performing an operation.
#[derive(Clone, Debug, Default)]
pub struct FaultPlan {
    faults: HashMap<Operation, Errno>,
}

impl FaultPlan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call of `op` fail with `status`.
    #[must_use]
    pub fn fail(mut self, op: Operation, status: Errno) -> Self {
        self.faults.insert(op, status);
        self
    }

    pub fn clear(&mut self, op: Operation) {
        self.faults.remove(&op);
    }

    #[must_use]
    pub fn status_for(&self, op: Operation) -> Option<Errno> {
        self.faults.get(&op).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Parses `delete-pool:-5,write:-27`. Positive statuses are negated; zero is
/// rejected.
impl FromStr for FaultPlan {
    type Err = FaultSpecError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut plan = Self::new();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (op, status) = entry
                .split_once(':')
                .ok_or_else(|| FaultSpecError::Malformed(entry.to_string()))?;
            let op: Operation = op.trim().parse()?;
            let status: i32 = status
                .trim()
                .parse()
                .ok()
                .filter(|code| *code != 0)
                .ok_or_else(|| FaultSpecError::BadStatus(status.trim().to_string()))?;
            plan = plan.fail(op, Errno::from_code(status));
        }
        Ok(plan)
    }
}
