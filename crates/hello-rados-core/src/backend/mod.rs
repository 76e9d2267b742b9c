//! Concrete cluster clients.

mod dir;
mod fault;
mod memory;

pub use dir::{DirClient, DirIoCtx, CLUSTER_DIR_OPTION, DIR_MAX_OBJECT_NAME_LEN};
pub use fault::{FaultPlan, FaultSpecError, Operation};
pub use memory::{MemoryClient, MemoryCluster, MemoryIoCtx};

use crate::context::ClientConfig;
use crate::errno::Errno;

pub const DEFAULT_MAX_OBJECT_SIZE: u64 = 128 * 1024 * 1024;
pub const DEFAULT_MAX_OBJECT_NAME_LEN: usize = 2048;

/// Per-object limits every backend enforces, read from the client options at
/// connect time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectLimits {
    pub max_object_size: u64,
    pub max_name_len: usize,
}

impl Default for ObjectLimits {
    fn default() -> Self {
        Self {
            max_object_size: DEFAULT_MAX_OBJECT_SIZE,
            max_name_len: DEFAULT_MAX_OBJECT_NAME_LEN,
        }
    }
}

impl ObjectLimits {
    /// # Errors
    /// `EINVAL` when a limit option is not a number.
    pub fn from_config(config: &ClientConfig) -> Result<Self, Errno> {
        let mut limits = Self::default();
        if let Some(raw) = config.get("osd_max_object_size") {
            limits.max_object_size = raw.parse().map_err(|_| Errno::EINVAL)?;
        }
        if let Some(raw) = config.get("osd_max_object_name_len") {
            limits.max_name_len = raw.parse().map_err(|_| Errno::EINVAL)?;
        }
        Ok(limits)
    }

    /// # Errors
    /// `EINVAL` for an empty name, `ENAMETOOLONG` past the name limit.
    pub fn check_name(&self, object: &str) -> Result<(), Errno> {
        if object.is_empty() {
            return Err(Errno::EINVAL);
        }
        if object.len() > self.max_name_len {
            return Err(Errno::ENAMETOOLONG);
        }
        Ok(())
    }

    /// # Errors
    /// Name errors as in [`Self::check_name`], `EFBIG` past the size limit.
    pub fn check_write(&self, object: &str, len: usize) -> Result<(), Errno> {
        self.check_name(object)?;
        if u64::try_from(len).map_or(true, |len| len > self.max_object_size) {
            return Err(Errno::EFBIG);
        }
        Ok(())
    }
}

pub(crate) fn check_pool_name(name: &str) -> Result<(), Errno> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(Errno::EINVAL);
    }
    Ok(())
}
