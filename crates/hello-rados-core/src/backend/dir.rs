//! Cluster kept in a local directory: `<cluster_dir>/pools/<pool>/<hex(name)>`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::debug;

use super::{check_pool_name, ObjectLimits};
use crate::client::{ClusterClient, IoCtx};
use crate::context::ClientConfig;
use crate::errno::Errno;

pub const CLUSTER_DIR_OPTION: &str = "cluster_dir";
/// Longest object name whose hex file name fits in 255 bytes.
pub const DIR_MAX_OBJECT_NAME_LEN: usize = 127;
const POOLS_DIR: &str = "pools";

#[derive(Debug, Default)]
pub struct DirClient {
    config: ClientConfig,
    pools_root: Option<PathBuf>,
    link: Option<Arc<AtomicBool>>,
    limits: ObjectLimits,
}

impl DirClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn pools_root(&self) -> Result<&Path, Errno> {
        match (&self.pools_root, &self.link) {
            (Some(root), Some(link)) if link.load(Ordering::Acquire) => Ok(root.as_path()),
            _ => Err(Errno::ENOTCONN),
        }
    }

    fn pool_dir(&self, name: &str) -> Result<PathBuf, Errno> {
        check_pool_name(name)?;
        Ok(self.pools_root()?.join(name))
    }
}

impl ClusterClient for DirClient {
    type IoCtx = DirIoCtx;

    fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ClientConfig {
        &mut self.config
    }

    fn connect(&mut self) -> Result<(), Errno> {
        if !self.config.is_initialized() {
            return Err(Errno::EINVAL);
        }
        if self.link.is_some() {
            return Err(Errno::EISCONN);
        }
        let root = self
            .config
            .get(CLUSTER_DIR_OPTION)
            .map(PathBuf::from)
            .ok_or(Errno::EINVAL)?;
        if !root.is_dir() {
            debug!(root = %root.display(), "cluster directory missing");
            return Err(Errno::ENOENT);
        }
        let mut limits = ObjectLimits::from_config(&self.config)?;
        limits.max_name_len = limits.max_name_len.min(DIR_MAX_OBJECT_NAME_LEN);
        self.limits = limits;
        let pools_root = root.join(POOLS_DIR);
        fs::create_dir_all(&pools_root).map_err(Errno::from)?;
        self.pools_root = Some(pools_root);
        self.link = Some(Arc::new(AtomicBool::new(true)));
        Ok(())
    }

    fn create_pool(&mut self, name: &str) -> Result<(), Errno> {
        let dir = self.pool_dir(name)?;
        fs::create_dir(&dir).map_err(Errno::from)
    }

    fn delete_pool(&mut self, name: &str) -> Result<(), Errno> {
        let dir = self.pool_dir(name)?;
        fs::remove_dir_all(&dir).map_err(Errno::from)
    }

    fn ioctx_create(&mut self, pool: &str) -> Result<DirIoCtx, Errno> {
        let dir = self.pool_dir(pool)?;
        if !dir.is_dir() {
            return Err(Errno::ENOENT);
        }
        let link = self.link.clone().ok_or(Errno::ENOTCONN)?;
        Ok(DirIoCtx {
            dir,
            link,
            limits: self.limits,
        })
    }

    fn shutdown(&mut self) {
        if let Some(link) = self.link.take() {
            link.store(false, Ordering::Release);
        }
        self.pools_root = None;
    }
}

#[derive(Debug)]
pub struct DirIoCtx {
    dir: PathBuf,
    link: Arc<AtomicBool>,
    limits: ObjectLimits,
}

impl DirIoCtx {
    fn object_path(&self, object: &str) -> Result<PathBuf, Errno> {
        if !self.link.load(Ordering::Acquire) {
            return Err(Errno::ENOTCONN);
        }
        self.limits.check_name(object)?;
        Ok(self.dir.join(hex::encode(object.as_bytes())))
    }
}

impl IoCtx for DirIoCtx {
    fn write_full(&mut self, object: &str, data: &[u8]) -> Result<(), Errno> {
        let path = self.object_path(object)?;
        self.limits.check_write(object, data.len())?;
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(Errno::from)?;
        tmp.write_all(data).map_err(Errno::from)?;
        tmp.persist(&path).map_err(|err| Errno::from(err.error))?;
        Ok(())
    }

    fn read_balanced(&mut self, object: &str) -> Result<Vec<u8>, Errno> {
        let path = self.object_path(object)?;
        fs::read(&path).map_err(Errno::from)
    }
}
