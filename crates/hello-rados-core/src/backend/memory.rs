//! In-process cluster. Clients made from one [`MemoryCluster`] share its
//! pools, so a second client sees what the first left behind.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::fault::{FaultPlan, Operation};
use super::{check_pool_name, ObjectLimits};
use crate::client::{ClusterClient, IoCtx};
use crate::context::ClientConfig;
use crate::errno::Errno;

type Pool = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Default)]
struct ClusterState {
    pools: BTreeMap<String, Pool>,
    faults: FaultPlan,
    journal: Vec<Operation>,
    connections: usize,
}

impl ClusterState {
    fn enter(&mut self, op: Operation) -> Result<(), Errno> {
        self.journal.push(op);
        match self.faults.status_for(op) {
            Some(status) => {
                debug!(op = op.as_str(), %status, "injected fault");
                Err(status)
            }
            None => Ok(()),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryCluster {
    state: Arc<Mutex<ClusterState>>,
}

impl MemoryCluster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_faults(faults: FaultPlan) -> Self {
        let cluster = Self::new();
        cluster.set_faults(faults);
        cluster
    }

    #[must_use]
    pub fn client(&self) -> MemoryClient {
        MemoryClient {
            cluster: self.clone(),
            config: ClientConfig::new(),
            link: None,
            limits: ObjectLimits::default(),
        }
    }

    pub fn set_faults(&self, faults: FaultPlan) {
        self.lock().faults = faults;
    }

    pub fn reset_faults(&self) {
        self.lock().faults = FaultPlan::new();
    }

    /// Creates a pool out of band, as another client would.
    ///
    /// # Errors
    /// `EEXIST` when the pool is already there.
    pub fn seed_pool(&self, name: &str) -> Result<(), Errno> {
        let mut state = self.lock();
        if state.pools.contains_key(name) {
            return Err(Errno::EEXIST);
        }
        state.pools.insert(name.to_string(), Pool::new());
        Ok(())
    }

    #[must_use]
    pub fn pools(&self) -> Vec<String> {
        self.lock().pools.keys().cloned().collect()
    }

    #[must_use]
    pub fn object(&self, pool: &str, name: &str) -> Option<Vec<u8>> {
        self.lock()
            .pools
            .get(pool)
            .and_then(|objects| objects.get(name))
            .cloned()
    }

    /// Every client-interface call made against this cluster, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Operation> {
        self.lock().journal.clone()
    }

    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.lock().connections
    }

    fn lock(&self) -> MutexGuard<'_, ClusterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
pub struct MemoryClient {
    cluster: MemoryCluster,
    config: ClientConfig,
    link: Option<Arc<AtomicBool>>,
    limits: ObjectLimits,
}

impl MemoryClient {
    fn connected(&self) -> Result<(), Errno> {
        match &self.link {
            Some(link) if link.load(Ordering::Acquire) => Ok(()),
            _ => Err(Errno::ENOTCONN),
        }
    }
}

impl ClusterClient for MemoryClient {
    type IoCtx = MemoryIoCtx;

    fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ClientConfig {
        &mut self.config
    }

    fn init(&mut self, identity: &str) -> Result<(), Errno> {
        self.cluster.lock().enter(Operation::Init)?;
        self.config.init(identity)
    }

    fn parse_args(&mut self, args: &[String]) -> Result<(), Errno> {
        self.cluster.lock().enter(Operation::ParseArgs)?;
        self.config.parse_args(args)
    }

    fn read_config_file(&mut self, path: &Path) -> Result<(), Errno> {
        self.cluster.lock().enter(Operation::ReadConfigFile)?;
        self.config.read_config_file(path)
    }

    fn connect(&mut self) -> Result<(), Errno> {
        let mut state = self.cluster.lock();
        state.enter(Operation::Connect)?;
        if !self.config.is_initialized() {
            return Err(Errno::EINVAL);
        }
        if self.link.is_some() {
            return Err(Errno::EISCONN);
        }
        self.limits = ObjectLimits::from_config(&self.config)?;
        state.connections += 1;
        self.link = Some(Arc::new(AtomicBool::new(true)));
        Ok(())
    }

    fn create_pool(&mut self, name: &str) -> Result<(), Errno> {
        let mut state = self.cluster.lock();
        state.enter(Operation::CreatePool)?;
        self.connected()?;
        check_pool_name(name)?;
        if state.pools.contains_key(name) {
            return Err(Errno::EEXIST);
        }
        state.pools.insert(name.to_string(), Pool::new());
        Ok(())
    }

    fn delete_pool(&mut self, name: &str) -> Result<(), Errno> {
        let mut state = self.cluster.lock();
        state.enter(Operation::DeletePool)?;
        self.connected()?;
        state.pools.remove(name).map(|_| ()).ok_or(Errno::ENOENT)
    }

    fn ioctx_create(&mut self, pool: &str) -> Result<MemoryIoCtx, Errno> {
        let mut state = self.cluster.lock();
        state.enter(Operation::CreateIoCtx)?;
        self.connected()?;
        if !state.pools.contains_key(pool) {
            return Err(Errno::ENOENT);
        }
        let link = self.link.clone().ok_or(Errno::ENOTCONN)?;
        Ok(MemoryIoCtx {
            cluster: self.cluster.clone(),
            pool: pool.to_string(),
            link,
            limits: self.limits,
        })
    }

    fn shutdown(&mut self) {
        let mut state = self.cluster.lock();
        state.journal.push(Operation::Shutdown);
        if let Some(link) = self.link.take() {
            link.store(false, Ordering::Release);
            state.connections = state.connections.saturating_sub(1);
        }
    }
}

#[derive(Debug)]
pub struct MemoryIoCtx {
    cluster: MemoryCluster,
    pool: String,
    link: Arc<AtomicBool>,
    limits: ObjectLimits,
}

impl MemoryIoCtx {
    fn connected(&self) -> Result<(), Errno> {
        if self.link.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(Errno::ENOTCONN)
        }
    }
}

impl IoCtx for MemoryIoCtx {
    fn write_full(&mut self, object: &str, data: &[u8]) -> Result<(), Errno> {
        let mut state = self.cluster.lock();
        state.enter(Operation::Write)?;
        self.connected()?;
        self.limits.check_write(object, data.len())?;
        let objects = state.pools.get_mut(&self.pool).ok_or(Errno::ENOENT)?;
        objects.insert(object.to_string(), data.to_vec());
        Ok(())
    }

    fn read_balanced(&mut self, object: &str) -> Result<Vec<u8>, Errno> {
        let mut state = self.cluster.lock();
        state.enter(Operation::Read)?;
        self.connected()?;
        self.limits.check_name(object)?;
        state
            .pools
            .get(&self.pool)
            .ok_or(Errno::ENOENT)?
            .get(object)
            .cloned()
            .ok_or(Errno::ENOENT)
    }
}
