//! Scoped ownership of a cluster connection, one freshly created pool and an
//! I/O context over it.
//!
//! Acquisition runs connect, pool creation and ioctx binding in order. Each
//! completed acquisition is recorded, and teardown releases exactly those in
//! reverse order: the pool is deleted only if this session created it, the
//! connection is shut down only if it was established. Teardown runs once,
//! either through [`StorageSession::close`] or when the session is dropped.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::client::{ClusterClient, IoCtx};
use crate::config::SessionConfig;
use crate::errno::Errno;
use crate::error::SessionError;

/// Process exit code used when a pool cannot be cleaned up.
pub const FATAL_CLEANUP_EXIT_CODE: i32 = 2;

/// Escalation for a failed pool deletion during teardown from `Drop`.
pub type FatalCleanupHandler = Arc<dyn Fn(&SessionError) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Unopened,
    Opening,
    Ready,
    Closing,
    Closed,
    Failed,
}

impl SessionState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unopened => "unopened",
            Self::Opening => "opening",
            Self::Ready => "ready",
            Self::Closing => "closing",
            Self::Closed => "closed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reports the error on stderr and exits with [`FATAL_CLEANUP_EXIT_CODE`].
pub fn terminate_process(err: &SessionError) {
    eprintln!("We failed to delete our test pool! {err}");
    std::process::exit(FATAL_CLEANUP_EXIT_CODE);
}

/// An unopened session: the client plus the teardown escalation policy.
pub struct SessionBuilder<C: ClusterClient> {
    client: C,
    on_fatal_cleanup: FatalCleanupHandler,
}

impl<C: ClusterClient> SessionBuilder<C> {
    #[must_use]
    pub fn new(client: C) -> Self {
        Self {
            client,
            on_fatal_cleanup: Arc::new(terminate_process),
        }
    }

    /// Replaces the default process-terminating escalation.
    #[must_use]
    pub fn with_fatal_cleanup_handler(mut self, handler: FatalCleanupHandler) -> Self {
        self.on_fatal_cleanup = handler;
        self
    }

    /// Configures the client, connects, creates `pool` and binds an ioctx.
    ///
    /// # Errors
    /// The first failing step's error. Whatever was acquired before it is
    /// released before this returns.
    pub fn open(self, config: &SessionConfig, pool: &str) -> Result<StorageSession<C>, SessionError> {
        let mut session = StorageSession {
            client: self.client,
            pool: pool.to_string(),
            identity: config.identity.clone(),
            ioctx: None,
            state: SessionState::Opening,
            connected: false,
            pool_created: false,
            torn_down: false,
            on_fatal_cleanup: self.on_fatal_cleanup,
        };
        match session.provision(config) {
            Ok(()) => {
                session.state = SessionState::Ready;
                Ok(session)
            }
            Err(err) => {
                error!(step = err.step().as_str(), status = %err.status(), "session open failed");
                session.state = SessionState::Failed;
                Err(err)
            }
        }
    }
}

pub struct StorageSession<C: ClusterClient> {
    client: C,
    pool: String,
    identity: String,
    ioctx: Option<C::IoCtx>,
    state: SessionState,
    connected: bool,
    pool_created: bool,
    torn_down: bool,
    on_fatal_cleanup: FatalCleanupHandler,
}

impl<C: ClusterClient> StorageSession<C> {
    #[must_use]
    pub fn builder(client: C) -> SessionBuilder<C> {
        SessionBuilder::new(client)
    }

    /// Opens a session with the default fatal-cleanup escalation.
    ///
    /// # Errors
    /// See [`SessionBuilder::open`].
    pub fn open(client: C, config: &SessionConfig, pool: &str) -> Result<Self, SessionError> {
        SessionBuilder::new(client).open(config, pool)
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn pool(&self) -> &str {
        &self.pool
    }

    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Writes `content` as the whole value of `object`.
    ///
    /// # Errors
    /// `WriteFailed` with the store's status.
    pub fn put(&mut self, object: &str, content: &[u8]) -> Result<(), SessionError> {
        let result = self
            .io()
            .and_then(|io| IoCtx::write_full(io, object, content));
        result.map_err(|status| SessionError::WriteFailed {
            object: object.to_string(),
            status,
        })?;
        info!(
            pool = %self.pool,
            object,
            bytes = content.len(),
            "wrote object"
        );
        Ok(())
    }

    /// Reads the whole object, allowing the store to balance across replicas.
    ///
    /// # Errors
    /// `ReadFailed` with the store's status, including a missing object.
    pub fn get_balanced(&mut self, object: &str) -> Result<Vec<u8>, SessionError> {
        let result = self
            .io()
            .and_then(|io| IoCtx::read_balanced(io, object));
        let data = result.map_err(|status| SessionError::ReadFailed {
            object: object.to_string(),
            status,
        })?;
        info!(pool = %self.pool, object, bytes = data.len(), "read object");
        Ok(data)
    }

    /// Tears the session down and hands a cleanup failure back to the caller
    /// instead of the fatal-cleanup handler.
    ///
    /// # Errors
    /// `CleanupFailed` when the pool could not be deleted.
    pub fn close(mut self) -> Result<(), SessionError> {
        self.teardown()
    }

    fn io(&mut self) -> Result<&mut C::IoCtx, Errno> {
        self.ioctx.as_mut().ok_or(Errno::ENOTCONN)
    }

    fn provision(&mut self, config: &SessionConfig) -> Result<(), SessionError> {
        self.client
            .init(&config.identity)
            .map_err(|status| SessionError::InitializationFailed { status })?;
        info!(identity = %config.identity, "set up cluster client");

        self.client
            .parse_args(&config.args)
            .map_err(|status| SessionError::ConfigParseFailed { status })?;
        debug!(args = config.args.len(), "parsed config options");

        let conf = config
            .conf_path()
            .map_err(|status| SessionError::ConfigParseFailed { status })?;
        if let Some(path) = conf {
            self.client
                .read_config_file(Path::new(path))
                .map_err(|status| SessionError::ConfigFileFailed {
                    path: path.to_string(),
                    status,
                })?;
            debug!(path, "applied config file");
        }

        self.client
            .connect()
            .map_err(|status| SessionError::ConnectFailed { status })?;
        self.connected = true;
        info!("connected to cluster");

        match self.client.create_pool(&self.pool) {
            Ok(()) => {}
            Err(status) if status == Errno::EEXIST => {
                return Err(SessionError::ContainerExists {
                    pool: self.pool.clone(),
                    status,
                })
            }
            Err(status) => {
                return Err(SessionError::ContainerCreateFailed {
                    pool: self.pool.clone(),
                    status,
                })
            }
        }
        self.pool_created = true;
        info!(pool = %self.pool, "created pool");

        let ioctx = self
            .client
            .ioctx_create(&self.pool)
            .map_err(|status| SessionError::IoHandleFailed {
                pool: self.pool.clone(),
                status,
            })?;
        self.ioctx = Some(ioctx);
        info!(pool = %self.pool, "created ioctx");
        Ok(())
    }

    fn teardown(&mut self) -> Result<(), SessionError> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;
        if self.state == SessionState::Ready {
            self.state = SessionState::Closing;
        }
        self.ioctx = None;

        let mut outcome = Ok(());
        if self.pool_created {
            match self.client.delete_pool(&self.pool) {
                Ok(()) => {
                    self.pool_created = false;
                    info!(pool = %self.pool, "deleted pool");
                }
                Err(status) => {
                    let err = SessionError::CleanupFailed {
                        pool: self.pool.clone(),
                        status,
                    };
                    error!(pool = %self.pool, %status, "failed to delete pool");
                    self.state = SessionState::Failed;
                    outcome = Err(err);
                }
            }
        }

        if self.connected {
            self.client.shutdown();
            self.connected = false;
            info!("shut down cluster connection");
        }

        if self.state != SessionState::Failed {
            self.state = SessionState::Closed;
        }
        outcome
    }
}

impl<C: ClusterClient> Drop for StorageSession<C> {
    fn drop(&mut self) {
        if let Err(err) = self.teardown() {
            (self.on_fatal_cleanup)(&err);
        }
    }
}

impl<C: ClusterClient> fmt::Debug for StorageSession<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSession")
            .field("pool", &self.pool)
            .field("identity", &self.identity)
            .field("state", &self.state)
            .field("connected", &self.connected)
            .field("pool_created", &self.pool_created)
            .finish_non_exhaustive()
    }
}
