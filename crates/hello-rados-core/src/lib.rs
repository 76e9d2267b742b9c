#![deny(clippy::all)]

//! Scoped sessions against a remote object store cluster: configure a client,
//! connect, provision a pool, do object I/O, and always tear down.

pub mod backend;
mod client;
mod config;
mod context;
mod demo;
mod errno;
mod error;
mod outcome;
mod session;

pub use crate::client::{ClusterClient, IoCtx};
pub use crate::config::{
    EnvSnapshot, SessionConfig, DEFAULT_CONTENT, DEFAULT_IDENTITY, DEFAULT_OBJECT, DEFAULT_POOL,
    ENV_CLIENT_ARGS,
};
pub use crate::context::{ClientConfig, EntityName};
pub use crate::demo::{run_hello, HelloReport, HelloRequest};
pub use crate::errno::Errno;
pub use crate::error::{diagnostics, SessionError, Step};
pub use crate::outcome::{CommandStatus, ExecutionOutcome};
pub use crate::session::{
    terminate_process, FatalCleanupHandler, SessionBuilder, SessionState, StorageSession,
    FATAL_CLEANUP_EXIT_CODE,
};
