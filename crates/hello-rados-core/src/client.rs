use std::path::Path;

use crate::context::ClientConfig;
use crate::errno::Errno;

/// Object I/O bound to one pool over one connection.
pub trait IoCtx {
    /// Replaces the whole object with `data`.
    fn write_full(&mut self, object: &str, data: &[u8]) -> Result<(), Errno>;
    /// Reads the whole object, letting the store pick any current replica.
    fn read_balanced(&mut self, object: &str) -> Result<Vec<u8>, Errno>;
}

/// Client side of a remote object store cluster.
///
/// The configuration calls have default implementations over the client's
/// [`ClientConfig`]; backends supply the control plane and pool calls.
pub trait ClusterClient {
    type IoCtx: IoCtx;

    fn config(&self) -> &ClientConfig;
    fn config_mut(&mut self) -> &mut ClientConfig;

    fn init(&mut self, identity: &str) -> Result<(), Errno> {
        self.config_mut().init(identity)
    }

    fn parse_args(&mut self, args: &[String]) -> Result<(), Errno> {
        self.config_mut().parse_args(args)
    }

    fn read_config_file(&mut self, path: &Path) -> Result<(), Errno> {
        self.config_mut().read_config_file(path)
    }

    fn connect(&mut self) -> Result<(), Errno>;
    fn create_pool(&mut self, name: &str) -> Result<(), Errno>;
    fn delete_pool(&mut self, name: &str) -> Result<(), Errno>;
    fn ioctx_create(&mut self, pool: &str) -> Result<Self::IoCtx, Errno>;
    fn shutdown(&mut self);
}
