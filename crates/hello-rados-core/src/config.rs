use std::collections::HashMap;
use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::context::find_conf_path;
use crate::errno::Errno;

pub const DEFAULT_IDENTITY: &str = "admin";
pub const DEFAULT_POOL: &str = "hello_world_pool";
pub const DEFAULT_OBJECT: &str = "hello_object";
pub const DEFAULT_CONTENT: &str = "hello world";

/// Extra client arguments picked up from the environment, applied before the
/// explicit ones.
pub const ENV_CLIENT_ARGS: &str = "CEPH_ARGS";

#[derive(Debug, Clone)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    #[must_use]
    pub fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    #[must_use]
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

/// Everything `open` needs to configure a client. Immutable once handed to
/// the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    pub identity: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl SessionConfig {
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Puts `--conf <path>` ahead of the other arguments.
    #[must_use]
    pub fn with_conf(mut self, path: &Path) -> Self {
        let mut args = vec!["--conf".to_string(), path.display().to_string()];
        args.append(&mut self.args);
        self.args = args;
        self
    }

    /// Prepends whitespace-separated arguments from `CEPH_ARGS`.
    #[must_use]
    pub fn with_env_args(mut self, snapshot: &EnvSnapshot) -> Self {
        if let Some(extra) = snapshot.var(ENV_CLIENT_ARGS) {
            let mut args: Vec<String> = extra.split_whitespace().map(str::to_string).collect();
            args.append(&mut self.args);
            self.args = args;
        }
        self
    }

    /// Config file named by `-c`/`--conf`, if any.
    ///
    /// # Errors
    /// `EINVAL` when the flag is the last argument.
    pub fn conf_path(&self) -> Result<Option<&str>, Errno> {
        find_conf_path(&self.args).map_err(|()| Errno::EINVAL)
    }
}
