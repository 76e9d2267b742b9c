use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};

/// Negative errno-style status reported by the cluster client interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Errno(i32);

impl Errno {
    pub const ENOENT: Self = Self(-2);
    pub const EIO: Self = Self(-5);
    pub const EEXIST: Self = Self(-17);
    pub const EINVAL: Self = Self(-22);
    pub const EFBIG: Self = Self(-27);
    pub const ENAMETOOLONG: Self = Self(-36);
    pub const EISCONN: Self = Self(-106);
    pub const ENOTCONN: Self = Self(-107);

    /// Wraps a failure code, forcing it negative.
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        if code < 0 {
            Self(code)
        } else {
            Self(code.saturating_neg())
        }
    }

    #[must_use]
    pub fn code(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&io::Error> for Errno {
    fn from(err: &io::Error) -> Self {
        if let Some(raw) = err.raw_os_error() {
            return Self::from_code(raw);
        }
        match err.kind() {
            io::ErrorKind::NotFound => Self::ENOENT,
            io::ErrorKind::AlreadyExists => Self::EEXIST,
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => Self::EINVAL,
            _ => Self::EIO,
        }
    }
}

impl From<io::Error> for Errno {
    fn from(err: io::Error) -> Self {
        Self::from(&err)
    }
}
