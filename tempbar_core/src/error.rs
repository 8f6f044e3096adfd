//! Errors raised by the SMC layer.

use crate::{DataType, SensorKey};
use std::fmt;

/// A raw return code from the kernel's structured-method interface, passed through unchanged.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct IoReturn(pub i32);

impl IoReturn {
    pub const SUCCESS: Self = Self(0);
    /// `kIOReturnNotPrivileged`
    pub const NOT_PRIVILEGED: Self = Self(0xE000_02C1_u32 as i32);

    #[inline]
    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }
}

impl fmt::Debug for IoReturn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "IoReturn({:#010x})", self.0 as u32)
    }
}

impl fmt::Display for IoReturn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#010x}", self.0 as u32)?;
        if *self == Self::NOT_PRIVILEGED {
            write!(f, " (not privileged, are you running as root?)")?;
        }
        Ok(())
    }
}

/// Startup failures. Nothing can be read after one of these.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("SMC service not found")]
    ServiceNotFound,

    #[error("failed to open the SMC service: kernel returned {0}")]
    ConnectionFailed(IoReturn),
}

/// Failures decoding a value buffer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unsupported format {data_type:?} with size {size}")]
    UnsupportedFormat { data_type: DataType, size: u32 },

    #[error("buffer holds {actual} bytes, {expected} expected")]
    Truncated { expected: usize, actual: usize },
}

/// Per-key read failures. These never affect reads of other keys.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    #[error("SMC key {0} not found")]
    KeyNotFound(SensorKey),

    #[error("SMC operation on {key} failed with result {code}")]
    OperationFailed { key: SensorKey, code: u8 },

    #[error("SMC call for {key} failed: kernel returned {code}")]
    Transport { key: SensorKey, code: IoReturn },

    #[error("could not decode {key}: {source}")]
    Decode {
        key: SensorKey,
        #[source]
        source: DecodeError,
    },

    #[error("{0:?} is not a four character SMC key")]
    InvalidKey(String),

    #[error("SMC connection is not open")]
    NotConnected,
}

impl SensorError {
    /// The key this error concerns, if any.
    pub const fn key(&self) -> Option<SensorKey> {
        match self {
            Self::KeyNotFound(key)
            | Self::OperationFailed { key, .. }
            | Self::Transport { key, .. }
            | Self::Decode { key, .. } => Some(*key),
            Self::InvalidKey(_) | Self::NotConnected => None,
        }
    }

    /// Whether this means "no data here" rather than an actual fault.
    #[inline]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound(_))
    }
}
