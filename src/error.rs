//! Unified error types for the climate controller.
//!
//! `Error` is what construction and reconfiguration return; `SensorError`
//! and `ConfigError` are also carried in events.  All variants are `Copy`
//! so they can be echoed back to the configuration source without
//! allocation.
//!
//! Nothing here is fatal: the worst outcome of any error is that the
//! last safe actuator state is held until the next evaluation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Failure to build or reconfigure an engine component.
///
/// Returned by the constructors and configuration writes.  Sensor
/// failures never surface here; they are held locally per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A single configuration write was rejected.
    Config(ConfigError),
    /// A whole configuration failed validation at construction time.
    InvalidConfig(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::InvalidConfig(reason) => write!(f, "invalid configuration: {reason}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Why a reading could not be used this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The driver returned no value (bus error, timeout, NaN).
    Unavailable,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "reading unavailable"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// A rejected configuration write.
///
/// Both variants carry the value that stayed in effect so the caller can
/// echo it back to the configuration source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The value is outside its declared bound.
    InvalidConfiguration {
        field: &'static str,
        retained: i32,
    },
    /// Cycle parameters can only change while the scheduler is idle.
    ReconfigurationWhileActive {
        field: &'static str,
        retained: i32,
    },
}

impl ConfigError {
    /// Name of the rejected field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration { field, .. }
            | Self::ReconfigurationWhileActive { field, .. } => field,
        }
    }

    /// The value that remains in effect after the rejection.
    pub fn retained(&self) -> i32 {
        match self {
            Self::InvalidConfiguration { retained, .. }
            | Self::ReconfigurationWhileActive { retained, .. } => *retained,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfiguration { field, retained } => {
                write!(f, "invalid value for {field}, keeping {retained}")
            }
            Self::ReconfigurationWhileActive { field, retained } => {
                write!(f, "{field} is locked while the cycle runs, keeping {retained}")
            }
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl core::error::Error for Error {}
impl core::error::Error for SensorError {}
impl core::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
