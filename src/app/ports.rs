//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlLoopDriver (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, event sinks, config storage)
//! implement these traits.  The [`ControlLoopDriver`](super::service::ControlLoopDriver)
//! consumes them via generics, so the decision engine never touches
//! hardware directly.

use crate::config::SystemConfig;
use crate::control::band::Channel;
use crate::control::cooling::CoolingOutputs;
use crate::control::fan::FanIntent;
use crate::error::SensorError;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per channel per sensor cycle.
///
/// Implementations must be non-blocking or bounded-latency; the dispatch
/// loop runs every task to completion.
pub trait SensorPort {
    /// Latest raw reading, or why there is none.
    fn read_channel(&mut self, channel: Channel) -> Result<i32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
///
/// Writes are fire-and-forget; the core does not track acknowledgement.
pub trait ActuatorPort {
    /// Drive the intake and exhaust fans.
    fn apply_fans(&mut self, intent: FanIntent);

    /// Drive the cooling loop and drain pump.
    fn apply_cooling(&mut self, outputs: CoolingOutputs);

    /// Switch the grow light.
    fn set_light(&mut self, on: bool);

    /// Switch the fogger.
    fn set_fogger(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log,
/// dashboard sync, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting and reject invalid
/// ranges with [`ConfigStoreError::ValidationFailed`] rather than clamp.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    fn load(&self) -> Result<SystemConfig, ConfigStoreError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigStoreError>;
}

// ───────────────────────────────────────────────────────────────
// Cycle delegate (decouples the duty-cycle scheduler from hardware)
// ───────────────────────────────────────────────────────────────

/// Callback trait the [`DutyCycleScheduler`](crate::scheduler::DutyCycleScheduler)
/// invokes whenever the light or fogger changes state.
///
/// The driver implements this by forwarding to the [`ActuatorPort`] and
/// [`EventSink`]; the scheduler itself knows nothing about either.
pub trait CycleDelegate {
    /// `at_ms` is the scheduled time of the change, which may be earlier
    /// than the current time if the driver loop ran late.
    fn on_cycle_event(&mut self, event: CycleEvent, at_ms: u64);
}

/// Discriminant passed to [`CycleDelegate::on_cycle_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleEvent {
    LightOn,
    LightOff,
    FoggerOn,
    FoggerOff,
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigStoreError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed to deserialize.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigStoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::error::Error for ConfigStoreError {}
