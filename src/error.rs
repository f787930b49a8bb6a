//! Unified error types for the BrewKettle firmware.
//!
//! One enum per failure category, all funneling into [`BrewError`] so the
//! command dispatch layer and the control loop share a uniform taxonomy:
//! precondition failures surface to the caller with no mutation, collaborator
//! faults stay local to the tick, persistence failures fail the operation
//! without corrupting the in-memory session.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level brew error
// ---------------------------------------------------------------------------

/// Every fallible command operation and tick collaborator funnels into this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrewError {
    /// The wall clock has not been synchronized from an external time
    /// source. Stage-initiating/advancing operations refuse to run.
    ClockNotSynchronized,
    /// A command payload was malformed (missing or non-numeric field).
    InvalidRequest,
    /// The session could not be persisted. The in-memory session is
    /// unchanged when this is returned from a command operation.
    Persistence(StoreError),
    /// The kettle temperature probe failed to produce a plausible reading.
    Sensor(SensorError),
    /// An actuator command failed.
    Actuator(ActuatorError),
}

impl fmt::Display for BrewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClockNotSynchronized => write!(f, "wall clock not synchronized"),
            Self::InvalidRequest => write!(f, "invalid request payload"),
            Self::Persistence(e) => write!(f, "persistence: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error or timed out.
    AdcReadFailed,
    /// Reading is outside the physically plausible range for a kettle.
    OutOfRange,
    /// Probe is disconnected (divider rail reading).
    Disconnected,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::Disconnected => write!(f, "probe disconnected"),
        }
    }
}

impl From<SensorError> for BrewError {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// LEDC duty-cycle write failed.
    PwmWriteFailed,
    /// Relay GPIO set failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl From<ActuatorError> for BrewError {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Persistence errors
// ---------------------------------------------------------------------------

/// Errors from [`SessionStore`](crate::app::ports::SessionStore) and
/// [`ConfigStore`](crate::app::ports::ConfigStore) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Requested record does not exist (first boot).
    NotFound,
    /// Stored blob failed deserialization.
    Corrupted,
    /// A config field failed range validation; the message names the field.
    ValidationFailed(&'static str),
    /// Storage partition is full.
    Full,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "record not found"),
            Self::Corrupted => write!(f, "record corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StoreError> for BrewError {
    fn from(e: StoreError) -> Self {
        Self::Persistence(e)
    }
}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, BrewError>;
