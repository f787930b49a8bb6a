//! Port traits — the boundary between the session controller and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BrewSessionController (domain)
//! ```
//!
//! Driven adapters (probe, heater SSR, pump relay, NVS, system clock)
//! implement these traits. The controller consumes them via generics, so
//! the whole session core runs against mocks on the host.

use crate::config::{BoilProfile, BrewConfig, MashProfile};
use crate::error::{ActuatorError, SensorError, StoreError};
use super::session::{BrewSession, SessionPatch};

// ───────────────────────────────────────────────────────────────
// Wall clock (driven adapter: SNTP → domain)
// ───────────────────────────────────────────────────────────────

/// Wall-clock source. `now()` yields epoch seconds only once the clock has
/// been synchronized from a trusted external source; before that every
/// deadline-based operation must refuse to run.
pub trait Clock {
    /// Current wall-clock time, `None` while unsynchronized.
    fn now(&self) -> Option<u64>;

    fn is_synchronized(&self) -> bool {
        self.now().is_some()
    }
}

// ───────────────────────────────────────────────────────────────
// Sensor / actuator ports
// ───────────────────────────────────────────────────────────────

/// Read-side port for the kettle temperature probe.
pub trait TemperatureProbe {
    /// One calibrated reading in °C. Implausible raw values are errors,
    /// never silently clamped readings.
    fn read_celsius(&mut self) -> Result<f32, SensorError>;
}

/// Write-side port for the heater SSR. Exclusively owned by the heater
/// controller: only the PID compute step and an explicit disable touch it.
pub trait HeaterPort {
    /// Drive the element at `duty` percent (0–100).
    fn set_heater_duty(&mut self, duty: f32) -> Result<(), ActuatorError>;

    /// Drop the SSR gate immediately.
    fn heater_off(&mut self) -> Result<(), ActuatorError>;
}

/// Write-side port for the recirculation pump relay. Mutated only by
/// command operations (start/resume/stop), never by the periodic tick.
pub trait PumpPort {
    fn set_pump(&mut self, on: bool) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Persistence ports
// ───────────────────────────────────────────────────────────────

/// Persists the single brew session record under a fixed key, overwritten
/// whole on every mutation. Implementations must be atomic from the
/// perspective of readers: a loaded record is always one complete save.
pub trait SessionStore {
    /// Load the persisted session; `Ok(None)` on first boot.
    fn load_session(&self) -> Result<Option<BrewSession>, StoreError>;

    /// Overwrite the stored session.
    fn save_session(&mut self, session: &BrewSession) -> Result<(), StoreError>;
}

/// Loads and persists operator configuration and stage profiles.
/// Implementations validate before persisting — reject, don't clamp.
pub trait ConfigStore {
    fn load_config(&self) -> Result<BrewConfig, StoreError>;
    fn save_config(&mut self, config: &BrewConfig) -> Result<(), StoreError>;

    fn load_mash_profile(&self) -> Result<MashProfile, StoreError>;
    fn load_boil_profile(&self) -> Result<BoilProfile, StoreError>;
}

// ───────────────────────────────────────────────────────────────
// Stage sequencer (collaborator: mash / boil step logic)
// ───────────────────────────────────────────────────────────────

/// Step logic for one stage. Invoked once per control tick; returns a patch
/// instead of mutating the session so that persistence and all writes stay
/// inside the controller. Implementations hold no back-reference to the
/// session or the store.
pub trait StageSequencer {
    /// Re-read the stage profile so in-flight step definitions reflect the
    /// current configuration. Called by StartBrew/ResumeBrew (and StartBoil
    /// for the boil sequencer).
    fn reload(&mut self, store: &dyn ConfigStore);

    /// One sequencing step against a read-only view of the session.
    /// `now` is synchronized wall-clock time; `None` while unsynced.
    fn advance(&mut self, session: &BrewSession, now: Option<u64>) -> Option<SessionPatch>;
}

// ───────────────────────────────────────────────────────────────
// Event sink (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The controller emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log, telemetry
/// channel, ...).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
