//! Outbound application events.
//!
//! The controller emits these through the [`EventSink`](super::ports::EventSink)
//! port. Adapters on the other side decide what to do with them — log to
//! serial, push onto a telemetry channel, etc.

use super::session::Stage;

/// Structured events emitted by the session core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A brew stage was entered via a command operation.
    StageStarted(Stage),

    /// A persisted session was re-armed after a restart.
    BrewResumed { end_time: Option<u64> },

    /// The session was stopped and all actuators released.
    BrewStopped,

    /// The operator forced the current step's deadline.
    StepAdvanced,

    /// A sequencer reported its stage finished.
    StageComplete(Stage),

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),
}

/// A point-in-time telemetry record suitable for logging or transmission.
#[derive(Debug, Clone)]
pub struct TelemetryData {
    pub stage: Stage,
    pub brew_started: bool,
    pub current_temperature: f32,
    pub target_temperature: Option<f32>,
    pub heater_duty: f32,
    pub pump_on: bool,
}
