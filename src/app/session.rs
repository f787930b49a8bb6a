//! The persisted brew session entity.
//!
//! Exactly one [`BrewSession`] exists per device. It is created with the
//! stopped shape on first boot, loaded from the store at process start,
//! mutated only by the controller's command operations and periodic tick,
//! and never deleted — "stopped" is a state (`Stage::None`), not an absence
//! of the record.
//!
//! Optional values are `Option<T>` here; the legacy wire sentinels (`""`,
//! `-1`, `0`) exist only in [`SessionSnapshot`], the serialization boundary.

use serde::{Deserialize, Serialize};

use crate::config::StepKey;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Top-level phase of a brew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    #[default]
    None,
    Mash,
    Boil,
}

impl Stage {
    /// Legacy wire encoding: 0 = none, 1 = mash, 2 = boil.
    pub const fn wire_code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Mash => 1,
            Self::Boil => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// BrewSession
// ---------------------------------------------------------------------------

/// The single persisted brew record. All timestamps are wall-clock epoch
/// seconds; `end_time == None` means "no step deadline armed".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrewSession {
    /// Whether the session is actively running.
    pub brew_started: bool,
    /// Current top-level stage.
    pub active_stage: Stage,
    /// Index into the mash profile's rest steps.
    pub mash_step: Option<usize>,
    /// Key of the current boil addition; `None` = not in a boil step.
    pub boil_step: Option<StepKey>,

    /// Start of the current step window.
    pub start_time: Option<u64>,
    /// Deadline of the current step window.
    pub end_time: Option<u64>,
    /// Wall-clock time of the last controller mutation.
    pub time_now: u64,

    /// Remaining/total boil duration (seconds).
    pub boil_time_secs: u32,
    /// Boil setpoint copied from config at stage start.
    pub boil_target_temperature: Option<f32>,
    /// Active heater setpoint.
    pub target_temperature: Option<f32>,
    /// Heater power cap during the boil (0–100).
    pub boil_power_percent: f32,
    /// Heater power cap while ramping (0–100).
    pub ramp_power_percent: f32,

    /// Last kettle probe reading (°C).
    pub current_temperature: f32,
    /// Pump-on flag for resumed sessions.
    pub recirculation: bool,
}

impl BrewSession {
    /// Reset to the stopped shape. The last probe reading survives a stop;
    /// everything else is cleared so `Stage::None` implies no step indices,
    /// no deadlines, and no setpoints.
    pub fn clear(&mut self) {
        let current_temperature = self.current_temperature;
        *self = Self {
            current_temperature,
            ..Self::default()
        };
    }

    /// Whether the step window carries both endpoints (a resumable deadline).
    pub fn has_step_window(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_some()
    }

    /// Structural invariants from the session contract. Exercised by tests;
    /// every command operation must leave the session in a state where this
    /// holds.
    pub fn invariants_ok(&self) -> bool {
        if self.active_stage == Stage::None
            && (self.brew_started || self.mash_step.is_some() || self.boil_step.is_some())
        {
            return false;
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if end < start {
                return false;
            }
        }
        true
    }

    /// Whole-field wire snapshot with legacy sentinels.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from(self)
    }

    /// Apply a sequencer patch. Sequencers return patches instead of
    /// mutating the session so that all writes stay inside the controller.
    pub fn apply(&mut self, patch: SessionPatch) {
        if let Some(t) = patch.target_temperature {
            self.target_temperature = Some(t);
        }
        if let Some(start) = patch.start_time {
            self.start_time = Some(start);
        }
        if let Some(end) = patch.end_time {
            self.end_time = Some(end);
        }
        if patch.clear_step_window {
            self.start_time = None;
            self.end_time = None;
        }
        if let Some(idx) = patch.mash_step {
            self.mash_step = Some(idx);
        }
        if let Some(key) = patch.boil_step {
            self.boil_step = Some(key);
        }
        if patch.clear_boil_step {
            self.boil_step = None;
        }
    }
}

// ---------------------------------------------------------------------------
// SessionPatch
// ---------------------------------------------------------------------------

/// A partial update produced by one sequencer `advance` call. `None` fields
/// leave the session untouched; the `clear_*` flags express "set to absent",
/// which `Option<Option<T>>` would make unreadable.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub target_temperature: Option<f32>,
    pub start_time: Option<u64>,
    pub end_time: Option<u64>,
    pub clear_step_window: bool,
    pub mash_step: Option<usize>,
    pub boil_step: Option<StepKey>,
    pub clear_boil_step: bool,
    /// The sequencer finished its stage this tick (informational; the
    /// operator advances stages explicitly).
    pub stage_complete: bool,
}

// ---------------------------------------------------------------------------
// SessionSnapshot — the serialization boundary
// ---------------------------------------------------------------------------

/// Map-of-fields record returned by every command operation. Field names
/// and sentinel values match the original controller's HTTP payloads:
/// `active_boil_step_index = ""` and `*_temperature = -1` mean "unset",
/// timestamps use `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub brew_started: bool,
    pub active_step: u8,
    pub active_mash_step_index: i32,
    pub active_boil_step_index: StepKey,
    pub start_time: u64,
    pub end_time: u64,
    pub time_now: u64,
    pub boil_time: u32,
    pub boil_target_temperature: f32,
    pub target_temperature: f32,
    pub boil_power_percentage: f32,
    pub ramp_power_percentage: f32,
    pub current_temperature: f32,
    pub recirculation: bool,
}

impl From<&BrewSession> for SessionSnapshot {
    fn from(s: &BrewSession) -> Self {
        Self {
            brew_started: s.brew_started,
            active_step: s.active_stage.wire_code(),
            active_mash_step_index: s.mash_step.map_or(-1, |i| i as i32),
            active_boil_step_index: s.boil_step.clone().unwrap_or_default(),
            start_time: s.start_time.unwrap_or(0),
            end_time: s.end_time.unwrap_or(0),
            time_now: s.time_now,
            boil_time: s.boil_time_secs,
            boil_target_temperature: s.boil_target_temperature.unwrap_or(-1.0),
            target_temperature: s.target_temperature.unwrap_or(-1.0),
            boil_power_percentage: s.boil_power_percent,
            ramp_power_percentage: s.ramp_power_percent,
            current_temperature: s.current_temperature,
            recirculation: s.recirculation,
        }
    }
}
