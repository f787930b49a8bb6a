//! Operator-configurable brew parameters.
//!
//! [`BrewConfig`] holds everything the operator tunes before a brew:
//! boil duration, setpoints, heater power caps, PID tunings and the control
//! loop sample period. Stage profiles (mash rest steps and named boil
//! additions) are stored alongside as separate records, mirroring how the
//! settings UI edits them independently.
//!
//! Values can be overridden via NVS; command operations copy setpoints from
//! here into the session — the controller never invents numbers.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Hard cap on mash rest steps per profile.
pub const MAX_MASH_STEPS: usize = 8;
/// Hard cap on named boil additions per profile.
pub const MAX_BOIL_ADDITIONS: usize = 8;
/// Capacity of a boil addition name (hop/adjunct key).
pub const STEP_KEY_LEN: usize = 24;

/// Fixed-capacity key naming a boil addition ("bittering", "whirlpool", ...).
pub type StepKey = heapless::String<STEP_KEY_LEN>;

/// Core brew configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrewConfig {
    // --- Boil ---
    /// Boil duration in minutes.
    pub boil_time_mins: u32,
    /// Boil setpoint (°C).
    pub boil_temperature_c: f32,
    /// Heater power cap during the boil (0–100%).
    pub boil_power_percent: f32,

    // --- Mash ---
    /// Heater power cap while ramping to a mash rest target (0–100%).
    pub ramp_power_percent: f32,

    // --- PID ---
    /// Proportional gain.
    pub kp: f32,
    /// Integral gain.
    pub ki: f32,
    /// Derivative gain.
    pub kd: f32,

    // --- Timing ---
    /// Control loop sample period (seconds).
    pub sample_time_secs: u32,
}

impl Default for BrewConfig {
    fn default() -> Self {
        Self {
            boil_time_mins: 60,
            boil_temperature_c: 100.0,
            boil_power_percent: 80.0,
            ramp_power_percent: 100.0,

            kp: 250.0,
            ki: 1.5,
            kd: 1.0,

            sample_time_secs: 5,
        }
    }
}

impl BrewConfig {
    /// Boil duration in seconds (the session stores seconds).
    pub fn boil_time_secs(&self) -> u32 {
        self.boil_time_mins * 60
    }

    /// Sample period in milliseconds (what the heater PID and the control
    /// timer consume).
    pub fn sample_time_ms(&self) -> u32 {
        self.sample_time_secs * 1000
    }
}

/// Range-check a config before persisting. Rejects, never clamps.
pub fn validate_config(cfg: &BrewConfig) -> Result<(), StoreError> {
    if !(1..=360).contains(&cfg.boil_time_mins) {
        return Err(StoreError::ValidationFailed(
            "boil_time_mins must be 1–360",
        ));
    }
    if !(50.0..=110.0).contains(&cfg.boil_temperature_c) {
        return Err(StoreError::ValidationFailed(
            "boil_temperature_c must be 50.0–110.0",
        ));
    }
    if !(0.0..=100.0).contains(&cfg.boil_power_percent) {
        return Err(StoreError::ValidationFailed(
            "boil_power_percent must be 0–100",
        ));
    }
    if !(0.0..=100.0).contains(&cfg.ramp_power_percent) {
        return Err(StoreError::ValidationFailed(
            "ramp_power_percent must be 0–100",
        ));
    }
    if !(cfg.kp.is_finite() && cfg.ki.is_finite() && cfg.kd.is_finite()) {
        return Err(StoreError::ValidationFailed("PID tunings must be finite"));
    }
    if cfg.kp < 0.0 || cfg.ki < 0.0 || cfg.kd < 0.0 {
        return Err(StoreError::ValidationFailed(
            "PID tunings must be non-negative",
        ));
    }
    if !(1..=60).contains(&cfg.sample_time_secs) {
        return Err(StoreError::ValidationFailed(
            "sample_time_secs must be 1–60",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Stage profiles
// ---------------------------------------------------------------------------

/// One mash rest: hold `target_temperature_c` for `duration_mins`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MashStep {
    pub target_temperature_c: f32,
    pub duration_mins: u32,
}

/// Ordered mash rest schedule the mash sequencer walks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MashProfile {
    pub steps: heapless::Vec<MashStep, MAX_MASH_STEPS>,
}

/// A named boil addition fired `offset_from_end_mins` before the boil ends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoilAddition {
    /// Recipe name for the addition; surfaces as the boil step key.
    pub key: StepKey,
    /// Minutes before the end of the boil at which this addition is due.
    pub offset_from_end_mins: u32,
}

/// Boil addition schedule the boil sequencer walks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BoilProfile {
    pub additions: heapless::Vec<BoilAddition, MAX_BOIL_ADDITIONS>,
}

impl MashProfile {
    /// A single-infusion fallback used when no profile has been stored.
    pub fn single_infusion() -> Self {
        let mut steps = heapless::Vec::new();
        // Capacity is MAX_MASH_STEPS (>0); the push cannot fail.
        let _ = steps.push(MashStep {
            target_temperature_c: 66.0,
            duration_mins: 60,
        });
        Self { steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = BrewConfig::default();
        assert!(validate_config(&c).is_ok());
        assert_eq!(c.boil_time_secs(), 3600);
        assert_eq!(c.sample_time_ms(), 5000);
        assert!(c.boil_power_percent <= 100.0);
        assert!(c.ramp_power_percent <= 100.0);
    }

    #[test]
    fn rejects_zero_boil_time() {
        let c = BrewConfig {
            boil_time_mins: 0,
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&c),
            Err(StoreError::ValidationFailed(_))
        ));
    }

    #[test]
    fn rejects_power_over_100() {
        let c = BrewConfig {
            boil_power_percent: 101.0,
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&c),
            Err(StoreError::ValidationFailed(_))
        ));
    }

    #[test]
    fn rejects_nan_tunings() {
        let c = BrewConfig {
            ki: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&c),
            Err(StoreError::ValidationFailed(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_sample_time() {
        let c = BrewConfig {
            sample_time_secs: 0,
            ..Default::default()
        };
        assert!(validate_config(&c).is_err());
        let c = BrewConfig {
            sample_time_secs: 120,
            ..Default::default()
        };
        assert!(validate_config(&c).is_err());
    }

    #[test]
    fn postcard_roundtrip() {
        let c = BrewConfig::default();
        let bytes = postcard::to_allocvec(&c).unwrap();
        let c2: BrewConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(c.boil_time_mins, c2.boil_time_mins);
        assert!((c.kp - c2.kp).abs() < 1e-6);
    }

    #[test]
    fn profiles_roundtrip() {
        let mash = MashProfile::single_infusion();
        let bytes = postcard::to_allocvec(&mash).unwrap();
        let back: MashProfile = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(back.steps.len(), 1);
        assert_eq!(back.steps[0], mash.steps[0]);
    }
}
