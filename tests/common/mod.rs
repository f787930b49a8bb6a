//! Shared mock ports for the host-side integration suites.

use std::cell::Cell;

use brewkettle::app::events::AppEvent;
use brewkettle::app::ports::{
    Clock, ConfigStore, EventSink, HeaterPort, PumpPort, SessionStore, TemperatureProbe,
};
use brewkettle::app::session::BrewSession;
use brewkettle::config::{BoilProfile, BrewConfig, MashProfile, MashStep};
use brewkettle::error::{ActuatorError, SensorError, StoreError};

// ── Persistence ───────────────────────────────────────────────

pub struct MemStore {
    pub session: Option<BrewSession>,
    pub config: BrewConfig,
    pub mash_profile: MashProfile,
    pub boil_profile: BoilProfile,
    pub fail_saves: bool,
    pub saves: usize,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            session: None,
            config: BrewConfig::default(),
            mash_profile: MashProfile::default(),
            boil_profile: BoilProfile::default(),
            fail_saves: false,
            saves: 0,
        }
    }

    pub fn with_mash_steps(steps: &[(f32, u32)]) -> Self {
        let mut profile = MashProfile::default();
        for &(target_temperature_c, duration_mins) in steps {
            profile
                .steps
                .push(MashStep {
                    target_temperature_c,
                    duration_mins,
                })
                .unwrap();
        }
        Self {
            mash_profile: profile,
            ..Self::new()
        }
    }
}

impl SessionStore for MemStore {
    fn load_session(&self) -> Result<Option<BrewSession>, StoreError> {
        Ok(self.session.clone())
    }

    fn save_session(&mut self, session: &BrewSession) -> Result<(), StoreError> {
        if self.fail_saves {
            return Err(StoreError::IoError);
        }
        self.saves += 1;
        self.session = Some(session.clone());
        Ok(())
    }
}

impl ConfigStore for MemStore {
    fn load_config(&self) -> Result<BrewConfig, StoreError> {
        Ok(self.config.clone())
    }

    fn save_config(&mut self, config: &BrewConfig) -> Result<(), StoreError> {
        self.config = config.clone();
        Ok(())
    }

    fn load_mash_profile(&self) -> Result<MashProfile, StoreError> {
        Ok(self.mash_profile.clone())
    }

    fn load_boil_profile(&self) -> Result<BoilProfile, StoreError> {
        Ok(self.boil_profile.clone())
    }
}

// ── Hardware ──────────────────────────────────────────────────

pub struct MockHw {
    pub temp: Result<f32, SensorError>,
    pub duties: Vec<f32>,
    pub heater_offs: usize,
    pub pump_on: bool,
    pub pump_calls: Vec<bool>,
}

impl MockHw {
    pub fn new() -> Self {
        Self {
            temp: Ok(20.0),
            duties: Vec::new(),
            heater_offs: 0,
            pump_on: false,
            pump_calls: Vec::new(),
        }
    }

    pub fn last_duty(&self) -> Option<f32> {
        self.duties.last().copied()
    }
}

impl TemperatureProbe for MockHw {
    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        self.temp
    }
}

impl HeaterPort for MockHw {
    fn set_heater_duty(&mut self, duty: f32) -> Result<(), ActuatorError> {
        self.duties.push(duty);
        Ok(())
    }

    fn heater_off(&mut self) -> Result<(), ActuatorError> {
        self.heater_offs += 1;
        self.duties.push(0.0);
        Ok(())
    }
}

impl PumpPort for MockHw {
    fn set_pump(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.pump_on = on;
        self.pump_calls.push(on);
        Ok(())
    }
}

// ── Clock ─────────────────────────────────────────────────────

/// Settable wall clock; `None` simulates a never-synced SNTP.
pub struct ManualClock(pub Cell<Option<u64>>);

impl ManualClock {
    pub fn unsynced() -> Self {
        Self(Cell::new(None))
    }

    pub fn at(secs: u64) -> Self {
        Self(Cell::new(Some(secs)))
    }

    pub fn set(&self, secs: u64) {
        self.0.set(Some(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Option<u64> {
        self.0.get()
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
