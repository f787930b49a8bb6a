//! Brew session controller — the hexagonal core.
//!
//! [`BrewSessionController`] owns the persisted [`BrewSession`], the heater
//! PID collaborator and both stage sequencers. It exposes the command
//! operations (start, resume, stop, advance, start-boil, adjust-power,
//! status) and the periodic control tick. All I/O flows through port traits
//! injected at call sites, making the entire core testable with mock
//! adapters.
//!
//! ```text
//!  TemperatureProbe ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!  Clock            ──▶ │  BrewSessionController   │ ──▶ SessionStore
//!  HeaterPort       ◀── │  session · PID · mash    │
//!  PumpPort         ◀── │  sequencer · boil seq.   │
//!                       └──────────────────────────┘
//! ```
//!
//! Concurrency contract: exactly one caller drives this struct (the event
//! loop). Commands and ticks are therefore serialized by construction; a
//! StopBrew queued mid-pause takes effect before the next tick because the
//! pacing delay lives in the control timer, not here. Every operation
//! mutates a working copy, persists it, and only then installs it as the
//! live session — a failed save neither reports success nor leaves a
//! half-applied record in memory.

use log::{info, warn};

use crate::config::BrewConfig;
use crate::control::heater::HeaterController;
use crate::error::{BrewError, Result};
use crate::sequence::{BoilSequencer, MashSequencer};

use super::commands::BrewCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{
    Clock, ConfigStore, EventSink, HeaterPort, PumpPort, SessionStore, StageSequencer,
    TemperatureProbe,
};
use super::session::{BrewSession, SessionSnapshot, Stage};

// ───────────────────────────────────────────────────────────────
// BrewSessionController
// ───────────────────────────────────────────────────────────────

/// The session controller orchestrates the whole brew lifecycle.
pub struct BrewSessionController<M = MashSequencer, B = BoilSequencer>
where
    M: StageSequencer,
    B: StageSequencer,
{
    session: BrewSession,
    heater: HeaterController,
    mash: M,
    boil: B,
    pump_on: bool,
}

impl BrewSessionController {
    /// Construct with the default mash/boil sequencers. The heater starts
    /// disabled; [`begin`](Self::begin) must run before the first tick.
    pub fn new(config: &BrewConfig) -> Self {
        Self::with_sequencers(config, MashSequencer::new(), BoilSequencer::new())
    }
}

impl<M, B> BrewSessionController<M, B>
where
    M: StageSequencer,
    B: StageSequencer,
{
    pub fn with_sequencers(config: &BrewConfig, mash: M, boil: B) -> Self {
        Self {
            session: BrewSession::default(),
            heater: HeaterController::new(config.kp, config.ki, config.kd, config.sample_time_ms()),
            mash,
            boil,
            pump_on: false,
        }
    }

    // ── Initialization ────────────────────────────────────────

    /// Boot-time initialization: reload both sequencers, restore the
    /// persisted session, force it out of the running state and persist,
    /// then disable the heater. A brew is never auto-resumed — the heater
    /// cannot be energized unattended after a restart; the operator must
    /// issue an explicit Resume.
    pub fn begin(
        &mut self,
        store: &mut (impl SessionStore + ConfigStore),
        hw: &mut impl HeaterPort,
    ) -> Result<()> {
        self.mash.reload(store);
        self.boil.reload(store);

        self.session = match store.load_session() {
            Ok(Some(s)) => {
                info!("session restored (stage {:?})", s.active_stage);
                s
            }
            Ok(None) => {
                info!("no stored session, starting clean");
                BrewSession::default()
            }
            Err(e) => {
                warn!("session load failed ({}), starting clean", e);
                BrewSession::default()
            }
        };
        self.session.brew_started = false;
        let persisted = store.save_session(&self.session);

        self.heater.disable(hw)?;
        persisted?;
        Ok(())
    }

    // ── Command handling ──────────────────────────────────────

    /// Process one external command. Returns the full session snapshot on
    /// success; on failure the session is untouched.
    pub fn handle_command(
        &mut self,
        cmd: BrewCommand,
        store: &mut (impl SessionStore + ConfigStore),
        hw: &mut (impl HeaterPort + PumpPort),
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) -> Result<SessionSnapshot> {
        match cmd {
            BrewCommand::StartBrew => self.start_brew(store, clock, sink),
            BrewCommand::ResumeBrew => self.resume_brew(store, hw, clock, sink),
            BrewCommand::StopBrew => self.stop_brew(store, hw, sink),
            BrewCommand::AdvanceStage => self.advance_stage(store, clock, sink),
            BrewCommand::StartBoil => self.start_boil(store, clock, sink),
            BrewCommand::AdjustBoilPower(pct) => self.adjust_boil_power(pct, store),
            BrewCommand::GetStatus => Ok(self.session.snapshot()),
        }
    }

    fn start_brew(
        &mut self,
        store: &mut (impl SessionStore + ConfigStore),
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) -> Result<SessionSnapshot> {
        let now = clock.now().ok_or(BrewError::ClockNotSynchronized)?;
        let cfg = self.load_config_or_default(store);

        let mut next = self.session.clone();
        next.time_now = now;
        next.active_stage = Stage::Mash;
        next.brew_started = true;
        next.mash_step = Some(0);
        next.boil_step = None;
        next.start_time = None;
        next.end_time = None;
        next.boil_time_secs = cfg.boil_time_secs();
        next.boil_target_temperature = Some(cfg.boil_temperature_c);
        next.boil_power_percent = cfg.boil_power_percent;
        next.ramp_power_percent = cfg.ramp_power_percent;

        store.save_session(&next)?;
        self.session = next;

        self.apply_heater_config(&cfg);
        self.mash.reload(store);
        self.boil.reload(store);

        info!("brew started (mash step 0)");
        sink.emit(&AppEvent::StageStarted(Stage::Mash));
        Ok(self.session.snapshot())
    }

    fn resume_brew(
        &mut self,
        store: &mut (impl SessionStore + ConfigStore),
        hw: &mut (impl HeaterPort + PumpPort),
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) -> Result<SessionSnapshot> {
        let now = clock.now().ok_or(BrewError::ClockNotSynchronized)?;
        let cfg = self.load_config_or_default(store);

        let mut next = self.session.clone();
        if let (Some(start), Some(end)) = (next.start_time, next.end_time) {
            // Preserve the remaining time-to-deadline across the restart,
            // not the absolute deadline: whatever was left of the step when
            // the controller last ran is still left now.
            let time_total = end.saturating_sub(start);
            let time_spent = next.time_now.saturating_sub(start);
            let time_left = time_total.saturating_sub(time_spent);
            next.end_time = Some(now + time_left);
        }
        next.boil_power_percent = cfg.boil_power_percent;
        next.ramp_power_percent = cfg.ramp_power_percent;
        next.brew_started = true;
        next.time_now = now;

        store.save_session(&next)?;
        self.session = next;

        self.apply_heater_config(&cfg);
        self.mash.reload(store);
        self.boil.reload(store);

        // Resumed sessions restore the pump to its recorded state.
        if let Err(e) = hw.set_pump(self.session.recirculation) {
            warn!("resume: pump restore failed ({})", e);
        }
        self.pump_on = self.session.recirculation;

        info!("brew resumed (end_time {:?})", self.session.end_time);
        sink.emit(&AppEvent::BrewResumed {
            end_time: self.session.end_time,
        });
        Ok(self.session.snapshot())
    }

    /// Stop is unconditional and idempotent: no clock requirement, safe to
    /// call at any time, including mid-tick or twice in a row. Actuators
    /// are released before anything else so a failed save can never leave
    /// the heater energized.
    fn stop_brew(
        &mut self,
        store: &mut impl SessionStore,
        hw: &mut (impl HeaterPort + PumpPort),
        sink: &mut impl EventSink,
    ) -> Result<SessionSnapshot> {
        self.heater.disable(hw)?;
        if let Err(e) = hw.set_pump(false) {
            warn!("stop: pump off failed ({})", e);
        }
        self.pump_on = false;

        let mut next = self.session.clone();
        next.clear();
        store.save_session(&next)?;
        self.session = next;

        info!("brew stopped");
        sink.emit(&AppEvent::BrewStopped);
        Ok(self.session.snapshot())
    }

    /// Mark the current step's deadline as reached. The sequencers compute
    /// the actual next step on the following tick.
    fn advance_stage(
        &mut self,
        store: &mut impl SessionStore,
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) -> Result<SessionSnapshot> {
        let now = clock.now().ok_or(BrewError::ClockNotSynchronized)?;

        let mut next = self.session.clone();
        next.end_time = Some(now);
        if next.start_time.is_some_and(|start| start > now) {
            next.start_time = Some(now);
        }

        store.save_session(&next)?;
        self.session = next;

        info!("step deadline forced");
        sink.emit(&AppEvent::StepAdvanced);
        Ok(self.session.snapshot())
    }

    fn start_boil(
        &mut self,
        store: &mut (impl SessionStore + ConfigStore),
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) -> Result<SessionSnapshot> {
        let now = clock.now().ok_or(BrewError::ClockNotSynchronized)?;
        let cfg = self.load_config_or_default(store);

        let mut next = self.session.clone();
        next.time_now = now;
        next.active_stage = Stage::Boil;
        next.brew_started = true;
        next.boil_step = None;
        next.start_time = None;
        next.end_time = None;
        next.boil_time_secs = cfg.boil_time_secs();
        next.boil_target_temperature = Some(cfg.boil_temperature_c);
        next.boil_power_percent = cfg.boil_power_percent;
        next.target_temperature = Some(cfg.boil_temperature_c);

        store.save_session(&next)?;
        self.session = next;

        self.apply_heater_config(&cfg);
        self.boil.reload(store);

        info!("boil started ({} s)", self.session.boil_time_secs);
        sink.emit(&AppEvent::StageStarted(Stage::Boil));
        Ok(self.session.snapshot())
    }

    fn adjust_boil_power(
        &mut self,
        pct: f32,
        store: &mut impl SessionStore,
    ) -> Result<SessionSnapshot> {
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            return Err(BrewError::InvalidRequest);
        }

        let mut next = self.session.clone();
        next.boil_power_percent = pct;
        store.save_session(&next)?;
        self.session = next;

        info!("boil power set to {:.0}%", pct);
        Ok(self.session.snapshot())
    }

    // ── Periodic tick ─────────────────────────────────────────

    /// One control cycle: probe → mash patch → boil patch → PID → clock →
    /// persist. Runs when the session is active OR once the wall clock is
    /// synchronized (so the sequencers can self-initialize before a start);
    /// otherwise a no-op. Collaborator failures are logged and skipped —
    /// the loop never terminates.
    pub fn tick(
        &mut self,
        hw: &mut (impl TemperatureProbe + HeaterPort),
        store: &mut impl SessionStore,
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) {
        let now = clock.now();
        if !self.session.brew_started && now.is_none() {
            return;
        }

        match hw.read_celsius() {
            Ok(celsius) => self.session.current_temperature = celsius,
            Err(e) => {
                // No trustworthy reading: skip sequencing and actuation for
                // this iteration and retry next period.
                warn!("tick: probe read failed ({}), skipping actuation", e);
                if let Some(n) = now {
                    self.session.time_now = n;
                }
                self.persist_tick(store);
                return;
            }
        }

        if let Some(patch) = self.mash.advance(&self.session, now) {
            if patch.stage_complete {
                sink.emit(&AppEvent::StageComplete(Stage::Mash));
            }
            self.session.apply(patch);
        }
        if let Some(patch) = self.boil.advance(&self.session, now) {
            if patch.stage_complete {
                sink.emit(&AppEvent::StageComplete(Stage::Boil));
            }
            self.session.apply(patch);
        }

        if let Err(e) = self.heater.compute(&self.session, hw) {
            warn!("tick: heater compute failed ({})", e);
        }

        if let Some(n) = now {
            self.session.time_now = n;
        }
        self.persist_tick(store);
    }

    fn persist_tick(&self, store: &mut impl SessionStore) {
        // A failed tick save is retried next period; command operations
        // still fail loudly on persistence errors.
        if let Err(e) = store.save_session(&self.session) {
            warn!("tick: session save failed ({})", e);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Read-only view of the live session.
    pub fn session(&self) -> &BrewSession {
        &self.session
    }

    /// Whole-field snapshot (what GetStatus returns).
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Current control-loop pace, for (re-)arming the tick timer.
    pub fn sample_period_ms(&self) -> u32 {
        self.heater.sample_period_ms()
    }

    pub fn heater_enabled(&self) -> bool {
        self.heater.is_enabled()
    }

    /// Telemetry record for the event sink.
    pub fn build_telemetry(&self) -> TelemetryData {
        TelemetryData {
            stage: self.session.active_stage,
            brew_started: self.session.brew_started,
            current_temperature: self.session.current_temperature,
            target_temperature: self.session.target_temperature,
            heater_duty: self.heater.last_duty(),
            pump_on: self.pump_on,
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn apply_heater_config(&mut self, cfg: &BrewConfig) {
        self.heater.set_tunings(cfg.kp, cfg.ki, cfg.kd);
        self.heater.set_sample_period_ms(cfg.sample_time_ms());
        self.heater.enable();
    }

    fn load_config_or_default(&self, store: &impl ConfigStore) -> BrewConfig {
        match store.load_config() {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("config load failed ({}), using defaults", e);
                BrewConfig::default()
            }
        }
    }
}
