//! End-to-end controller scenarios against mock ports.
//!
//! Exercises the full command + tick surface the way the firmware drives
//! it: boot, start, sequencer-driven progression, resume-after-restart,
//! stop, and the JSON command layer.

mod common;

use common::{ManualClock, MemStore, MockHw, RecordingSink};

use brewkettle::api;
use brewkettle::app::commands::BrewCommand;
use brewkettle::app::events::AppEvent;
use brewkettle::app::service::BrewSessionController;
use brewkettle::app::session::{BrewSession, Stage};
use brewkettle::config::BrewConfig;
use brewkettle::error::{BrewError, SensorError, StoreError};

fn booted(store: &mut MemStore) -> (BrewSessionController, MockHw) {
    let mut ctl = BrewSessionController::new(&BrewConfig::default());
    let mut hw = MockHw::new();
    ctl.begin(store, &mut hw).unwrap();
    (ctl, hw)
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_never_auto_resumes_an_interrupted_brew() {
    let mut store = MemStore::new();
    store.session = Some(BrewSession {
        brew_started: true,
        active_stage: Stage::Boil,
        boil_target_temperature: Some(100.0),
        target_temperature: Some(100.0),
        start_time: Some(1000),
        end_time: Some(4600),
        time_now: 2000,
        ..Default::default()
    });

    let (ctl, hw) = booted(&mut store);

    // Session restored but parked; heater released before the first tick.
    assert!(!ctl.session().brew_started);
    assert_eq!(ctl.session().active_stage, Stage::Boil);
    assert_eq!(ctl.session().end_time, Some(4600));
    assert!(!store.session.as_ref().unwrap().brew_started);
    assert_eq!(hw.heater_offs, 1);
    assert!(!ctl.heater_enabled());
}

#[test]
fn boot_with_corrupted_session_starts_clean() {
    struct CorruptStore(MemStore);
    impl brewkettle::app::ports::SessionStore for CorruptStore {
        fn load_session(&self) -> Result<Option<BrewSession>, StoreError> {
            Err(StoreError::Corrupted)
        }
        fn save_session(&mut self, s: &BrewSession) -> Result<(), StoreError> {
            self.0.save_session(s)
        }
    }
    impl brewkettle::app::ports::ConfigStore for CorruptStore {
        fn load_config(&self) -> Result<BrewConfig, StoreError> {
            self.0.load_config()
        }
        fn save_config(&mut self, c: &BrewConfig) -> Result<(), StoreError> {
            self.0.save_config(c)
        }
        fn load_mash_profile(&self) -> Result<brewkettle::config::MashProfile, StoreError> {
            self.0.load_mash_profile()
        }
        fn load_boil_profile(&self) -> Result<brewkettle::config::BoilProfile, StoreError> {
            self.0.load_boil_profile()
        }
    }

    let mut store = CorruptStore(MemStore::new());
    let mut ctl = BrewSessionController::new(&BrewConfig::default());
    let mut hw = MockHw::new();
    ctl.begin(&mut store, &mut hw).unwrap();

    assert_eq!(*ctl.session(), BrewSession::default());
    assert!(store.0.session.is_some(), "clean record persisted");
}

// ── Clock gating ──────────────────────────────────────────────

#[test]
fn clock_gated_commands_leave_session_untouched() {
    let mut store = MemStore::new();
    let (mut ctl, mut hw) = booted(&mut store);
    let clock = ManualClock::unsynced();
    let mut sink = RecordingSink::new();

    let before = ctl.session().clone();
    let saves_before = store.saves;

    for cmd in [
        BrewCommand::StartBrew,
        BrewCommand::ResumeBrew,
        BrewCommand::AdvanceStage,
        BrewCommand::StartBoil,
    ] {
        let err = ctl
            .handle_command(cmd.clone(), &mut store, &mut hw, &clock, &mut sink)
            .unwrap_err();
        assert_eq!(err, BrewError::ClockNotSynchronized, "cmd {cmd:?}");
        assert_eq!(*ctl.session(), before, "cmd {cmd:?} mutated the session");
    }
    assert_eq!(store.saves, saves_before, "nothing was persisted");
    assert!(sink.events.is_empty());
}

#[test]
fn stop_and_status_work_without_a_clock() {
    let mut store = MemStore::new();
    let (mut ctl, mut hw) = booted(&mut store);
    let clock = ManualClock::unsynced();
    let mut sink = RecordingSink::new();

    let status = ctl
        .handle_command(BrewCommand::GetStatus, &mut store, &mut hw, &clock, &mut sink)
        .unwrap();
    assert!(!status.brew_started);

    let stopped = ctl
        .handle_command(BrewCommand::StopBrew, &mut store, &mut hw, &clock, &mut sink)
        .unwrap();
    assert_eq!(stopped.active_step, 0);
}

// ── Mash progression ──────────────────────────────────────────

#[test]
fn mash_rest_arms_and_advances_through_the_profile() {
    let mut store = MemStore::with_mash_steps(&[(52.0, 15), (66.0, 60)]);
    let (mut ctl, mut hw) = booted(&mut store);
    let clock = ManualClock::at(10_000);
    let mut sink = RecordingSink::new();

    ctl.handle_command(BrewCommand::StartBrew, &mut store, &mut hw, &clock, &mut sink)
        .unwrap();

    // Ramping: below the first rest target, heater drives, no window.
    hw.temp = Ok(40.0);
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);
    assert_eq!(ctl.session().target_temperature, Some(52.0));
    assert!(ctl.session().end_time.is_none());
    assert!(hw.last_duty().unwrap() > 0.0);

    // At temperature: the 15 min rest window arms.
    hw.temp = Ok(52.2);
    clock.set(10_010);
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);
    assert_eq!(ctl.session().start_time, Some(10_010));
    assert_eq!(ctl.session().end_time, Some(10_010 + 15 * 60));

    // Deadline passes: move to the second rest, window cleared.
    clock.set(10_010 + 15 * 60);
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);
    assert_eq!(ctl.session().mash_step, Some(1));
    assert_eq!(ctl.session().target_temperature, Some(66.0));
    assert!(ctl.session().end_time.is_none());

    // Second rest runs out: stage complete is reported, session stays in
    // mash until the operator moves on.
    hw.temp = Ok(66.3);
    clock.set(20_000);
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);
    clock.set(20_000 + 60 * 60);
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);
    assert!(sink
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::StageComplete(Stage::Mash))));
    assert_eq!(ctl.session().active_stage, Stage::Mash);
}

#[test]
fn advance_stage_forces_the_rest_to_finish_early() {
    let mut store = MemStore::with_mash_steps(&[(52.0, 15), (66.0, 60)]);
    let (mut ctl, mut hw) = booted(&mut store);
    let clock = ManualClock::at(10_000);
    let mut sink = RecordingSink::new();

    ctl.handle_command(BrewCommand::StartBrew, &mut store, &mut hw, &clock, &mut sink)
        .unwrap();
    hw.temp = Ok(52.5);
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);
    assert_eq!(ctl.session().end_time, Some(10_000 + 15 * 60));

    // Operator skips the rest of the rest.
    clock.set(10_100);
    ctl.handle_command(BrewCommand::AdvanceStage, &mut store, &mut hw, &clock, &mut sink)
        .unwrap();
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);
    assert_eq!(ctl.session().mash_step, Some(1));
}

// ── Boil ──────────────────────────────────────────────────────

#[test]
fn boil_window_runs_to_completion() {
    let mut store = MemStore::new();
    let (mut ctl, mut hw) = booted(&mut store);
    let clock = ManualClock::at(50_000);
    let mut sink = RecordingSink::new();

    let snap = ctl
        .handle_command(BrewCommand::StartBoil, &mut store, &mut hw, &clock, &mut sink)
        .unwrap();
    assert_eq!(snap.active_step, Stage::Boil.wire_code());
    assert_eq!(snap.boil_time, 3600);

    // Ramp to the boil; window arms at temperature.
    hw.temp = Ok(100.1);
    clock.set(50_300);
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);
    assert_eq!(ctl.session().start_time, Some(50_300));
    assert_eq!(ctl.session().end_time, Some(50_300 + 3600));

    // Boil duty respects the configured power cap.
    assert!(hw.last_duty().unwrap() <= BrewConfig::default().boil_power_percent + 1e-3);

    // Window elapses: stage complete, window and step key cleared.
    clock.set(50_300 + 3600);
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);
    assert!(sink
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::StageComplete(Stage::Boil))));
    assert!(ctl.session().end_time.is_none());
    assert!(ctl.session().boil_step.is_none());
}

#[test]
fn adjust_boil_power_takes_effect_on_the_next_tick() {
    let mut store = MemStore::new();
    let (mut ctl, mut hw) = booted(&mut store);
    let clock = ManualClock::at(50_000);
    let mut sink = RecordingSink::new();

    ctl.handle_command(BrewCommand::StartBoil, &mut store, &mut hw, &clock, &mut sink)
        .unwrap();
    hw.temp = Ok(98.0);
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);

    ctl.handle_command(
        BrewCommand::AdjustBoilPower(25.0),
        &mut store,
        &mut hw,
        &clock,
        &mut sink,
    )
    .unwrap();
    clock.set(50_010);
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);
    assert!(hw.last_duty().unwrap() <= 25.0 + 1e-3);
}

// ── Resume ────────────────────────────────────────────────────

#[test]
fn restart_mid_rest_preserves_remaining_time() {
    // First life: a rest window is armed, then the device dies at 250.
    let mut store = MemStore::with_mash_steps(&[(66.0, 5)]);
    {
        let (mut ctl, mut hw) = booted(&mut store);
        let clock = ManualClock::at(100);
        let mut sink = RecordingSink::new();
        ctl.handle_command(BrewCommand::StartBrew, &mut store, &mut hw, &clock, &mut sink)
            .unwrap();
        hw.temp = Ok(66.1);
        ctl.tick(&mut hw, &mut store, &clock, &mut sink);
        assert_eq!(ctl.session().end_time, Some(400));
        clock.set(250);
        ctl.tick(&mut hw, &mut store, &clock, &mut sink);
        assert_eq!(store.session.as_ref().unwrap().time_now, 250);
    }

    // Second life: boot parks the session, resume re-arms with 150 s left.
    let (mut ctl, mut hw) = booted(&mut store);
    assert!(!ctl.session().brew_started);

    let clock = ManualClock::at(1000);
    let mut sink = RecordingSink::new();
    let snap = ctl
        .handle_command(BrewCommand::ResumeBrew, &mut store, &mut hw, &clock, &mut sink)
        .unwrap();
    assert_eq!(snap.end_time, 1150);
    assert!(snap.brew_started);
    assert!(ctl.heater_enabled());
}

// ── Stop ──────────────────────────────────────────────────────

#[test]
fn stop_releases_everything_and_is_idempotent() {
    let mut store = MemStore::new();
    let (mut ctl, mut hw) = booted(&mut store);
    let clock = ManualClock::at(50_000);
    let mut sink = RecordingSink::new();

    ctl.handle_command(BrewCommand::StartBoil, &mut store, &mut hw, &clock, &mut sink)
        .unwrap();
    hw.temp = Ok(99.0);
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);
    assert!(hw.last_duty().unwrap() > 0.0);

    let first = ctl
        .handle_command(BrewCommand::StopBrew, &mut store, &mut hw, &clock, &mut sink)
        .unwrap();
    let second = ctl
        .handle_command(BrewCommand::StopBrew, &mut store, &mut hw, &clock, &mut sink)
        .unwrap();

    assert_eq!(first, second);
    assert!(!first.brew_started);
    assert_eq!(first.active_step, 0);
    assert_eq!(first.active_mash_step_index, -1);
    assert_eq!(first.active_boil_step_index.as_str(), "");
    assert!((first.boil_target_temperature - -1.0).abs() < 1e-6);
    assert!(!ctl.heater_enabled());
    assert_eq!(hw.last_duty(), Some(0.0));
    assert!(!hw.pump_on);
    // The stopped shape is persisted.
    assert!(!store.session.as_ref().unwrap().brew_started);

    // Ticks after stop keep the heater off even with an unsynced clock.
    let unsynced = ManualClock::unsynced();
    let saves = store.saves;
    ctl.tick(&mut hw, &mut store, &unsynced, &mut sink);
    assert_eq!(store.saves, saves, "stopped + unsynced tick is a no-op");
}

// ── Tick robustness ───────────────────────────────────────────

#[test]
fn probe_fault_pauses_actuation_without_killing_the_loop() {
    let mut store = MemStore::with_mash_steps(&[(66.0, 60)]);
    let (mut ctl, mut hw) = booted(&mut store);
    let clock = ManualClock::at(10_000);
    let mut sink = RecordingSink::new();

    ctl.handle_command(BrewCommand::StartBrew, &mut store, &mut hw, &clock, &mut sink)
        .unwrap();
    hw.temp = Ok(60.0);
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);
    let temp_before = ctl.session().current_temperature;
    let duties_before = hw.duties.len();

    hw.temp = Err(SensorError::Disconnected);
    clock.set(10_005);
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);
    // No actuation, no stale-temperature sequencing; time still recorded.
    assert_eq!(hw.duties.len(), duties_before);
    assert_eq!(ctl.session().current_temperature, temp_before);
    assert_eq!(ctl.session().time_now, 10_005);

    // Probe recovers next period.
    hw.temp = Ok(61.0);
    clock.set(10_010);
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);
    assert!(hw.duties.len() > duties_before);
}

#[test]
fn failed_tick_save_is_retried_next_period() {
    let mut store = MemStore::with_mash_steps(&[(66.0, 60)]);
    let (mut ctl, mut hw) = booted(&mut store);
    let clock = ManualClock::at(10_000);
    let mut sink = RecordingSink::new();

    ctl.handle_command(BrewCommand::StartBrew, &mut store, &mut hw, &clock, &mut sink)
        .unwrap();

    store.fail_saves = true;
    hw.temp = Ok(50.0);
    clock.set(10_005);
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);
    // The tick survives; in-memory state advanced even though the save failed.
    assert_eq!(ctl.session().time_now, 10_005);

    store.fail_saves = false;
    clock.set(10_010);
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);
    assert_eq!(store.session.as_ref().unwrap().time_now, 10_010);
}

// ── JSON command surface ──────────────────────────────────────

#[test]
fn api_round_trip_start_status_stop() {
    let mut store = MemStore::new();
    let (mut ctl, mut hw) = booted(&mut store);
    let clock = ManualClock::at(10_000);
    let mut sink = RecordingSink::new();

    let resp = api::handle_request(api::EP_START, "", &mut ctl, &mut store, &mut hw, &clock, &mut sink);
    assert_eq!(resp.status, 200);
    assert!(resp.body.contains("\"brew_started\":true"));
    assert!(resp.body.contains("\"active_step\":1"));
    assert!(resp.body.contains("\"active_mash_step_index\":0"));

    let resp = api::handle_request(api::EP_STATUS, "", &mut ctl, &mut store, &mut hw, &clock, &mut sink);
    assert_eq!(resp.status, 200);
    assert!(resp.body.contains("\"boil_time\":3600"));

    let resp = api::handle_request(api::EP_STOP, "", &mut ctl, &mut store, &mut hw, &clock, &mut sink);
    assert_eq!(resp.status, 200);
    assert!(resp.body.contains("\"brew_started\":false"));
    assert!(resp.body.contains("\"active_step\":0"));
}

#[test]
fn api_clock_gate_reports_fixed_payload() {
    let mut store = MemStore::new();
    let (mut ctl, mut hw) = booted(&mut store);
    let clock = ManualClock::unsynced();
    let mut sink = RecordingSink::new();

    let before = ctl.session().clone();
    let resp = api::handle_request(api::EP_START, "", &mut ctl, &mut store, &mut hw, &clock, &mut sink);
    assert_eq!(resp.status, 500);
    assert_eq!(resp.body, r#"{"error":"clock_not_synchronized"}"#);
    assert_eq!(*ctl.session(), before);
}

#[test]
fn api_rejects_malformed_boil_power_without_mutation() {
    let mut store = MemStore::new();
    let (mut ctl, mut hw) = booted(&mut store);
    let clock = ManualClock::at(10_000);
    let mut sink = RecordingSink::new();

    ctl.handle_command(BrewCommand::StartBoil, &mut store, &mut hw, &clock, &mut sink)
        .unwrap();
    let before = ctl.session().clone();

    for body in ["", "{}", r#"{"boil_power_percentage":"max"}"#] {
        let resp = api::handle_request(
            api::EP_BOIL_POWER,
            body,
            &mut ctl,
            &mut store,
            &mut hw,
            &clock,
            &mut sink,
        );
        assert_eq!(resp.status, 500, "body {body:?}");
        assert_eq!(resp.body, r#"{"error":"invalid_request"}"#);
        assert_eq!(*ctl.session(), before);
    }

    let resp = api::handle_request(
        api::EP_BOIL_POWER,
        r#"{"boil_power_percentage": 55}"#,
        &mut ctl,
        &mut store,
        &mut hw,
        &clock,
        &mut sink,
    );
    assert_eq!(resp.status, 200);
    assert!(resp.body.contains("\"boil_power_percentage\":55.0"));
}

#[test]
fn api_unknown_endpoint_is_404() {
    let mut store = MemStore::new();
    let (mut ctl, mut hw) = booted(&mut store);
    let clock = ManualClock::at(10_000);
    let mut sink = RecordingSink::new();

    let resp = api::handle_request("reboot", "", &mut ctl, &mut store, &mut hw, &clock, &mut sink);
    assert_eq!(resp.status, 404);
}

// ── End-to-end (boot → brew → stop) ───────────────────────────

#[test]
fn full_brew_day() {
    let mut store = MemStore::with_mash_steps(&[(66.0, 60)]);
    let (mut ctl, mut hw) = booted(&mut store);
    let clock = ManualClock::at(100_000);
    let mut sink = RecordingSink::new();

    // Start: mash step 0, boil parameters copied from config.
    let snap = ctl
        .handle_command(BrewCommand::StartBrew, &mut store, &mut hw, &clock, &mut sink)
        .unwrap();
    assert_eq!(snap.active_mash_step_index, 0);
    assert_eq!(snap.active_boil_step_index.as_str(), "");
    assert_eq!(snap.boil_time, 3600);
    assert!((snap.boil_target_temperature - 100.0).abs() < 1e-6);

    // Rest completes.
    hw.temp = Ok(66.2);
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);
    clock.set(100_000 + 3600);
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);

    // Operator moves to the boil.
    ctl.handle_command(BrewCommand::StartBoil, &mut store, &mut hw, &clock, &mut sink)
        .unwrap();
    hw.temp = Ok(100.2);
    clock.set(104_000);
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);
    assert_eq!(ctl.session().end_time, Some(104_000 + 3600));

    clock.set(104_000 + 3600);
    ctl.tick(&mut hw, &mut store, &clock, &mut sink);

    // Done: stop, everything released and persisted stopped.
    let snap = ctl
        .handle_command(BrewCommand::StopBrew, &mut store, &mut hw, &clock, &mut sink)
        .unwrap();
    assert_eq!(snap.active_step, 0);
    assert!(!ctl.heater_enabled());
    assert!(ctl.session().invariants_ok());
    assert!(!store.session.as_ref().unwrap().brew_started);
}
