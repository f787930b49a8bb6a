//! BrewKettle firmware — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                  │
//! │                                                          │
//! │  HardwareAdapter       NvsAdapter        SystemClock     │
//! │  (probe+SSR+pump)      (Session+Config)  (Clock)         │
//! │  LogEventSink          api (JSON command surface)        │
//! │                                                          │
//! │  ─────────────── Port Trait Boundary ─────────────────   │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │       BrewSessionController (pure logic)           │  │
//! │  │  session · PID heater · mash/boil sequencers       │  │
//! │  └────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Execution model: a single event loop owns the controller. The esp_timer
//! control timer pushes `ControlTick` into the lock-free queue at the
//! configured sample period; commands raise `CommandReceived`. Pacing lives
//! in the timer, so a stop issued mid-rest is handled before the next tick.

#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use brewkettle::adapters::{HardwareAdapter, LogEventSink, NvsAdapter, SystemClock};
use brewkettle::app::events::AppEvent;
use brewkettle::app::ports::{Clock, ConfigStore, EventSink};
use brewkettle::app::service::BrewSessionController;
use brewkettle::config::BrewConfig;
use brewkettle::drivers::heater::HeaterDriver;
use brewkettle::drivers::pump::PumpDriver;
use brewkettle::drivers::{hw_init, hw_timer};
use brewkettle::events::{self, Event};
use brewkettle::pins;
use brewkettle::sensors::TemperatureSensor;

/// Telemetry is emitted once per this many control ticks (one report per
/// minute at the default 5 s sample period).
const TELEMETRY_EVERY_TICKS: u32 = 12;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }

    info!("BrewKettle v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Peripheral init failure is critical: without the SSR channel we
        // cannot even guarantee the heater is releasable. Halt and let the
        // watchdog reset.
        log::error!("HAL init failed: {} — halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }

    // ── 3. Persistence + config ───────────────────────────────
    let mut nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            return Err(anyhow::anyhow!("NVS init failed: {}", e));
        }
    };
    let config = match nvs.load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("config load failed ({}), using defaults", e);
            BrewConfig::default()
        }
    };

    // ── 4. Adapters ───────────────────────────────────────────
    let mut hw = HardwareAdapter::new(
        TemperatureSensor::new(pins::KETTLE_TEMP_ADC_GPIO),
        HeaterDriver::new(),
        PumpDriver::new(),
    );
    let clock = SystemClock::new();
    let mut sink = LogEventSink::new();

    // ── 5. Session controller ─────────────────────────────────
    let mut ctl = BrewSessionController::new(&config);
    if let Err(e) = ctl.begin(&mut nvs, &mut hw) {
        // A failed boot persist is not fatal: the heater is already
        // disabled and the next successful save repairs the record.
        warn!("controller init: {}", e);
    }

    // ── 6. Control timer ──────────────────────────────────────
    let mut armed_period_ms = ctl.sample_period_ms();
    hw_timer::start_control_timer(armed_period_ms);

    info!("system ready, entering event loop");

    // ── 7. Event loop ─────────────────────────────────────────
    let mut tick_counter: u32 = 0;

    loop {
        // Yield to the idle task between drains so the task watchdog and
        // the IP stack keep running.
        #[cfg(target_os = "espidf")]
        unsafe {
            esp_idf_svc::sys::vTaskDelay(1);
        }
        #[cfg(not(target_os = "espidf"))]
        {
            std::thread::sleep(std::time::Duration::from_millis(10));
            events::push_event(Event::ControlTick);
        }

        events::drain_events(|event| match event {
            Event::ControlTick => {
                ctl.tick(&mut hw, &mut nvs, &clock, &mut sink);

                tick_counter += 1;
                if tick_counter >= TELEMETRY_EVERY_TICKS {
                    tick_counter = 0;
                    events::push_event(Event::TelemetryTick);
                }

                // A start/resume may have loaded a different sample period.
                let period = ctl.sample_period_ms();
                if period != armed_period_ms {
                    armed_period_ms = period;
                    hw_timer::rearm_control_timer(period);
                }
            }

            Event::TelemetryTick => {
                sink.emit(&AppEvent::Telemetry(ctl.build_telemetry()));
            }

            Event::ClockSynced => {
                info!("wall clock synchronized ({:?})", clock.now());
            }

            Event::CommandReceived => {
                // An ingress transport frames its request and raises this
                // event; dispatch goes through api::handle_request. No
                // transport is bound in this build.
            }
        });
    }
}
