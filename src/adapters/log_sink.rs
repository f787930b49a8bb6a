//! Event sink that writes application events to the structured log.
//!
//! The firmware has no metrics pipeline; operator-visible lifecycle events
//! go to the serial console through the `log` facade (esp_idf_logger on
//! device, env-style logger in host runs).

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::StageStarted(stage) => info!("event: {:?} stage started", stage),
            AppEvent::BrewResumed { end_time } => {
                info!("event: brew resumed (end_time {:?})", end_time);
            }
            AppEvent::BrewStopped => info!("event: brew stopped"),
            AppEvent::StepAdvanced => info!("event: step deadline forced"),
            AppEvent::StageComplete(stage) => info!("event: {:?} stage complete", stage),
            AppEvent::Telemetry(t) => info!(
                "telemetry: stage={:?} started={} temp={:.1}C target={:?} duty={:.0}% pump={}",
                t.stage,
                t.brew_started,
                t.current_temperature,
                t.target_temperature,
                t.heater_duty,
                t.pump_on
            ),
        }
    }
}
