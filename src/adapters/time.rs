//! System wall-clock adapter.
//!
//! Implements the [`Clock`] port over the ESP-IDF system clock. The clock
//! is only trusted once SNTP has set it: `gettimeofday` readings from
//! before 2020-01-01 are treated as "not synchronized" and reported as
//! `None`, which gates every stage-initiating command.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: wraps `gettimeofday()` (SNTP-disciplined once WiFi is up).
//! On host/test: reads a static AtomicU64 epoch; 0 means unsynced.

use crate::app::ports::Clock;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU64, Ordering};

/// Epoch seconds for 2020-01-01T00:00:00Z. Anything earlier is a cold RTC.
const EPOCH_2020: i64 = 1_577_836_800;

#[cfg(not(target_os = "espidf"))]
static SIM_EPOCH_SECS: AtomicU64 = AtomicU64::new(0);

/// Set the simulated wall clock (0 simulates an unsynced clock).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_epoch_secs(secs: u64) {
    SIM_EPOCH_SECS.store(secs, Ordering::Relaxed);
}

#[derive(Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    #[cfg(target_os = "espidf")]
    fn now(&self) -> Option<u64> {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        // SAFETY: gettimeofday only writes the struct we pass in.
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        if tv.tv_sec < EPOCH_2020 {
            return None;
        }
        Some(tv.tv_sec as u64)
    }

    #[cfg(not(target_os = "espidf"))]
    fn now(&self) -> Option<u64> {
        match SIM_EPOCH_SECS.load(Ordering::Relaxed) {
            0 => None,
            secs => Some(secs),
        }
    }
}
