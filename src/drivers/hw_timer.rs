//! Control-tick timer using ESP-IDF's esp_timer API.
//!
//! A single periodic timer pushes [`Event::ControlTick`] into the lock-free
//! SPSC queue at the configured sample period. Pacing lives entirely in
//! this timer; the main loop never sleeps between tick and command
//! handling, so a queued command is picked up immediately.
//!
//! Timer callbacks execute in the ESP timer task context (not ISR), so
//! they can safely call push_event() which uses AtomicU8.

#[cfg(target_os = "espidf")]
use crate::events::{push_event, Event};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::{error, info};

#[cfg(target_os = "espidf")]
static mut CONTROL_TIMER: esp_timer_handle_t = core::ptr::null_mut();

/// SAFETY: CONTROL_TIMER is written once in `start_control_timer()` before
/// any timer callbacks fire. Only called from the single main task.
#[cfg(target_os = "espidf")]
unsafe fn control_timer() -> esp_timer_handle_t {
    unsafe { CONTROL_TIMER }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn control_tick_cb(_arg: *mut core::ffi::c_void) {
    push_event(Event::ControlTick);
}

/// Start the periodic control timer at `period_ms`.
#[cfg(target_os = "espidf")]
pub fn start_control_timer(period_ms: u32) {
    // SAFETY: CONTROL_TIMER is written here once at boot from the single
    // main-task context before any timer callbacks fire. The callback only
    // calls push_event(), which is safe from the timer task.
    unsafe {
        let args = esp_timer_create_args_t {
            callback: Some(control_tick_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"brewctl\0".as_ptr() as *const _,
            skip_unhandled_events: false,
        };
        let ret = esp_timer_create(&args, &raw mut CONTROL_TIMER);
        if ret != ESP_OK {
            error!("hw_timer: control timer create failed (rc={})", ret);
            return;
        }
        let ret = esp_timer_start_periodic(CONTROL_TIMER, u64::from(period_ms) * 1_000);
        if ret != ESP_OK {
            error!("hw_timer: control timer start failed (rc={})", ret);
            return;
        }
        info!("hw_timer: control tick every {} ms", period_ms);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn start_control_timer(period_ms: u32) {
    // Events are driven by the test harness on host.
    log::info!("hw_timer(sim): control timer not started ({} ms)", period_ms);
}

/// Re-arm the running timer with a new period (after a config change).
#[cfg(target_os = "espidf")]
pub fn rearm_control_timer(period_ms: u32) {
    // SAFETY: control_timer() contract — main task only.
    unsafe {
        let ct = control_timer();
        if ct.is_null() {
            start_control_timer(period_ms);
            return;
        }
        esp_timer_stop(ct);
        let ret = esp_timer_start_periodic(ct, u64::from(period_ms) * 1_000);
        if ret != ESP_OK {
            error!("hw_timer: control timer re-arm failed (rc={})", ret);
        } else {
            info!("hw_timer: control tick re-armed at {} ms", period_ms);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn rearm_control_timer(_period_ms: u32) {}

/// Stop the control timer.
#[cfg(target_os = "espidf")]
pub fn stop_control_timer() {
    // SAFETY: null-check prevents stopping a never-created handle.
    unsafe {
        let ct = control_timer();
        if !ct.is_null() {
            esp_timer_stop(ct);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn stop_control_timer() {}
