//! Timer-driven event queue.
//!
//! Events are produced by the esp_timer control-tick callback, the network
//! ingress task, and software (clock sync notification); they are consumed
//! one at a time by the main loop. The queue is a lock-free SPSC ring so
//! producers in timer-task context never block the consumer, and — more
//! importantly — the pacing delay between control ticks lives in the timer,
//! not in the loop: commands queued during the pause are serviced
//! immediately.

use core::sync::atomic::{AtomicU8, Ordering};

/// Maximum number of pending events. Power of 2 for cheap wrap-around.
const EVENT_QUEUE_CAP: usize = 16;

/// System event types. Lower discriminant = higher dispatch priority when
/// several are pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Event {
    /// An inbound command frame is waiting in the API engine.
    CommandReceived = 0,
    /// The wall clock has just been synchronized (SNTP callback).
    ClockSynced = 1,
    /// Control loop tick — fires every `BrewConfig::sample_time_secs`.
    ControlTick = 2,
    /// Telemetry report timer fired.
    TelemetryTick = 3,
}

// ── Lock-free SPSC ring ───────────────────────────────────────
//
// Producers: esp_timer callbacks / ingress task (one logical writer).
// Consumer: the main loop. Head/tail are u8 indices into a byte buffer
// of raw discriminants; the static is required so C timer callbacks can
// reach it.

static HEAD: AtomicU8 = AtomicU8::new(0);
static TAIL: AtomicU8 = AtomicU8::new(0);
// SAFETY: slots are written only by the single producer side (guarded by
// the HEAD/TAIL acquire-release protocol) and read only by the single
// consumer; a slot is never accessed concurrently.
static mut SLOTS: [u8; EVENT_QUEUE_CAP] = [0; EVENT_QUEUE_CAP];

/// Push an event. Safe from timer-task context. Returns `false` when the
/// queue is full and the event was dropped.
pub fn push_event(event: Event) -> bool {
    let head = HEAD.load(Ordering::Relaxed);
    let tail = TAIL.load(Ordering::Acquire);
    let next = (head + 1) % EVENT_QUEUE_CAP as u8;
    if next == tail {
        return false;
    }
    // SAFETY: single producer; slot at `head` is outside the consumer's
    // visible range until the Release store below.
    unsafe {
        SLOTS[head as usize] = event as u8;
    }
    HEAD.store(next, Ordering::Release);
    true
}

/// Pop the next pending event (main loop only).
pub fn pop_event() -> Option<Event> {
    let tail = TAIL.load(Ordering::Relaxed);
    let head = HEAD.load(Ordering::Acquire);
    if tail == head {
        return None;
    }
    // SAFETY: single consumer; the Acquire load above made the slot visible.
    let raw = unsafe { SLOTS[tail as usize] };
    TAIL.store((tail + 1) % EVENT_QUEUE_CAP as u8, Ordering::Release);
    decode(raw)
}

/// Drain all pending events into a callback, FIFO.
pub fn drain_events(mut handler: impl FnMut(Event)) {
    while let Some(event) = pop_event() {
        handler(event);
    }
}

fn decode(raw: u8) -> Option<Event> {
    match raw {
        0 => Some(Event::CommandReceived),
        1 => Some(Event::ClockSynced),
        2 => Some(Event::ControlTick),
        3 => Some(Event::TelemetryTick),
        _ => None,
    }
}
