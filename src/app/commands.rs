//! Inbound commands to the session controller.
//!
//! These are the transport-agnostic operations a bound web layer maps its
//! verbs onto. Every variant except `StopBrew` and `GetStatus` requires a
//! synchronized wall clock.

/// Commands that external adapters can send into the session core.
#[derive(Debug, Clone, PartialEq)]
pub enum BrewCommand {
    /// Begin a new brew: enter the mash stage at step 0.
    StartBrew,

    /// Re-arm a persisted session after a restart, preserving the
    /// remaining time-to-deadline of the interrupted step.
    ResumeBrew,

    /// Stop everything. Unconditional and idempotent — the one operation
    /// with no precondition, so an operator can always recover.
    StopBrew,

    /// Mark the current step's deadline as reached; the next tick lets the
    /// sequencers move on.
    AdvanceStage,

    /// Skip ahead to the boil stage.
    StartBoil,

    /// Change the boil heater power cap (0–100).
    AdjustBoilPower(f32),

    /// Read-only session snapshot.
    GetStatus,
}
