//! Transport-agnostic JSON command surface.
//!
//! The network stack (HTTP server, websocket bridge, whatever carries the
//! bytes) hands each request here as an endpoint name plus a raw JSON body
//! and gets back a status code and a JSON payload. Every successful
//! operation answers with the full session snapshot, so clients never need
//! a follow-up status poll; failures answer with a fixed error payload and
//! an unchanged session.

use log::warn;

use crate::app::commands::BrewCommand;
use crate::app::ports::{Clock, ConfigStore, EventSink, HeaterPort, PumpPort, SessionStore};
use crate::app::service::BrewSessionController;
use crate::error::BrewError;

/// Endpoint names understood by [`handle_request`].
pub const EP_START: &str = "start";
pub const EP_RESUME: &str = "resume";
pub const EP_STOP: &str = "stop";
pub const EP_ADVANCE: &str = "advance";
pub const EP_START_BOIL: &str = "startboil";
pub const EP_BOIL_POWER: &str = "boilpower";
pub const EP_STATUS: &str = "status";

/// Wire response: HTTP-style status plus a JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    fn ok(body: String) -> Self {
        Self { status: 200, body }
    }

    fn error(status: u16, code: &str) -> Self {
        Self {
            status,
            body: format!("{{\"error\":\"{}\"}}", code),
        }
    }
}

/// Map an endpoint plus request body onto a command. The boil power body
/// must carry a numeric `boil_power_percentage`; anything else is an
/// invalid request.
pub fn parse_command(endpoint: &str, body: &str) -> Option<Result<BrewCommand, BrewError>> {
    match endpoint {
        EP_START => Some(Ok(BrewCommand::StartBrew)),
        EP_RESUME => Some(Ok(BrewCommand::ResumeBrew)),
        EP_STOP => Some(Ok(BrewCommand::StopBrew)),
        EP_ADVANCE => Some(Ok(BrewCommand::AdvanceStage)),
        EP_START_BOIL => Some(Ok(BrewCommand::StartBoil)),
        EP_BOIL_POWER => Some(parse_boil_power(body)),
        EP_STATUS => Some(Ok(BrewCommand::GetStatus)),
        _ => None,
    }
}

fn parse_boil_power(body: &str) -> Result<BrewCommand, BrewError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|_| BrewError::InvalidRequest)?;
    let pct = value
        .get("boil_power_percentage")
        .and_then(serde_json::Value::as_f64)
        .ok_or(BrewError::InvalidRequest)?;
    Ok(BrewCommand::AdjustBoilPower(pct as f32))
}

/// Parse, dispatch and encode one request against the controller.
pub fn handle_request(
    endpoint: &str,
    body: &str,
    ctl: &mut BrewSessionController,
    store: &mut (impl SessionStore + ConfigStore),
    hw: &mut (impl HeaterPort + PumpPort),
    clock: &impl Clock,
    sink: &mut impl EventSink,
) -> ApiResponse {
    let Some(parsed) = parse_command(endpoint, body) else {
        return ApiResponse::error(404, "unknown_command");
    };
    let cmd = match parsed {
        Ok(cmd) => cmd,
        Err(e) => return encode_error(endpoint, &e),
    };

    match ctl.handle_command(cmd, store, hw, clock, sink) {
        Ok(snapshot) => match serde_json::to_string(&snapshot) {
            Ok(json) => ApiResponse::ok(json),
            Err(e) => {
                warn!("api: snapshot encode failed ({})", e);
                ApiResponse::error(500, "encoding_failed")
            }
        },
        Err(e) => encode_error(endpoint, &e),
    }
}

fn encode_error(endpoint: &str, e: &BrewError) -> ApiResponse {
    warn!("api: '{}' failed ({})", endpoint, e);
    let code = match e {
        BrewError::ClockNotSynchronized => "clock_not_synchronized",
        BrewError::InvalidRequest => "invalid_request",
        BrewError::Persistence(_) => "persistence_failed",
        BrewError::Sensor(_) => "sensor_fault",
        BrewError::Actuator(_) => "actuator_fault",
    };
    ApiResponse::error(500, code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_map_to_commands() {
        assert_eq!(
            parse_command(EP_START, "").unwrap().unwrap(),
            BrewCommand::StartBrew
        );
        assert_eq!(
            parse_command(EP_STOP, "").unwrap().unwrap(),
            BrewCommand::StopBrew
        );
        assert_eq!(
            parse_command(EP_STATUS, "").unwrap().unwrap(),
            BrewCommand::GetStatus
        );
        assert!(parse_command("reboot", "").is_none());
    }

    #[test]
    fn boil_power_accepts_integers_and_floats() {
        let cmd = parse_command(EP_BOIL_POWER, r#"{"boil_power_percentage": 65}"#)
            .unwrap()
            .unwrap();
        assert_eq!(cmd, BrewCommand::AdjustBoilPower(65.0));

        let cmd = parse_command(EP_BOIL_POWER, r#"{"boil_power_percentage": 72.5}"#)
            .unwrap()
            .unwrap();
        assert_eq!(cmd, BrewCommand::AdjustBoilPower(72.5));
    }

    #[test]
    fn boil_power_rejects_malformed_bodies() {
        for body in [
            "",
            "not json",
            "{}",
            r#"{"boil_power_percentage": "high"}"#,
            r#"{"boil_power_percentage": null}"#,
        ] {
            let err = parse_command(EP_BOIL_POWER, body).unwrap().unwrap_err();
            assert_eq!(err, BrewError::InvalidRequest, "body: {body:?}");
        }
    }

    #[test]
    fn error_payloads_are_fixed_strings() {
        let resp = encode_error(EP_START, &BrewError::ClockNotSynchronized);
        assert_eq!(resp.status, 500);
        assert_eq!(resp.body, r#"{"error":"clock_not_synchronized"}"#);

        let resp = encode_error(EP_BOIL_POWER, &BrewError::InvalidRequest);
        assert_eq!(resp.status, 500);
        assert_eq!(resp.body, r#"{"error":"invalid_request"}"#);
    }
}
