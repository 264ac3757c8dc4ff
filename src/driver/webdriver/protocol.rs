//! Wire format helpers for the W3C WebDriver protocol

use serde::Deserialize;
use serde_json::{Value, json};

use crate::driver::Selector;
use crate::error::FleetError;
use crate::types::ElementId;

/// Key under which WebDriver serializes element references
pub(super) const ELEMENT_KEY: &str = "element-6066-11e4-a837-4b72e6f6ff6d";

/// WebDriver code point for the Enter key
pub(super) const ENTER_KEY: &str = "\u{E007}";

const BROWSER_ARGS: &[&str] = &["--disable-gpu", "--no-sandbox", "--disable-dev-shm-usage"];

/// Error payload of a failed command
#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

/// New-session request body
pub(super) fn new_session_body(headless: bool) -> Value {
    let mut args: Vec<&str> = BROWSER_ARGS.to_vec();
    if headless {
        args.insert(0, "--headless");
    }
    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": { "args": args }
            }
        }
    })
}

/// Locator body for find-element commands
pub(super) fn locator_body(selector: &Selector) -> Value {
    let using = match selector {
        Selector::Css(_) => "css selector",
        Selector::Xpath(_) => "xpath",
    };
    json!({ "using": using, "value": selector.value() })
}

/// Element reference in a command result
pub(super) fn element_from(value: &Value) -> Option<ElementId> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(ElementId::from)
}

/// Element references in a find-elements result
pub(super) fn elements_from(value: &Value) -> Vec<ElementId> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(element_from).collect())
        .unwrap_or_default()
}

/// Map an error payload to the fleet error taxonomy
///
/// A missing element becomes [`FleetError::ElementMissing`]; session-level
/// errors make the driver unusable; everything else is a per-interaction
/// failure.
pub(super) fn classify_error(value: Value) -> FleetError {
    let wire: WireError = match serde_json::from_value(value.clone()) {
        Ok(wire) => wire,
        Err(_) => return FleetError::driver_interaction(format!("malformed error: {value}")),
    };
    match wire.error.as_str() {
        "no such element" => FleetError::element_missing(wire.message),
        "invalid session id" | "session not created" | "no such window" => {
            FleetError::driver_unavailable(format!("{}: {}", wire.error, wire.message))
        }
        _ => FleetError::driver_interaction(format!("{}: {}", wire.error, wire.message)),
    }
}
