//! Response envelope decoding and classification.
//!
//! # Design
//! The API signals failures inside the body, in two unrelated shapes:
//!
//! - a `status` field (`"ok"` / `"error"`) next to a `data` field, used by
//!   most calls;
//! - no `status` at all, with the error message nested under
//!   `rxs.obs[0].msg`, used by search when the token is rejected.
//!
//! `Envelope::decode` turns a raw JSON value into one of these shapes,
//! checking the type of every field it branches on, and
//! `Envelope::classify` maps the shape to a payload or an `ApiError`.
//! Both steps are pure.
//!
//! A bare envelope whose nested message does not mention the token is
//! passed through untouched. The API has no further documented markers for
//! that shape.

use serde_json::{Map, Value};

use crate::error::ApiError;

const INVALID_KEY: &str = "Invalid key";
const OVER_QUOTA: &str = "Over quota";
const UNKNOWN_ID: &str = "Unknown ID";
const UNKNOWN_STATION: &str = "Unknown station";

/// A decoded response body, discriminated by its `status` field.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// `status == "ok"`. `data` is `None` when absent or `null`.
    Ok { data: Option<Value> },

    /// `status == "error"`.
    Error { data: Option<Value> },

    /// Any other string `status`.
    Other { status: String },

    /// No `status` field. `payload` is `data` when present, otherwise the
    /// whole body; `search_msg` is the string found at `rxs.obs[0].msg`.
    Bare {
        payload: Value,
        search_msg: Option<String>,
    },
}

impl Envelope {
    /// Decode a response body into an `Envelope`.
    ///
    /// Fails with `ApiError::Decode` when the body is not a JSON object or
    /// when `status` is present with a non-string value.
    pub fn decode(body: Value) -> Result<Self, ApiError> {
        let mut object = match body {
            Value::Object(object) => object,
            other => {
                return Err(ApiError::Decode(format!(
                    "expected a JSON object, got {}",
                    json_type(&other)
                )))
            }
        };

        let data = take_present(&mut object, "data");

        match take_present(&mut object, "status") {
            Some(Value::String(status)) => Ok(match status.as_str() {
                "ok" => Envelope::Ok { data },
                "error" => Envelope::Error { data },
                _ => Envelope::Other { status },
            }),
            Some(other) => Err(ApiError::Decode(format!(
                "expected `status` to be a string, got {}",
                json_type(&other)
            ))),
            None => {
                let search_msg = object
                    .get("rxs")
                    .and_then(|rxs| rxs.pointer("/obs/0/msg"))
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                let payload = match data {
                    Some(data) => data,
                    None => Value::Object(object),
                };
                Ok(Envelope::Bare {
                    payload,
                    search_msg,
                })
            }
        }
    }

    /// Map the envelope to its payload or to the failure it reports.
    pub fn classify(self) -> Result<Value, ApiError> {
        match self {
            Envelope::Ok { data: None } => Err(ApiError::Api(
                "success envelope without data".to_string(),
            )),
            Envelope::Ok { data: Some(data) } => {
                if is_empty(&data) {
                    return Err(ApiError::UnknownCity);
                }
                // `get` on a non-object yields None, so lists skip this check.
                if data.get("msg").and_then(Value::as_str) == Some(UNKNOWN_ID) {
                    return Err(ApiError::UnknownId);
                }
                Ok(data)
            }
            Envelope::Error { data } => match data {
                Some(Value::String(s)) if s == INVALID_KEY => Err(ApiError::InvalidToken),
                Some(Value::String(s)) if s == OVER_QUOTA => Err(ApiError::OverQuota),
                Some(Value::String(s)) if s == UNKNOWN_STATION => Err(ApiError::UnknownStation),
                Some(data) if !is_empty(&data) => Err(ApiError::Api(detail(data))),
                _ => Err(ApiError::Api("error".to_string())),
            },
            Envelope::Other { status } => Err(ApiError::Api(status)),
            Envelope::Bare {
                payload,
                search_msg,
            } => match search_msg {
                Some(msg) if msg.contains(INVALID_KEY) => Err(ApiError::InvalidToken),
                _ => Ok(payload),
            },
        }
    }
}

/// Decode and classify a response body in one step.
pub fn classify(body: Value) -> Result<Value, ApiError> {
    Envelope::decode(body)?.classify()
}

/// Remove `key` from `object`, treating JSON `null` as absent.
fn take_present(object: &mut Map<String, Value>, key: &str) -> Option<Value> {
    object.remove(key).filter(|value| !value.is_null())
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn detail(data: Value) -> String {
    match data {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
