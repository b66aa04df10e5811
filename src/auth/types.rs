// Authentication result types

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

use crate::error::AdapterError;

/// Outcome code of an authentication attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultCode {
    Success,
    Failure,
}

/// Data carried by an [`AuthResult`]
#[derive(Debug)]
pub enum Payload {
    /// Decoded JSON response body
    Json(Value),
    /// Response body that was not valid JSON
    Raw(String),
    /// Error that ended the attempt
    Error(AdapterError),
    Empty,
}

impl Payload {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&AdapterError> {
        match self {
            Payload::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Payload::Json(value) => value.serialize(serializer),
            Payload::Raw(text) => serializer.serialize_str(text),
            Payload::Error(err) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("error", err.kind())?;
                map.serialize_entry("message", &err.to_string())?;
                if let Some(status) = err.status() {
                    map.serialize_entry("status", &status)?;
                }
                map.end()
            }
            Payload::Empty => serializer.serialize_unit(),
        }
    }
}

/// Uniform outcome of one authentication attempt
///
/// Immutable once built; fields are exposed through getters only.
#[derive(Debug, Serialize)]
pub struct AuthResult {
    code: ResultCode,
    identity: Option<String>,
    payload: Payload,
}

impl AuthResult {
    pub fn new(code: ResultCode, identity: Option<String>, payload: Payload) -> Self {
        Self {
            code,
            identity,
            payload,
        }
    }

    pub fn success(identity: impl Into<String>, payload: Payload) -> Self {
        Self::new(ResultCode::Success, Some(identity.into()), payload)
    }

    pub fn failure(payload: Payload) -> Self {
        Self::new(ResultCode::Failure, None, payload)
    }

    pub fn code(&self) -> ResultCode {
        self.code
    }

    pub fn is_success(&self) -> bool {
        self.code == ResultCode::Success
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }
}

/// Settlement of `authenticate()`: `Ok` when fulfilled, `Err` when rejected
pub type AuthOutcome = Result<AuthResult, AuthResult>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_result() {
        let result = AuthResult::success("alice", Payload::Json(json!({"token": "t"})));
        assert!(result.is_success());
        assert_eq!(result.code(), ResultCode::Success);
        assert_eq!(result.identity(), Some("alice"));
        assert_eq!(result.payload().as_json(), Some(&json!({"token": "t"})));
    }

    #[test]
    fn test_failure_result_has_no_identity() {
        let result = AuthResult::failure(Payload::Error(AdapterError::ConfigError(
            "No URL configured".to_string(),
        )));
        assert!(!result.is_success());
        assert_eq!(result.identity(), None);
        assert!(result.payload().as_error().is_some());
    }

    #[test]
    fn test_serialize_success() {
        let result = AuthResult::success("alice", Payload::Raw("OK".to_string()));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({"code": "SUCCESS", "identity": "alice", "payload": "OK"})
        );
    }

    #[test]
    fn test_serialize_error_payload() {
        let result = AuthResult::failure(Payload::Error(AdapterError::HttpStatus {
            status: 401,
            message: "denied".to_string(),
        }));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["code"], "FAILURE");
        assert_eq!(value["identity"], Value::Null);
        assert_eq!(value["payload"]["error"], "http_status");
        assert_eq!(value["payload"]["status"], 401);
        assert_eq!(value["payload"]["message"], "HTTP error: 401 - denied");
    }

    #[test]
    fn test_serialize_empty_payload() {
        let result = AuthResult::failure(Payload::Empty);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["payload"], Value::Null);
    }
}
