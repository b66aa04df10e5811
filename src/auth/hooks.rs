// Request/response hooks
// Strategy objects that replace one step of the default request handling

use crate::error::AdapterError;
use crate::models::{Params, QueryParams, RequestPayload, TransportResponse};

use super::types::{AuthResult, Payload};

/// Turns a transport response into the fulfilled result
pub trait SuccessHook: Send + Sync {
    /// `identity` is the identity bound when the attempt started
    fn on_success(&self, identity: &str, response: TransportResponse) -> AuthResult;
}

/// Turns a failure into the rejected result
pub trait FailureHook: Send + Sync {
    fn on_failure(&self, error: AdapterError) -> AuthResult;
}

/// Builds the request payload from the bound params
pub trait ParamsBuilder: Send + Sync {
    fn build(&self, params: &Params) -> RequestPayload;
}

impl<F> SuccessHook for F
where
    F: Fn(&str, TransportResponse) -> AuthResult + Send + Sync,
{
    fn on_success(&self, identity: &str, response: TransportResponse) -> AuthResult {
        self(identity, response)
    }
}

impl<F> FailureHook for F
where
    F: Fn(AdapterError) -> AuthResult + Send + Sync,
{
    fn on_failure(&self, error: AdapterError) -> AuthResult {
        self(error)
    }
}

impl<F> ParamsBuilder for F
where
    F: Fn(&Params) -> RequestPayload + Send + Sync,
{
    fn build(&self, params: &Params) -> RequestPayload {
        self(params)
    }
}

/// SUCCESS result with the bound identity and the decoded body,
/// falling back to the raw body text
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSuccess;

impl SuccessHook for DefaultSuccess {
    fn on_success(&self, identity: &str, response: TransportResponse) -> AuthResult {
        let payload = match response.json() {
            Some(value) => Payload::Json(value),
            None => Payload::Raw(response.text()),
        };
        AuthResult::success(identity, payload)
    }
}

/// FAILURE result without identity, carrying the error itself
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFailure;

impl FailureHook for DefaultFailure {
    fn on_failure(&self, error: AdapterError) -> AuthResult {
        AuthResult::failure(Payload::Error(error))
    }
}

/// Serializes params into ordered query pairs
#[derive(Debug, Clone, Copy, Default)]
pub struct FormParams;

impl ParamsBuilder for FormParams {
    fn build(&self, params: &Params) -> RequestPayload {
        RequestPayload::Query(QueryParams::from(params))
    }
}

/// Sends params as a JSON document instead of form pairs
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParams;

impl ParamsBuilder for JsonParams {
    fn build(&self, params: &Params) -> RequestPayload {
        RequestPayload::Json(serde_json::Value::Object(params.clone()))
    }
}
