// Authentication module
// Adapter configuration, request execution and result types

mod adapter;
mod configuration;
mod credentials;
mod hooks;
mod options;
mod types;

pub use adapter::{HttpAdapter, HttpAdapterBuilder};
pub use configuration::{
    AdapterConfiguration, DEFAULT_METHOD, DEFAULT_PARAM_NAME_CREDENTIAL,
    DEFAULT_PARAM_NAME_IDENTITY,
};
pub use credentials::{CredentialSource, StaticCredentials};
pub use hooks::{
    DefaultFailure, DefaultSuccess, FailureHook, FormParams, JsonParams, ParamsBuilder,
    SuccessHook,
};
pub use options::AdapterOptions;
pub use types::{AuthOutcome, AuthResult, Payload, ResultCode};
