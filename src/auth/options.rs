// Adapter option sets
// One option set is applied per `set_options` call; absent fields are left alone

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::models::{Headers, Params};

use super::hooks::{FailureHook, ParamsBuilder, SuccessHook};

/// Options accepted by the adapter at construction time and afterwards
///
/// Deserializable from a config table; hooks can only be set in code.
/// Keys not recognized here land in `request_options` and are passed
/// through to the transport.
#[derive(Clone, Default, Deserialize)]
pub struct AdapterOptions {
    #[serde(default)]
    pub url: Option<String>,

    // The config store lowercases keys
    #[serde(default, alias = "paramNameIdentity", alias = "paramnameidentity")]
    pub param_name_identity: Option<String>,

    #[serde(default, alias = "paramNameCredential", alias = "paramnamecredential")]
    pub param_name_credential: Option<String>,

    #[serde(default)]
    pub method: Option<String>,

    #[serde(default)]
    pub params: Option<Params>,

    #[serde(default)]
    pub headers: Option<Headers>,

    #[serde(skip)]
    pub on_success: Option<Arc<dyn SuccessHook>>,

    #[serde(skip)]
    pub on_failure: Option<Arc<dyn FailureHook>>,

    #[serde(skip)]
    pub build_params: Option<Arc<dyn ParamsBuilder>>,

    /// Passthrough request fields
    #[serde(flatten)]
    pub request_options: Params,
}

impl AdapterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    /// Add a single configured param
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .get_or_insert_with(Params::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Add a single header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_param_name_identity(mut self, name: impl Into<String>) -> Self {
        self.param_name_identity = Some(name.into());
        self
    }

    pub fn with_param_name_credential(mut self, name: impl Into<String>) -> Self {
        self.param_name_credential = Some(name.into());
        self
    }

    pub fn with_on_success(mut self, hook: impl SuccessHook + 'static) -> Self {
        self.on_success = Some(Arc::new(hook));
        self
    }

    pub fn with_on_failure(mut self, hook: impl FailureHook + 'static) -> Self {
        self.on_failure = Some(Arc::new(hook));
        self
    }

    pub fn with_build_params(mut self, builder: impl ParamsBuilder + 'static) -> Self {
        self.build_params = Some(Arc::new(builder));
        self
    }

    /// Add a passthrough request field
    pub fn with_request_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.request_options.insert(key.into(), value.into());
        self
    }
}

impl fmt::Debug for AdapterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterOptions")
            .field("url", &self.url)
            .field("param_name_identity", &self.param_name_identity)
            .field("param_name_credential", &self.param_name_credential)
            .field("method", &self.method)
            .field("params", &self.params)
            .field("headers", &self.headers)
            .field("on_success", &self.on_success.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .field("build_params", &self.build_params.is_some())
            .field("request_options", &self.request_options)
            .finish()
    }
}
