// Adapter configuration and option merging

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::models::{Headers, Params};
use crate::resolver::UrlResolver;

use super::hooks::{DefaultFailure, DefaultSuccess, FailureHook, FormParams, ParamsBuilder, SuccessHook};
use super::options::AdapterOptions;

pub const DEFAULT_METHOD: &str = "POST";
pub const DEFAULT_PARAM_NAME_IDENTITY: &str = "username";
pub const DEFAULT_PARAM_NAME_CREDENTIAL: &str = "password";

/// Mutable adapter configuration
///
/// Created once with the adapter and changed through the setters or
/// [`AdapterConfiguration::apply`]. Every setter replaces exactly one field.
#[derive(Clone)]
pub struct AdapterConfiguration {
    url: Option<String>,
    method: String,
    params: Params,
    headers: Option<Headers>,
    param_name_identity: String,
    param_name_credential: String,
    request_options: Params,
    on_success: Arc<dyn SuccessHook>,
    on_failure: Arc<dyn FailureHook>,
    build_params: Arc<dyn ParamsBuilder>,
}

impl Default for AdapterConfiguration {
    fn default() -> Self {
        Self {
            url: None,
            method: DEFAULT_METHOD.to_string(),
            params: Params::new(),
            headers: None,
            param_name_identity: DEFAULT_PARAM_NAME_IDENTITY.to_string(),
            param_name_credential: DEFAULT_PARAM_NAME_CREDENTIAL.to_string(),
            request_options: Params::new(),
            on_success: Arc::new(DefaultSuccess),
            on_failure: Arc::new(DefaultFailure),
            build_params: Arc::new(FormParams),
        }
    }
}

impl AdapterConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    // === Setters ===

    pub fn set_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.url = Some(url.into());
        self
    }

    pub fn set_method(&mut self, method: impl Into<String>) -> &mut Self {
        self.method = method.into();
        self
    }

    pub fn set_params(&mut self, params: Params) -> &mut Self {
        self.params = params;
        self
    }

    pub fn set_headers(&mut self, headers: Headers) -> &mut Self {
        self.headers = Some(headers);
        self
    }

    /// Replace the passthrough request options wholesale
    pub fn set_request_options(&mut self, options: Params) -> &mut Self {
        self.request_options = options;
        self
    }

    pub fn set_param_name_identity(&mut self, name: impl Into<String>) -> &mut Self {
        self.param_name_identity = name.into();
        self
    }

    pub fn set_param_name_credential(&mut self, name: impl Into<String>) -> &mut Self {
        self.param_name_credential = name.into();
        self
    }

    pub fn set_on_success(&mut self, hook: Arc<dyn SuccessHook>) -> &mut Self {
        self.on_success = hook;
        self
    }

    pub fn set_on_failure(&mut self, hook: Arc<dyn FailureHook>) -> &mut Self {
        self.on_failure = hook;
        self
    }

    pub fn set_build_params(&mut self, builder: Arc<dyn ParamsBuilder>) -> &mut Self {
        self.build_params = builder;
        self
    }

    // === Merging ===

    /// Apply one option set
    ///
    /// Fields are applied in a fixed order: url, identity param name,
    /// credential param name, method, params, headers, success hook, failure
    /// hook, params builder. Absent fields keep their current value. When no
    /// headers are supplied the resolver is asked for the defaults of the
    /// current URL. Passthrough fields are shallow-merged into
    /// `request_options`, new keys winning.
    pub fn apply(&mut self, options: AdapterOptions, resolver: Option<&dyn UrlResolver>) -> &mut Self {
        let AdapterOptions {
            url,
            param_name_identity,
            param_name_credential,
            method,
            params,
            headers,
            on_success,
            on_failure,
            build_params,
            request_options,
        } = options;

        if let Some(url) = url {
            self.set_url(url);
        }

        if let Some(name) = non_empty(param_name_identity) {
            self.set_param_name_identity(name);
        }

        if let Some(name) = non_empty(param_name_credential) {
            self.set_param_name_credential(name);
        }

        if let Some(method) = non_empty(method) {
            self.set_method(method);
        }

        if let Some(params) = params {
            self.set_params(params);
        }

        match headers {
            Some(headers) => {
                self.set_headers(headers);
            }
            None => {
                let defaults = match (resolver, self.url.as_deref()) {
                    (Some(resolver), Some(url)) => resolver.headers(url),
                    _ => None,
                };
                if let Some(defaults) = defaults {
                    tracing::debug!(
                        count = defaults.len(),
                        "Installing default headers from URL resolver"
                    );
                    self.set_headers(defaults);
                }
            }
        }

        if let Some(hook) = on_success {
            self.set_on_success(hook);
        }

        if let Some(hook) = on_failure {
            self.set_on_failure(hook);
        }

        if let Some(builder) = build_params {
            self.set_build_params(builder);
        }

        for (key, value) in request_options {
            self.request_options.insert(key, value);
        }

        self
    }

    /// Write identity and credential into params under the configured names
    ///
    /// Existing values at those keys are overwritten; nothing is removed.
    pub fn bind_credentials(&mut self, identity: &str, credential: &str) -> &Params {
        self.params.insert(
            self.param_name_identity.clone(),
            Value::String(identity.to_string()),
        );
        self.params.insert(
            self.param_name_credential.clone(),
            Value::String(credential.to_string()),
        );
        &self.params
    }

    // === Getters ===

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn headers(&self) -> Option<&Headers> {
        self.headers.as_ref()
    }

    pub fn param_name_identity(&self) -> &str {
        &self.param_name_identity
    }

    pub fn param_name_credential(&self) -> &str {
        &self.param_name_credential
    }

    pub fn request_options(&self) -> &Params {
        &self.request_options
    }

    pub fn on_success(&self) -> Arc<dyn SuccessHook> {
        Arc::clone(&self.on_success)
    }

    pub fn on_failure(&self) -> Arc<dyn FailureHook> {
        Arc::clone(&self.on_failure)
    }

    pub fn build_params(&self) -> Arc<dyn ParamsBuilder> {
        Arc::clone(&self.build_params)
    }
}

impl fmt::Debug for AdapterConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Params may hold a bound credential, headers an Authorization value
        let param_keys: Vec<&String> = self.params.keys().collect();
        let header_names: Option<Vec<&String>> =
            self.headers.as_ref().map(|headers| headers.keys().collect());
        f.debug_struct("AdapterConfiguration")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("params", &param_keys)
            .field("headers", &header_names)
            .field("param_name_identity", &self.param_name_identity)
            .field("param_name_credential", &self.param_name_credential)
            .field("request_options", &self.request_options)
            .finish_non_exhaustive()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
