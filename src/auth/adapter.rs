use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config;
use crate::error::{AdapterError, Result};
use crate::http_client::Transport;
use crate::models::RequestDescriptor;
use crate::resolver::UrlResolver;

use super::configuration::AdapterConfiguration;
use super::credentials::CredentialSource;
use super::hooks::{FailureHook, SuccessHook};
use super::options::AdapterOptions;
use super::types::AuthOutcome;

/// HTTP authentication adapter
///
/// Binds the identity/credential pair into the configured params, sends one
/// request through the transport and converts the outcome into an
/// [`AuthResult`](super::AuthResult). Safe to share behind an `Arc`; the
/// configuration is changed through `&mut` access only.
pub struct HttpAdapter {
    /// Current configuration, also holding the persistent params map
    config: RwLock<AdapterConfiguration>,

    /// Identity/credential supplier
    credentials: Arc<dyn CredentialSource>,

    /// Optional URL resolver
    resolver: Option<Arc<dyn UrlResolver>>,

    /// Network transport
    transport: Arc<dyn Transport>,
}

/// Everything one attempt needs, captured while the config lock is held
struct PreparedAttempt {
    identity: String,
    on_success: Arc<dyn SuccessHook>,
    on_failure: Arc<dyn FailureHook>,
    request: Result<(String, RequestDescriptor)>,
}

impl HttpAdapter {
    /// Create an adapter with default configuration
    pub fn new(transport: Arc<dyn Transport>, credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            config: RwLock::new(AdapterConfiguration::new()),
            credentials,
            resolver: None,
            transport,
        }
    }

    pub fn builder(
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialSource>,
    ) -> HttpAdapterBuilder {
        HttpAdapterBuilder {
            transport,
            credentials,
            resolver: None,
            options: None,
            store: None,
        }
    }

    /// Apply one option set on top of the current configuration
    pub fn set_options(&mut self, options: AdapterOptions) -> &mut Self {
        let resolver = self.resolver.as_deref();
        self.config.get_mut().apply(options, resolver);
        self
    }

    /// Mutable access to the configuration setters
    pub fn configure(&mut self) -> &mut AdapterConfiguration {
        self.config.get_mut()
    }

    /// Snapshot of the current configuration
    ///
    /// The lock is released before returning, so the snapshot can be held
    /// across `authenticate` calls.
    pub async fn configuration(&self) -> AdapterConfiguration {
        self.config.read().await.clone()
    }

    pub fn resolver(&self) -> Option<&Arc<dyn UrlResolver>> {
        self.resolver.as_ref()
    }

    /// Run one authentication attempt
    ///
    /// Settles exactly once: `Ok` with the success hook's result, or `Err`
    /// with the failure hook's result. Configuration problems (no URL,
    /// unresolvable template, invalid method) are reported as failures too.
    pub async fn authenticate(&self) -> AuthOutcome {
        let attempt_id = Uuid::new_v4();
        let prepared = self.prepare().await;

        let (url, request) = match prepared.request {
            Ok(parts) => parts,
            Err(e) => {
                tracing::warn!(
                    attempt_id = %attempt_id,
                    error_kind = e.kind(),
                    error = %e,
                    "Authentication request could not be built"
                );
                return Err(prepared.on_failure.on_failure(e));
            }
        };

        tracing::debug!(
            attempt_id = %attempt_id,
            method = %request.method,
            url = %url,
            identity = %prepared.identity,
            "Dispatching authentication request"
        );

        match self.transport.request(&url, request).await {
            Ok(response) => {
                tracing::info!(
                    attempt_id = %attempt_id,
                    status = response.status,
                    identity = %prepared.identity,
                    "Authentication request succeeded"
                );
                Ok(prepared.on_success.on_success(&prepared.identity, response))
            }
            Err(e) => {
                tracing::warn!(
                    attempt_id = %attempt_id,
                    error_kind = e.kind(),
                    error = %e,
                    identity = %prepared.identity,
                    "Authentication request failed"
                );
                Err(prepared.on_failure.on_failure(e))
            }
        }
    }

    /// Bind credentials and build the request under the config write lock
    async fn prepare(&self) -> PreparedAttempt {
        let identity = self.credentials.identity();
        let credential = self.credentials.credential();

        let mut config = self.config.write().await;
        let params = config.bind_credentials(&identity, &credential).clone();

        let request = match config.url() {
            None | Some("") => Err(AdapterError::ConfigError(
                "No URL configured for the HTTP adapter".to_string(),
            )),
            Some(template) => {
                let url = match &self.resolver {
                    Some(resolver) => resolver.url(template, &params),
                    None => Ok(template.to_string()),
                };

                url.map(|url| {
                    let payload = config.build_params().build(&params);
                    let mut request = RequestDescriptor::new(config.method());
                    request.headers = config.headers().cloned().unwrap_or_default();
                    request.options = config.request_options().clone();

                    match request.method.as_str() {
                        "POST" => request.body = Some(payload),
                        "GET" => request.query = Some(payload),
                        other => tracing::debug!(
                            method = other,
                            "No automatic payload placement for this method"
                        ),
                    }
                    (url, request)
                })
            }
        };

        PreparedAttempt {
            identity,
            on_success: config.on_success(),
            on_failure: config.on_failure(),
            request,
        }
    }
}

/// Builder applying explicit options, then the config store's adapter table
pub struct HttpAdapterBuilder {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialSource>,
    resolver: Option<Arc<dyn UrlResolver>>,
    options: Option<AdapterOptions>,
    store: Option<::config::Config>,
}

impl HttpAdapterBuilder {
    pub fn resolver(mut self, resolver: Arc<dyn UrlResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Explicit options, applied first
    pub fn options(mut self, options: AdapterOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Config store whose `authentication.http` table is applied second
    pub fn config_store(mut self, store: ::config::Config) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<HttpAdapter> {
        let mut adapter = HttpAdapter {
            config: RwLock::new(AdapterConfiguration::new()),
            credentials: self.credentials,
            resolver: self.resolver,
            transport: self.transport,
        };

        if let Some(options) = self.options {
            adapter.set_options(options);
        }

        if let Some(store) = &self.store {
            if let Some(options) = config::options_from_store(store)? {
                tracing::debug!("Applying adapter options from config store");
                adapter.set_options(options);
            }
        }

        Ok(adapter)
    }
}
