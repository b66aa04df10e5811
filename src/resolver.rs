// URL template resolution and per-template default headers

use dashmap::DashMap;
use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::{Captures, Regex};
use std::sync::Arc;

use crate::error::{AdapterError, Result};
use crate::models::{value_to_param, Headers, Params};

// `{name}` placeholders, names may contain dots and dashes
static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z0-9_.\-]+)\}").expect("placeholder pattern is valid"));

// Characters escaped inside a path segment (RFC 3986 pchar complement)
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

static SCHEME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("scheme pattern is valid"));

/// Turns a URL template plus params into a concrete URL
pub trait UrlResolver: Send + Sync {
    /// Default headers registered for a template, if any
    fn headers(&self, template: &str) -> Option<Headers>;

    /// Concrete URL for a template
    fn url(&self, template: &str, params: &Params) -> Result<String>;
}

/// Placeholder-substituting resolver
///
/// Resolution pipeline:
/// 1. Replace every `{name}` with the percent-encoded value of `params[name]`
/// 2. Join relative templates onto the base URL
/// 3. Validate the result as an absolute URL
pub struct TemplateResolver {
    /// Prefix for templates without a scheme
    base_url: Option<String>,

    /// Default headers indexed by template
    headers: Arc<DashMap<String, Headers>>,
}

impl TemplateResolver {
    /// Create a resolver without a base URL
    pub fn new() -> Self {
        Self {
            base_url: None,
            headers: Arc::new(DashMap::new()),
        }
    }

    /// Create a resolver that joins relative templates onto `base_url`
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            headers: Arc::new(DashMap::new()),
        }
    }

    /// Register default headers for a template
    pub fn register_headers(&self, template: impl Into<String>, headers: Headers) {
        let template = template.into();
        tracing::debug!(template = %template, count = headers.len(), "Registered default headers");
        self.headers.insert(template, headers);
    }

    /// Substitute placeholders without joining or validating
    pub fn expand(template: &str, params: &Params) -> Result<String> {
        let mut missing: Option<String> = None;

        let expanded = PLACEHOLDER_PATTERN.replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            match params.get(name) {
                Some(value) => {
                    utf8_percent_encode(&value_to_param(value), PATH_SEGMENT).to_string()
                }
                None => {
                    if missing.is_none() {
                        missing = Some(name.to_string());
                    }
                    String::new()
                }
            }
        });

        match missing {
            Some(name) => Err(AdapterError::ResolverError(format!(
                "missing parameter '{}' for template '{}'",
                name, template
            ))),
            None => Ok(expanded.into_owned()),
        }
    }

    fn join(&self, path: &str) -> String {
        match &self.base_url {
            Some(base) if !SCHEME_PATTERN.is_match(path) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            _ => path.to_string(),
        }
    }
}

impl Default for TemplateResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for TemplateResolver {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            headers: Arc::clone(&self.headers),
        }
    }
}

impl UrlResolver for TemplateResolver {
    fn headers(&self, template: &str) -> Option<Headers> {
        self.headers.get(template).map(|entry| entry.value().clone())
    }

    fn url(&self, template: &str, params: &Params) -> Result<String> {
        let expanded = Self::expand(template, params)?;
        let joined = self.join(&expanded);

        let parsed = url::Url::parse(&joined).map_err(|e| {
            AdapterError::ResolverError(format!("invalid URL '{}': {}", joined, e))
        })?;

        tracing::trace!(template = %template, url = %parsed, "Resolved URL template");
        Ok(parsed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: serde_json::Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_expand_placeholders() {
        let p = params(json!({"tenant": "acme", "username": "alice"}));
        assert_eq!(
            TemplateResolver::expand("/tenants/{tenant}/login", &p).unwrap(),
            "/tenants/acme/login"
        );
    }

    #[test]
    fn test_expand_encodes_values() {
        let p = params(json!({"user": "a b/c"}));
        assert_eq!(
            TemplateResolver::expand("/users/{user}", &p).unwrap(),
            "/users/a%20b%2Fc"
        );
    }

    #[test]
    fn test_url_keeps_spaces_as_path_escapes() {
        let resolver = TemplateResolver::with_base_url("https://auth.example.com");
        let url = resolver
            .url(
                "/users/{username}/session",
                &params(json!({"username": "john doe"})),
            )
            .unwrap();
        assert_eq!(url, "https://auth.example.com/users/john%20doe/session");

        let parsed = url::Url::parse(&url).unwrap();
        let segments: Vec<&str> = parsed.path_segments().unwrap().collect();
        assert_eq!(segments, vec!["users", "john%20doe", "session"]);

        let url = resolver
            .url("/tags/{tag}", &params(json!({"tag": "a+b?"})))
            .unwrap();
        assert_eq!(url, "https://auth.example.com/tags/a+b%3F");
    }

    #[test]
    fn test_expand_missing_param() {
        let err = TemplateResolver::expand("/tenants/{tenant}/login", &Params::new()).unwrap_err();
        assert!(matches!(err, AdapterError::ResolverError(_)));
        assert!(err.to_string().contains("'tenant'"));
    }

    #[test]
    fn test_url_with_base() {
        let resolver = TemplateResolver::with_base_url("https://auth.example.com/api/");
        let url = resolver
            .url("/tenants/{tenant}/login", &params(json!({"tenant": "acme"})))
            .unwrap();
        assert_eq!(url, "https://auth.example.com/api/tenants/acme/login");
    }

    #[test]
    fn test_absolute_template_ignores_base() {
        let resolver = TemplateResolver::with_base_url("https://auth.example.com");
        let url = resolver
            .url("https://other.example.com/login", &Params::new())
            .unwrap();
        assert_eq!(url, "https://other.example.com/login");
    }

    #[test]
    fn test_relative_template_without_base_is_rejected() {
        let resolver = TemplateResolver::new();
        let err = resolver.url("/login", &Params::new()).unwrap_err();
        assert!(matches!(err, AdapterError::ResolverError(_)));
    }

    #[test]
    fn test_registered_headers() {
        let resolver = TemplateResolver::new();
        assert!(resolver.headers("/login").is_none());

        let mut headers = Headers::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        resolver.register_headers("/login", headers.clone());

        assert_eq!(resolver.headers("/login"), Some(headers));
        assert!(resolver.headers("/logout").is_none());
    }

    #[test]
    fn test_clone_shares_header_registry() {
        let resolver = TemplateResolver::new();
        let clone = resolver.clone();
        clone.register_headers("/login", Headers::new());
        assert!(resolver.headers("/login").is_some());
    }
}
