use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::{Input, Password};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::auth::AdapterOptions;
use crate::error::AdapterError;
use crate::models::{Headers, Params};

/// Top-level key of the authentication section in the config store
pub const CONFIG_KEY_AUTH: &str = "authentication";

/// Key of the HTTP adapter table inside the authentication section
pub const CONFIG_KEY_ADAPTER: &str = "http";

/// Prefix for environment overrides of the config store
pub const ENV_PREFIX: &str = "HTTP_AUTH";

// === Config store ===

/// Build the config store from an optional TOML file plus environment
///
/// Environment keys use `__` as separator, e.g.
/// `HTTP_AUTH__AUTHENTICATION__HTTP__URL`.
pub fn load_store(path: Option<&Path>) -> Result<::config::Config> {
    let mut builder = ::config::Config::builder();

    if let Some(path) = path {
        tracing::info!("Loading adapter configuration from {}", path.display());
        builder = builder.add_source(::config::File::from(path.to_path_buf()).required(true));
    }

    builder = builder.add_source(
        ::config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__"),
    );

    builder.build().context("Failed to load configuration store")
}

/// Read the `authentication.http` option set from a config store
///
/// Returns `None` when the section is absent.
pub fn options_from_store(store: &::config::Config) -> crate::error::Result<Option<AdapterOptions>> {
    let auth: Value = match store.get(CONFIG_KEY_AUTH) {
        Ok(value) => value,
        Err(::config::ConfigError::NotFound(_)) => return Ok(None),
        Err(e) => {
            return Err(AdapterError::ConfigError(format!(
                "Failed to read '{}' section: {}",
                CONFIG_KEY_AUTH, e
            )))
        }
    };

    let section = match auth.get(CONFIG_KEY_ADAPTER) {
        Some(Value::Null) | None => return Ok(None),
        Some(section) => section.clone(),
    };

    serde_json::from_value(section).map(Some).map_err(|e| {
        AdapterError::ConfigError(format!(
            "Invalid '{}.{}' options: {}",
            CONFIG_KEY_AUTH, CONFIG_KEY_ADAPTER, e
        ))
    })
}

// === CLI settings ===

/// HTTP authentication adapter - perform one authentication request
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Authentication endpoint URL (or template when a base URL is set)
    #[arg(long, env = "AUTH_URL")]
    pub url: Option<String>,

    /// Base URL for relative URL templates
    #[arg(long, env = "AUTH_BASE_URL")]
    pub base_url: Option<String>,

    /// HTTP method (POST sends a form body, GET a query string)
    #[arg(short = 'X', long, env = "AUTH_METHOD")]
    pub method: Option<String>,

    /// Identity to authenticate as
    #[arg(short = 'u', long, env = "AUTH_IDENTITY")]
    pub identity: Option<String>,

    /// Credential (prompted for when absent)
    #[arg(short = 'p', long, env = "AUTH_CREDENTIAL", hide_env_values = true)]
    pub credential: Option<String>,

    /// Parameter name for the identity
    #[arg(long, env = "AUTH_IDENTITY_PARAM")]
    pub identity_param: Option<String>,

    /// Parameter name for the credential
    #[arg(long, env = "AUTH_CREDENTIAL_PARAM")]
    pub credential_param: Option<String>,

    /// Extra request parameter (key=value), repeatable
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Extra request header (Name: value), repeatable
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE")]
    pub headers: Vec<String>,

    /// TOML file with an [authentication.http] table
    #[arg(short = 'c', long, env = "AUTH_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// HTTP connect timeout in seconds
    #[arg(long, env = "HTTP_CONNECT_TIMEOUT", default_value = "10")]
    pub connect_timeout: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30")]
    pub http_timeout: u64,

    /// HTTP max retries for 429/5xx and network errors
    #[arg(long, env = "HTTP_MAX_RETRIES", default_value = "0")]
    pub http_retries: u32,
}

#[derive(Clone, Debug)]
pub struct Settings {
    // Adapter options given on the command line
    pub url: Option<String>,
    pub base_url: Option<String>,
    pub method: Option<String>,
    pub identity_param: Option<String>,
    pub credential_param: Option<String>,
    pub params: Params,
    pub headers: Headers,

    // Credentials
    pub identity: Option<String>,
    pub credential: Option<String>,

    // Config store
    pub config_file: Option<PathBuf>,

    // HTTP client
    pub http_max_connections: usize,
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,
    pub http_max_retries: u32,

    // Logging
    pub log_level: String,
    pub log_json: bool,
}

impl Settings {
    /// Load settings with priority: CLI > ENV > .env > defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_args(CliArgs::parse())
    }

    pub fn from_args(args: CliArgs) -> Result<Self> {
        let params = args
            .params
            .iter()
            .map(|raw| parse_param(raw))
            .collect::<Result<Params>>()?;

        let headers = args
            .headers
            .iter()
            .map(|raw| parse_header(raw))
            .collect::<Result<Headers>>()?;

        Ok(Settings {
            url: args.url,
            base_url: args.base_url,
            method: args.method,
            identity_param: args.identity_param,
            credential_param: args.credential_param,
            params,
            headers,
            identity: args.identity,
            credential: args.credential,
            config_file: args.config_file.map(|s| expand_tilde(&s)),
            http_max_connections: std::env::var("HTTP_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4),
            http_connect_timeout: args.connect_timeout,
            http_request_timeout: args.http_timeout,
            http_max_retries: args.http_retries,
            log_level: args.log_level,
            log_json: args.log_json,
        })
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.config_file {
            if !path.exists() {
                anyhow::bail!("AUTH_CONFIG_FILE does not exist: {}", path.display());
            }
        }

        Ok(())
    }

    /// Option set built from the command line; empty fields stay absent
    pub fn adapter_options(&self) -> AdapterOptions {
        let mut options = AdapterOptions::new();
        options.url = self.url.clone();
        options.method = self.method.clone();
        options.param_name_identity = self.identity_param.clone();
        options.param_name_credential = self.credential_param.clone();
        if !self.params.is_empty() {
            options.params = Some(self.params.clone());
        }
        if !self.headers.is_empty() {
            options.headers = Some(self.headers.clone());
        }
        options
    }

    /// Identity from settings, prompting when missing
    pub fn resolve_identity(&self) -> Result<String> {
        match &self.identity {
            Some(identity) => Ok(identity.clone()),
            None => Input::new()
                .with_prompt("Identity (AUTH_IDENTITY)")
                .interact_text()
                .context("Failed to read identity"),
        }
    }

    /// Credential from settings, prompting when missing
    pub fn resolve_credential(&self) -> Result<String> {
        match &self.credential {
            Some(credential) => Ok(credential.clone()),
            None => Password::new()
                .with_prompt("Credential (AUTH_CREDENTIAL)")
                .interact()
                .context("Failed to read credential"),
        }
    }
}

/// Expand tilde (~) in file paths to user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Parse `key=value`; values that parse as JSON scalars keep their type
fn parse_param(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("Invalid parameter '{}', expected KEY=VALUE", raw))?;

    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("Invalid parameter '{}': empty key", raw);
    }

    let value = match serde_json::from_str::<Value>(value) {
        Ok(v @ (Value::Bool(_) | Value::Number(_) | Value::Null)) => v,
        _ => Value::String(value.to_string()),
    };

    Ok((key.to_string(), value))
}

/// Parse `Name: value`
fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .with_context(|| format!("Invalid header '{}', expected 'Name: value'", raw))?;

    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Invalid header '{}': empty name", raw);
    }

    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QueryParams;
    use serde_json::json;

    fn store_from_toml(toml: &str) -> ::config::Config {
        ::config::Config::builder()
            .add_source(::config::File::from_str(toml, ::config::FileFormat::Toml))
            .build()
            .unwrap()
    }

    #[test]
    fn test_options_from_store() {
        let store = store_from_toml(
            r#"
            [authentication.http]
            url = "https://auth.example.com/login"
            method = "GET"
            timeout = 5

            [authentication.http.params]
            client_id = "web"

            [authentication.http.headers]
            Accept = "application/json"
            "#,
        );

        let options = options_from_store(&store).unwrap().unwrap();
        assert_eq!(options.url.as_deref(), Some("https://auth.example.com/login"));
        assert_eq!(options.method.as_deref(), Some("GET"));
        assert_eq!(options.params.unwrap()["client_id"], json!("web"));
        assert_eq!(options.headers.unwrap().len(), 1);
        assert_eq!(options.request_options["timeout"], json!(5));
    }

    #[test]
    fn test_options_from_store_camel_case_keys() {
        let store = store_from_toml(
            r#"
            [authentication.http]
            url = "https://auth.example.com/login"
            paramNameIdentity = "email"
            paramNameCredential = "secret"
            "#,
        );

        let options = options_from_store(&store).unwrap().unwrap();
        assert_eq!(options.param_name_identity.as_deref(), Some("email"));
        assert_eq!(options.param_name_credential.as_deref(), Some("secret"));
        assert!(options.request_options.is_empty());
    }

    #[test]
    fn test_options_from_store_keeps_param_order() {
        let store = store_from_toml(
            r#"
            [authentication.http.params]
            zeta = "1"
            alpha = "2"
            mike = "3"
            bravo = "4"
            yankee = "5"
            charlie = "6"
            "#,
        );

        let params = options_from_store(&store).unwrap().unwrap().params.unwrap();
        let keys: Vec<&str> = params.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mike", "bravo", "yankee", "charlie"]);

        let body = QueryParams::from(&params).to_query_string();
        assert_eq!(body, "zeta=1&alpha=2&mike=3&bravo=4&yankee=5&charlie=6");
    }

    #[test]
    fn test_options_from_store_missing_section() {
        let store = store_from_toml("[other]\nkey = 1\n");
        assert!(options_from_store(&store).unwrap().is_none());

        let store = store_from_toml("[authentication.ldap]\nhost = \"x\"\n");
        assert!(options_from_store(&store).unwrap().is_none());
    }

    #[test]
    fn test_options_from_store_invalid_section() {
        let store = store_from_toml("[authentication]\nhttp = 5\n");
        let err = options_from_store(&store).unwrap_err();
        assert!(matches!(err, AdapterError::ConfigError(_)));
    }

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/test/file.toml");
        assert!(path.to_string_lossy().contains("test/file.toml"));
        assert!(!path.to_string_lossy().starts_with("~"));

        let path = expand_tilde("/absolute/path");
        assert_eq!(path, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_tilde_just_tilde() {
        // Just "~" without slash should not expand
        let path = expand_tilde("~");
        assert_eq!(path, PathBuf::from("~"));
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("client_id=web").unwrap(),
            ("client_id".to_string(), json!("web"))
        );
        assert_eq!(
            parse_param("remember=true").unwrap(),
            ("remember".to_string(), json!(true))
        );
        assert_eq!(parse_param("ttl=60").unwrap(), ("ttl".to_string(), json!(60)));
        assert_eq!(
            parse_param("redirect=https://x?a=b").unwrap(),
            ("redirect".to_string(), json!("https://x?a=b"))
        );
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("Accept: application/json").unwrap(),
            ("Accept".to_string(), "application/json".to_string())
        );
        assert_eq!(
            parse_header("X-Trace:abc:def").unwrap(),
            ("X-Trace".to_string(), "abc:def".to_string())
        );
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn test_settings_from_args() {
        let args = CliArgs::parse_from([
            "http-auth",
            "--url",
            "https://auth.example.com/login",
            "-X",
            "GET",
            "-u",
            "alice",
            "--param",
            "client_id=web",
            "-H",
            "Accept: application/json",
        ]);
        let settings = Settings::from_args(args).unwrap();

        assert_eq!(settings.identity.as_deref(), Some("alice"));
        let options = settings.adapter_options();
        assert_eq!(options.url.as_deref(), Some("https://auth.example.com/login"));
        assert_eq!(options.method.as_deref(), Some("GET"));
        assert_eq!(options.params.unwrap()["client_id"], json!("web"));
        assert_eq!(
            options.headers.unwrap().get("Accept").map(String::as_str),
            Some("application/json")
        );
        assert!(options.param_name_identity.is_none());
    }

    #[test]
    fn test_adapter_options_leave_empty_fields_absent() {
        let args = CliArgs::parse_from(["http-auth", "-u", "alice", "-p", "s3cr3t"]);
        let settings = Settings::from_args(args).unwrap();
        let options = settings.adapter_options();

        assert!(options.params.is_none());
        assert!(options.headers.is_none());
        assert_eq!(settings.resolve_credential().unwrap(), "s3cr3t");
    }
}
