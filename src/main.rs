use anyhow::Result;
use std::sync::Arc;

use http_auth_adapter::auth::{HttpAdapter, StaticCredentials};
use http_auth_adapter::config::{self, Settings};
use http_auth_adapter::{AuthResult, ReqwestTransport, TemplateResolver};

#[tokio::main]
async fn main() -> Result<()> {
    // Load settings first (for log level)
    let settings = Settings::load()?;
    settings.validate()?;

    init_logging(&settings);

    tracing::debug!("Settings: {:?}", redacted(&settings));

    let identity = settings.resolve_identity()?;
    let credential = settings.resolve_credential()?;

    let transport = Arc::new(ReqwestTransport::new(
        settings.http_max_connections,
        settings.http_connect_timeout,
        settings.http_request_timeout,
        settings.http_max_retries,
    )?);

    let store = config::load_store(settings.config_file.as_deref())?;

    let mut builder = HttpAdapter::builder(
        transport,
        Arc::new(StaticCredentials::new(identity, credential)),
    )
    .config_store(store);

    if let Some(base_url) = &settings.base_url {
        builder = builder.resolver(Arc::new(TemplateResolver::with_base_url(base_url)));
    }

    // Command-line options are applied last and win over the config file
    let mut adapter = builder.build()?;
    adapter.set_options(settings.adapter_options());

    let outcome = tokio::select! {
        outcome = adapter.authenticate() => outcome,
        _ = shutdown_signal() => {
            tracing::warn!("Interrupted before the authentication request settled");
            std::process::exit(130);
        }
    };

    match outcome {
        Ok(result) => {
            print_result(&result)?;
            Ok(())
        }
        Err(result) => {
            print_result(&result)?;
            std::process::exit(1);
        }
    }
}

/// Initialize logging with the configured level
fn init_logging(settings: &Settings) {
    let log_level = settings.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    if settings.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_result(result: &AuthResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

/// Settings without the credential, for debug logs
fn redacted(settings: &Settings) -> Settings {
    let mut copy = settings.clone();
    if copy.credential.is_some() {
        copy.credential = Some("***".to_string());
    }
    copy
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
