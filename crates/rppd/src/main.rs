// # rppd - Registry Daemon
//
// Thin HTTP integration layer over rpp-core. The daemon is responsible for:
//
// 1. Reading configuration from environment variables
// 2. Initializing the runtime and the in-memory store
// 3. Seeding registrar accounts and the reserved registry records
// 4. Moving HTTP requests to and from the registry core
//
// All registry logic lives in rpp-core; nothing here inspects paths or
// bodies beyond handing them over.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `RPP_LISTEN`: Socket address to bind (default 127.0.0.1:8080)
// - `RPP_TLD`: Top-level label the registry serves (default example)
// - `RPP_MAX_DOMAINS`: Domain quota (default 5000)
// - `RPP_MAX_CONTACTS`: Contact quota (default 5000)
// - `RPP_REGISTRARS`: Comma-separated handle:secret pairs (required)
// - `RPP_OPERATOR_NAME`: Name of the seeded operator contact
// - `RPP_LOG_LEVEL`: trace, debug, info, warn or error (default info)
//
// ## Example
//
// ```bash
// export RPP_TLD=example
// export RPP_REGISTRARS=5:hunter2,6:hunter3
//
// rppd
// ```

use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::State;
use axum::http::{self, StatusCode, header};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use rpp_core::protocol::{CLTRID_HEADER, CONTENT_TYPE, SVTRID_HEADER};
use rpp_core::traits::{NewDomain, RegistryStore, StoreTx as _};
use rpp_core::{MemoryStore, Method, Registry, RegistryConfig, Request};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Largest request body the daemon accepts
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum RppExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<RppExitCode> for ExitCode {
    fn from(code: RppExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    listen: SocketAddr,
    registry: RegistryConfig,
    registrars: Vec<(u32, String)>,
    operator_name: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let mut registry = RegistryConfig::default();
        if let Ok(tld) = env::var("RPP_TLD") {
            registry.tld = tld;
        }
        if let Ok(max) = env::var("RPP_MAX_DOMAINS") {
            registry.max_domains = max
                .parse()
                .with_context(|| format!("RPP_MAX_DOMAINS is not a number: {max}"))?;
        }
        if let Ok(max) = env::var("RPP_MAX_CONTACTS") {
            registry.max_contacts = max
                .parse()
                .with_context(|| format!("RPP_MAX_CONTACTS is not a number: {max}"))?;
        }

        let listen = env::var("RPP_LISTEN").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let listen = listen
            .parse()
            .with_context(|| format!("RPP_LISTEN is not a socket address: {listen}"))?;

        let registrars = env::var("RPP_REGISTRARS")
            .context("RPP_REGISTRARS is required. Set it via: export RPP_REGISTRARS=5:secret")?
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(parse_registrar)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            listen,
            registry,
            registrars,
            operator_name: env::var("RPP_OPERATOR_NAME")
                .unwrap_or_else(|_| "Registry Operator".to_string()),
            log_level: env::var("RPP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.registry.validate().map_err(|e| anyhow::anyhow!("{e}"))?;

        if self.registrars.is_empty() {
            anyhow::bail!(
                "RPP_REGISTRARS must contain at least one handle:secret pair. \
                Set it via: export RPP_REGISTRARS=5:secret"
            );
        }
        for (handle, secret) in &self.registrars {
            if secret.is_empty() {
                anyhow::bail!("Registrar {handle} has an empty secret");
            }
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "RPP_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

/// Parse one `handle:secret` registrar entry
fn parse_registrar(entry: &str) -> Result<(u32, String)> {
    let (handle, secret) = entry
        .split_once(':')
        .with_context(|| format!("Registrar entry '{entry}' is not handle:secret"))?;
    let handle = handle
        .parse()
        .with_context(|| format!("Registrar handle '{handle}' is not a number"))?;
    Ok((handle, secret.to_string()))
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return RppExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {e}");
        return RppExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return RppExitCode::ConfigError.into();
    }

    info!("Starting rppd daemon");
    info!(
        tld = %config.registry.tld,
        registrars = config.registrars.len(),
        "Configuration loaded"
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            return RppExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {e}");
            RppExitCode::RuntimeError
        } else {
            RppExitCode::CleanShutdown
        }
    })
    .into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let store = MemoryStore::new();
    seed(&store, &config).await?;

    let registry = Registry::new(Arc::new(store), config.registry)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    let registry = Arc::new(registry);

    let app = axum::Router::new()
        .fallback(handle)
        .with_state(registry);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;
    info!(listen = %config.listen, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await
        .context("Server error")?;

    info!("Shutting down daemon");
    Ok(())
}

/// Seed the store with registrar accounts and the reserved records
///
/// The operator contact and the registry's own domain exist before the
/// first request, mirroring what a provisioned production database holds.
async fn seed(store: &MemoryStore, config: &Config) -> Result<()> {
    for (handle, secret) in &config.registrars {
        store.add_registrar(*handle, secret).await;
        info!(registrar = handle, "Registrar provisioned");
    }

    let operator = config.registrars[0].0;
    let nic = config.registry.nic_domain();

    let mut tx = store
        .begin()
        .await
        .map_err(|e| anyhow::anyhow!("Seeding failed: {e}"))?;
    let handle = tx
        .insert_contact(&config.operator_name)
        .await
        .map_err(|e| anyhow::anyhow!("Seeding failed: {e}"))?;
    tx.insert_domain(NewDomain {
        name: nic.clone(),
        holder: handle.to_string(),
        tech: handle.to_string(),
        admin: handle.to_string(),
        registrar: operator,
    })
    .await
    .map_err(|e| anyhow::anyhow!("Seeding failed: {e}"))?;
    tx.commit()
        .await
        .map_err(|e| anyhow::anyhow!("Seeding failed: {e}"))?;

    info!(domain = %nic, operator_contact = handle, "Registry records seeded");
    Ok(())
}

/// Bridge one HTTP exchange to the registry core
async fn handle(
    State(registry): State<Arc<Registry>>,
    req: http::Request<Body>,
) -> http::Response<Body> {
    let (parts, body) = req.into_parts();

    let mut request = Request::new(Method::parse(parts.method.as_str()), parts.uri.path());
    request.authorization = header_string(&parts.headers, header::AUTHORIZATION.as_str());
    request.cltrid = header_string(&parts.headers, CLTRID_HEADER);
    request.body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) if bytes.is_empty() => None,
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            error!("Failed to read request body: {e}");
            return plain_error(StatusCode::BAD_REQUEST);
        }
    };

    let response = registry.handle(request).await;

    let status = StatusCode::from_u16(response.status_code)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = http::Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, CONTENT_TYPE)
        .header(SVTRID_HEADER, &response.svtrid);
    if let Some(cltrid) = &response.cltrid {
        builder = builder.header(CLTRID_HEADER, cltrid);
    }
    match builder.body(Body::from(response.to_body())) {
        Ok(resp) => resp,
        Err(e) => {
            // Only reachable when a client header does not round-trip
            error!("Failed to build response: {e}");
            plain_error(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn header_string(headers: &http::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn plain_error(status: StatusCode) -> http::Response<Body> {
    let mut resp = http::Response::new(Body::empty());
    *resp.status_mut() = status;
    resp
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to setup SIGTERM handler: {e}");
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to setup SIGINT handler: {e}");
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM"),
        _ = sigint.recv() => info!("Received SIGINT"),
    }
}

/// Wait for shutdown signals (CTRL-C only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to wait for CTRL-C: {e}");
    }
}
