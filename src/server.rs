//! Server startup
//!
//! Wires configuration, the shared resolver and the router together and
//! serves plain HTTP, or HTTPS when TLS is on, until Ctrl-C.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, ServerError};
use crate::extraction::{LinkResolver, MessageParser};
use crate::handlers::{router, AppState};

/// How long in-flight HTTPS requests may finish after Ctrl-C
const TLS_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Build the shared state for `config`.
pub fn build_state(config: &Config) -> Result<Arc<AppState>> {
    config.validate()?;
    let resolver = LinkResolver::from_config(&config.resolver_config())?;
    Ok(Arc::new(AppState::new(MessageParser::new(resolver))))
}

/// Load a PEM certificate chain and private key.
pub async fn load_tls(cert: &Path, key: &Path) -> std::result::Result<RustlsConfig, ServerError> {
    // One process-wide provider; a repeated install is a no-op.
    let _ = rustls::crypto::ring::default_provider().install_default();

    RustlsConfig::from_pem_file(cert, key)
        .await
        .map_err(|source| ServerError::Tls {
            cert: cert.display().to_string(),
            key: key.display().to_string(),
            source,
        })
}

/// Bind and serve until a shutdown signal arrives.
pub async fn serve(config: Config) -> Result<()> {
    let state = build_state(&config)?;
    let addr = config.listen_addr().await?;
    let app = router(state, &config);

    info!(
        %addr,
        tls = config.ssl,
        max_concurrent_fetches = config.max_concurrent_fetches,
        fetch_timeout_secs = config.fetch_timeout_secs,
        "Starting server"
    );

    match config.tls_paths() {
        Some((cert, key)) => serve_tls(addr, app, cert, key).await?,
        None => serve_plain(addr, app).await?,
    }

    info!("Server stopped");
    Ok(())
}

async fn serve_plain(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    info!("Listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn serve_tls(addr: SocketAddr, app: Router, cert: &Path, key: &Path) -> Result<()> {
    let tls = load_tls(cert, key).await?;

    let handle = Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.graceful_shutdown(Some(TLS_GRACE_PERIOD));
    });

    info!("Listening on https://{addr}");
    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Unable to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, Error};

    #[tokio::test]
    async fn test_load_tls_missing_files() {
        let err = load_tls(
            Path::new("/nonexistent/cert.pem"),
            Path::new("/nonexistent/key.pem"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ServerError::Tls { .. }));
        assert!(err.to_string().contains("/nonexistent/cert.pem"));
    }

    #[tokio::test]
    async fn test_serve_rejects_ssl_without_key_pair() {
        let config = Config {
            ssl: true,
            ..Config::default()
        };

        let err = serve(config).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingTlsPath("SSL_CERT_PATH"))
        ));
    }

    #[tokio::test]
    async fn test_serve_fails_on_unreadable_key_pair() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            ssl: true,
            ssl_cert_path: Some("/nonexistent/cert.pem".into()),
            ssl_key_path: Some("/nonexistent/key.pem".into()),
            ..Config::default()
        };

        let err = serve(config).await.unwrap_err();
        assert!(matches!(err, Error::Server(ServerError::Tls { .. })));
    }
}
