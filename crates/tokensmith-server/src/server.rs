use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{Router, routing::get};
use tokensmith_auth::{
    InMemoryRefreshCredentialStorage, RefreshCredentialStorage, RotationEngine, TokenState,
    token_routes,
};
use tokensmith_auth_postgres::{PostgresAuthStorage, mask_password};
use tokensmith_notifications::{AnomalyDispatcher, AnomalyNotifier, sink_from_config};
use tower_http::trace::TraceLayer;

use crate::config::{AppConfig, StorageBackend};
use crate::handlers;

pub struct TokensmithServer {
    addr: SocketAddr,
    app: Router,
}

/// Wires storage, the notification dispatcher and the rotation engine into
/// a router. Must run inside a Tokio runtime.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let storage = build_storage(cfg).await?;

    let sink = sink_from_config(&cfg.notifications).context("notification sink")?;
    let notifier: Arc<dyn AnomalyNotifier> =
        Arc::new(AnomalyDispatcher::spawn(sink, &cfg.notifications));

    let engine = RotationEngine::from_config(&cfg.auth, storage, notifier)
        .context("rotation engine")?;
    let state = TokenState::new(
        Arc::new(engine),
        cfg.auth.cookies.clone(),
        cfg.auth.client_ip,
    );

    Ok(Router::new()
        .route("/healthz", get(handlers::healthz))
        .merge(token_routes().with_state(state))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri().path(),
                        http.status_code = Empty,
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        ))
}

async fn build_storage(cfg: &AppConfig) -> anyhow::Result<Arc<dyn RefreshCredentialStorage>> {
    match cfg.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory credential storage; sessions end on restart");
            Ok(Arc::new(InMemoryRefreshCredentialStorage::new()))
        }
        StorageBackend::Postgres => {
            let pg = &cfg.storage.postgres;
            tracing::info!(url = %mask_password(&pg.url), "Connecting to PostgreSQL");
            let storage = PostgresAuthStorage::connect(pg)
                .await
                .context("postgres connection")?;
            storage
                .ensure_schema()
                .await
                .context("postgres schema")?;
            Ok(Arc::new(storage.refresh_credential_store()))
        }
    }
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub async fn build(self) -> anyhow::Result<TokensmithServer> {
        let app = build_app(&self.config).await?;
        Ok(TokensmithServer {
            addr: self.addr,
            app,
        })
    }
}

impl TokensmithServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        // Peer addresses feed the origin extractor.
        axum::serve(
            listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
