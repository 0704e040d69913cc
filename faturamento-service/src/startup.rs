//! Application startup and lifecycle management.

use axum::extract::Request;
use axum::middleware::from_fn;
use axum::{
    routing::{get, post},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{make_request_span, metrics_middleware, request_id_middleware};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::FaturamentoConfig;
use crate::handlers;
use crate::handlers::invoices::INVOICES_PATH;
use crate::services::{Database, InvoiceRepository, InvoiceService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub invoices: InvoiceService,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Connect to Postgres, apply migrations and bind the listener.
    ///
    /// A schema that cannot be applied is fatal.
    pub async fn build(config: FaturamentoConfig) -> Result<Self, AppError> {
        let db = Database::new(
            config.database.url.expose_secret(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to Postgres: {}", e);
            AppError::DatabaseError(e.into())
        })?;

        db.ensure_schema().await.map_err(|e| {
            tracing::error!("Failed to apply database migrations: {}", e);
            AppError::DatabaseError(e.into())
        })?;

        Self::build_with_repository(config, Arc::new(db)).await
    }

    /// Build on top of an already prepared store. Port 0 binds a random port.
    pub async fn build_with_repository(
        config: FaturamentoConfig,
        repository: Arc<dyn InvoiceRepository>,
    ) -> Result<Self, AppError> {
        let state = AppState {
            invoices: InvoiceService::new(repository),
        };

        let addr = format!("{}:{}", config.common.host, config.common.port);
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Faturamento service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: router(state),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until the process is stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Serve until `signal` resolves, then drain in-flight requests.
    pub async fn run_with_shutdown<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}

/// Routes plus the request-id, metrics and tracing layers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .route(
            INVOICES_PATH,
            get(handlers::invoices::list_invoices).post(handlers::invoices::create_invoice),
        )
        .route(
            &format!("{}/:id", INVOICES_PATH),
            get(handlers::invoices::get_invoice),
        )
        .route(
            &format!("{}/:id/imprimir", INVOICES_PATH),
            post(handlers::invoices::print_invoice),
        )
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            make_request_span(request)
        }))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryInvoiceRepository;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use tower::ServiceExt;

    fn test_router() -> Router {
        router(AppState {
            invoices: InvoiceService::new(Arc::new(InMemoryInvoiceRepository::new())),
        })
    }

    #[tokio::test]
    async fn print_route_requires_post() {
        let response = test_router()
            .oneshot(
                HttpRequest::builder()
                    .method("GET")
                    .uri(format!("{}/{}/imprimir", INVOICES_PATH, uuid::Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn malformed_id_is_rejected() {
        let response = test_router()
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri(format!("{}/not-a-uuid/imprimir", INVOICES_PATH))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let response = test_router()
            .oneshot(
                HttpRequest::builder()
                    .uri(INVOICES_PATH)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }
}
