use faturamento_service::config::{DatabaseConfig, FaturamentoConfig};
use faturamento_service::services::{InMemoryInvoiceRepository, InvoiceRepository};
use faturamento_service::startup::Application;
use secrecy::Secret;
use std::sync::Arc;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    pub repository: Arc<dyn InvoiceRepository>,
}

pub fn test_config(database_url: &str) -> FaturamentoConfig {
    FaturamentoConfig {
        common: service_core::config::Config {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port
            environment: "test".to_string(),
            log_level: "debug".to_string(),
        },
        database: DatabaseConfig {
            url: Secret::new(database_url.to_string()),
            max_connections: 5,
            min_connections: 1,
        },
        otlp_endpoint: None,
    }
}

impl TestApp {
    /// Spawn the service on a random port, backed by an in-memory store.
    pub async fn spawn() -> Self {
        Self::spawn_with_repository(Arc::new(InMemoryInvoiceRepository::new())).await
    }

    pub async fn spawn_with_repository(repository: Arc<dyn InvoiceRepository>) -> Self {
        let config = test_config("postgres://unused");

        let app = Application::build_with_repository(config, repository.clone())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
            repository,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn create_invoice(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/notas-fiscais"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Post a body as written, so numeric literals reach the server untouched.
    pub async fn create_invoice_raw(&self, body: String) -> reqwest::Response {
        self.client
            .post(self.url("/api/notas-fiscais"))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn list_invoices(&self) -> Vec<serde_json::Value> {
        self.client
            .get(self.url("/api/notas-fiscais"))
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .expect("Failed to parse JSON")
    }

    pub async fn print_invoice(&self, id: &str) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/notas-fiscais/{}/imprimir", id)))
            .send()
            .await
            .expect("Failed to execute request")
    }
}
