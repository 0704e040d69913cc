//! PostgreSQL invoice store.

use crate::error::InvoiceError;
use crate::models::{Invoice, InvoiceStatus, LineItem, NewInvoice};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::repository::InvoiceRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Invoice columns joined with (optional) item columns; one row per item,
/// or a single row with NULL item columns for an invoice without items.
const SELECT_INVOICES_WITH_ITEMS: &str = r#"
    SELECT i.id, i.number, i.customer_id, i.total_amount, i.status, i.issued_at, i.printed_at,
           it.id AS item_id, it.product_id, it.description, it.quantity, it.unit_price
    FROM invoices i
    LEFT JOIN invoice_items it ON it.invoice_id = i.id
"#;

#[derive(Debug, FromRow)]
struct InvoiceItemRow {
    id: Uuid,
    number: String,
    customer_id: Uuid,
    total_amount: Decimal,
    status: String,
    issued_at: DateTime<Utc>,
    printed_at: Option<DateTime<Utc>>,
    item_id: Option<i64>,
    product_id: Option<Uuid>,
    description: Option<String>,
    quantity: Option<i32>,
    unit_price: Option<Decimal>,
}

impl InvoiceItemRow {
    fn invoice(&self) -> Result<Invoice, InvoiceError> {
        let status = self
            .status
            .parse::<InvoiceStatus>()
            .map_err(InvoiceError::StoreUnavailable)?;

        Ok(Invoice {
            id: self.id,
            number: self.number.clone(),
            customer_id: self.customer_id,
            total_amount: self.total_amount,
            status,
            issued_at: self.issued_at,
            printed_at: self.printed_at,
            items: Vec::new(),
        })
    }

    fn into_item(self) -> Option<LineItem> {
        Some(LineItem {
            id: self.item_id?,
            invoice_id: self.id,
            product_id: self.product_id?,
            description: self.description?,
            quantity: self.quantity?,
            unit_price: self.unit_price?,
        })
    }
}

/// Fold joined rows, already ordered by invoice, into invoices with items.
fn group_rows(rows: Vec<InvoiceItemRow>) -> Result<Vec<Invoice>, InvoiceError> {
    let mut invoices: Vec<Invoice> = Vec::new();

    for row in rows {
        if invoices.last().map(|i| i.id) != Some(row.id) {
            invoices.push(row.invoice()?);
        }
        if let (Some(item), Some(invoice)) = (row.into_item(), invoices.last_mut()) {
            invoice.items.push(item);
        }
    }

    Ok(invoices)
}

fn store_error(context: &str, e: sqlx::Error) -> InvoiceError {
    InvoiceError::StoreUnavailable(anyhow::anyhow!("{}: {}", context, e))
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "faturamento-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, InvoiceError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| store_error("Failed to connect", e))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl InvoiceRepository for Database {
    #[instrument(skip(self))]
    async fn ensure_schema(&self) -> Result<(), InvoiceError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| InvoiceError::StoreUnavailable(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), InvoiceError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("Health check failed", e))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_invoices_with_items(&self) -> Result<Vec<Invoice>, InvoiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let sql = format!(
            "{} ORDER BY i.issued_at, i.id, it.id",
            SELECT_INVOICES_WITH_ITEMS
        );
        let rows = sqlx::query_as::<_, InvoiceItemRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("Failed to list invoices", e))?;

        timer.observe_duration();

        group_rows(rows)
    }

    #[instrument(skip(self), fields(invoice_id = %id))]
    async fn get_invoice_with_items(&self, id: Uuid) -> Result<Option<Invoice>, InvoiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let sql = format!("{} WHERE i.id = $1 ORDER BY it.id", SELECT_INVOICES_WITH_ITEMS);
        let rows = sqlx::query_as::<_, InvoiceItemRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error("Failed to get invoice", e))?;

        timer.observe_duration();

        Ok(group_rows(rows)?.pop())
    }

    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id, items = invoice.items.len()))]
    async fn create_invoice_with_items(
        &self,
        invoice: NewInvoice,
    ) -> Result<Invoice, InvoiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("Failed to begin transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO invoices (id, number, customer_id, total_amount, status, issued_at, printed_at)
            VALUES ($1, $2, $3, $4, $5, $6, NULL)
            "#,
        )
        .bind(invoice.id)
        .bind(&invoice.number)
        .bind(invoice.customer_id)
        .bind(invoice.total_amount)
        .bind(invoice.status.as_str())
        .bind(invoice.issued_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("Failed to create invoice", e))?;

        let mut item_ids = Vec::with_capacity(invoice.items.len());
        for item in &invoice.items {
            let item_id = sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO invoice_items (invoice_id, product_id, description, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(invoice.id)
            .bind(item.product_id)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.unit_price)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| store_error("Failed to create invoice item", e))?;

            item_ids.push(item_id);
        }

        // Dropping `tx` on any error above rolls the whole invoice back.
        tx.commit()
            .await
            .map_err(|e| store_error("Failed to commit invoice", e))?;

        timer.observe_duration();

        info!(invoice_id = %invoice.id, number = %invoice.number, "Invoice created");

        Ok(invoice.into_invoice(item_ids))
    }

    #[instrument(skip(self), fields(invoice_id = %id, status = %status))]
    async fn update_print_status(
        &self,
        id: Uuid,
        status: InvoiceStatus,
        printed_at: Option<DateTime<Utc>>,
    ) -> Result<bool, InvoiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_print_status"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET status = $2,
                printed_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(printed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("Failed to update invoice", e))?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(invoice_id = %id))]
    async fn delete_invoice(&self, id: Uuid) -> Result<bool, InvoiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_invoice"])
            .start_timer();

        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("Failed to delete invoice", e))?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(invoice_id = %id, "Invoice deleted");
        }

        Ok(deleted)
    }
}
