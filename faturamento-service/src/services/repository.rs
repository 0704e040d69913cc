//! Storage contract for invoices and their line items.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::InvoiceError;
use crate::models::{Invoice, InvoiceStatus, NewInvoice};

/// Store owning invoices and their items.
///
/// Reads always return an invoice together with all of its items. Writes of
/// a new invoice and its items are atomic.
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Idempotent schema setup, run once before serving.
    async fn ensure_schema(&self) -> Result<(), InvoiceError>;

    async fn health_check(&self) -> Result<(), InvoiceError>;

    /// Every invoice with its items, oldest first.
    async fn list_invoices_with_items(&self) -> Result<Vec<Invoice>, InvoiceError>;

    async fn get_invoice_with_items(&self, id: Uuid) -> Result<Option<Invoice>, InvoiceError>;

    /// Persist the invoice and all its items in one unit. Returns the stored
    /// invoice with store-assigned item ids.
    async fn create_invoice_with_items(&self, invoice: NewInvoice)
        -> Result<Invoice, InvoiceError>;

    /// Single-row update of the print fields; last write wins. Returns `false`
    /// when no invoice has that id.
    async fn update_print_status(
        &self,
        id: Uuid,
        status: InvoiceStatus,
        printed_at: Option<DateTime<Utc>>,
    ) -> Result<bool, InvoiceError>;

    /// Remove an invoice; its items go with it. Not routed over HTTP.
    async fn delete_invoice(&self, id: Uuid) -> Result<bool, InvoiceError>;
}
