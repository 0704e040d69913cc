//! In-memory invoice store.
//!
//! Intended for tests/dev. Same contract as the PostgreSQL store, including
//! the cascade from an invoice to its items.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::RwLock;
use uuid::Uuid;

use super::repository::InvoiceRepository;
use crate::error::InvoiceError;
use crate::models::{Invoice, InvoiceStatus, NewInvoice};

#[derive(Debug, Default)]
struct Tables {
    /// Insertion order doubles as the store-default order.
    invoices: Vec<Invoice>,
    last_item_id: i64,
}

#[derive(Debug, Default)]
pub struct InMemoryInvoiceRepository {
    tables: RwLock<Tables>,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of line items across all invoices.
    pub fn item_count(&self) -> usize {
        self.tables
            .read()
            .map(|t| t.invoices.iter().map(|i| i.items.len()).sum())
            .unwrap_or(0)
    }
}

fn poisoned() -> InvoiceError {
    InvoiceError::StoreUnavailable(anyhow::anyhow!("In-memory store lock poisoned"))
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn ensure_schema(&self) -> Result<(), InvoiceError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<(), InvoiceError> {
        self.tables.read().map(|_| ()).map_err(|_| poisoned())
    }

    async fn list_invoices_with_items(&self) -> Result<Vec<Invoice>, InvoiceError> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables.invoices.clone())
    }

    async fn get_invoice_with_items(&self, id: Uuid) -> Result<Option<Invoice>, InvoiceError> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables.invoices.iter().find(|i| i.id == id).cloned())
    }

    async fn create_invoice_with_items(
        &self,
        invoice: NewInvoice,
    ) -> Result<Invoice, InvoiceError> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;

        if tables.invoices.iter().any(|i| i.id == invoice.id) {
            return Err(InvoiceError::StoreUnavailable(anyhow::anyhow!(
                "Duplicate invoice id {}",
                invoice.id
            )));
        }

        let first = tables.last_item_id + 1;
        let item_ids: Vec<i64> = (first..first + invoice.items.len() as i64).collect();
        tables.last_item_id += invoice.items.len() as i64;

        let stored = invoice.into_invoice(item_ids);
        tables.invoices.push(stored.clone());

        Ok(stored)
    }

    async fn update_print_status(
        &self,
        id: Uuid,
        status: InvoiceStatus,
        printed_at: Option<DateTime<Utc>>,
    ) -> Result<bool, InvoiceError> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;

        match tables.invoices.iter_mut().find(|i| i.id == id) {
            Some(invoice) => {
                invoice.status = status;
                invoice.printed_at = printed_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_invoice(&self, id: Uuid) -> Result<bool, InvoiceError> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let before = tables.invoices.len();
        tables.invoices.retain(|i| i.id != id);
        Ok(tables.invoices.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewLineItem;
    use rust_decimal::Decimal;

    fn draft(items: usize) -> NewInvoice {
        let items = (0..items)
            .map(|n| NewLineItem {
                product_id: Uuid::new_v4(),
                description: format!("Item {}", n),
                quantity: 1,
                unit_price: Decimal::ONE,
            })
            .collect();
        NewInvoice::draft(Uuid::new_v4(), items, Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn item_ids_are_unique_across_invoices() {
        let repo = InMemoryInvoiceRepository::new();
        let a = repo.create_invoice_with_items(draft(2)).await.unwrap();
        let b = repo.create_invoice_with_items(draft(1)).await.unwrap();

        let ids: Vec<i64> = a.items.iter().chain(&b.items).map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn deleting_an_invoice_removes_its_items() {
        let repo = InMemoryInvoiceRepository::new();
        let kept = repo.create_invoice_with_items(draft(1)).await.unwrap();
        let gone = repo.create_invoice_with_items(draft(3)).await.unwrap();
        assert_eq!(repo.item_count(), 4);

        assert!(repo.delete_invoice(gone.id).await.unwrap());
        assert!(!repo.delete_invoice(gone.id).await.unwrap());

        assert_eq!(repo.item_count(), 1);
        assert!(repo.get_invoice_with_items(gone.id).await.unwrap().is_none());
        assert!(repo.get_invoice_with_items(kept.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_of_unknown_invoice_reports_false() {
        let repo = InMemoryInvoiceRepository::new();
        let updated = repo
            .update_print_status(Uuid::new_v4(), InvoiceStatus::Printed, Some(Utc::now()))
            .await
            .unwrap();
        assert!(!updated);
    }
}
