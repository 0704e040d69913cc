//! Invoice lifecycle: issue drafts, list them, print them.

use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use super::metrics::{ERRORS_TOTAL, INVOICES_TOTAL, INVOICE_AMOUNT_TOTAL};
use super::repository::InvoiceRepository;
use crate::error::InvoiceError;
use crate::models::{Invoice, NewInvoice, NewLineItem};

/// Confirmation returned with a printed invoice.
pub const PRINTED_MESSAGE: &str = "Nota impressa com sucesso!";

/// Invoices are billed in Brazilian reais.
const CURRENCY: &str = "BRL";

/// Input for issuing an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub customer_id: Uuid,
    pub items: Vec<NewLineItem>,
}

/// Invoice service. Holds no state of its own; everything lives in the store.
#[derive(Clone)]
pub struct InvoiceService {
    repository: Arc<dyn InvoiceRepository>,
    clock: Arc<dyn Clock>,
}

impl InvoiceService {
    pub fn new(repository: Arc<dyn InvoiceRepository>) -> Self {
        Self::with_clock(repository, Arc::new(SystemClock))
    }

    pub fn with_clock(repository: Arc<dyn InvoiceRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub fn repository(&self) -> &Arc<dyn InvoiceRepository> {
        &self.repository
    }

    pub async fn health_check(&self) -> Result<(), InvoiceError> {
        self.repository.health_check().await
    }

    /// All invoices with their items, in store order.
    #[instrument(skip(self))]
    pub async fn list_invoices(&self) -> Result<Vec<Invoice>, InvoiceError> {
        self.repository
            .list_invoices_with_items()
            .await
            .map_err(record_error)
    }

    #[instrument(skip(self))]
    pub async fn get_invoice(&self, id: Uuid) -> Result<Invoice, InvoiceError> {
        self.repository
            .get_invoice_with_items(id)
            .await
            .map_err(record_error)?
            .ok_or(InvoiceError::NotFound(id))
    }

    /// Issue a draft invoice numbered and stamped from the current clock.
    ///
    /// No minimum item count and no checks on quantity or price. Two invoices
    /// issued within the same second get the same number.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id, items = input.items.len()))]
    pub async fn create_invoice(&self, input: CreateInvoice) -> Result<Invoice, InvoiceError> {
        let draft = NewInvoice::draft(input.customer_id, input.items, self.clock.now())?;

        let invoice = self
            .repository
            .create_invoice_with_items(draft)
            .await
            .map_err(record_error)?;

        INVOICES_TOTAL.with_label_values(&["created"]).inc();
        // Counters only go up; zero and negative totals are not exported.
        if let Some(amount) = invoice.total_amount.to_f64().filter(|a| *a > 0.0) {
            INVOICE_AMOUNT_TOTAL.with_label_values(&[CURRENCY]).inc_by(amount);
        }

        info!(
            invoice_id = %invoice.id,
            number = %invoice.number,
            total_amount = %invoice.total_amount,
            "Invoice issued"
        );

        Ok(invoice)
    }

    /// Mark an invoice printed. Re-printing overwrites `printed_at`.
    ///
    /// Read and write are separate store calls; concurrent prints of the same
    /// invoice resolve by last write.
    #[instrument(skip(self))]
    pub async fn print_invoice(&self, id: Uuid) -> Result<Invoice, InvoiceError> {
        let mut invoice = self.get_invoice(id).await?;

        if invoice.is_printed() {
            warn!(invoice_id = %id, printed_at = ?invoice.printed_at, "Reprinting invoice");
        }

        invoice.mark_printed(self.clock.now());

        let updated = self
            .repository
            .update_print_status(id, invoice.status, invoice.printed_at)
            .await
            .map_err(record_error)?;

        // Deleted between the read and the write.
        if !updated {
            return Err(InvoiceError::NotFound(id));
        }

        INVOICES_TOTAL.with_label_values(&["printed"]).inc();
        info!(invoice_id = %invoice.id, number = %invoice.number, "Invoice printed");

        Ok(invoice)
    }
}

fn record_error(err: InvoiceError) -> InvoiceError {
    if let InvoiceError::StoreUnavailable(_) = err {
        ERRORS_TOTAL.with_label_values(&["store_unavailable"]).inc();
    }
    err
}
