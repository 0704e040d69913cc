//! Domain models for faturamento-service.

mod invoice;
mod line_item;

pub use invoice::{
    invoice_number, total_amount, Invoice, InvoiceStatus, NewInvoice, NUMBER_PREFIX,
};
pub use line_item::{LineItem, NewLineItem};
