//! Services module for faturamento-service.

pub mod clock;
pub mod database;
pub mod invoices;
pub mod memory;
pub mod metrics;
pub mod repository;

pub use clock::{Clock, FixedClock, SystemClock};
pub use database::Database;
pub use invoices::{CreateInvoice, InvoiceService, PRINTED_MESSAGE};
pub use memory::InMemoryInvoiceRepository;
pub use metrics::{get_metrics, init_metrics};
pub use repository::InvoiceRepository;
