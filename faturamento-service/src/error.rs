//! Error taxonomy for the invoice lifecycle.

use service_core::error::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("Invoice {0} not found")]
    NotFound(Uuid),

    /// Line amounts or the invoice total do not fit a 96-bit decimal.
    #[error("Invoice amount out of range")]
    AmountOverflow,

    #[error("Invoice store unavailable: {0}")]
    StoreUnavailable(anyhow::Error),
}

impl From<InvoiceError> for AppError {
    fn from(err: InvoiceError) -> Self {
        match err {
            InvoiceError::NotFound(id) => {
                AppError::NotFound(anyhow::anyhow!("Invoice {} not found", id))
            }
            InvoiceError::AmountOverflow => {
                AppError::BadRequest(anyhow::anyhow!("Invoice amount out of range"))
            }
            InvoiceError::StoreUnavailable(e) => {
                tracing::error!(error = %e, "Invoice store unavailable");
                AppError::ServiceUnavailable
            }
        }
    }
}
