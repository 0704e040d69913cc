//! Invoice endpoints under `/api/notas-fiscais`.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::dtos::{CreateInvoiceRequest, InvoiceResponse, PrintInvoiceResponse};
use crate::services::PRINTED_MESSAGE;
use crate::startup::AppState;

pub const INVOICES_PATH: &str = "/api/notas-fiscais";

/// List every invoice with its items.
pub async fn list_invoices(
    State(state): State<AppState>,
) -> Result<Json<Vec<InvoiceResponse>>, AppError> {
    let invoices = state.invoices.list_invoices().await?;

    tracing::debug!(count = invoices.len(), "Listing invoices");

    Ok(Json(
        invoices.into_iter().map(InvoiceResponse::from).collect(),
    ))
}

/// Issue a new draft invoice. Responds 201 with a `Location` to re-fetch it.
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<InvoiceResponse>), AppError> {
    tracing::info!(
        customer_id = %payload.customer_id,
        items = payload.items.len(),
        "Creating invoice"
    );

    let invoice = state.invoices.create_invoice(payload.into()).await?;
    let location = format!("{}/{}", INVOICES_PATH, invoice.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(InvoiceResponse::from(invoice)),
    ))
}

/// Fetch one invoice with its items.
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state.invoices.get_invoice(invoice_id).await?;
    Ok(Json(InvoiceResponse::from(invoice)))
}

/// Mark an invoice printed.
pub async fn print_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<PrintInvoiceResponse>, AppError> {
    tracing::info!(invoice_id = %invoice_id, "Printing invoice");

    let invoice = state.invoices.print_invoice(invoice_id).await?;

    Ok(Json(PrintInvoiceResponse {
        invoice: InvoiceResponse::from(invoice),
        message: PRINTED_MESSAGE.to_string(),
    }))
}
