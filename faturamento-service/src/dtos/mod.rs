//! Wire types for the invoice HTTP API. Field names are camelCase.
//!
//! Money travels as JSON numbers parsed and written from their literal text,
//! so `10.00` keeps its scale and no value passes through `f64`. Prices sent
//! as strings are accepted too.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Invoice, LineItem, NewLineItem};
use crate::services::CreateInvoice;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub customer_id: Uuid,
    #[serde(default)]
    pub items: Vec<CreateItemRequest>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub product_id: Uuid,
    #[serde(default)]
    pub description: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub unit_price: Decimal,
}

impl From<CreateInvoiceRequest> for CreateInvoice {
    fn from(req: CreateInvoiceRequest) -> Self {
        CreateInvoice {
            customer_id: req.customer_id,
            items: req
                .items
                .into_iter()
                .map(|item| NewLineItem {
                    product_id: item.product_id,
                    description: item.description,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub number: String,
    pub customer_id: Uuid,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total_amount: Decimal,
    pub status: String,
    pub issued_at: DateTime<Utc>,
    pub printed_at: Option<DateTime<Utc>>,
    pub items: Vec<LineItemResponse>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemResponse {
    pub id: i64,
    pub invoice_id: Uuid,
    pub product_id: Uuid,
    pub description: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrintInvoiceResponse {
    pub invoice: InvoiceResponse,
    pub message: String,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id,
            number: invoice.number,
            customer_id: invoice.customer_id,
            total_amount: invoice.total_amount,
            status: invoice.status.as_str().to_string(),
            issued_at: invoice.issued_at,
            printed_at: invoice.printed_at,
            items: invoice.items.into_iter().map(LineItemResponse::from).collect(),
        }
    }
}

impl From<LineItem> for LineItemResponse {
    fn from(item: LineItem) -> Self {
        Self {
            id: item.id,
            invoice_id: item.invoice_id,
            product_id: item.product_id,
            description: item.description,
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}
