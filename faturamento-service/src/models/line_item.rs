//! Line item model for faturamento-service.

use rust_decimal::Decimal;
use uuid::Uuid;

/// Persisted line item. Owned by exactly one invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    /// Assigned by the store.
    pub id: i64,
    pub invoice_id: Uuid,
    pub product_id: Uuid,
    /// Product description as it read when the invoice was issued.
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl LineItem {
    pub fn amount(&self) -> Option<Decimal> {
        Decimal::from(self.quantity).checked_mul(self.unit_price)
    }
}

/// Line item as submitted, before the store assigns an id.
///
/// Quantity and unit price are accepted as given; zero and negative values
/// are not rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    pub product_id: Uuid,
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl NewLineItem {
    /// `quantity × unit_price`, or `None` on decimal overflow.
    pub fn amount(&self) -> Option<Decimal> {
        Decimal::from(self.quantity).checked_mul(self.unit_price)
    }

    pub fn into_line_item(self, id: i64, invoice_id: Uuid) -> LineItem {
        LineItem {
            id,
            invoice_id,
            product_id: self.product_id,
            description: self.description,
            quantity: self.quantity,
            unit_price: self.unit_price,
        }
    }
}
