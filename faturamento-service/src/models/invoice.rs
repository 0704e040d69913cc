//! Invoice model for faturamento-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::line_item::{LineItem, NewLineItem};
use crate::error::InvoiceError;

/// Prefix of every invoice number.
pub const NUMBER_PREFIX: &str = "NF";

/// Invoice status. The only transition is `Draft -> Printed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvoiceStatus {
    Draft,
    Printed,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Printed => "Printed",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(InvoiceStatus::Draft),
            "Printed" => Ok(InvoiceStatus::Printed),
            other => Err(anyhow::anyhow!("Unknown invoice status '{}'", other)),
        }
    }
}

/// Invoice number for an invoice issued at `at`: `NF` + `yyyyMMddHHmmss` (UTC).
///
/// Second resolution only. Invoices issued within the same second share a
/// number, and nothing downstream enforces uniqueness.
pub fn invoice_number(at: DateTime<Utc>) -> String {
    format!("{}{}", NUMBER_PREFIX, at.format("%Y%m%d%H%M%S"))
}

/// Exact decimal sum of `quantity × unit_price`. `None` on overflow.
pub fn total_amount<'a, I>(items: I) -> Option<Decimal>
where
    I: IntoIterator<Item = &'a NewLineItem>,
{
    items
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.amount()?))
}

/// Persisted invoice with its line items in store order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub id: Uuid,
    pub number: String,
    pub customer_id: Uuid,
    pub total_amount: Decimal,
    pub status: InvoiceStatus,
    pub issued_at: DateTime<Utc>,
    pub printed_at: Option<DateTime<Utc>>,
    pub items: Vec<LineItem>,
}

impl Invoice {
    /// Move to `Printed` stamped with `at`.
    ///
    /// Printing an already printed invoice is allowed and overwrites
    /// `printed_at`.
    pub fn mark_printed(&mut self, at: DateTime<Utc>) {
        self.status = InvoiceStatus::Printed;
        self.printed_at = Some(at);
    }

    pub fn is_printed(&self) -> bool {
        self.status == InvoiceStatus::Printed
    }

    /// Sum recomputed from the items; equals `total_amount` for any invoice
    /// built through [`NewInvoice::draft`].
    pub fn items_total(&self) -> Option<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.amount()?))
    }
}

/// Invoice ready to be written, items not yet numbered by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub id: Uuid,
    pub number: String,
    pub customer_id: Uuid,
    pub total_amount: Decimal,
    pub status: InvoiceStatus,
    pub issued_at: DateTime<Utc>,
    pub items: Vec<NewLineItem>,
}

impl NewInvoice {
    /// Build a draft issued at `now`. An empty item list is accepted and
    /// yields a zero total.
    pub fn draft(
        customer_id: Uuid,
        items: Vec<NewLineItem>,
        now: DateTime<Utc>,
    ) -> Result<Self, InvoiceError> {
        let total_amount = total_amount(&items).ok_or(InvoiceError::AmountOverflow)?;

        Ok(Self {
            id: Uuid::new_v4(),
            number: invoice_number(now),
            customer_id,
            total_amount,
            status: InvoiceStatus::Draft,
            issued_at: now,
            items,
        })
    }

    /// Attach store-assigned item ids, in submission order.
    pub fn into_invoice(self, item_ids: Vec<i64>) -> Invoice {
        let id = self.id;
        let items = self
            .items
            .into_iter()
            .zip(item_ids)
            .map(|(item, item_id)| item.into_line_item(item_id, id))
            .collect();

        Invoice {
            id,
            number: self.number,
            customer_id: self.customer_id,
            total_amount: self.total_amount,
            status: self.status,
            issued_at: self.issued_at,
            printed_at: None,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(quantity: i32, unit_price: Decimal) -> NewLineItem {
        NewLineItem {
            product_id: Uuid::new_v4(),
            description: "Produto".to_string(),
            quantity,
            unit_price,
        }
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 13, h, m, s).unwrap()
    }

    #[test]
    fn number_is_prefix_plus_fourteen_digits() {
        let number = invoice_number(at(20, 11, 31));
        assert_eq!(number, "NF20251113201131");
        assert_eq!(number.len(), NUMBER_PREFIX.len() + 14);
    }

    #[test]
    fn number_ignores_sub_second_precision() {
        let base = at(9, 5, 7);
        let later = base + chrono::Duration::milliseconds(999);
        assert_eq!(invoice_number(base), invoice_number(later));
    }

    #[test]
    fn total_uses_exact_decimal_arithmetic() {
        let items = vec![
            item(2, Decimal::new(1000, 2)),
            item(1, Decimal::new(550, 2)),
        ];
        assert_eq!(total_amount(&items), Some(Decimal::new(2550, 2)));

        // 0.1 * 3 must not drift the way binary floats do.
        let tenths = vec![item(3, Decimal::new(1, 1))];
        assert_eq!(total_amount(&tenths), Some(Decimal::new(3, 1)));
    }

    #[test]
    fn total_of_no_items_is_zero() {
        assert_eq!(total_amount(&Vec::<NewLineItem>::new()), Some(Decimal::ZERO));
    }

    #[test]
    fn negative_and_zero_values_are_summed_as_given() {
        let items = vec![item(0, Decimal::new(999, 2)), item(-1, Decimal::new(5, 0))];
        assert_eq!(total_amount(&items), Some(Decimal::new(-5, 0)));
    }

    #[test]
    fn overflowing_total_is_reported() {
        let items = vec![item(i32::MAX, Decimal::MAX)];
        assert_eq!(total_amount(&items), None);

        let err = NewInvoice::draft(Uuid::new_v4(), items, at(0, 0, 0)).unwrap_err();
        assert!(matches!(err, InvoiceError::AmountOverflow));
    }

    #[test]
    fn draft_starts_unprinted() {
        let now = at(12, 0, 0);
        let draft = NewInvoice::draft(Uuid::new_v4(), vec![item(1, Decimal::ONE)], now).unwrap();

        assert_eq!(draft.status, InvoiceStatus::Draft);
        assert_eq!(draft.issued_at, now);
        assert_eq!(draft.number, "NF20251113120000");

        let invoice = draft.into_invoice(vec![41]);
        assert_eq!(invoice.printed_at, None);
        assert_eq!(invoice.items[0].id, 41);
        assert_eq!(invoice.items[0].invoice_id, invoice.id);
        assert_eq!(invoice.items_total(), Some(invoice.total_amount));
    }

    #[test]
    fn printing_twice_overwrites_timestamp() {
        let draft = NewInvoice::draft(Uuid::new_v4(), vec![], at(8, 0, 0)).unwrap();
        let mut invoice = draft.into_invoice(vec![]);

        invoice.mark_printed(at(9, 0, 0));
        assert!(invoice.is_printed());
        assert_eq!(invoice.printed_at, Some(at(9, 0, 0)));

        invoice.mark_printed(at(10, 0, 0));
        assert_eq!(invoice.status, InvoiceStatus::Printed);
        assert_eq!(invoice.printed_at, Some(at(10, 0, 0)));
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [InvoiceStatus::Draft, InvoiceStatus::Printed] {
            assert_eq!(status.as_str().parse::<InvoiceStatus>().unwrap(), status);
        }
        assert!("Rascunho".parse::<InvoiceStatus>().is_err());
    }
}
