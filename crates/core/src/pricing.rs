//! Quote totals derived from request quantities.
//!
//! A quoted item prices one request line; the line's quantity always comes
//! from the parent request. Quoted items whose `request_item_id` does not
//! resolve against the request contribute zero — they are stale references,
//! treated as unavailable rather than as an error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::offer::QuotedItem;
use crate::domain::request::{RequestItem, RequestItemId};

/// Sum of `price x quantity` over the quote, quantities looked up by
/// request item id. Unresolved ids contribute 0.
pub fn compute_total(items: &[RequestItem], quoted: &[QuotedItem]) -> Decimal {
    quoted
        .iter()
        .map(|line| {
            let quantity = items
                .iter()
                .find(|item| item.id == line.request_item_id)
                .map(|item| item.quantity)
                .unwrap_or(0);
            line.price * Decimal::from(quantity)
        })
        .sum()
}

/// A quote must carry at least one positively priced line to mean anything.
pub fn has_available_item(quoted: &[QuotedItem]) -> bool {
    quoted.iter().any(|line| line.price > Decimal::ZERO)
}

/// One request line as priced (or not) by a quote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotedLine {
    pub request_item_id: RequestItemId,
    pub title: String,
    pub quantity: u32,
    pub unit_price: Option<Decimal>,
    pub line_total: Decimal,
}

/// Request-ordered view of a quote, with unquoted lines shown as
/// unavailable. The breakdown total always agrees with [`compute_total`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub lines: Vec<QuotedLine>,
    pub total: Decimal,
}

pub fn breakdown(items: &[RequestItem], quoted: &[QuotedItem]) -> PricingBreakdown {
    let lines: Vec<QuotedLine> = items
        .iter()
        .map(|item| {
            let unit_price = quoted
                .iter()
                .find(|line| line.request_item_id == item.id)
                .map(|line| line.price);
            let line_total = unit_price
                .map(|price| price * Decimal::from(item.quantity))
                .unwrap_or(Decimal::ZERO);
            QuotedLine {
                request_item_id: item.id.clone(),
                title: item.title.clone(),
                quantity: item.quantity,
                unit_price,
                line_total,
            }
        })
        .collect();

    let total = lines.iter().map(|line| line.line_total).sum();
    PricingBreakdown { lines, total }
}
