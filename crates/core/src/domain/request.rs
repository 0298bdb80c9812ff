use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::category::{Category, MAX_REQUEST_CATEGORIES};
use crate::domain::party::{UserId, VendorId};
use crate::domain::product::{Product, ProductId};
use crate::errors::{NegotiationError, ValidationError};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestItemId(pub String);

impl RequestId {
    pub fn generate() -> Self {
        Self(format!("req-{}", Uuid::new_v4()))
    }
}

impl RequestItemId {
    pub fn generate() -> Self {
        Self(format!("item-{}", Uuid::new_v4()))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for RequestItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One line of a buyer's want-list. Immutable once the parent request is
/// submitted; quotes reference lines by id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestItem {
    pub id: RequestItemId,
    pub title: String,
    pub description: String,
    pub quantity: u32,
    pub image_url: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    Active,
    PendingConfirmation,
    Completed,
    Cancelled,
}

impl RequestStatus {
    /// Terminal requests accept no further negotiation, only reads.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Active => "active",
            RequestStatus::PendingConfirmation => "pending-confirmation",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(RequestStatus::Active),
            "pending-confirmation" => Ok(RequestStatus::PendingConfirmation),
            "completed" => Ok(RequestStatus::Completed),
            "cancelled" => Ok(RequestStatus::Cancelled),
            other => Err(format!("unknown request status `{other}`")),
        }
    }
}

/// A buyer's multi-item enquiry, the anchor of one negotiation.
///
/// `items` is non-empty and order-preserving; `categories` holds 1..=3 unique
/// entries; `targeted_vendor_ids` empty means the request is public and
/// surfaces to vendors by specialty match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub user_id: UserId,
    pub title: String,
    pub items: Vec<RequestItem>,
    pub categories: Vec<Category>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub targeted_vendor_ids: Vec<VendorId>,
    pub source_product_id: Option<ProductId>,
}

impl Request {
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (&self.status, next),
            (RequestStatus::Active, RequestStatus::PendingConfirmation)
                | (RequestStatus::PendingConfirmation, RequestStatus::Completed)
                | (RequestStatus::PendingConfirmation, RequestStatus::Active)
                | (RequestStatus::Active, RequestStatus::Cancelled)
        )
    }

    pub fn transition_to(&mut self, next: RequestStatus) -> Result<(), NegotiationError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(NegotiationError::InvalidRequestTransition { from: self.status, to: next })
    }

    /// Quantity of the referenced item, or `None` for ids that do not belong
    /// to this request (stale references from an old quote).
    pub fn item_quantity(&self, item_id: &RequestItemId) -> Option<u32> {
        self.items.iter().find(|item| &item.id == item_id).map(|item| item.quantity)
    }

    pub fn is_targeted(&self) -> bool {
        !self.targeted_vendor_ids.is_empty()
    }
}

/// Unsubmitted request as captured by a form or API payload. Validation and
/// id/timestamp minting happen on submission.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestDraft {
    pub title: String,
    pub items: Vec<RequestItem>,
    pub categories: Vec<Category>,
    pub targeted_vendor_ids: Vec<VendorId>,
    pub source_product_id: Option<ProductId>,
}

impl RequestDraft {
    /// Single-line draft targeted at the vendor of a catalog product.
    pub fn for_product(product: &Product, message: Option<&str>) -> Self {
        let description = match message {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => format!("Enquiry about {}", product.title),
        };

        Self {
            title: format!("Enquiry about: {}", product.title),
            items: vec![RequestItem {
                id: RequestItemId::generate(),
                title: product.title.clone(),
                description,
                quantity: 1,
                image_url: product.image_url.clone(),
            }],
            categories: vec![product.category],
            targeted_vendor_ids: vec![product.vendor_id.clone()],
            source_product_id: Some(product.id.clone()),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.items.is_empty() {
            return Err(ValidationError::EmptyItems);
        }

        let unique = dedupe_categories(&self.categories);
        if unique.is_empty() || unique.len() > MAX_REQUEST_CATEGORIES {
            return Err(ValidationError::InvalidCategories { count: unique.len() });
        }

        Ok(())
    }

    /// Validate and promote the draft into a submitted, `active` request.
    /// Item quantities are floored at 1; duplicate categories collapse while
    /// preserving first-seen order.
    pub fn into_request(
        self,
        id: RequestId,
        owner: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<Request, ValidationError> {
        self.validate()?;

        let categories = dedupe_categories(&self.categories);
        let items = self
            .items
            .into_iter()
            .map(|item| RequestItem { quantity: item.quantity.max(1), ..item })
            .collect();

        Ok(Request {
            id,
            user_id: owner,
            title: self.title,
            items,
            categories,
            status: RequestStatus::Active,
            created_at,
            targeted_vendor_ids: self.targeted_vendor_ids,
            source_product_id: self.source_product_id,
        })
    }
}

fn dedupe_categories(categories: &[Category]) -> Vec<Category> {
    let mut seen = Vec::with_capacity(categories.len());
    for category in categories {
        if !seen.contains(category) {
            seen.push(*category);
        }
    }
    seen
}
