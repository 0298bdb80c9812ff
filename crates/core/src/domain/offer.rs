use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::disclosure::SharedContactDetails;
use crate::domain::party::VendorId;
use crate::domain::request::{Request, RequestId, RequestItemId};
use crate::errors::{NegotiationError, ValidationError};
use crate::pricing;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfferId(pub String);

impl OfferId {
    pub fn generate() -> Self {
        Self(format!("offer-{}", Uuid::new_v4()))
    }
}

impl std::fmt::Display for OfferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A price against one request item. Items the vendor cannot supply are
/// simply absent from the quote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotedItem {
    pub request_item_id: RequestItemId,
    pub price: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OfferStatus {
    Pending,
    UserAccepted,
    UserCountered,
    VendorCountered,
    OnHold,
    Confirmed,
    Rejected,
    Withdrawn,
}

impl OfferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OfferStatus::Confirmed | OfferStatus::Rejected | OfferStatus::Withdrawn)
    }

    /// An open offer still participates in the negotiation.
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Pending => "pending",
            OfferStatus::UserAccepted => "user-accepted",
            OfferStatus::UserCountered => "user-countered",
            OfferStatus::VendorCountered => "vendor-countered",
            OfferStatus::OnHold => "on-hold",
            OfferStatus::Confirmed => "confirmed",
            OfferStatus::Rejected => "rejected",
            OfferStatus::Withdrawn => "withdrawn",
        }
    }
}

impl std::str::FromStr for OfferStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(OfferStatus::Pending),
            "user-accepted" => Ok(OfferStatus::UserAccepted),
            "user-countered" => Ok(OfferStatus::UserCountered),
            "vendor-countered" => Ok(OfferStatus::VendorCountered),
            "on-hold" => Ok(OfferStatus::OnHold),
            "confirmed" => Ok(OfferStatus::Confirmed),
            "rejected" => Ok(OfferStatus::Rejected),
            "withdrawn" => Ok(OfferStatus::Withdrawn),
            other => Err(format!("unknown offer status `{other}`")),
        }
    }
}

/// A vendor's itemized quote against one request.
///
/// `total_price` is always derived from `quoted_items` via the pricing
/// module; it is never written independently. `shared_contact_details` is
/// populated by confirmation only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub request_id: RequestId,
    pub vendor_id: VendorId,
    pub quoted_items: Vec<QuotedItem>,
    pub total_price: Decimal,
    pub notes: Option<String>,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    pub shared_contact_details: Option<SharedContactDetails>,
}

impl Offer {
    /// Offer-local legality of a status change, the union over both actors.
    /// The engine layers actor and request-state preconditions on top.
    pub fn can_transition_to(&self, next: OfferStatus) -> bool {
        matches!(
            (&self.status, next),
            (OfferStatus::Pending, OfferStatus::UserAccepted)
                | (OfferStatus::Pending, OfferStatus::OnHold)
                | (OfferStatus::Pending, OfferStatus::UserCountered)
                | (OfferStatus::Pending, OfferStatus::Withdrawn)
                | (OfferStatus::OnHold, OfferStatus::UserAccepted)
                | (OfferStatus::OnHold, OfferStatus::UserCountered)
                | (OfferStatus::VendorCountered, OfferStatus::UserAccepted)
                | (OfferStatus::VendorCountered, OfferStatus::UserCountered)
                | (OfferStatus::UserCountered, OfferStatus::VendorCountered)
                | (OfferStatus::UserCountered, OfferStatus::Confirmed)
                | (OfferStatus::UserAccepted, OfferStatus::Confirmed)
                | (OfferStatus::Pending, OfferStatus::Rejected)
                | (OfferStatus::OnHold, OfferStatus::Rejected)
                | (OfferStatus::UserAccepted, OfferStatus::Rejected)
                | (OfferStatus::UserCountered, OfferStatus::Rejected)
                | (OfferStatus::VendorCountered, OfferStatus::Rejected)
        )
    }

    pub fn transition_to(&mut self, next: OfferStatus) -> Result<(), NegotiationError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(NegotiationError::InvalidTransition { from: self.status, attempted: next })
    }
}

/// An unsubmitted quote. Validation and total derivation happen against the
/// parent request on submission.
#[derive(Clone, Debug, PartialEq)]
pub struct OfferDraft {
    pub request_id: RequestId,
    pub quoted_items: Vec<QuotedItem>,
    pub notes: Option<String>,
}

impl OfferDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !pricing::has_available_item(&self.quoted_items) {
            return Err(ValidationError::NoAvailableItems);
        }
        Ok(())
    }

    /// Validate and promote the draft into a submitted, `pending` offer with
    /// its total derived against the parent request.
    pub fn into_offer(
        self,
        id: OfferId,
        vendor: VendorId,
        request: &Request,
        created_at: DateTime<Utc>,
    ) -> Result<Offer, ValidationError> {
        self.validate()?;

        let total_price = pricing::compute_total(&request.items, &self.quoted_items);
        Ok(Offer {
            id,
            request_id: self.request_id,
            vendor_id: vendor,
            quoted_items: self.quoted_items,
            total_price,
            notes: self.notes,
            status: OfferStatus::Pending,
            created_at,
            shared_contact_details: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::{Offer, OfferDraft, OfferId, OfferStatus, QuotedItem};
    use crate::domain::category::Category;
    use crate::domain::party::{UserId, VendorId};
    use crate::domain::request::{
        Request, RequestDraft, RequestId, RequestItem, RequestItemId,
    };
    use crate::errors::{NegotiationError, ValidationError};

    fn request() -> Request {
        RequestDraft {
            title: "Workbench restock".to_string(),
            items: vec![
                RequestItem {
                    id: RequestItemId("item-1".to_string()),
                    title: "Clamp set".to_string(),
                    description: String::new(),
                    quantity: 1,
                    image_url: None,
                },
                RequestItem {
                    id: RequestItemId("item-2".to_string()),
                    title: "Wood glue".to_string(),
                    description: String::new(),
                    quantity: 2,
                    image_url: None,
                },
            ],
            categories: vec![Category::Hardware],
            ..RequestDraft::default()
        }
        .into_request(RequestId("req-1".to_string()), UserId("user-1".to_string()), Utc::now())
        .expect("valid draft")
    }

    fn offer(status: OfferStatus) -> Offer {
        let mut offer = OfferDraft {
            request_id: RequestId("req-1".to_string()),
            quoted_items: vec![QuotedItem {
                request_item_id: RequestItemId("item-1".to_string()),
                price: Decimal::new(1_000, 2),
            }],
            notes: None,
        }
        .into_offer(
            OfferId("offer-1".to_string()),
            VendorId("vendor-1".to_string()),
            &request(),
            Utc::now(),
        )
        .expect("valid draft");
        offer.status = status;
        offer
    }

    #[test]
    fn quote_with_no_priced_item_fails_validation() {
        let draft = OfferDraft {
            request_id: RequestId("req-1".to_string()),
            quoted_items: vec![QuotedItem {
                request_item_id: RequestItemId("item-1".to_string()),
                price: Decimal::ZERO,
            }],
            notes: None,
        };
        assert_eq!(draft.validate().expect_err("all zero"), ValidationError::NoAvailableItems);

        let empty = OfferDraft {
            request_id: RequestId("req-1".to_string()),
            quoted_items: Vec::new(),
            notes: None,
        };
        assert_eq!(empty.validate().expect_err("empty"), ValidationError::NoAvailableItems);
    }

    #[test]
    fn submission_derives_the_total_from_request_quantities() {
        let offer = OfferDraft {
            request_id: RequestId("req-1".to_string()),
            quoted_items: vec![
                QuotedItem {
                    request_item_id: RequestItemId("item-1".to_string()),
                    price: Decimal::new(1_000, 2),
                },
                QuotedItem {
                    request_item_id: RequestItemId("item-2".to_string()),
                    price: Decimal::new(500, 2),
                },
            ],
            notes: Some("All in stock.".to_string()),
        }
        .into_offer(
            OfferId::generate(),
            VendorId("vendor-1".to_string()),
            &request(),
            Utc::now(),
        )
        .expect("valid draft");

        // 10.00 x 1 + 5.00 x 2
        assert_eq!(offer.total_price, Decimal::new(2_000, 2));
        assert_eq!(offer.status, OfferStatus::Pending);
        assert!(offer.shared_contact_details.is_none());
    }

    #[test]
    fn terminal_offers_accept_no_transition() {
        for status in [OfferStatus::Confirmed, OfferStatus::Rejected, OfferStatus::Withdrawn] {
            let mut terminal = offer(status);
            let error = terminal
                .transition_to(OfferStatus::UserAccepted)
                .expect_err("terminal offers are frozen");
            assert!(matches!(error, NegotiationError::InvalidTransition { .. }));
            assert_eq!(terminal.status, status);
        }
    }

    #[test]
    fn withdrawal_is_only_legal_from_pending() {
        assert!(offer(OfferStatus::Pending).can_transition_to(OfferStatus::Withdrawn));
        for status in [
            OfferStatus::OnHold,
            OfferStatus::UserAccepted,
            OfferStatus::UserCountered,
            OfferStatus::VendorCountered,
        ] {
            assert!(!offer(status).can_transition_to(OfferStatus::Withdrawn));
        }
    }

    #[test]
    fn vendor_counter_only_answers_a_user_counter() {
        assert!(offer(OfferStatus::UserCountered).can_transition_to(OfferStatus::VendorCountered));
        for status in [OfferStatus::Pending, OfferStatus::OnHold, OfferStatus::VendorCountered] {
            assert!(!offer(status).can_transition_to(OfferStatus::VendorCountered));
        }
    }

    #[test]
    fn every_open_status_can_be_rejected() {
        for status in [
            OfferStatus::Pending,
            OfferStatus::OnHold,
            OfferStatus::UserAccepted,
            OfferStatus::UserCountered,
            OfferStatus::VendorCountered,
        ] {
            assert!(offer(status).can_transition_to(OfferStatus::Rejected), "{status:?}");
        }
    }
}
