use std::collections::HashMap;

use crate::domain::offer::{Offer, OfferId};
use crate::domain::request::{Request, RequestId};

/// Entities one operation intends to write. The engine assembles the full
/// set against a snapshot before anything is committed, so a rejected
/// operation never leaves a partial write behind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteSet {
    pub requests: Vec<Request>,
    pub offers: Vec<Offer>,
}

impl WriteSet {
    pub fn with_request(mut self, request: Request) -> Self {
        self.requests.push(request);
        self
    }

    pub fn with_offer(mut self, offer: Offer) -> Self {
        self.offers.push(offer);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.offers.is_empty()
    }
}

/// Arena-style home of the request/offer collections the engine reads and
/// writes through.
///
/// Reads hand out snapshots; `commit` upserts a whole [`WriteSet`] in one
/// step. The engine assumes a single logical writer — an adapter over a
/// multi-writer backend must implement `commit` as one transaction that
/// re-checks the statuses the write-set was derived from.
pub trait MarketStore {
    fn request(&self, id: &RequestId) -> Option<Request>;
    fn offer(&self, id: &OfferId) -> Option<Offer>;
    /// All offers on a request, ordered by creation time then id.
    fn offers_for_request(&self, request_id: &RequestId) -> Vec<Offer>;
    fn requests(&self) -> Vec<Request>;
    fn offers(&self) -> Vec<Offer>;
    fn commit(&mut self, writes: WriteSet);
}

#[derive(Debug, Default)]
pub struct InMemoryMarketStore {
    requests: HashMap<RequestId, Request>,
    offers: HashMap<OfferId, Offer>,
}

impl InMemoryMarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> (usize, usize) {
        (self.requests.len(), self.offers.len())
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.offers.is_empty()
    }
}

impl MarketStore for InMemoryMarketStore {
    fn request(&self, id: &RequestId) -> Option<Request> {
        self.requests.get(id).cloned()
    }

    fn offer(&self, id: &OfferId) -> Option<Offer> {
        self.offers.get(id).cloned()
    }

    fn offers_for_request(&self, request_id: &RequestId) -> Vec<Offer> {
        let mut offers: Vec<Offer> = self
            .offers
            .values()
            .filter(|offer| &offer.request_id == request_id)
            .cloned()
            .collect();
        offers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.0.cmp(&b.id.0)));
        offers
    }

    fn requests(&self) -> Vec<Request> {
        let mut requests: Vec<Request> = self.requests.values().cloned().collect();
        requests.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.0.cmp(&b.id.0)));
        requests
    }

    fn offers(&self) -> Vec<Offer> {
        let mut offers: Vec<Offer> = self.offers.values().cloned().collect();
        offers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.0.cmp(&b.id.0)));
        offers
    }

    fn commit(&mut self, writes: WriteSet) {
        for request in writes.requests {
            self.requests.insert(request.id.clone(), request);
        }
        for offer in writes.offers {
            self.offers.insert(offer.id.clone(), offer);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use super::{InMemoryMarketStore, MarketStore, WriteSet};
    use crate::domain::category::Category;
    use crate::domain::offer::{Offer, OfferId, OfferStatus, QuotedItem};
    use crate::domain::party::{UserId, VendorId};
    use crate::domain::request::{
        RequestDraft, RequestId, RequestItem, RequestItemId,
    };

    fn seeded_store() -> InMemoryMarketStore {
        let request = RequestDraft {
            title: "Replacement caster wheels".to_string(),
            items: vec![RequestItem {
                id: RequestItemId("item-1".to_string()),
                title: "Caster wheel".to_string(),
                description: String::new(),
                quantity: 4,
                image_url: None,
            }],
            categories: vec![Category::Hardware],
            ..RequestDraft::default()
        }
        .into_request(RequestId("req-1".to_string()), UserId("user-1".to_string()), Utc::now())
        .expect("valid draft");

        let base = Utc::now();
        let offer = |id: &str, minutes: i64| Offer {
            id: OfferId(id.to_string()),
            request_id: RequestId("req-1".to_string()),
            vendor_id: VendorId(format!("vendor-{id}")),
            quoted_items: vec![QuotedItem {
                request_item_id: RequestItemId("item-1".to_string()),
                price: Decimal::new(500, 2),
            }],
            total_price: Decimal::new(2_000, 2),
            notes: None,
            status: OfferStatus::Pending,
            created_at: base + Duration::minutes(minutes),
            shared_contact_details: None,
        };

        let mut store = InMemoryMarketStore::new();
        store.commit(
            WriteSet::default()
                .with_request(request)
                .with_offer(offer("b", 2))
                .with_offer(offer("a", 1)),
        );
        store
    }

    #[test]
    fn commit_upserts_by_id() {
        let mut store = seeded_store();
        let mut offer = store.offer(&OfferId("a".to_string())).expect("seeded offer");
        offer.status = OfferStatus::OnHold;
        store.commit(WriteSet::default().with_offer(offer));

        let reread = store.offer(&OfferId("a".to_string())).expect("still present");
        assert_eq!(reread.status, OfferStatus::OnHold);
        assert_eq!(store.len(), (1, 2));
    }

    #[test]
    fn offers_for_request_are_ordered_by_creation_time() {
        let store = seeded_store();
        let offers = store.offers_for_request(&RequestId("req-1".to_string()));
        let ids: Vec<&str> = offers.iter().map(|offer| offer.id.0.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn missing_ids_read_as_none() {
        let store = seeded_store();
        assert!(store.request(&RequestId("req-9".to_string())).is_none());
        assert!(store.offer(&OfferId("offer-9".to_string())).is_none());
    }
}
