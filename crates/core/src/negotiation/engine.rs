use chrono::Utc;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::disclosure::SharedContactDetails;
use crate::domain::offer::{Offer, OfferDraft, OfferId, OfferStatus, QuotedItem};
use crate::domain::party::{Actor, UserId, VendorId};
use crate::domain::request::{Request, RequestDraft, RequestId, RequestStatus};
use crate::errors::{NegotiationError, ValidationError};
use crate::negotiation::store::{MarketStore, WriteSet};
use crate::pricing;

/// Post-operation snapshot of the touched enquiry: the request plus every
/// offer on it, in creation order.
#[derive(Clone, Debug, PartialEq)]
pub struct NegotiationOutcome {
    pub request: Request,
    pub offers: Vec<Offer>,
}

/// The negotiation state machine over an injected [`MarketStore`].
///
/// Every operation validates against a snapshot, assembles the complete
/// [`WriteSet`], and commits it in one step; a returned error means nothing
/// was written. The engine performs no I/O of its own — persistence and
/// notification happen behind the store seam or after the call returns.
pub struct NegotiationEngine<S> {
    store: S,
}

impl<S> NegotiationEngine<S>
where
    S: MarketStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Submit a buyer's enquiry. The draft is validated and enters the
    /// market as `active`.
    pub fn create_request(
        &mut self,
        owner: &UserId,
        draft: RequestDraft,
    ) -> Result<Request, NegotiationError> {
        let request = draft.into_request(RequestId::generate(), owner.clone(), Utc::now())?;
        self.store.commit(WriteSet::default().with_request(request.clone()));
        Ok(request)
    }

    /// Submit a vendor's quote against an active request. Whether the vendor
    /// already has an open offer on the request is caller policy; the model
    /// itself permits several.
    pub fn create_offer(
        &mut self,
        vendor: &VendorId,
        draft: OfferDraft,
    ) -> Result<Offer, NegotiationError> {
        let request = self
            .store
            .request(&draft.request_id)
            .ok_or_else(|| NegotiationError::UnknownRequest(draft.request_id.clone()))?;

        match request.status {
            RequestStatus::Active => {}
            status if status.is_terminal() => {
                return Err(NegotiationError::RequestTerminal { request: request.id, status });
            }
            status => {
                return Err(NegotiationError::RequestNotOpen { request: request.id, status });
            }
        }

        let offer = draft.into_offer(OfferId::generate(), vendor.clone(), &request, Utc::now())?;
        self.store.commit(WriteSet::default().with_offer(offer.clone()));
        Ok(offer)
    }

    /// Consumer-facing status dispatcher. Counter moves carry new items and
    /// go through [`Self::submit_counter_offer`] instead; requesting a
    /// countered (or pending) status here is always invalid.
    pub fn update_offer_status(
        &mut self,
        id: &OfferId,
        new_status: OfferStatus,
        shared_details: Option<SharedContactDetails>,
    ) -> Result<NegotiationOutcome, NegotiationError> {
        match new_status {
            OfferStatus::UserAccepted => self.accept_offer(id),
            OfferStatus::OnHold => self.hold_offer(id),
            OfferStatus::Rejected => self.reject_offer(id),
            OfferStatus::Withdrawn => self.withdraw_offer(id),
            OfferStatus::Confirmed => {
                let details = shared_details.ok_or(NegotiationError::MissingContactDetails)?;
                self.confirm_offer(id, details)
            }
            OfferStatus::Pending | OfferStatus::UserCountered | OfferStatus::VendorCountered => {
                let (_, offer) = self.load_open_pair(id)?;
                Err(NegotiationError::InvalidTransition {
                    from: offer.status,
                    attempted: new_status,
                })
            }
        }
    }

    /// [`Self::update_offer_status`] plus an audit event for the applied or
    /// rejected transition.
    pub fn update_offer_status_with_audit<A>(
        &mut self,
        id: &OfferId,
        new_status: OfferStatus,
        shared_details: Option<SharedContactDetails>,
        sink: &A,
        context: &AuditContext,
    ) -> Result<NegotiationOutcome, NegotiationError>
    where
        A: AuditSink,
    {
        let result = self.update_offer_status(id, new_status, shared_details);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        context,
                        "negotiation.transition_applied",
                        AuditCategory::Negotiation,
                        AuditOutcome::Success,
                    )
                    .with_metadata("attempted", new_status.as_str())
                    .with_metadata("request_status", outcome.request.status.as_str()),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        context,
                        "negotiation.transition_rejected",
                        AuditCategory::Negotiation,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("attempted", new_status.as_str())
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }

    /// Replace the quote's items with a counter from either side. The total
    /// is rederived against the request items as they stand; the previous
    /// price is discarded.
    pub fn submit_counter_offer(
        &mut self,
        id: &OfferId,
        new_items: Vec<QuotedItem>,
        by: Actor,
    ) -> Result<Offer, NegotiationError> {
        let (request, mut offer) = self.load_open_pair(id)?;

        if !pricing::has_available_item(&new_items) {
            return Err(ValidationError::NoAvailableItems.into());
        }

        let attempted = match by {
            Actor::Buyer => OfferStatus::UserCountered,
            Actor::Vendor => OfferStatus::VendorCountered,
        };
        offer.transition_to(attempted)?;
        offer.quoted_items = new_items;
        offer.total_price = pricing::compute_total(&request.items, &offer.quoted_items);

        self.store.commit(WriteSet::default().with_offer(offer.clone()));
        Ok(offer)
    }

    /// [`Self::submit_counter_offer`] plus an audit event.
    pub fn submit_counter_offer_with_audit<A>(
        &mut self,
        id: &OfferId,
        new_items: Vec<QuotedItem>,
        by: Actor,
        sink: &A,
        context: &AuditContext,
    ) -> Result<Offer, NegotiationError>
    where
        A: AuditSink,
    {
        let result = self.submit_counter_offer(id, new_items, by);
        match &result {
            Ok(offer) => {
                sink.emit(
                    AuditEvent::new(
                        context,
                        "negotiation.transition_applied",
                        AuditCategory::Negotiation,
                        AuditOutcome::Success,
                    )
                    .with_metadata("attempted", offer.status.as_str())
                    .with_metadata("total_price", offer.total_price.to_string()),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        context,
                        "negotiation.transition_rejected",
                        AuditCategory::Negotiation,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }

    /// Buyer accepts a quote; the enquiry moves to `pending-confirmation`
    /// and waits on the vendor.
    pub fn accept_offer(&mut self, id: &OfferId) -> Result<NegotiationOutcome, NegotiationError> {
        let (mut request, mut offer) = self.load_open_pair(id)?;
        if request.status != RequestStatus::Active {
            return Err(NegotiationError::InvalidTransition {
                from: offer.status,
                attempted: OfferStatus::UserAccepted,
            });
        }

        offer.transition_to(OfferStatus::UserAccepted)?;
        request.transition_to(RequestStatus::PendingConfirmation)?;

        let request_id = request.id.clone();
        self.store.commit(WriteSet::default().with_request(request).with_offer(offer));
        self.outcome(&request_id)
    }

    /// Buyer parks a fresh quote while weighing others.
    pub fn hold_offer(&mut self, id: &OfferId) -> Result<NegotiationOutcome, NegotiationError> {
        let (request, mut offer) = self.load_open_pair(id)?;
        if request.status != RequestStatus::Active {
            return Err(NegotiationError::InvalidTransition {
                from: offer.status,
                attempted: OfferStatus::OnHold,
            });
        }

        offer.transition_to(OfferStatus::OnHold)?;

        let request_id = request.id.clone();
        self.store.commit(WriteSet::default().with_offer(offer));
        self.outcome(&request_id)
    }

    /// Either side walks away from the quote. Rejecting an accepted quote
    /// rolls the enquiry back to `active` so its siblings are in play again.
    pub fn reject_offer(&mut self, id: &OfferId) -> Result<NegotiationOutcome, NegotiationError> {
        let (mut request, mut offer) = self.load_open_pair(id)?;
        let rollback = offer.status == OfferStatus::UserAccepted;

        offer.transition_to(OfferStatus::Rejected)?;

        let request_id = request.id.clone();
        let mut writes = WriteSet::default().with_offer(offer);
        if rollback {
            request.transition_to(RequestStatus::Active)?;
            writes = writes.with_request(request);
        }
        self.store.commit(writes);
        self.outcome(&request_id)
    }

    /// Vendor retracts a quote the buyer has not reacted to.
    pub fn withdraw_offer(&mut self, id: &OfferId) -> Result<NegotiationOutcome, NegotiationError> {
        let (request, mut offer) = self.load_open_pair(id)?;

        offer.transition_to(OfferStatus::Withdrawn)?;

        let request_id = request.id.clone();
        self.store.commit(WriteSet::default().with_offer(offer));
        self.outcome(&request_id)
    }

    /// Vendor finalizes the deal. One atomic write-set confirms this offer,
    /// attaches the contact details, force-rejects every open sibling, and
    /// completes the request. After this the enquiry is immutable.
    pub fn confirm_offer(
        &mut self,
        id: &OfferId,
        details: SharedContactDetails,
    ) -> Result<NegotiationOutcome, NegotiationError> {
        let (mut request, mut offer) = self.load_open_pair(id)?;
        if request.status != RequestStatus::PendingConfirmation {
            return Err(NegotiationError::InvalidTransition {
                from: offer.status,
                attempted: OfferStatus::Confirmed,
            });
        }

        offer.transition_to(OfferStatus::Confirmed)?;
        offer.shared_contact_details = Some(details);

        let mut writes = WriteSet::default();
        for mut sibling in self.store.offers_for_request(&request.id) {
            if sibling.id == offer.id || sibling.status.is_terminal() {
                continue;
            }
            // forced by the cascade, not a negotiated move
            sibling.status = OfferStatus::Rejected;
            writes = writes.with_offer(sibling);
        }

        request.transition_to(RequestStatus::Completed)?;

        let request_id = request.id.clone();
        writes = writes.with_request(request).with_offer(offer);
        self.store.commit(writes);
        self.outcome(&request_id)
    }

    /// Buyer withdraws the whole enquiry. Open offers are left as they are
    /// and surface through the history projections.
    pub fn cancel_request(&mut self, id: &RequestId) -> Result<Request, NegotiationError> {
        let mut request = self
            .store
            .request(id)
            .ok_or_else(|| NegotiationError::UnknownRequest(id.clone()))?;

        if request.status.is_terminal() {
            return Err(NegotiationError::RequestTerminal {
                request: request.id,
                status: request.status,
            });
        }

        request.transition_to(RequestStatus::Cancelled)?;
        self.store.commit(WriteSet::default().with_request(request.clone()));
        Ok(request)
    }

    /// Load the offer and its parent request, refusing terminal requests up
    /// front so no mutation ever runs against a closed enquiry.
    fn load_open_pair(&self, id: &OfferId) -> Result<(Request, Offer), NegotiationError> {
        let offer =
            self.store.offer(id).ok_or_else(|| NegotiationError::UnknownOffer(id.clone()))?;
        let request = self
            .store
            .request(&offer.request_id)
            .ok_or_else(|| NegotiationError::UnknownRequest(offer.request_id.clone()))?;

        if request.status.is_terminal() {
            return Err(NegotiationError::RequestTerminal {
                request: request.id,
                status: request.status,
            });
        }

        Ok((request, offer))
    }

    fn outcome(&self, request_id: &RequestId) -> Result<NegotiationOutcome, NegotiationError> {
        let request = self
            .store
            .request(request_id)
            .ok_or_else(|| NegotiationError::UnknownRequest(request_id.clone()))?;
        let offers = self.store.offers_for_request(request_id);
        Ok(NegotiationOutcome { request, offers })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::audit::{AuditContext, InMemoryAuditSink};
    use crate::disclosure::{DisclosureSource, SharedContactDetails};
    use crate::domain::category::Category;
    use crate::domain::offer::{Offer, OfferDraft, OfferStatus, QuotedItem};
    use crate::domain::party::{Actor, UserId, VendorId};
    use crate::domain::request::{
        RequestDraft, RequestId, RequestItem, RequestItemId, RequestStatus,
    };
    use crate::errors::{NegotiationError, ValidationError};
    use crate::negotiation::engine::NegotiationEngine;
    use crate::negotiation::store::{InMemoryMarketStore, MarketStore};

    fn engine() -> NegotiationEngine<InMemoryMarketStore> {
        NegotiationEngine::new(InMemoryMarketStore::new())
    }

    fn buyer() -> UserId {
        UserId("user-1".to_string())
    }

    fn vendor(n: u32) -> VendorId {
        VendorId(format!("vendor-{n}"))
    }

    fn two_item_draft() -> RequestDraft {
        RequestDraft {
            title: "Brake overhaul parts".to_string(),
            items: vec![
                RequestItem {
                    id: RequestItemId("item-1".to_string()),
                    title: "Brake caliper".to_string(),
                    description: String::new(),
                    quantity: 1,
                    image_url: None,
                },
                RequestItem {
                    id: RequestItemId("item-2".to_string()),
                    title: "Brake pads".to_string(),
                    description: String::new(),
                    quantity: 2,
                    image_url: None,
                },
            ],
            categories: vec![Category::AutoParts],
            ..RequestDraft::default()
        }
    }

    fn quote(prices: &[(&str, i64)]) -> Vec<QuotedItem> {
        prices
            .iter()
            .map(|(id, cents)| QuotedItem {
                request_item_id: RequestItemId(id.to_string()),
                price: Decimal::new(*cents, 2),
            })
            .collect()
    }

    fn details() -> SharedContactDetails {
        SharedContactDetails::edited("Auto Parts Pro", "parts@example.com", "555-0101", None)
    }

    /// Engine with one request and two pending offers: A from vendor 1
    /// (10.00 + 5.00 per the two-item draft), B from vendor 2.
    fn market() -> (NegotiationEngine<InMemoryMarketStore>, RequestId, Offer, Offer) {
        let mut engine = engine();
        let request = engine.create_request(&buyer(), two_item_draft()).expect("valid request");
        let offer_a = engine
            .create_offer(
                &vendor(1),
                OfferDraft {
                    request_id: request.id.clone(),
                    quoted_items: quote(&[("item-1", 1_000), ("item-2", 500)]),
                    notes: Some("OEM parts, in stock.".to_string()),
                },
            )
            .expect("valid offer");
        let offer_b = engine
            .create_offer(
                &vendor(2),
                OfferDraft {
                    request_id: request.id.clone(),
                    quoted_items: quote(&[("item-1", 900)]),
                    notes: None,
                },
            )
            .expect("valid offer");
        (engine, request.id, offer_a, offer_b)
    }

    #[test]
    fn full_negotiation_runs_to_confirmation_with_sibling_cascade() {
        let (mut engine, request_id, offer_a, offer_b) = market();
        assert_eq!(offer_a.total_price, Decimal::new(2_000, 2));

        let countered = engine
            .submit_counter_offer(
                &offer_a.id,
                quote(&[("item-1", 900), ("item-2", 500)]),
                Actor::Buyer,
            )
            .expect("buyer counter");
        assert_eq!(countered.status, OfferStatus::UserCountered);
        assert_eq!(countered.total_price, Decimal::new(1_900, 2));

        let final_counter = engine
            .submit_counter_offer(
                &offer_a.id,
                quote(&[("item-1", 800), ("item-2", 500)]),
                Actor::Vendor,
            )
            .expect("vendor final counter");
        assert_eq!(final_counter.status, OfferStatus::VendorCountered);
        assert_eq!(final_counter.total_price, Decimal::new(1_800, 2));

        let accepted = engine.accept_offer(&offer_a.id).expect("buyer accepts the final offer");
        assert_eq!(accepted.request.status, RequestStatus::PendingConfirmation);

        let confirmed = engine.confirm_offer(&offer_a.id, details()).expect("vendor confirms");
        assert_eq!(confirmed.request.status, RequestStatus::Completed);

        let winner = confirmed.offers.iter().find(|offer| offer.id == offer_a.id).unwrap();
        assert_eq!(winner.status, OfferStatus::Confirmed);
        assert_eq!(
            winner.shared_contact_details.as_ref().map(|details| details.source),
            Some(DisclosureSource::Edited)
        );

        let loser = confirmed.offers.iter().find(|offer| offer.id == offer_b.id).unwrap();
        assert_eq!(loser.status, OfferStatus::Rejected);
        assert!(loser.shared_contact_details.is_none());

        let confirmed_count = confirmed
            .offers
            .iter()
            .filter(|offer| offer.status == OfferStatus::Confirmed)
            .count();
        assert_eq!(confirmed_count, 1);
        assert_eq!(engine.store().request(&request_id).unwrap().status, RequestStatus::Completed);
    }

    #[test]
    fn confirmation_spares_already_terminal_siblings() {
        let (mut engine, _, offer_a, offer_b) = market();
        engine.withdraw_offer(&offer_b.id).expect("vendor 2 withdraws");

        engine.accept_offer(&offer_a.id).expect("accept");
        let confirmed = engine.confirm_offer(&offer_a.id, details()).expect("confirm");

        let withdrawn = confirmed.offers.iter().find(|offer| offer.id == offer_b.id).unwrap();
        assert_eq!(withdrawn.status, OfferStatus::Withdrawn);
    }

    #[test]
    fn accept_requires_an_active_request() {
        let (mut engine, _, offer_a, offer_b) = market();
        engine.accept_offer(&offer_b.id).expect("first acceptance");

        let error = engine.accept_offer(&offer_a.id).expect_err("request is mid-confirmation");
        assert_eq!(
            error,
            NegotiationError::InvalidTransition {
                from: OfferStatus::Pending,
                attempted: OfferStatus::UserAccepted,
            }
        );
    }

    #[test]
    fn confirm_requires_the_request_to_be_pending_confirmation() {
        let (mut engine, _, offer_a, _) = market();
        engine
            .submit_counter_offer(&offer_a.id, quote(&[("item-1", 950)]), Actor::Buyer)
            .expect("buyer counter");

        let error = engine
            .confirm_offer(&offer_a.id, details())
            .expect_err("no acceptance happened yet");
        assert_eq!(
            error,
            NegotiationError::InvalidTransition {
                from: OfferStatus::UserCountered,
                attempted: OfferStatus::Confirmed,
            }
        );
    }

    #[test]
    fn failed_operations_leave_the_market_untouched() {
        let (mut engine, _, offer_a, _) = market();
        let requests_before = engine.store().requests();
        let offers_before = engine.store().offers();

        engine.confirm_offer(&offer_a.id, details()).expect_err("pending offer, active request");
        engine
            .submit_counter_offer(&offer_a.id, quote(&[]), Actor::Buyer)
            .expect_err("empty counter");

        assert_eq!(engine.store().requests(), requests_before);
        assert_eq!(engine.store().offers(), offers_before);
    }

    #[test]
    fn rejecting_an_accepted_offer_rolls_the_request_back() {
        let (mut engine, _, offer_a, _) = market();
        engine.accept_offer(&offer_a.id).expect("accept");

        let outcome = engine.reject_offer(&offer_a.id).expect("vendor declines");
        assert_eq!(outcome.request.status, RequestStatus::Active);
        let rejected = outcome.offers.iter().find(|offer| offer.id == offer_a.id).unwrap();
        assert_eq!(rejected.status, OfferStatus::Rejected);
    }

    #[test]
    fn rejecting_a_pending_offer_leaves_the_request_alone() {
        let (mut engine, _, offer_a, _) = market();
        let outcome = engine.reject_offer(&offer_a.id).expect("reject");
        assert_eq!(outcome.request.status, RequestStatus::Active);
    }

    #[test]
    fn hold_and_withdraw_only_apply_to_pending_offers() {
        let (mut engine, _, offer_a, offer_b) = market();
        engine.hold_offer(&offer_a.id).expect("hold pending offer");

        let error = engine.hold_offer(&offer_a.id).expect_err("already on hold");
        assert!(matches!(error, NegotiationError::InvalidTransition { .. }));

        let error = engine.withdraw_offer(&offer_a.id).expect_err("on hold, not pending");
        assert!(matches!(error, NegotiationError::InvalidTransition { .. }));

        let outcome = engine.withdraw_offer(&offer_b.id).expect("withdraw pending offer");
        let withdrawn = outcome.offers.iter().find(|offer| offer.id == offer_b.id).unwrap();
        assert_eq!(withdrawn.status, OfferStatus::Withdrawn);
    }

    #[test]
    fn held_offers_can_be_accepted_or_countered() {
        let (mut engine, _, offer_a, _) = market();
        engine.hold_offer(&offer_a.id).expect("hold");

        let countered = engine
            .submit_counter_offer(&offer_a.id, quote(&[("item-1", 850)]), Actor::Buyer)
            .expect("counter from hold");
        assert_eq!(countered.status, OfferStatus::UserCountered);
    }

    #[test]
    fn vendor_counter_requires_a_user_counter_first() {
        let (mut engine, _, offer_a, _) = market();
        let error = engine
            .submit_counter_offer(&offer_a.id, quote(&[("item-1", 950)]), Actor::Vendor)
            .expect_err("nothing to answer");
        assert_eq!(
            error,
            NegotiationError::InvalidTransition {
                from: OfferStatus::Pending,
                attempted: OfferStatus::VendorCountered,
            }
        );
    }

    #[test]
    fn counters_ignore_stale_item_references() {
        let (mut engine, _, offer_a, _) = market();
        let countered = engine
            .submit_counter_offer(
                &offer_a.id,
                quote(&[("item-1", 700), ("item-gone", 99_900)]),
                Actor::Buyer,
            )
            .expect("counter with one stale line");
        assert_eq!(countered.total_price, Decimal::new(700, 2));
    }

    #[test]
    fn counter_must_price_at_least_one_item() {
        let (mut engine, _, offer_a, _) = market();
        let error = engine
            .submit_counter_offer(&offer_a.id, quote(&[("item-1", 0)]), Actor::Buyer)
            .expect_err("all-zero counter");
        assert_eq!(error, NegotiationError::Validation(ValidationError::NoAvailableItems));
    }

    #[test]
    fn terminal_requests_freeze_every_offer_operation() {
        let (mut engine, request_id, offer_a, offer_b) = market();
        engine.accept_offer(&offer_a.id).expect("accept");
        engine.confirm_offer(&offer_a.id, details()).expect("confirm");

        let snapshot = engine.store().offers();
        let terminal = |error: NegotiationError| {
            matches!(error, NegotiationError::RequestTerminal { .. })
        };

        assert!(terminal(engine.accept_offer(&offer_b.id).unwrap_err()));
        assert!(terminal(engine.hold_offer(&offer_b.id).unwrap_err()));
        assert!(terminal(engine.reject_offer(&offer_b.id).unwrap_err()));
        assert!(terminal(engine.withdraw_offer(&offer_b.id).unwrap_err()));
        assert!(terminal(
            engine
                .submit_counter_offer(&offer_b.id, quote(&[("item-1", 1)]), Actor::Buyer)
                .unwrap_err()
        ));
        assert!(terminal(engine.confirm_offer(&offer_b.id, details()).unwrap_err()));
        assert!(terminal(
            engine
                .create_offer(
                    &vendor(3),
                    OfferDraft {
                        request_id: request_id.clone(),
                        quoted_items: quote(&[("item-1", 1_000)]),
                        notes: None,
                    },
                )
                .unwrap_err()
        ));
        assert!(terminal(engine.cancel_request(&request_id).unwrap_err()));

        assert_eq!(engine.store().offers(), snapshot);
    }

    #[test]
    fn cancelling_an_active_request_is_terminal_and_spares_offers() {
        let (mut engine, request_id, offer_a, _) = market();
        let cancelled = engine.cancel_request(&request_id).expect("cancel");
        assert_eq!(cancelled.status, RequestStatus::Cancelled);

        let offer = engine.store().offer(&offer_a.id).unwrap();
        assert_eq!(offer.status, OfferStatus::Pending);

        let error = engine.accept_offer(&offer_a.id).expect_err("cancelled request");
        assert!(matches!(error, NegotiationError::RequestTerminal { .. }));
    }

    #[test]
    fn cancelling_mid_confirmation_is_rejected() {
        let (mut engine, request_id, offer_a, _) = market();
        engine.accept_offer(&offer_a.id).expect("accept");

        let error = engine.cancel_request(&request_id).expect_err("deal is being finalized");
        assert_eq!(
            error,
            NegotiationError::InvalidRequestTransition {
                from: RequestStatus::PendingConfirmation,
                to: RequestStatus::Cancelled,
            }
        );
    }

    #[test]
    fn quotes_are_refused_while_a_deal_awaits_confirmation() {
        let (mut engine, request_id, offer_a, _) = market();
        engine.accept_offer(&offer_a.id).expect("accept");

        let error = engine
            .create_offer(
                &vendor(3),
                OfferDraft {
                    request_id: request_id.clone(),
                    quoted_items: quote(&[("item-1", 1_100)]),
                    notes: None,
                },
            )
            .expect_err("request is mid-confirmation");
        assert_eq!(
            error,
            NegotiationError::RequestNotOpen {
                request: request_id,
                status: RequestStatus::PendingConfirmation,
            }
        );
    }

    #[test]
    fn status_dispatcher_covers_the_negotiation_verbs() {
        let (mut engine, _, offer_a, offer_b) = market();

        let error = engine
            .update_offer_status(&offer_a.id, OfferStatus::Confirmed, None)
            .expect_err("details are mandatory for confirmation");
        assert_eq!(error, NegotiationError::MissingContactDetails);

        let error = engine
            .update_offer_status(&offer_a.id, OfferStatus::UserCountered, None)
            .expect_err("counters carry items and use submit_counter_offer");
        assert!(matches!(error, NegotiationError::InvalidTransition { .. }));

        let held = engine
            .update_offer_status(&offer_a.id, OfferStatus::OnHold, None)
            .expect("hold through the dispatcher");
        let offer = held.offers.iter().find(|offer| offer.id == offer_a.id).unwrap();
        assert_eq!(offer.status, OfferStatus::OnHold);

        engine.update_offer_status(&offer_b.id, OfferStatus::UserAccepted, None).expect("accept");
        let confirmed = engine
            .update_offer_status(&offer_b.id, OfferStatus::Confirmed, Some(details()))
            .expect("confirm through the dispatcher");
        assert_eq!(confirmed.request.status, RequestStatus::Completed);
    }

    #[test]
    fn unknown_ids_are_reported_as_such() {
        let mut engine = engine();
        let error = engine
            .update_offer_status(
                &crate::domain::offer::OfferId("offer-missing".to_string()),
                OfferStatus::Rejected,
                None,
            )
            .expect_err("nothing in the store");
        assert!(matches!(error, NegotiationError::UnknownOffer(_)));

        let error = engine
            .cancel_request(&RequestId("req-missing".to_string()))
            .expect_err("nothing in the store");
        assert!(matches!(error, NegotiationError::UnknownRequest(_)));
    }

    #[test]
    fn audited_transitions_emit_applied_and_rejected_events() {
        let (mut engine, request_id, offer_a, _) = market();
        let sink = InMemoryAuditSink::default();
        let context = AuditContext::new(
            Some(request_id),
            Some(offer_a.id.clone()),
            "corr-1",
            "buyer:user-1",
        );

        engine
            .update_offer_status_with_audit(
                &offer_a.id,
                OfferStatus::UserAccepted,
                None,
                &sink,
                &context,
            )
            .expect("accept");
        engine
            .update_offer_status_with_audit(
                &offer_a.id,
                OfferStatus::OnHold,
                None,
                &sink,
                &context,
            )
            .expect_err("accepted offers cannot be held");

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "negotiation.transition_applied");
        assert_eq!(events[0].metadata.get("request_status").map(String::as_str), Some("pending-confirmation"));
        assert_eq!(events[1].event_type, "negotiation.transition_rejected");
        assert!(events[1].metadata.contains_key("error"));
    }
}
