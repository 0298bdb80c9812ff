//! Role-specific read models derived from the request/offer collections.
//!
//! Everything here is a pure function of the current collections; nothing is
//! cached. Both dashboards run through one parameterized projection,
//! [`requests_in_tab`], so the two predicate sets cannot drift apart
//! structurally. The predicates themselves are asymmetric on purpose: buyer
//! tabs key off the request status alone, vendor tabs key off that vendor's
//! latest offer per request. This mirrors the shipped marketplace behavior
//! and is preserved as-is.

use std::collections::HashSet;

use crate::domain::offer::{Offer, OfferStatus};
use crate::domain::party::{UserId, Vendor, VendorId};
use crate::domain::request::{Request, RequestId, RequestStatus};

/// A dashboard tab predicate. `latest_offer` is the viewing vendor's most
/// recent offer on the request, and `None` for buyer-side views.
pub trait TabFilter {
    fn admits(&self, request: &Request, latest_offer: Option<&Offer>) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VendorTab {
    ActiveEnquiries,
    ConfirmedOrders,
    History,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserTab {
    Active,
    Confirmed,
    History,
}

impl TabFilter for VendorTab {
    fn admits(&self, request: &Request, latest_offer: Option<&Offer>) -> bool {
        let Some(offer) = latest_offer else {
            return false;
        };
        match self {
            VendorTab::ActiveEnquiries => offer.status.is_open(),
            VendorTab::ConfirmedOrders => offer.status == OfferStatus::Confirmed,
            VendorTab::History => {
                matches!(offer.status, OfferStatus::Rejected | OfferStatus::Withdrawn)
                    || request.status == RequestStatus::Cancelled
            }
        }
    }
}

impl TabFilter for UserTab {
    fn admits(&self, request: &Request, _latest_offer: Option<&Offer>) -> bool {
        match self {
            UserTab::Active => matches!(
                request.status,
                RequestStatus::Active | RequestStatus::PendingConfirmation
            ),
            UserTab::Confirmed => request.status == RequestStatus::Completed,
            UserTab::History => request.status == RequestStatus::Cancelled,
        }
    }
}

/// Whose dashboard a projection feeds. The scope supplies the ownership
/// filter and decides whether a latest offer is resolved for the predicate.
#[derive(Clone, Copy, Debug)]
pub enum ViewScope<'a> {
    Buyer(&'a UserId),
    Vendor(&'a VendorId),
}

/// The single projection both dashboards are built from.
pub fn requests_in_tab<'a, F>(
    tab: &F,
    scope: ViewScope<'_>,
    requests: &'a [Request],
    offers: &[Offer],
) -> Vec<&'a Request>
where
    F: TabFilter,
{
    requests
        .iter()
        .filter(|request| match scope {
            ViewScope::Buyer(user_id) => {
                &request.user_id == user_id && tab.admits(request, None)
            }
            ViewScope::Vendor(vendor_id) => {
                tab.admits(request, latest_offer(offers, &request.id, vendor_id))
            }
        })
        .collect()
}

/// The vendor's most recent offer on a request, by creation time with id as
/// the tie-breaker.
pub fn latest_offer<'a>(
    offers: &'a [Offer],
    request_id: &RequestId,
    vendor_id: &VendorId,
) -> Option<&'a Offer> {
    offers
        .iter()
        .filter(|offer| &offer.request_id == request_id && &offer.vendor_id == vendor_id)
        .max_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.0.cmp(&b.id.0)))
}

/// Caller-side policy helper for the one-open-offer-per-vendor convention:
/// the engine itself permits several.
pub fn vendor_has_open_offer(
    vendor_id: &VendorId,
    request_id: &RequestId,
    offers: &[Offer],
) -> bool {
    offers.iter().any(|offer| {
        &offer.request_id == request_id
            && &offer.vendor_id == vendor_id
            && offer.status.is_open()
    })
}

/// Active requests this vendor could still quote on: public ones matching a
/// specialty, or ones targeted at the vendor, minus enquiries the vendor has
/// already fulfilled. The active-status gate also keeps every terminal
/// request out, quoted on or not.
pub fn leads_for_vendor<'a>(
    vendor: &Vendor,
    requests: &'a [Request],
    offers: &[Offer],
) -> Vec<&'a Request> {
    let fulfilled: HashSet<&RequestId> = offers
        .iter()
        .filter(|offer| {
            offer.vendor_id == vendor.id && offer.status == OfferStatus::Confirmed
        })
        .map(|offer| &offer.request_id)
        .collect();

    requests
        .iter()
        .filter(|request| {
            if request.status != RequestStatus::Active || fulfilled.contains(&request.id) {
                return false;
            }
            if request.is_targeted() {
                request.targeted_vendor_ids.contains(&vendor.id)
            } else {
                request.categories.iter().any(|category| vendor.specialties.contains(category))
            }
        })
        .collect()
}

pub fn active_enquiries_for_vendor<'a>(
    vendor_id: &VendorId,
    requests: &'a [Request],
    offers: &[Offer],
) -> Vec<&'a Request> {
    requests_in_tab(&VendorTab::ActiveEnquiries, ViewScope::Vendor(vendor_id), requests, offers)
}

pub fn confirmed_orders_for_vendor<'a>(
    vendor_id: &VendorId,
    requests: &'a [Request],
    offers: &[Offer],
) -> Vec<&'a Request> {
    requests_in_tab(&VendorTab::ConfirmedOrders, ViewScope::Vendor(vendor_id), requests, offers)
}

pub fn enquiry_history_for_vendor<'a>(
    vendor_id: &VendorId,
    requests: &'a [Request],
    offers: &[Offer],
) -> Vec<&'a Request> {
    requests_in_tab(&VendorTab::History, ViewScope::Vendor(vendor_id), requests, offers)
}

pub fn active_enquiries_for_user<'a>(
    user_id: &UserId,
    requests: &'a [Request],
    offers: &[Offer],
) -> Vec<&'a Request> {
    requests_in_tab(&UserTab::Active, ViewScope::Buyer(user_id), requests, offers)
}

pub fn confirmed_orders_for_user<'a>(
    user_id: &UserId,
    requests: &'a [Request],
    offers: &[Offer],
) -> Vec<&'a Request> {
    requests_in_tab(&UserTab::Confirmed, ViewScope::Buyer(user_id), requests, offers)
}

pub fn history_for_user<'a>(
    user_id: &UserId,
    requests: &'a [Request],
    offers: &[Offer],
) -> Vec<&'a Request> {
    requests_in_tab(&UserTab::History, ViewScope::Buyer(user_id), requests, offers)
}
