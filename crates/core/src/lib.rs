pub mod audit;
pub mod config;
pub mod disclosure;
pub mod domain;
pub mod errors;
pub mod negotiation;
pub mod pricing;
pub mod views;

pub use audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
pub use disclosure::{DisclosureSource, SharedContactDetails};
pub use domain::category::{Category, UnknownCategory, MAX_REQUEST_CATEGORIES};
pub use domain::offer::{Offer, OfferDraft, OfferId, OfferStatus, QuotedItem};
pub use domain::party::{Actor, Buyer, Party, UserId, Vendor, VendorId};
pub use domain::product::{Product, ProductId, RentPeriod};
pub use domain::request::{
    Request, RequestDraft, RequestId, RequestItem, RequestItemId, RequestStatus,
};
pub use errors::{ApplicationError, InterfaceError, NegotiationError, ValidationError};
pub use negotiation::{
    InMemoryMarketStore, MarketStore, NegotiationEngine, NegotiationOutcome, WriteSet,
};
pub use pricing::{breakdown, compute_total, has_available_item, PricingBreakdown, QuotedLine};
pub use views::{
    active_enquiries_for_user, active_enquiries_for_vendor, confirmed_orders_for_user,
    confirmed_orders_for_vendor, enquiry_history_for_vendor, history_for_user, latest_offer,
    leads_for_vendor, requests_in_tab, vendor_has_open_offer, TabFilter, UserTab, VendorTab,
    ViewScope,
};
