use thiserror::Error;

use crate::domain::offer::{OfferId, OfferStatus};
use crate::domain::request::{RequestId, RequestStatus};

/// Caller-correctable draft problems, surfaced as form-level messages.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("a request must contain at least one item")]
    EmptyItems,
    #[error("a request must carry between 1 and 3 categories (got {count})")]
    InvalidCategories { count: usize },
    #[error("a quote must price at least one requested item")]
    NoAvailableItems,
}

/// Failures of the negotiation protocol itself. All variants are recoverable
/// values: a failed operation leaves every entity untouched.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum NegotiationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The offer cannot move from its current status to the attempted one.
    /// Usually a stale view or a race; the caller should re-fetch and retry.
    #[error("offer cannot move from {from:?} to {attempted:?}")]
    InvalidTransition { from: OfferStatus, attempted: OfferStatus },
    /// Internal-consistency guard on the request machine; reachable from the
    /// outside only through `cancel_request` on a pending-confirmation
    /// request.
    #[error("request cannot move from {from:?} to {to:?}")]
    InvalidRequestTransition { from: RequestStatus, to: RequestStatus },
    /// The enquiry reached `completed` or `cancelled`; never retried.
    #[error("request {request} is {status:?} and closed to negotiation")]
    RequestTerminal { request: RequestId, status: RequestStatus },
    /// The enquiry is mid-confirmation and not open for new quotes.
    #[error("request {request} is {status:?} and not accepting new quotes")]
    RequestNotOpen { request: RequestId, status: RequestStatus },
    #[error("unknown request {0}")]
    UnknownRequest(RequestId),
    #[error("unknown offer {0}")]
    UnknownOffer(OfferId),
    #[error("confirming a deal requires shared contact details")]
    MissingContactDetails,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApplicationError {
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Negotiation(error) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Persistence(message) | ApplicationError::Integration(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
