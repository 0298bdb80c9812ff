use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use haggle_core::domain::offer::{Offer, OfferId};
use haggle_core::domain::party::{Buyer, UserId, Vendor, VendorId};
use haggle_core::domain::product::{Product, ProductId};
use haggle_core::domain::request::{Request, RequestId};

pub mod buyer;
pub mod memory;
pub mod offer;
pub mod product;
pub mod request;
pub mod vendor;

pub use buyer::SqlBuyerRepository;
pub use memory::{
    InMemoryOfferRepository, InMemoryProductRepository, InMemoryRequestRepository,
    InMemoryVendorRepository,
};
pub use offer::SqlOfferRepository;
pub use product::SqlProductRepository;
pub use request::SqlRequestRepository;
pub use vendor::SqlVendorRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait RequestRepository: Send + Sync {
    async fn find_by_id(&self, id: &RequestId) -> Result<Option<Request>, RepositoryError>;
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Request>, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<Request>, RepositoryError>;
    async fn save(&self, request: Request) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait OfferRepository: Send + Sync {
    async fn find_by_id(&self, id: &OfferId) -> Result<Option<Offer>, RepositoryError>;
    async fn list_for_request(&self, request_id: &RequestId)
        -> Result<Vec<Offer>, RepositoryError>;
    async fn list_for_vendor(&self, vendor_id: &VendorId) -> Result<Vec<Offer>, RepositoryError>;
    async fn save(&self, offer: Offer) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait VendorRepository: Send + Sync {
    async fn find_by_id(&self, id: &VendorId) -> Result<Option<Vendor>, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<Vendor>, RepositoryError>;
    async fn save(&self, vendor: Vendor) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait BuyerRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<Buyer>, RepositoryError>;
    async fn save(&self, buyer: Buyer) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;
    async fn list_for_vendor(&self, vendor_id: &VendorId)
        -> Result<Vec<Product>, RepositoryError>;
    async fn save(&self, product: Product) -> Result<(), RepositoryError>;
}

// Column codecs shared by the SQL repositories. Money travels as canonical
// decimal strings, timestamps as RFC 3339, list-shaped fields as JSON.

pub(crate) fn encode_decimal(value: &Decimal) -> String {
    value.to_string()
}

pub(crate) fn decode_decimal(raw: &str) -> Result<Decimal, RepositoryError> {
    raw.parse::<Decimal>()
        .map_err(|_| RepositoryError::Decode(format!("invalid decimal `{raw}`")))
}

pub(crate) fn encode_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339()
}

pub(crate) fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|_| RepositoryError::Decode(format!("invalid timestamp `{raw}`")))
}

pub(crate) fn encode_json<T: Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value)
        .map_err(|error| RepositoryError::Decode(format!("json encode failed: {error}")))
}

pub(crate) fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T, RepositoryError> {
    serde_json::from_str(raw)
        .map_err(|error| RepositoryError::Decode(format!("json decode failed: {error}")))
}
