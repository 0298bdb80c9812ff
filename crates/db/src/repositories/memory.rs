use std::collections::HashMap;

use tokio::sync::RwLock;

use haggle_core::domain::offer::{Offer, OfferId};
use haggle_core::domain::party::{UserId, Vendor, VendorId};
use haggle_core::domain::product::{Product, ProductId};
use haggle_core::domain::request::{Request, RequestId};

use super::{
    OfferRepository, ProductRepository, RepositoryError, RequestRepository, VendorRepository,
};

fn sort_requests(mut requests: Vec<Request>) -> Vec<Request> {
    requests.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.0.cmp(&b.id.0)));
    requests
}

fn sort_offers(mut offers: Vec<Offer>) -> Vec<Offer> {
    offers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.0.cmp(&b.id.0)));
    offers
}

#[derive(Default)]
pub struct InMemoryRequestRepository {
    requests: RwLock<HashMap<String, Request>>,
}

#[async_trait::async_trait]
impl RequestRepository for InMemoryRequestRepository {
    async fn find_by_id(&self, id: &RequestId) -> Result<Option<Request>, RepositoryError> {
        let requests = self.requests.read().await;
        Ok(requests.get(&id.0).cloned())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Request>, RepositoryError> {
        let requests = self.requests.read().await;
        Ok(sort_requests(
            requests.values().filter(|request| &request.user_id == user_id).cloned().collect(),
        ))
    }

    async fn list_all(&self) -> Result<Vec<Request>, RepositoryError> {
        let requests = self.requests.read().await;
        Ok(sort_requests(requests.values().cloned().collect()))
    }

    async fn save(&self, request: Request) -> Result<(), RepositoryError> {
        let mut requests = self.requests.write().await;
        requests.insert(request.id.0.clone(), request);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryOfferRepository {
    offers: RwLock<HashMap<String, Offer>>,
}

#[async_trait::async_trait]
impl OfferRepository for InMemoryOfferRepository {
    async fn find_by_id(&self, id: &OfferId) -> Result<Option<Offer>, RepositoryError> {
        let offers = self.offers.read().await;
        Ok(offers.get(&id.0).cloned())
    }

    async fn list_for_request(
        &self,
        request_id: &RequestId,
    ) -> Result<Vec<Offer>, RepositoryError> {
        let offers = self.offers.read().await;
        Ok(sort_offers(
            offers.values().filter(|offer| &offer.request_id == request_id).cloned().collect(),
        ))
    }

    async fn list_for_vendor(&self, vendor_id: &VendorId) -> Result<Vec<Offer>, RepositoryError> {
        let offers = self.offers.read().await;
        Ok(sort_offers(
            offers.values().filter(|offer| &offer.vendor_id == vendor_id).cloned().collect(),
        ))
    }

    async fn save(&self, offer: Offer) -> Result<(), RepositoryError> {
        let mut offers = self.offers.write().await;
        offers.insert(offer.id.0.clone(), offer);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryVendorRepository {
    vendors: RwLock<HashMap<String, Vendor>>,
}

#[async_trait::async_trait]
impl VendorRepository for InMemoryVendorRepository {
    async fn find_by_id(&self, id: &VendorId) -> Result<Option<Vendor>, RepositoryError> {
        let vendors = self.vendors.read().await;
        Ok(vendors.get(&id.0).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Vendor>, RepositoryError> {
        let vendors = self.vendors.read().await;
        let mut all: Vec<Vendor> = vendors.values().cloned().collect();
        all.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(all)
    }

    async fn save(&self, vendor: Vendor) -> Result<(), RepositoryError> {
        let mut vendors = self.vendors.write().await;
        vendors.insert(vendor.id.0.clone(), vendor);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<String, Product>>,
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.get(&id.0).cloned())
    }

    async fn list_for_vendor(
        &self,
        vendor_id: &VendorId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        let mut all: Vec<Product> =
            products.values().filter(|product| &product.vendor_id == vendor_id).cloned().collect();
        all.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(all)
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        products.insert(product.id.0.clone(), product);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use haggle_core::domain::category::Category;
    use haggle_core::domain::offer::{Offer, OfferId, OfferStatus, QuotedItem};
    use haggle_core::domain::party::{UserId, Vendor, VendorId};
    use haggle_core::domain::request::{
        RequestDraft, RequestId, RequestItem, RequestItemId,
    };

    use crate::repositories::{
        InMemoryOfferRepository, InMemoryRequestRepository, InMemoryVendorRepository,
        OfferRepository, RequestRepository, VendorRepository,
    };

    #[tokio::test]
    async fn in_memory_request_repo_round_trip() {
        let repo = InMemoryRequestRepository::default();
        let request = RequestDraft {
            title: "Leaky faucet cartridge".to_string(),
            items: vec![RequestItem {
                id: RequestItemId("item-1".to_string()),
                title: "Delta 101-DST cartridge".to_string(),
                description: "Single-handle model, slow drip from the spout.".to_string(),
                quantity: 1,
                image_url: None,
            }],
            categories: vec![Category::Plumbing],
            ..RequestDraft::default()
        }
        .into_request(RequestId("req-1".to_string()), UserId("user-2".to_string()), Utc::now())
        .expect("valid draft");

        repo.save(request.clone()).await.expect("save request");
        let found = repo.find_by_id(&request.id).await.expect("find request");
        assert_eq!(found, Some(request.clone()));

        let listed = repo.list_for_user(&request.user_id).await.expect("list for user");
        assert_eq!(listed, vec![request]);
    }

    #[tokio::test]
    async fn in_memory_offer_repo_partitions_by_request_and_vendor() {
        let repo = InMemoryOfferRepository::default();
        let offer = Offer {
            id: OfferId("offer-1".to_string()),
            request_id: RequestId("req-1".to_string()),
            vendor_id: VendorId("vendor-2".to_string()),
            quoted_items: vec![QuotedItem {
                request_item_id: RequestItemId("item-1".to_string()),
                price: Decimal::new(2_550, 2),
            }],
            total_price: Decimal::new(2_550, 2),
            notes: Some("Can install tomorrow.".to_string()),
            status: OfferStatus::Pending,
            created_at: Utc::now(),
            shared_contact_details: None,
        };

        repo.save(offer.clone()).await.expect("save offer");

        let by_request =
            repo.list_for_request(&offer.request_id).await.expect("list for request");
        assert_eq!(by_request, vec![offer.clone()]);

        let by_vendor = repo.list_for_vendor(&offer.vendor_id).await.expect("list for vendor");
        assert_eq!(by_vendor, vec![offer]);

        let elsewhere = repo
            .list_for_request(&RequestId("req-9".to_string()))
            .await
            .expect("list for other request");
        assert!(elsewhere.is_empty());
    }

    #[tokio::test]
    async fn in_memory_vendor_repo_round_trip() {
        let repo = InMemoryVendorRepository::default();
        let vendor = Vendor {
            id: VendorId("vendor-1".to_string()),
            business_name: "Auto Parts Pro".to_string(),
            specialties: vec![Category::AutoParts],
            email: "parts@example.com".to_string(),
            phone: Some("555-0101".to_string()),
        };

        repo.save(vendor.clone()).await.expect("save vendor");
        let found = repo.find_by_id(&vendor.id).await.expect("find vendor");
        assert_eq!(found, Some(vendor));
    }
}
