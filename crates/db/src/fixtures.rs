//! Deterministic demo dataset and its verification contract.
//!
//! The seed paints one of each negotiation situation: a fresh multi-item
//! enquiry collecting quotes, an accepted quote awaiting vendor
//! confirmation, a countered quote, and a completed deal with disclosed
//! contact details. Loading is an upsert through the repositories, so
//! reseeding an existing database is safe.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use haggle_core::disclosure::SharedContactDetails;
use haggle_core::domain::category::Category;
use haggle_core::domain::offer::{Offer, OfferId, OfferStatus, QuotedItem};
use haggle_core::domain::party::{Buyer, UserId, Vendor, VendorId};
use haggle_core::domain::product::{Product, ProductId, RentPeriod};
use haggle_core::domain::request::{
    Request, RequestId, RequestItem, RequestItemId, RequestStatus,
};
use haggle_core::pricing::compute_total;

use crate::connection::DbPool;
use crate::repositories::{
    decode_timestamp, BuyerRepository, OfferRepository, ProductRepository, RepositoryError,
    RequestRepository, SqlBuyerRepository, SqlOfferRepository, SqlProductRepository,
    SqlRequestRepository, SqlVendorRepository, VendorRepository,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub buyers: usize,
    pub vendors: usize,
    pub products: usize,
    pub requests: usize,
    pub offers: usize,
}

#[derive(Clone, Debug, Default)]
pub struct VerificationResult {
    pub failures: Vec<String>,
}

impl VerificationResult {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct DemoSeedDataset;

impl DemoSeedDataset {
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let buyers = SqlBuyerRepository::new(pool.clone());
        let vendors = SqlVendorRepository::new(pool.clone());
        let products = SqlProductRepository::new(pool.clone());
        let requests = SqlRequestRepository::new(pool.clone());
        let offers = SqlOfferRepository::new(pool.clone());

        let buyer_rows = seed_buyers();
        for buyer in &buyer_rows {
            buyers.save(buyer.clone()).await?;
        }

        let vendor_rows = seed_vendors();
        for vendor in &vendor_rows {
            vendors.save(vendor.clone()).await?;
        }

        let product_rows = seed_products();
        for product in &product_rows {
            products.save(product.clone()).await?;
        }

        let request_rows = seed_requests()?;
        for request in &request_rows {
            requests.save(request.clone()).await?;
        }

        let offer_rows = seed_offers(&request_rows, &vendor_rows)?;
        for offer in &offer_rows {
            offers.save(offer.clone()).await?;
        }

        Ok(SeedResult {
            buyers: buyer_rows.len(),
            vendors: vendor_rows.len(),
            products: product_rows.len(),
            requests: request_rows.len(),
            offers: offer_rows.len(),
        })
    }

    /// Re-reads the dataset through the repositories and checks the
    /// invariants the rest of the system leans on.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let requests = SqlRequestRepository::new(pool.clone()).list_all().await?;
        let offer_repo = SqlOfferRepository::new(pool.clone());

        let mut result = VerificationResult::default();
        let expected = expected_seed_result();

        if requests.len() != expected.requests {
            result.failures.push(format!(
                "expected {} seeded requests, found {}",
                expected.requests,
                requests.len()
            ));
        }

        for request in &requests {
            if request.items.is_empty() {
                result.failures.push(format!("request {} has no items", request.id));
            }
            if request.categories.is_empty() || request.categories.len() > 3 {
                result.failures.push(format!(
                    "request {} carries {} categories",
                    request.id,
                    request.categories.len()
                ));
            }

            let offers = offer_repo.list_for_request(&request.id).await?;
            for offer in &offers {
                let derived = compute_total(&request.items, &offer.quoted_items);
                if offer.total_price != derived {
                    result.failures.push(format!(
                        "offer {} stores total {} but its items derive {}",
                        offer.id, offer.total_price, derived
                    ));
                }

                match offer.status {
                    OfferStatus::Confirmed => {
                        if request.status != RequestStatus::Completed {
                            result.failures.push(format!(
                                "offer {} is confirmed but request {} is {:?}",
                                offer.id, request.id, request.status
                            ));
                        }
                        if offer.shared_contact_details.is_none() {
                            result.failures.push(format!(
                                "offer {} is confirmed without disclosed contact details",
                                offer.id
                            ));
                        }
                    }
                    _ => {
                        if offer.shared_contact_details.is_some() {
                            result.failures.push(format!(
                                "offer {} discloses contact details before confirmation",
                                offer.id
                            ));
                        }
                    }
                }
            }
        }

        Ok(result)
    }
}

pub fn expected_seed_result() -> SeedResult {
    SeedResult { buyers: 3, vendors: 4, products: 3, requests: 4, offers: 5 }
}

fn ts(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    decode_timestamp(raw)
}

fn seed_buyers() -> Vec<Buyer> {
    let buyer = |id: &str, name: &str, email: &str| Buyer {
        id: UserId(id.to_string()),
        name: name.to_string(),
        email: email.to_string(),
    };
    vec![
        buyer("user-1", "Alex Johnson", "alex@example.com"),
        buyer("user-2", "Maria Garcia", "maria@example.com"),
        buyer("user-3", "Sam Chen", "sam@example.com"),
    ]
}

fn seed_vendors() -> Vec<Vendor> {
    let vendor = |id: &str, name: &str, specialties: Vec<Category>, email: &str, phone: Option<&str>| Vendor {
        id: VendorId(id.to_string()),
        business_name: name.to_string(),
        specialties,
        email: email.to_string(),
        phone: phone.map(str::to_string),
    };
    vec![
        vendor(
            "vendor-1",
            "Auto Parts Pro",
            vec![Category::AutoParts, Category::Hardware],
            "parts@example.com",
            Some("555-0101"),
        ),
        vendor(
            "vendor-2",
            "Plumb Perfect",
            vec![Category::Plumbing, Category::Hardware],
            "plumbing@example.com",
            None,
        ),
        vendor(
            "vendor-3",
            "Circuit City Surplus",
            vec![Category::Electronics, Category::Computing],
            "electronics@example.com",
            Some("555-0103"),
        ),
        vendor(
            "vendor-4",
            "General Hardware Hub",
            vec![Category::Hardware, Category::General],
            "hardware@example.com",
            None,
        ),
    ]
}

fn seed_products() -> Vec<Product> {
    vec![
        Product {
            id: ProductId("prod-1".to_string()),
            vendor_id: VendorId("vendor-3".to_string()),
            title: "Raspberry Pi 4 Model B - 4GB".to_string(),
            description: "Tested pull from lab stock, includes official power supply.".to_string(),
            price: Decimal::new(6_500, 2),
            category: Category::Computing,
            image_url: None,
            for_rent: false,
            rent_price: None,
            rent_period: None,
        },
        Product {
            id: ProductId("prod-2".to_string()),
            vendor_id: VendorId("vendor-1".to_string()),
            title: "Ceramic brake pad set".to_string(),
            description: "Front axle set for 2016-2021 Honda Civic.".to_string(),
            price: Decimal::new(3_450, 2),
            category: Category::AutoParts,
            image_url: None,
            for_rent: false,
            rent_price: None,
            rent_period: None,
        },
        Product {
            id: ProductId("prod-3".to_string()),
            vendor_id: VendorId("vendor-4".to_string()),
            title: "Cordless drill, 18V".to_string(),
            description: "Two batteries and charger included.".to_string(),
            price: Decimal::new(8_999, 2),
            category: Category::Hardware,
            image_url: None,
            for_rent: true,
            rent_price: Some(Decimal::new(1_200, 2)),
            rent_period: Some(RentPeriod::PerDay),
        },
    ]
}

fn seed_requests() -> Result<Vec<Request>, RepositoryError> {
    let item = |id: &str, title: &str, description: &str, quantity: u32| RequestItem {
        id: RequestItemId(id.to_string()),
        title: title.to_string(),
        description: description.to_string(),
        quantity,
        image_url: None,
    };

    Ok(vec![
        Request {
            id: RequestId("req-1".to_string()),
            user_id: UserId("user-1".to_string()),
            title: "Brake overhaul for 2018 Honda Civic".to_string(),
            items: vec![
                item(
                    "item-1-1",
                    "Front-left brake caliper",
                    "OEM part number 45019-TBA-A00, new or excellent refurbished.",
                    1,
                ),
                item("item-1-2", "Brake pad set", "Ceramic preferred, front axle.", 2),
            ],
            categories: vec![Category::AutoParts],
            status: RequestStatus::Active,
            created_at: ts("2026-06-18T09:00:00+00:00")?,
            targeted_vendor_ids: Vec::new(),
            source_product_id: None,
        },
        Request {
            id: RequestId("req-2".to_string()),
            user_id: UserId("user-2".to_string()),
            title: "Leaky faucet cartridge".to_string(),
            items: vec![item(
                "item-2-1",
                "Delta 101-DST cartridge",
                "Single-handle kitchen model, slow drip from the spout.",
                1,
            )],
            categories: vec![Category::Plumbing],
            status: RequestStatus::PendingConfirmation,
            created_at: ts("2026-06-19T14:30:00+00:00")?,
            targeted_vendor_ids: vec![VendorId("vendor-2".to_string())],
            source_product_id: None,
        },
        Request {
            id: RequestId("req-3".to_string()),
            user_id: UserId("user-3".to_string()),
            title: "Raspberry Pi 4 Model B - 4GB".to_string(),
            items: vec![item(
                "item-3-1",
                "Raspberry Pi 4, 4GB RAM",
                "Used is fine if in good working condition; official power supply a plus.",
                1,
            )],
            categories: vec![Category::Computing],
            status: RequestStatus::Active,
            created_at: ts("2026-06-16T11:15:00+00:00")?,
            targeted_vendor_ids: Vec::new(),
            source_product_id: Some(ProductId("prod-1".to_string())),
        },
        Request {
            id: RequestId("req-4".to_string()),
            user_id: UserId("user-1".to_string()),
            title: "Set of 4 lug nuts for alloy wheels".to_string(),
            items: vec![item(
                "item-4-1",
                "M12x1.5 acorn lug nut",
                "Chrome finish preferred, for aftermarket alloy wheels.",
                4,
            )],
            categories: vec![Category::AutoParts],
            status: RequestStatus::Completed,
            created_at: ts("2026-06-10T08:00:00+00:00")?,
            targeted_vendor_ids: Vec::new(),
            source_product_id: None,
        },
    ])
}

fn seed_offers(
    requests: &[Request],
    vendors: &[Vendor],
) -> Result<Vec<Offer>, RepositoryError> {
    let quoted = |item_id: &str, cents: i64| QuotedItem {
        request_item_id: RequestItemId(item_id.to_string()),
        price: Decimal::new(cents, 2),
    };
    let offer = |id: &str,
                 request: &Request,
                 vendor_id: &str,
                 quoted_items: Vec<QuotedItem>,
                 notes: Option<&str>,
                 status: OfferStatus,
                 created_at: DateTime<Utc>| Offer {
        id: OfferId(id.to_string()),
        request_id: request.id.clone(),
        vendor_id: VendorId(vendor_id.to_string()),
        total_price: compute_total(&request.items, &quoted_items),
        quoted_items,
        notes: notes.map(str::to_string),
        status,
        created_at,
        shared_contact_details: None,
    };

    let vendor_1 = vendors
        .iter()
        .find(|vendor| vendor.id.0 == "vendor-1")
        .ok_or_else(|| RepositoryError::Decode("seed vendors missing vendor-1".to_string()))?;

    let mut rows = vec![
        offer(
            "offer-1",
            &requests[0],
            "vendor-1",
            vec![quoted("item-1-1", 9_500), quoted("item-1-2", 1_250)],
            Some("OEM parts, in stock."),
            OfferStatus::Pending,
            ts("2026-06-19T10:00:00+00:00")?,
        ),
        offer(
            "offer-2",
            &requests[1],
            "vendor-2",
            vec![quoted("item-2-1", 2_550)],
            Some("Can install tomorrow."),
            OfferStatus::UserAccepted,
            ts("2026-06-20T09:45:00+00:00")?,
        ),
        offer(
            "offer-3",
            &requests[2],
            "vendor-3",
            vec![quoted("item-3-1", 6_500)],
            Some("Includes power supply."),
            OfferStatus::Pending,
            ts("2026-06-17T16:20:00+00:00")?,
        ),
        offer(
            "offer-5",
            &requests[2],
            "vendor-4",
            vec![quoted("item-3-1", 6_000)],
            Some("Slightly used, works perfectly."),
            OfferStatus::UserCountered,
            ts("2026-06-18T12:05:00+00:00")?,
        ),
    ];

    let mut confirmed = offer(
        "offer-4",
        &requests[3],
        "vendor-1",
        vec![quoted("item-4-1", 375)],
        None,
        OfferStatus::Confirmed,
        ts("2026-06-11T10:30:00+00:00")?,
    );
    confirmed.shared_contact_details = Some(SharedContactDetails::from_profile(vendor_1));
    rows.push(confirmed);

    Ok(rows)
}
