//! Contract tests for the demo seed dataset: loading is idempotent, the
//! repositories round-trip every entity faithfully, and the negotiation
//! invariants hold over the seeded data.

use haggle_core::domain::offer::OfferStatus;
use haggle_core::domain::party::{UserId, VendorId};
use haggle_core::domain::request::{RequestId, RequestStatus};
use haggle_core::pricing::compute_total;
use haggle_db::repositories::{
    OfferRepository, RequestRepository, SqlOfferRepository, SqlRequestRepository,
    SqlVendorRepository, VendorRepository,
};
use haggle_db::{connect_memory, expected_seed_result, migrations, DbPool, DemoSeedDataset};

async fn seeded_pool() -> DbPool {
    let pool = connect_memory().await.expect("in-memory pool");
    migrations::run_pending(&pool).await.expect("migrations apply");
    DemoSeedDataset::load(&pool).await.expect("seed loads");
    pool
}

#[tokio::test]
async fn seed_reports_expected_counts_and_verifies() {
    let pool = connect_memory().await.expect("in-memory pool");
    migrations::run_pending(&pool).await.expect("migrations apply");

    let result = DemoSeedDataset::load(&pool).await.expect("seed loads");
    assert_eq!(result, expected_seed_result());

    let verification = DemoSeedDataset::verify(&pool).await.expect("verify runs");
    assert!(verification.passed(), "unexpected failures: {:?}", verification.failures);
}

#[tokio::test]
async fn seeding_twice_is_idempotent() {
    let pool = seeded_pool().await;
    let second = DemoSeedDataset::load(&pool).await.expect("reseed loads");
    assert_eq!(second, expected_seed_result());

    let requests = SqlRequestRepository::new(pool.clone()).list_all().await.expect("list");
    assert_eq!(requests.len(), expected_seed_result().requests);
}

#[tokio::test]
async fn requests_round_trip_with_item_order_preserved() {
    let pool = seeded_pool().await;
    let repo = SqlRequestRepository::new(pool.clone());

    let request = repo
        .find_by_id(&RequestId("req-1".to_string()))
        .await
        .expect("query runs")
        .expect("req-1 is seeded");

    assert_eq!(request.status, RequestStatus::Active);
    let item_ids: Vec<&str> = request.items.iter().map(|item| item.id.0.as_str()).collect();
    assert_eq!(item_ids, ["item-1-1", "item-1-2"]);
    assert_eq!(request.items[1].quantity, 2);

    let mine = repo.list_for_user(&UserId("user-1".to_string())).await.expect("list");
    let ids: Vec<&str> = mine.iter().map(|request| request.id.0.as_str()).collect();
    assert_eq!(ids, ["req-4", "req-1"]);
}

#[tokio::test]
async fn offer_totals_agree_with_derived_pricing() {
    let pool = seeded_pool().await;
    let requests = SqlRequestRepository::new(pool.clone());
    let offers = SqlOfferRepository::new(pool.clone());

    for request in requests.list_all().await.expect("requests") {
        for offer in offers.list_for_request(&request.id).await.expect("offers") {
            assert_eq!(
                offer.total_price,
                compute_total(&request.items, &offer.quoted_items),
                "offer {} total drifted from its items",
                offer.id
            );
        }
    }
}

#[tokio::test]
async fn the_confirmed_deal_carries_disclosed_details() {
    let pool = seeded_pool().await;
    let offers = SqlOfferRepository::new(pool.clone());

    let confirmed: Vec<_> = offers
        .list_for_vendor(&VendorId("vendor-1".to_string()))
        .await
        .expect("vendor offers")
        .into_iter()
        .filter(|offer| offer.status == OfferStatus::Confirmed)
        .collect();

    assert_eq!(confirmed.len(), 1);
    let details = confirmed[0].shared_contact_details.as_ref().expect("details disclosed");
    assert_eq!(details.business_name, "Auto Parts Pro");

    let vendor = SqlVendorRepository::new(pool.clone())
        .find_by_id(&VendorId("vendor-1".to_string()))
        .await
        .expect("query runs")
        .expect("vendor-1 is seeded");
    assert_eq!(details.email, vendor.email);
}
