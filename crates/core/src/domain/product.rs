use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::category::Category;
use crate::domain::party::VendorId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentPeriod {
    #[serde(rename = "per hour")]
    PerHour,
    #[serde(rename = "per day")]
    PerDay,
    #[serde(rename = "per week")]
    PerWeek,
    #[serde(rename = "per month")]
    PerMonth,
}

/// A catalog listing a vendor puts in front of buyers. Products are not part
/// of the negotiation state machine; a buyer browsing one raises a targeted
/// request against its vendor instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub vendor_id: VendorId,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub category: Category,
    pub image_url: Option<String>,
    pub for_rent: bool,
    pub rent_price: Option<Decimal>,
    pub rent_period: Option<RentPeriod>,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{Product, ProductId, RentPeriod};
    use crate::domain::category::Category;
    use crate::domain::party::VendorId;

    #[test]
    fn rent_periods_serialize_with_marketplace_labels() {
        let json = serde_json::to_string(&RentPeriod::PerWeek).expect("serialize");
        assert_eq!(json, "\"per week\"");
    }

    #[test]
    fn product_round_trips_through_serde() {
        let product = Product {
            id: ProductId("prod-1".to_string()),
            vendor_id: VendorId("vendor-3".to_string()),
            title: "Raspberry Pi 4 Model B".to_string(),
            description: "4GB RAM, includes official power supply.".to_string(),
            price: Decimal::new(6_500, 2),
            category: Category::Computing,
            image_url: None,
            for_rent: false,
            rent_price: None,
            rent_period: None,
        };

        let json = serde_json::to_string(&product).expect("serialize");
        let back: Product = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, product);
    }
}
