use serde::{Deserialize, Serialize};

use crate::domain::category::Category;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VendorId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for VendorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A buyer account. Buyers own requests and drive the accept/hold/counter
/// side of a negotiation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// A vendor account. Specialties decide which public requests surface as
/// leads; contact fields are what a confirmation may disclose.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub business_name: String,
    pub specialties: Vec<Category>,
    pub email: String,
    pub phone: Option<String>,
}

/// Authenticated marketplace identity. Every negotiation decision point
/// matches exhaustively on this instead of consulting a side-channel role
/// string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Party {
    Buyer(Buyer),
    Vendor(Vendor),
}

impl Party {
    pub fn actor(&self) -> Actor {
        match self {
            Party::Buyer(_) => Actor::Buyer,
            Party::Vendor(_) => Actor::Vendor,
        }
    }
}

/// Which side of the table an operation comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    Buyer,
    Vendor,
}

#[cfg(test)]
mod tests {
    use super::{Actor, Buyer, Party, UserId, Vendor, VendorId};
    use crate::domain::category::Category;

    #[test]
    fn party_resolves_to_its_actor() {
        let buyer = Party::Buyer(Buyer {
            id: UserId("user-1".to_string()),
            name: "Alex Johnson".to_string(),
            email: "alex@example.com".to_string(),
        });
        let vendor = Party::Vendor(Vendor {
            id: VendorId("vendor-1".to_string()),
            business_name: "Auto Parts Pro".to_string(),
            specialties: vec![Category::AutoParts],
            email: "parts@example.com".to_string(),
            phone: None,
        });

        assert_eq!(buyer.actor(), Actor::Buyer);
        assert_eq!(vendor.actor(), Actor::Vendor);
    }

    #[test]
    fn party_serializes_with_role_tag() {
        let vendor = Party::Vendor(Vendor {
            id: VendorId("vendor-2".to_string()),
            business_name: "Plumb Perfect".to_string(),
            specialties: vec![Category::Plumbing, Category::Hardware],
            email: "plumbing@example.com".to_string(),
            phone: Some("555-0102".to_string()),
        });

        let json = serde_json::to_value(&vendor).expect("serialize");
        assert_eq!(json["role"], "vendor");
        assert_eq!(json["specialties"][0], "Plumbing");
    }
}
