use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on categories a single request may carry.
pub const MAX_REQUEST_CATEGORIES: usize = 3;

/// Fixed marketplace taxonomy. Requests and vendor specialties both draw
/// from this list; matching between the two is set intersection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Auto Parts")]
    AutoParts,
    #[serde(rename = "Plumbing")]
    Plumbing,
    #[serde(rename = "Electronics")]
    Electronics,
    #[serde(rename = "Hardware")]
    Hardware,
    #[serde(rename = "Computing")]
    Computing,
    #[serde(rename = "Home Improvement")]
    HomeImprovement,
    #[serde(rename = "Appliances")]
    Appliances,
    #[serde(rename = "Gardening")]
    Gardening,
    #[serde(rename = "Sporting Goods")]
    SportingGoods,
    #[serde(rename = "Industrial")]
    Industrial,
    #[serde(rename = "General")]
    General,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::AutoParts,
        Category::Plumbing,
        Category::Electronics,
        Category::Hardware,
        Category::Computing,
        Category::HomeImprovement,
        Category::Appliances,
        Category::Gardening,
        Category::SportingGoods,
        Category::Industrial,
        Category::General,
    ];

    /// Marketplace display label, also the storage encoding.
    pub fn label(&self) -> &'static str {
        match self {
            Category::AutoParts => "Auto Parts",
            Category::Plumbing => "Plumbing",
            Category::Electronics => "Electronics",
            Category::Hardware => "Hardware",
            Category::Computing => "Computing",
            Category::HomeImprovement => "Home Improvement",
            Category::Appliances => "Appliances",
            Category::Gardening => "Gardening",
            Category::SportingGoods => "Sporting Goods",
            Category::Industrial => "Industrial",
            Category::General => "General",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown category `{0}`")]
pub struct UnknownCategory(pub String);

impl std::str::FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownCategory(value.to_string()))
    }
}
