//! The one-way reveal of vendor contact details.
//!
//! Contact information crosses to the buyer exactly once, at the moment a
//! vendor confirms a deal, and never mutates afterward. Nothing in any
//! pre-confirmation state exposes these fields; the engine is the only
//! writer and attaches them inside the confirmation write-set.

use serde::{Deserialize, Serialize};

use crate::domain::party::Vendor;

/// Shown to the buyer so they can weigh verbatim profile data against
/// details the vendor typed for this one transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisclosureSource {
    Profile,
    Edited,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedContactDetails {
    pub business_name: String,
    pub email: String,
    pub phone: String,
    pub notes: Option<String>,
    pub source: DisclosureSource,
}

impl SharedContactDetails {
    /// Verbatim copy of the stored vendor profile.
    pub fn from_profile(vendor: &Vendor) -> Self {
        Self {
            business_name: vendor.business_name.clone(),
            email: vendor.email.clone(),
            phone: vendor.phone.clone().unwrap_or_else(|| "Not provided".to_string()),
            notes: Some("Details from vendor profile.".to_string()),
            source: DisclosureSource::Profile,
        }
    }

    /// Details the vendor rewrote for this transaction only.
    pub fn edited(
        business_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            business_name: business_name.into(),
            email: email.into(),
            phone: phone.into(),
            notes,
            source: DisclosureSource::Edited,
        }
    }
}
