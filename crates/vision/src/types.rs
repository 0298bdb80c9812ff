use serde::{Deserialize, Serialize};

use haggle_core::domain::category::{Category, MAX_REQUEST_CATEGORIES};

/// An image captured by the request form, ready to send for analysis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub mime_type: String,
    pub base64_data: String,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, base64_data: impl Into<String>) -> Self {
        Self { mime_type: mime_type.into(), base64_data: base64_data.into() }
    }
}

/// A web source the analysis grounded its identification on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLink {
    pub uri: String,
    pub title: String,
}

/// Pre-populated form fields for one request item. Everything here is a
/// suggestion the buyer can overwrite before submitting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSuggestion {
    pub title: String,
    pub description: String,
    pub categories: Vec<Category>,
    pub sources: Vec<SourceLink>,
}

/// Bring a suggested category list inside the request invariant: unique,
/// at most three, never empty.
pub fn clamp_categories(found: Vec<Category>) -> Vec<Category> {
    let mut unique = Vec::new();
    for category in found {
        if !unique.contains(&category) {
            unique.push(category);
        }
        if unique.len() == MAX_REQUEST_CATEGORIES {
            break;
        }
    }
    if unique.is_empty() {
        unique.push(Category::General);
    }
    unique
}

#[cfg(test)]
mod tests {
    use haggle_core::domain::category::Category;

    use super::clamp_categories;

    #[test]
    fn clamping_dedupes_and_caps_at_three() {
        let clamped = clamp_categories(vec![
            Category::Hardware,
            Category::Hardware,
            Category::AutoParts,
            Category::Plumbing,
            Category::General,
        ]);
        assert_eq!(
            clamped,
            vec![Category::Hardware, Category::AutoParts, Category::Plumbing]
        );
    }

    #[test]
    fn an_empty_suggestion_falls_back_to_general() {
        assert_eq!(clamp_categories(Vec::new()), vec![Category::General]);
    }
}
