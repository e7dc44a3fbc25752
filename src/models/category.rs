//! Product categorization models.

use serde::{Deserialize, Serialize};

/// Category assigned to a product, either manually or by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAssignment {
    pub product: String,
    #[serde(default)]
    pub category: Option<String>,
    /// True when a user override, false when inferred automatically.
    #[serde(default)]
    pub manual: bool,
}

impl CategoryAssignment {
    pub fn manual(product: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            category: Some(category.into()),
            manual: true,
        }
    }

    pub fn inferred(product: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            category: Some(category.into()),
            manual: false,
        }
    }

    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or("(uncategorized)")
    }
}

/// Body of a manual override request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualCategory {
    pub product: String,
    pub category: String,
}

impl ManualCategory {
    pub fn new(product: &str, category: &str) -> Result<Self, String> {
        let product = product.trim();
        let category = category.trim();
        if product.is_empty() {
            return Err("product must not be empty".to_string());
        }
        if category.is_empty() {
            return Err("category must not be empty".to_string());
        }
        Ok(Self {
            product: product.to_string(),
            category: category.to_string(),
        })
    }
}

/// Result of running the ML classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MlApplyResult {
    #[serde(default)]
    pub updated: usize,
    #[serde(default)]
    pub products: Vec<CategoryAssignment>,
}
