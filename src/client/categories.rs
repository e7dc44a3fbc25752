//! Product categorization endpoints.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::response;
use super::ApiClient;
use crate::error::Result;
use crate::models::{CategoryAssignment, ManualCategory, MlApplyResult};

#[derive(Deserialize)]
#[serde(untagged)]
enum CategorizationList {
    Wrapped { products: Vec<CategoryAssignment> },
    Bare(Vec<CategoryAssignment>),
}

#[derive(Serialize)]
struct ApplyMl<'a> {
    #[serde(skip_serializing_if = "no_products")]
    products: &'a [String],
}

fn no_products(products: &&[String]) -> bool {
    products.is_empty()
}

impl ApiClient {
    /// Current category of every known product.
    pub async fn categorizations(&self) -> Result<Vec<CategoryAssignment>> {
        let list: CategorizationList = self.get_json("/api/products/categorization").await?;
        Ok(match list {
            CategorizationList::Wrapped { products } => products,
            CategorizationList::Bare(products) => products,
        })
    }

    /// Save a manual override for one product.
    pub async fn save_manual_category(&self, assignment: &ManualCategory) -> Result<()> {
        let (builder, url) = self.request(Method::POST, "/api/manual_categories")?;
        let response = self.send(builder.json(assignment), &url).await?;
        response::check(response).await?;
        tracing::info!(
            "Saved manual category {} -> {}",
            assignment.product,
            assignment.category
        );
        Ok(())
    }

    /// Run the ML classifier, optionally restricted to some products.
    pub async fn apply_ml_categories(&self, products: &[String]) -> Result<MlApplyResult> {
        let (builder, url) =
            self.request(Method::POST, "/api/products/categorization/apply_ml")?;
        let response = self.send(builder.json(&ApplyMl { products }), &url).await?;
        response::json(response, &url).await
    }
}
