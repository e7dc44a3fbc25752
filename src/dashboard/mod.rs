//! Dashboard state: the active session, its chart panels and the local
//! category catalog.
//!
//! Every read here is scoped to the session active when the read starts, and
//! every commit to a panel is checked against the session active when the
//! response arrives.

mod lifecycle;
mod panel;

pub use lifecycle::{UploadOutcome, UploadReport};
pub use panel::{Chart, ChartPanel, PanelView, Ticket};

use std::sync::{Arc, RwLock};

use crate::cache::{QueryCache, Resource};
use crate::categories::CategoryCatalog;
use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::models::{AiInsights, CategoryAssignment, ChartData, ManualCategory, MlApplyResult, SessionId};
use crate::query::ScopedQueries;
use crate::session::SessionStore;

pub struct Dashboard {
    api: ApiClient,
    queries: ScopedQueries,
    products: ChartPanel,
    categories: ChartPanel,
    catalog: RwLock<CategoryCatalog>,
}

impl Dashboard {
    pub fn new(api: ApiClient, cache: Arc<QueryCache>) -> Self {
        Self {
            queries: ScopedQueries::new(api.clone(), cache),
            api,
            products: ChartPanel::new(Chart::Products),
            categories: ChartPanel::new(Chart::Categories),
            catalog: RwLock::new(CategoryCatalog::default()),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &SessionStore {
        self.api.store()
    }

    pub fn queries(&self) -> &ScopedQueries {
        &self.queries
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.store().active()
    }

    fn panel(&self, chart: Chart) -> &ChartPanel {
        match chart {
            Chart::Products => &self.products,
            Chart::Categories => &self.categories,
        }
    }

    /// Make `session` the active one. Panels are cleared and loads still in
    /// flight for the previous session can no longer commit.
    pub fn switch_session(&self, session: Option<SessionId>) -> Result<()> {
        for chart in Chart::ALL {
            self.panel(chart).reset();
        }
        self.store().set_active(session)
    }

    /// What a chart panel shows for the active session.
    pub fn view(&self, chart: Chart) -> PanelView {
        self.panel(chart).view(self.active_session())
    }

    /// Load one chart for the active session and return what the panel
    /// shows afterwards. Failures degrade to an empty chart.
    pub async fn load_chart(&self, chart: Chart) -> PanelView {
        let panel = self.panel(chart);
        let ticket = panel.begin(self.active_session());
        let result = self
            .queries
            .fetch::<ChartData>(chart.resource(), ticket.session())
            .await;
        panel.commit(ticket, result, self.active_session());
        self.view(chart)
    }

    /// Load both charts concurrently.
    pub async fn load_charts(&self) -> (PanelView, PanelView) {
        tokio::join!(
            self.load_chart(Chart::Products),
            self.load_chart(Chart::Categories)
        )
    }

    /// Drop cached charts for the active session and load them again.
    pub async fn refresh_charts(&self) -> (PanelView, PanelView) {
        let session = self.active_session();
        for chart in Chart::ALL {
            self.queries.invalidate(chart.resource(), session);
        }
        self.load_charts().await
    }

    /// AI insights for the active session.
    pub async fn insights(&self) -> Result<AiInsights> {
        self.queries
            .fetch(Resource::Insights, self.active_session())
            .await
    }

    /// Fetch the categorization listing and replace the local catalog.
    pub async fn load_categories(&self) -> Result<Vec<CategoryAssignment>> {
        let assignments = self.api.categorizations().await?;
        let catalog = CategoryCatalog::from_assignments(assignments);
        let snapshot = catalog.to_vec();
        *self.catalog.write().unwrap_or_else(|e| e.into_inner()) = catalog;
        Ok(snapshot)
    }

    pub fn catalog(&self) -> CategoryCatalog {
        self.catalog
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Save a manual override and apply it locally.
    pub async fn set_manual_category(
        &self,
        product: &str,
        category: &str,
    ) -> Result<CategoryAssignment> {
        let assignment = ManualCategory::new(product, category).map_err(ApiError::InvalidInput)?;
        self.api.save_manual_category(&assignment).await?;

        let entry = {
            let mut catalog = self.catalog.write().unwrap_or_else(|e| e.into_inner());
            catalog.apply_manual(&assignment);
            catalog
                .get(&assignment.product)
                .cloned()
                .unwrap_or_else(|| CategoryAssignment::manual(product, category))
        };
        self.queries
            .invalidate(Resource::CategoryChart, self.active_session());
        Ok(entry)
    }

    /// Run the classifier and merge its output, keeping manual overrides.
    pub async fn apply_ml_categories(&self, products: &[String]) -> Result<MlApplyResult> {
        let result = self.api.apply_ml_categories(products).await?;
        let changed = self
            .catalog
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .merge_inferred(result.products.iter().cloned());
        tracing::info!(
            "Classifier updated {} product(s), {} changed locally",
            result.updated,
            changed
        );
        self.queries
            .invalidate(Resource::CategoryChart, self.active_session());
        Ok(result)
    }
}
