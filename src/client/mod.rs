//! HTTP client for the document API.
//!
//! All requests go through [`ApiClient::request_scoped`], which applies the
//! session qualifier and cache-defeating headers from [`tagging`].

mod analytics;
mod categories;
mod documents;
mod response;
mod sessions;
pub mod tagging;

pub use documents::{is_uploadable, UPLOADABLE_EXTENSIONS};
pub use response::{parse_content_disposition_filename, Download};

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{ApiError, Result};
use crate::models::SessionId;
use crate::session::SessionStore;

/// Default user agent for API requests.
pub const USER_AGENT: &str = concat!("docdash/", env!("CARGO_PKG_VERSION"));

/// Client for the document API, bound to a session store.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
    store: SessionStore,
}

impl ApiClient {
    /// Create a client for the API rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration, store: SessionStore) -> Result<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| ApiError::Transport {
                url: base.to_string(),
                source: e,
            })?;

        Ok(Self {
            client,
            base,
            store,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Resolve an API path (e.g. `/api/sessions`) against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    /// Build a request tagged with the currently active session.
    pub fn request(&self, method: Method, path: &str) -> Result<(RequestBuilder, String)> {
        self.request_scoped(method, path, self.store.active())
    }

    /// Build a request tagged with an explicit session.
    pub fn request_scoped(
        &self,
        method: Method,
        path: &str,
        session: Option<SessionId>,
    ) -> Result<(RequestBuilder, String)> {
        let url = tagging::tag_url(self.endpoint(path)?, session);
        let headers = tagging::tag_headers(session, &self.store.identity());
        tracing::debug!("{} {} (session: {:?})", method, url, session);

        let label = url.to_string();
        Ok((self.client.request(method, url).headers(headers), label))
    }

    /// Send a prepared request.
    pub(crate) async fn send(
        &self,
        builder: RequestBuilder,
        url: &str,
    ) -> Result<reqwest::Response> {
        builder.send().await.map_err(|e| ApiError::Transport {
            url: url.to_string(),
            source: e,
        })
    }

    /// GET a JSON resource scoped to the given session.
    pub async fn get_json_scoped<T: DeserializeOwned>(
        &self,
        path: &str,
        session: Option<SessionId>,
    ) -> Result<T> {
        let (builder, url) = self.request_scoped(Method::GET, path, session)?;
        let response = self.send(builder, &url).await?;
        response::json(response, &url).await
    }

    /// GET a JSON resource scoped to the active session.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_json_scoped(path, self.store.active()).await
    }
}
