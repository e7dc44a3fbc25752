//! Session-scoped fetching through the query cache.
//!
//! [`ScopedQueries::fetch`] is the only way analytics are read. It takes the
//! session as a mandatory argument, derives the cache key from it and tags
//! the outgoing request with the same value.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::cache::{QueryCache, QueryKey, Resource};
use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::models::SessionId;

#[derive(Clone)]
pub struct ScopedQueries {
    api: ApiClient,
    cache: Arc<QueryCache>,
}

impl ScopedQueries {
    pub fn new(api: ApiClient, cache: Arc<QueryCache>) -> Self {
        Self { api, cache }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Read `resource` for `session`, from cache when fresh.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        resource: Resource,
        session: Option<SessionId>,
    ) -> Result<T> {
        let key = QueryKey::new(resource, session);

        let value = match self.cache.get(&key) {
            Some(value) => {
                tracing::debug!("Cache hit for {} (session: {:?})", resource, session);
                value
            }
            None => {
                let epoch = self.cache.epoch(&key);
                let value: serde_json::Value =
                    self.api.get_json_scoped(resource.path(), session).await?;
                // Stored under the key the request was made with, even if the
                // active session has moved on, but never over an invalidation
                // that happened while the request was in flight.
                if !self.cache.put_if_current(key, value.clone(), epoch) {
                    tracing::debug!(
                        "Discarding superseded {} result (session: {:?})",
                        resource,
                        session
                    );
                }
                value
            }
        };

        serde_json::from_value(value).map_err(|e| ApiError::Malformed {
            url: resource.path().to_string(),
            reason: e.to_string(),
        })
    }

    /// Drop cached copies so the next fetch goes to the server.
    pub fn invalidate(&self, resource: Resource, session: Option<SessionId>) {
        self.cache.invalidate(&QueryKey::new(resource, session));
    }

    pub fn invalidate_session(&self, session: Option<SessionId>) {
        self.cache.invalidate_session(session);
    }
}
