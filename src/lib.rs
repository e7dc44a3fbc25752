//! docdash - session-scoped document and invoice dashboard client.
//!
//! Every read against the document API is qualified with the active working
//! session, cached per (resource, session) and committed to a view only while
//! that session is still active.

pub mod browse;
pub mod cache;
pub mod categories;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod query;
pub mod session;

pub use client::ApiClient;
pub use dashboard::Dashboard;
pub use error::{ApiError, Result};
pub use session::SessionStore;
