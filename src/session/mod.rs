//! Active-session state and dashboard link handling.

pub mod link;
mod store;

pub use store::{LinkAction, LinkSync, SessionStore, StoreState};
