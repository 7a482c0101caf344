//! Reconflow Client
//!
//! Talks to the execution backend: catalog fetch, run submission, the
//! per-run WebSocket event channel and workflow persistence. [`ApiClient`]
//! implements [`CatalogSource`], [`RunBackend`] and [`WorkflowStore`], so the
//! rest of the workspace never sees HTTP.
//!
//! [`CatalogSource`]: reconflow_catalog::CatalogSource
//! [`RunBackend`]: reconflow_session::RunBackend
//! [`WorkflowStore`]: reconflow_store::WorkflowStore

mod client;
mod config;
mod error;
mod rejection;
mod ws;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use ws::WsChannel;
