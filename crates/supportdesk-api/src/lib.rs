//! # supportdesk-api
//!
//! Typed client for the support backend's HTTP API.
//!
//! - `POST /api/query` and `POST /api/query/conversation` answer and classify a query
//! - `GET`/`DELETE /api/conversation/{session_id}` read or drop the backend-held conversation
//! - `GET /health` and `GET /` report liveness
//! - `GET /api/tickets` lists classified tickets
//!
//! Every operation returns a [`DeskResult`](supportdesk_types::DeskResult):
//! network failures and non-2xx responses become transport errors, bodies that
//! do not match the expected schema become parse errors.
//!
//! ## Example
//!
//! ```rust,no_run
//! use supportdesk_api::{ApiClient, ApiConfig, SupportBackend};
//! use supportdesk_types::{Channel, QueryRequest, SessionId};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ApiClient::new(ApiConfig::new("http://localhost:8000")?);
//!     let result = client
//!         .submit_query(&QueryRequest {
//!             query: "How do I install the Python SDK?".to_string(),
//!             session_id: SessionId::generate(),
//!             channel: Channel::WebChat,
//!             include_followup: true,
//!         })
//!         .await?;
//!     println!("{} ({})", result.answer, result.classification.topic);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;

pub use client::{ApiClient, SupportBackend};
pub use config::{ApiConfig, DEFAULT_TICKETS_PATH, LEGACY_TICKETS_PATH};
