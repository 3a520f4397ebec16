//! helmsman HTTP server.
//!
//! Exposes the query dispatcher over HTTP:
//!
//! - `POST /v1/query` classifies and answers a question
//! - `POST /v1/debug/query` sends the question straight to the model

pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;

pub use routes::app;
pub use state::AppState;
