//! Query dispatch for helmsman.
//!
//! The [`Dispatcher`] turns one query into exactly one generation strategy
//! invocation plus, for structured answers, one transcript update. Every
//! failure comes back as a [`DispatchError`] the caller can map to a
//! client rejection or a server failure.

pub mod dispatcher;
pub mod error;
pub mod request;

pub use dispatcher::{Dispatcher, DispatcherParts};
pub use error::{CacheOperation, DispatchError, Stage};
pub use request::{QueryRequest, QueryResponse};
