//! Remote inference: capability implementations backed by a hosted model server.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{InferenceClient, RemoteError};
