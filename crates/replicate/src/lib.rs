//! HTTP client for the Replicate prediction API.
//!
//! Covers the two calls the platform needs: creating a prediction with an
//! asynchronous webhook callback, and re-querying a prediction for the
//! manual recovery path.

pub mod client;
pub mod types;

pub use client::{ReplicateClient, ReplicateError};
pub use types::{CreatePredictionRequest, Prediction};
