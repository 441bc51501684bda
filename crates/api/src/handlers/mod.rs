//! HTTP request handlers.

pub mod admin;
pub mod generations;
pub mod models;
pub mod transactions;
pub mod webhooks;
