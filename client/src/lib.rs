//! Client-side session handling for the identity API.
//!
//! Attaches bearer tokens to outgoing requests, refreshes an expired access
//! token once for all concurrent callers and keeps the signed-in principal
//! in sync with the stored session.

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod session;
pub mod utils;

#[cfg(test)]
mod testing;

pub use client::SessionClient;
pub use config::Config;
pub use errors::{ClientError, ClientResult};
