//! Session record and its persistence.

pub mod models;
pub mod store;

pub use models::{LoginRequest, Session, TokenResponse};
pub use store::{ArcSessionStore, FileSessionStore, MemorySessionStore, SessionStore};
