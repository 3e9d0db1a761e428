//! Authentication state for the signed-in user.
//!
//! Claims decoding, state change notifications and the provider that
//! derives the current principal from the stored session.

pub mod claims;
pub mod events;
pub mod provider;

// Re-exports for convenience
pub use claims::{Claims, ClaimsError, Principal, decode_claims, encode_claims};
pub use events::{AuthNotifier, AuthStateChange};
pub use provider::AuthStateProvider;
