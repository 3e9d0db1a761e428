//! Outbound request pipeline.
//!
//! Every authenticated call goes through [`pipeline::ApiClient`], which
//! attaches the stored bearer token, recovers from a 401 through the
//! [`refresh::RefreshCoordinator`] and retries once.

pub mod common;
pub mod endpoints;
pub mod pipeline;
pub mod refresh;
pub mod transport;

// Re-exports for convenience
pub use common::{ApiResult, BodyDecoder, JsonBody, NoContent, RawText, ValidationProblem};
pub use pipeline::ApiClient;
pub use refresh::{RefreshCoordinator, RefreshOutcome, RefreshState};
pub use transport::{ArcTransport, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
