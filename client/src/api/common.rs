//! Result envelope and response body decoding.
//!
//! Every pipeline operation returns an [`ApiResult`]. How a success body is
//! read is chosen at compile time through a [`BodyDecoder`]:
//! - [`NoContent`]: the body is ignored
//! - [`RawText`]: the body text is passed through unparsed
//! - [`JsonBody<T>`]: the body is parsed as JSON into `T`

use crate::errors::{ClientError, ClientResult};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::marker::PhantomData;

/// Uniform outcome of a request made through the pipeline.
#[derive(Debug, Clone)]
pub struct ApiResult<T> {
    pub status: StatusCode,
    pub data: Option<T>,
    /// Reason phrase or failure message
    pub message: Option<String>,
    /// Structured problem payload returned by the server on failure
    pub errors: Option<ValidationProblem>,
}

impl<T> ApiResult<T> {
    pub fn success(status: StatusCode, data: Option<T>) -> Self {
        Self {
            status,
            data,
            message: None,
            errors: None,
        }
    }

    pub fn failure(status: StatusCode, message: Option<String>) -> Self {
        Self {
            status,
            data: None,
            message,
            errors: None,
        }
    }

    /// Result for a request that never got a response.
    pub fn transport_fault(message: impl Into<String>) -> Self {
        Self::failure(StatusCode::INTERNAL_SERVER_ERROR, Some(message.into()))
    }

    pub fn with_errors(mut self, errors: ValidationProblem) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    /// Drops the payload, keeping status and error details.
    pub fn without_data<U>(self) -> ApiResult<U> {
        ApiResult {
            status: self.status,
            data: None,
            message: self.message,
            errors: self.errors,
        }
    }

    /// Flattens field errors into `field: message` strings.
    pub fn field_errors(&self) -> Vec<String> {
        self.errors
            .as_ref()
            .and_then(|p| p.errors.as_ref())
            .map(|errors| {
                let mut fields: Vec<_> = errors.iter().collect();
                fields.sort_by(|a, b| a.0.cmp(b.0));
                fields
                    .into_iter()
                    .flat_map(|(field, messages)| {
                        messages.iter().map(move |m| format!("{}: {}", field, m))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Problem details returned by the server for rejected requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationProblem {
    #[serde(rename = "type", default)]
    pub problem_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default, alias = "detail")]
    pub details: Option<String>,
    #[serde(default)]
    pub errors: Option<HashMap<String, Vec<String>>>,
}

impl ValidationProblem {
    /// Parses a problem payload. Anything that is not a JSON object is rejected.
    pub fn parse(body: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }
}

/// Strategy for turning a success body into a payload.
pub trait BodyDecoder {
    type Output;

    fn decode(body: String) -> ClientResult<Option<Self::Output>>;
}

/// The caller expects no payload.
#[derive(Debug)]
pub struct NoContent;

impl BodyDecoder for NoContent {
    type Output = ();

    fn decode(_body: String) -> ClientResult<Option<()>> {
        Ok(None)
    }
}

/// The caller wants the raw body text.
#[derive(Debug)]
pub struct RawText;

impl BodyDecoder for RawText {
    type Output = String;

    fn decode(body: String) -> ClientResult<Option<String>> {
        Ok(Some(body))
    }
}

/// The caller expects a JSON document of type `T`.
#[derive(Debug)]
pub struct JsonBody<T>(PhantomData<T>);

impl<T: DeserializeOwned> BodyDecoder for JsonBody<T> {
    type Output = T;

    fn decode(body: String) -> ClientResult<Option<T>> {
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| {
                ClientError::decode(format!(
                    "expected {}: {}",
                    std::any::type_name::<T>(),
                    e
                ))
            })
    }
}
