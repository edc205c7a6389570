use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Request};
use url::Url;

use crate::args::{HeaderPair, HttpMethod};
use crate::error::ValidationError;

/// Everything needed to issue the same request over and over.
///
/// Headers keep their insertion order and duplicates. The body is a
/// [`Bytes`] handle, so every attempt gets its own cheap copy.
#[derive(Debug, Clone, Default)]
pub struct RequestSpec {
    method: HttpMethod,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl RequestSpec {
    #[must_use]
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Appends one header, keeping earlier values for the same name.
    ///
    /// # Errors
    ///
    /// Returns an error when the name or value is not valid HTTP.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, ValidationError> {
        let header_name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|source| {
            ValidationError::InvalidHeaderName {
                name: name.to_owned(),
                source,
            }
        })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|source| ValidationError::InvalidHeaderValue {
                name: name.to_owned(),
                source,
            })?;
        self.headers.append(header_name, header_value);
        Ok(self)
    }

    /// Appends every pair in order.
    ///
    /// # Errors
    ///
    /// Returns the first invalid header.
    pub fn with_headers(self, headers: &[HeaderPair]) -> Result<Self, ValidationError> {
        headers
            .iter()
            .try_fold(self, |spec, pair| spec.with_header(&pair.name, &pair.value))
    }

    /// Sets the payload. An empty payload means no body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.body = if body.is_empty() { None } else { Some(body) };
        self
    }

    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub(crate) fn build_request(&self, client: &Client, target: &Url) -> reqwest::Result<Request> {
        let mut builder = client
            .request(self.method.to_reqwest(), target.clone())
            .headers(self.headers.clone());
        if let Some(body) = &self.body {
            builder = builder.body(body.clone());
        }
        builder.build()
    }
}
