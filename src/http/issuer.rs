use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tracing::trace;
use url::Url;

use crate::error::{AppResult, HttpError};
use crate::metrics::Outcome;
use crate::shutdown::ShutdownReceiver;

use super::client::{ClientSettings, build_client};
use super::spec::RequestSpec;

/// Performs one complete HTTP exchange.
///
/// Implementations must consume the whole response before returning so the
/// underlying connection can be reused.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns the response status code.
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot be built, the exchange fails,
    /// or the body cannot be read.
    async fn exchange(&self, target: &Url, spec: &RequestSpec) -> Result<u16, HttpError>;
}

/// [`Transport`] over one pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns an error when the client cannot be built.
    pub fn new(settings: &ClientSettings) -> AppResult<Self> {
        Ok(Self {
            client: build_client(settings)?,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn exchange(&self, target: &Url, spec: &RequestSpec) -> Result<u16, HttpError> {
        let request = spec
            .build_request(&self.client, target)
            .map_err(|err| HttpError::BuildRequestFailed { source: err })?;
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|err| HttpError::RequestFailed { source: err })?;
        let status = response.status().as_u16();
        drain_response_body(response)
            .await
            .map_err(|err| HttpError::ReadBodyFailed { source: err })?;
        Ok(status)
    }
}

async fn drain_response_body(
    response: reqwest::Response,
) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}

/// Issues one request and classifies it. Never retries.
///
/// Any status code counts as a success here; only a missing response is a
/// failure. Cancellation drops the in-flight exchange.
pub async fn issue<T>(
    transport: &T,
    target: &Url,
    spec: &RequestSpec,
    shutdown: &mut ShutdownReceiver,
) -> Outcome
where
    T: Transport + ?Sized,
{
    tokio::select! {
        biased;
        () = shutdown.triggered() => {
            trace!("Request to {} cancelled", target);
            Outcome::Failure
        }
        result = transport.exchange(target, spec) => match result {
            Ok(status) => Outcome::Success(status),
            Err(err) => {
                trace!("Request to {} failed: {}", target, err);
                Outcome::Failure
            }
        },
    }
}
