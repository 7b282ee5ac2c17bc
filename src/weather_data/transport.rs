//! The HTTP seam used by the station data fetcher.

use crate::weather_data::error::WeatherDataError;
use futures_util::TryStreamExt;
use reqwest::{Client, StatusCode};
use std::io;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;

/// Status and full body of an HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// Performs plain HTTP GETs. Non-success statuses are returned, not turned into errors,
/// so callers can decide what to retry.
#[allow(async_fn_in_trait)]
pub trait HttpTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, WeatherDataError>;
}

/// [`HttpTransport`] backed by a `reqwest` client with a per-request timeout.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, WeatherDataError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(WeatherDataError::ClientBuild)?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, WeatherDataError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WeatherDataError::NetworkRequest(url.to_string(), e))?;
        let status = response.status();

        let stream = response.bytes_stream().map_err(io::Error::other);
        let mut reader = StreamReader::new(stream);
        let mut body = Vec::new();
        reader.read_to_end(&mut body).await?;

        Ok(HttpResponse { status, body })
    }
}
