//! Byte transport for service requests.
//!
//! The provider never talks to the network directly; it asks a
//! [`Transport`] for the body of a URL. [`HttpTransport`] is the real
//! implementation on top of `reqwest`; tests substitute in-memory ones.

use std::{future::Future, pin::Pin};

use crate::error::{Error, Result};

/// Future type for transport fetches.
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>>;

/// Fetches response bodies by URL.
pub trait Transport: Send + Sync {
    /// Fetch the body at `url`.
    ///
    /// Implementations return [`Error::Http`] for transport failures and
    /// [`Error::HttpStatus`] for non-success responses.
    fn get(&self, url: &str) -> FetchFuture<'_>;
}

/// HTTP transport backed by a `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a default HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport around an existing HTTP client.
    #[must_use]
    pub fn with_http(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> FetchFuture<'_> {
        let url = url.to_string();
        Box::pin(async move {
            tracing::debug!(url = %url, "fetching");

            let response = self
                .http
                .get(&url)
                .send()
                .await
                .map_err(|e| Error::Http {
                    url: url.clone(),
                    message: e.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(Error::HttpStatus {
                    url,
                    status: status.as_u16(),
                });
            }

            let data = response.bytes().await.map_err(|e| Error::Http {
                url: url.clone(),
                message: e.to_string(),
            })?;

            Ok(data.to_vec())
        })
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn get(&self, url: &str) -> FetchFuture<'_> {
        (**self).get(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_host_is_http_error() {
        // Port 9 on localhost has nothing listening in test environments.
        let transport = HttpTransport::new();
        let result = transport.get("http://127.0.0.1:9/ImageServer?f=json").await;
        assert!(matches!(result, Err(Error::Http { .. })));
    }
}
