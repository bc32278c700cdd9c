//! HTTP transport seam.
//!
//! The API client only needs "GET this URL, give me status and body". Keeping
//! that behind [`HttpTransport`] lets the host swap the network stack and
//! lets tests answer from memory.

use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Raw response handed back by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        HttpResponse {
            status: 200,
            body: body.into(),
        }
    }

    pub fn with_status(status: u16) -> Self {
        HttpResponse {
            status,
            body: Vec::new(),
        }
    }
}

/// Network-level failures, distinct from malformed API payloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),
}

/// Performs a single GET request.
pub trait HttpTransport: Send + Sync {
    fn get(&self, url: &Url) -> Result<HttpResponse, TransportError>;
}

/// Blocking `reqwest` transport used in production builds.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(ReqwestTransport { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| TransportError::Network(e.to_string()))?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
pub(crate) mod stub {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory transport answering from canned responses keyed by full URL.
    #[derive(Default)]
    pub(crate) struct StubTransport {
        responses: Mutex<HashMap<String, Result<HttpResponse, TransportError>>>,
        requested: Mutex<Vec<String>>,
    }

    impl StubTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn respond(&self, url: &str, body: &str) {
            self.respond_with(url, Ok(HttpResponse::ok(body.as_bytes())));
        }

        pub(crate) fn respond_with(&self, url: &str, response: Result<HttpResponse, TransportError>) {
            self.responses
                .lock()
                .unwrap()
                .insert(url.to_string(), response);
        }

        pub(crate) fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl HttpTransport for StubTransport {
        fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.responses
                .lock()
                .unwrap()
                .get(url.as_str())
                .cloned()
                .unwrap_or_else(|| Ok(HttpResponse::with_status(404)))
        }
    }
}
