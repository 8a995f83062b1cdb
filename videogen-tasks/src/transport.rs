use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::mask_secret;
use crate::error::ProtocolError;
use crate::VideoGenError;

#[derive(Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn post_json<T: Serialize>(url: Url, body: &T) -> Result<Self, VideoGenError> {
        let body = serde_json::to_vec(body).map_err(|e| {
            VideoGenError::InvalidInput(format!("Failed to encode request body: {e}"))
        })?;
        Ok(Self {
            method: Method::POST,
            url,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(body),
            timeout: None,
        })
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

// Credentials in headers are masked
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, String)> = self
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), masked_header(name, value)))
            .collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &headers)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn masked_header(name: &str, value: &str) -> String {
    if !name.eq_ignore_ascii_case("authorization") {
        return value.to_string();
    }
    match value.split_once(' ') {
        Some((scheme, credentials)) => format!("{scheme} {}", mask_secret(credentials)),
        None => mask_secret(value),
    }
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Decode a 2xx body, or map the status to a [`ProtocolError`]
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, VideoGenError> {
        if !(200..300).contains(&self.status) {
            return Err(ProtocolError::from_status(self.status, &self.body).into());
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Request/response primitive the provider adapters are built on
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, VideoGenError>;
}

/// [`Transport`] backed by a shared `reqwest` connection pool
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, VideoGenError> {
        let mut req_builder = self.client.request(request.method, request.url);

        for (name, value) in request.headers {
            req_builder = req_builder.header(name, value);
        }
        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }
        if let Some(timeout) = request.timeout {
            req_builder = req_builder.timeout(timeout);
        }

        let response = req_builder.send().await.map_err(VideoGenError::network)?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(VideoGenError::network)?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Records every request and replays canned responses in order
    #[derive(Default)]
    pub struct SpyTransport {
        pub requests: Mutex<Vec<HttpRequest>>,
        responses: Mutex<VecDeque<HttpResponse>>,
    }

    impl SpyTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, status: u16, body: &str) -> Self {
            self.responses.lock().unwrap().push_back(HttpResponse {
                status,
                body: body.as_bytes().to_vec(),
            });
            self
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn request(&self, index: usize) -> HttpRequest {
            self.requests.lock().unwrap()[index].clone()
        }
    }

    #[async_trait]
    impl Transport for SpyTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, VideoGenError> {
            self.requests.lock().unwrap().push(request);
            self.responses.lock().unwrap().pop_front().ok_or_else(|| {
                VideoGenError::network(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "no scripted response",
                ))
            })
        }
    }

    pub fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
        request
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json_body(request: &HttpRequest) -> serde_json::Value {
        serde_json::from_slice(request.body.as_deref().unwrap_or_default()).unwrap()
    }
}
