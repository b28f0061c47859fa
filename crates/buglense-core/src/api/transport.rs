//! The wire seam under [`ApiClient`](super::ApiClient).
//!
//! [`ApiClient`](super::ApiClient) builds an [`HttpRequest`] and interprets
//! the [`HttpResponse`]; a [`Transport`] only moves bytes. Tests plug in a
//! scripted transport, production uses [`UreqTransport`].

use super::multipart::{self, MultipartForm};
use crate::error::ApiError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    /// Already-serialized JSON text.
    Json(String),
    /// Encoded by the transport, which also owns the boundary header.
    Multipart(MultipartForm),
}

/// A fully-resolved request ready to hand to a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL without the query string.
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw response as received; status classification happens in the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Sends one request and returns whatever the server answered.
///
/// Implementations return `Ok` for every response that arrived, including
/// 4xx/5xx, and [`ApiError::Network`] only when no response exists.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request)
    }
}

/// Blocking HTTP transport over a shared `ureq` agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    /// Build a transport. `None` disables the overall request timeout.
    #[must_use]
    pub fn new(timeout: Option<Duration>) -> Self {
        let mut builder =
            ureq::AgentBuilder::new().user_agent(concat!("buglense/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut call = self.agent.request(request.method.as_str(), &request.url);
        for (key, value) in &request.query {
            call = call.query(key, value);
        }
        for (key, value) in &request.headers {
            call = call.set(key, value);
        }

        let result = match request.body {
            RequestBody::Empty => call.call(),
            RequestBody::Json(body) => call.send_string(&body),
            RequestBody::Multipart(form) => {
                let boundary = multipart::random_boundary();
                call.set("Content-Type", &form.content_type(&boundary))
                    .send_bytes(&form.encode(&boundary))
            }
        };

        let response = match result {
            Ok(response) | Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(err)) => {
                return Err(ApiError::Network(err.to_string()));
            }
        };

        let status = response.status();
        let status_text = response.status_text().to_string();
        let body = response
            .into_string()
            .map_err(|err| ApiError::Network(format!("failed to read response body: {err}")))?;

        Ok(HttpResponse {
            status,
            status_text,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{HttpRequest, HttpResponse, Method, RequestBody, Transport, UreqTransport};
    use crate::error::ApiError;

    #[test]
    fn header_lookup_ignores_case() {
        let request = HttpRequest {
            method: Method::Get,
            url: "http://localhost/api/bugs".to_string(),
            query: Vec::new(),
            headers: vec![("Authorization".to_string(), "Bearer t".to_string())],
            body: RequestBody::Empty,
        };
        assert_eq!(request.header("authorization"), Some("Bearer t"));
        assert_eq!(request.header("accept"), None);
    }

    #[test]
    fn success_range_is_2xx() {
        let mut response = HttpResponse {
            status: 204,
            status_text: "No Content".to_string(),
            body: String::new(),
        };
        assert!(response.is_success());
        response.status = 304;
        assert!(!response.is_success());
        response.status = 199;
        assert!(!response.is_success());
    }

    #[test]
    fn unreachable_host_is_a_network_error() {
        // Port 9 (discard) is closed on test hosts, so the connect fails fast.
        let transport = UreqTransport::default();
        let result = transport.send(HttpRequest {
            method: Method::Get,
            url: "http://127.0.0.1:9/api/bugs".to_string(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        });
        assert!(matches!(result, Err(ApiError::Network(_))));
    }
}
