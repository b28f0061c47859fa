//! HTTP client for the BugLense REST API.
//!
//! [`ApiClient`] owns the base URL and the bearer token. It turns a logical
//! call (verb, path, optional query or body) into an [`HttpRequest`], hands
//! it to a [`Transport`], and converts the answer into either a typed value
//! or an [`ApiError`]. It never retries.

pub mod multipart;
pub mod transport;

pub use multipart::MultipartForm;
pub use transport::{HttpRequest, HttpResponse, Method, RequestBody, Transport, UreqTransport};

use crate::config::ApiConfig;
use crate::error::ApiError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, error, warn};

pub struct ApiClient {
    base_url: String,
    token: RwLock<Option<String>>,
    transport: Box<dyn Transport>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("has_token", &self.token().is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, transport: impl Transport + 'static) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            token: RwLock::new(None),
            transport: Box::new(transport),
        }
    }

    /// Client over the real HTTP transport.
    #[must_use]
    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.url.clone(), UreqTransport::new(config.timeout()))
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replace the bearer token used by every later request.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let mut request = self.request(Method::Get, path, RequestBody::Empty);
        request.query = query
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        self.execute(request)
    }

    pub fn post<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(self.json_request(Method::Post, path, body)?)
    }

    pub fn put<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(self.json_request(Method::Put, path, body)?)
    }

    pub fn patch<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(self.json_request(Method::Patch, path, body)?)
    }

    pub fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.request(Method::Delete, path, RequestBody::Empty))
    }

    /// `POST` a multipart form (file uploads).
    pub fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: MultipartForm,
    ) -> Result<T, ApiError> {
        self.execute(self.request(Method::Post, path, RequestBody::Multipart(form)))
    }

    fn json_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpRequest, ApiError> {
        let body = match body {
            Some(body) => RequestBody::Json(serde_json::to_string(body).map_err(|err| {
                ApiError::Invalid(format!("failed to encode request body: {err}"))
            })?),
            None => RequestBody::Empty,
        };
        Ok(self.request(method, path, body))
    }

    fn request(&self, method: Method, path: &str, body: RequestBody) -> HttpRequest {
        let multipart = matches!(body, RequestBody::Multipart(_));
        let mut headers = Vec::with_capacity(3);
        if !multipart {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        headers.push(("Accept".to_string(), "application/json".to_string()));
        if let Some(token) = self.token() {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            query: Vec::new(),
            headers,
            body,
        }
    }

    fn execute<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, ApiError> {
        let method = request.method;
        debug!(%method, url = %request.url, "sending request");

        let result = self
            .transport
            .send(request)
            .and_then(|response| decode_response(&response));
        if let Err(err) = &result {
            report_error(err);
        }
        result
    }
}

/// Interpret a raw response.
///
/// Non-2xx statuses become [`ApiError::Http`] with the body's `message`
/// when it has one. 204 decodes as the empty object `{}`.
pub fn decode_response<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    if !response.is_success() {
        return Err(error_from_response(response));
    }

    let body = if response.status == 204 {
        "{}"
    } else {
        response.body.as_str()
    };
    serde_json::from_str(body).map_err(|err| ApiError::Decode(err.to_string()))
}

fn error_from_response(response: &HttpResponse) -> ApiError {
    let data = serde_json::from_str::<Value>(&response.body).ok();
    let message = data
        .as_ref()
        .and_then(|value| value.get("message"))
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map_or_else(
            || format!("Error: {} {}", response.status, response.status_text),
            str::to_string,
        );

    ApiError::Http {
        status: response.status,
        message,
        data,
    }
}

/// Global observer for failed requests. Logs only; never changes the error.
pub fn report_error(err: &ApiError) {
    match err.status() {
        Some(401) => warn!(code = %err.code(), "authentication required: {err}"),
        Some(403) => warn!(code = %err.code(), "permission denied: {err}"),
        Some(status) if status >= 500 => error!(code = %err.code(), "server error: {err}"),
        Some(status) => warn!(code = %err.code(), "API error ({status}): {err}"),
        None => warn!(code = %err.code(), "application error: {err}"),
    }
}
