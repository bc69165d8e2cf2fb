use async_trait::async_trait;
use snafu::Snafu;
use std::collections::HashMap;
#[cfg(feature = "default_client")]
use std::time::Duration;

#[derive(Debug, Clone, Snafu)]
pub enum HttpError {
    /// The request never produced a response: connection, DNS, TLS or timeout failures.
    #[snafu(display("HttpError: {message}"))]
    RequestError { message: String },

    /// The server answered with a non-success status.
    #[snafu(display("Request failed with status {status}: {message}"))]
    StatusError { status: u16, message: String },
}

impl HttpError {
    /// The HTTP status returned by the server, if there was a response at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::RequestError { .. } => None,
            HttpError::StatusError { status, .. } => Some(*status),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub body: Vec<u8>,
    pub headers: HashMap<String, String>,
}

#[async_trait]
/// This trait must be implemented by any HTTP client that is used by our Rust crates.
/// It is assumed the implementing type will provide the hostname, port, headers, etc. as needed for each request.
///
/// By default, this trait requires the implementing type to be `Send + Sync`.
pub trait HttpClient: Send + Sync {
    async fn request(
        &self,
        http_method: HttpMethod,
        path: String,
        query: Option<HashMap<String, String>>,
        body: Option<Vec<u8>>,
        headers: Option<HashMap<String, String>>,
    ) -> Result<HttpResponse, HttpError>;
}

#[cfg(feature = "default_client")]
pub struct DefaultHttpClient {
    client: reqwest::Client,
    base_url: String,
}

#[cfg(feature = "default_client")]
impl DefaultHttpClient {
    pub fn new(base_url: &str) -> Self {
        DefaultHttpClient {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Builds a client without extra headers that gives up on requests taking longer than
    /// `timeout`.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, HttpError> {
        Self::build(base_url, reqwest::header::HeaderMap::new(), timeout)
    }

    /// Builds a client that sends `header_name: header_value` on every request and gives up on
    /// requests that take longer than `timeout`.
    pub fn with_header(
        base_url: &str,
        header_name: &str,
        header_value: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, HttpError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::HeaderName::from_bytes(header_name.as_bytes()).map_err(|e| {
                HttpError::RequestError {
                    message: format!("Invalid header name '{}': {}", header_name, e),
                }
            })?,
            reqwest::header::HeaderValue::from_str(header_value).map_err(|e| {
                HttpError::RequestError {
                    message: format!("Invalid header value for '{}': {}", header_name, e),
                }
            })?,
        );
        Self::build(base_url, headers, timeout)
    }

    fn build(
        base_url: &str,
        headers: reqwest::header::HeaderMap,
        timeout: Option<Duration>,
    ) -> Result<Self, HttpError> {
        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| HttpError::RequestError {
            message: format!("Failed to build HTTP client: {}", e),
        })?;

        Ok(DefaultHttpClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[cfg(feature = "default_client")]
#[async_trait]
impl HttpClient for DefaultHttpClient {
    async fn request(
        &self,
        method: HttpMethod,
        path: String,
        query: Option<HashMap<String, String>>,
        body: Option<Vec<u8>>,
        headers: Option<HashMap<String, String>>,
    ) -> Result<HttpResponse, HttpError> {
        let url = format!("{}{}", self.base_url, path);
        let method = reqwest::Method::from_bytes(method.as_str().as_bytes()).map_err(|e| {
            HttpError::RequestError {
                message: e.to_string(),
            }
        })?;

        let mut request_builder = self.client.request(method, &url);

        if let Some(query_params) = query {
            request_builder = request_builder.query(&query_params);
        }

        if let Some(header_params) = headers {
            for (key, value) in header_params {
                request_builder = request_builder.header(key, value);
            }
        }

        if let Some(body_data) = body {
            request_builder = request_builder.body(body_data);
        }

        let response = request_builder
            .send()
            .await
            .map_err(|e| HttpError::RequestError {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response text".to_string());
            return Err(HttpError::StatusError {
                status,
                message: text,
            });
        }

        let response_headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::RequestError {
                message: e.to_string(),
            })?
            .to_vec();

        Ok(HttpResponse {
            body,
            headers: response_headers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_only_reported_for_responses() {
        let transport = HttpError::RequestError {
            message: "connection refused".to_string(),
        };
        let rejected = HttpError::StatusError {
            status: 400,
            message: "overspend".to_string(),
        };

        assert_eq!(transport.status(), None);
        assert_eq!(rejected.status(), Some(400));
        assert_eq!(
            rejected.to_string(),
            "Request failed with status 400: overspend"
        );
    }

    #[cfg(feature = "default_client")]
    #[test]
    fn test_invalid_header_is_rejected() {
        let result =
            DefaultHttpClient::with_header("http://localhost:4001", "X Bad", "token", None);
        assert!(matches!(result, Err(HttpError::RequestError { .. })));
    }

    #[cfg(feature = "default_client")]
    #[tokio::test]
    async fn test_unreachable_host_is_a_transport_error() {
        let client = DefaultHttpClient::with_header(
            "http://127.0.0.1:9",
            "X-Algo-API-Token",
            "token",
            Some(Duration::from_millis(500)),
        )
        .unwrap();

        let err = client
            .request(HttpMethod::Get, "/v2/status".to_string(), None, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), None);
    }

    #[cfg(feature = "default_client")]
    #[tokio::test]
    async fn test_timeout_applies_without_a_header() {
        // Accepts connections but never answers
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let client =
            DefaultHttpClient::with_timeout(&base_url, Some(Duration::from_millis(200))).unwrap();

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            client.request(HttpMethod::Get, "/v2/status".to_string(), None, None, None),
        )
        .await
        .expect("client timeout should fire first")
        .unwrap_err();
        assert!(matches!(err, HttpError::RequestError { .. }), "{err:?}");
        drop(listener);
    }
}
