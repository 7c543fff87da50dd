//! HTTP client shared by every provider and image fetch

use super::user_agent::{accept_html, accept_language, generate_user_agent};
use crate::config::OutgoingSettings;
use crate::error::{Result, SearchError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;

/// GET request to be made on behalf of a provider
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// URL to request
    pub url: String,
    /// Request headers, overriding the client defaults
    pub headers: Vec<(String, String)>,
    /// Query parameters, percent-encoded when sent
    pub params: Vec<(String, String)>,
}

impl ProviderRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

/// Text response from a provider request
#[derive(Debug)]
pub struct ProviderResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl ProviderResponse {
    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into a transport error
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(SearchError::Transport(format!(
                "HTTP error {} from {}",
                self.status, self.url
            )))
        }
    }
}

/// HTTP client wrapper with browser-like defaults
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    user_agent: String,
    extra_headers: HashMap<String, String>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let timeout = Duration::try_from_secs_f64(settings.request_timeout)
            .map_err(|e| SearchError::Config(format!("request_timeout: {}", e)))?;

        let mut builder = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(settings.pool_maxsize)
            .cookie_store(true)
            .gzip(true)
            .brotli(true);

        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url).map_err(config_error)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http).map_err(config_error)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https).map_err(config_error)?);
            }
        }

        let client = builder.build().map_err(config_error)?;

        Ok(Self {
            client,
            user_agent: settings
                .useragent
                .clone()
                .unwrap_or_else(generate_user_agent),
            extra_headers: settings.extra_headers.clone(),
        })
    }

    /// Default headers for an outgoing request, with the configured extras applied
    fn base_headers(&self, accept: &'static str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(&self.user_agent)?);
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        headers.insert(ACCEPT_LANGUAGE, header_value(&accept_language("en"))?);
        headers.insert("dnt", HeaderValue::from_static("1"));

        apply_headers(
            &mut headers,
            self.extra_headers
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )?;
        Ok(headers)
    }

    /// Execute a provider request and read the body as text
    pub async fn execute(&self, request: ProviderRequest) -> Result<ProviderResponse> {
        // Request headers replace the defaults and the configured extras
        let mut headers = self.base_headers(accept_html())?;
        apply_headers(
            &mut headers,
            request.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )?;

        let mut req_builder = self.client.get(&request.url).headers(headers);
        if !request.params.is_empty() {
            req_builder = req_builder.query(&request.params);
        }

        let response = req_builder.send().await?;

        Self::parse_response(response).await
    }

    /// Download the full body at `url`, refusing anything over `max_bytes`
    ///
    /// The limit is enforced while streaming, so bodies without a
    /// `Content-Length` are cut off as soon as they grow past it.
    pub async fn get_bytes(&self, url: &str, max_bytes: usize) -> Result<Vec<u8>> {
        let mut response = self
            .client
            .get(url)
            .headers(self.base_headers(ACCEPT_IMAGE)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Transport(format!(
                "HTTP error {} from {}",
                status.as_u16(),
                url
            )));
        }

        if let Some(length) = response.content_length() {
            if length > max_bytes as u64 {
                return Err(too_large(length, max_bytes));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > max_bytes {
                return Err(too_large((body.len() + chunk.len()) as u64, max_bytes));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }

    /// Parse response into ProviderResponse
    async fn parse_response(response: Response) -> Result<ProviderResponse> {
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let text = response.text().await?;

        Ok(ProviderResponse { status, text, url })
    }

    /// Get current user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

const ACCEPT_IMAGE: &str = "image/avif,image/webp,image/*,*/*;q=0.8";

/// Insert each header, replacing any earlier value under the same name
fn apply_headers<'a, I>(headers: &mut HeaderMap, entries: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    for (key, value) in entries {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| SearchError::Config(format!("invalid header name {}: {}", key, e)))?;
        headers.insert(name, header_value(value)?);
    }
    Ok(())
}

fn too_large(length: u64, max_bytes: usize) -> SearchError {
    SearchError::Transport(format!(
        "body of at least {} bytes exceeds limit of {}",
        length, max_bytes
    ))
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| SearchError::Config(format!("invalid header value {:?}: {}", value, e)))
}

fn config_error(err: reqwest::Error) -> SearchError {
    SearchError::Config(format!("failed to build HTTP client: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_custom_user_agent() {
        let settings = OutgoingSettings {
            useragent: Some("TestBot/1.0".to_string()),
            ..Default::default()
        };
        let client = HttpClient::with_settings(&settings).unwrap();
        assert_eq!(client.user_agent(), "TestBot/1.0");
    }

    #[tokio::test]
    async fn test_params_are_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "rust & tokio"))
            .and(header("X-Test", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let request = ProviderRequest::get(format!("{}/search", server.uri()))
            .param("q", "rust & tokio")
            .header("X-Test", "1");
        let response = client.execute(request).await.unwrap();

        assert!(response.is_success());
        assert_eq!(response.text, "ok");
    }

    #[tokio::test]
    async fn test_error_for_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let response = client
            .execute(ProviderRequest::get(server.uri()))
            .await
            .unwrap();
        assert_eq!(response.status, 503);
        assert!(matches!(
            response.error_for_status(),
            Err(SearchError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_get_bytes_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/big"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 64]))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let url = format!("{}/big", server.uri());

        let bytes = client.get_bytes(&url, 1024).await.unwrap();
        assert_eq!(bytes.len(), 64);
        assert!(client.get_bytes(&url, 16).await.is_err());
    }

    /// Serve `connections` chunked responses without a Content-Length
    async fn chunked_server(chunks: usize, connections: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for _ in 0..connections {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
                    )
                    .await;
                for _ in 0..chunks {
                    if socket
                        .write_all(b"10\r\n0123456789abcdef\r\n")
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                let _ = socket.write_all(b"0\r\n\r\n").await;
            }
        });

        format!("http://{}/image", addr)
    }

    #[tokio::test]
    async fn test_get_bytes_limit_without_content_length() {
        let url = chunked_server(8, 2).await;
        let client = HttpClient::new().unwrap();

        let bytes = client.get_bytes(&url, 1024).await.unwrap();
        assert_eq!(bytes.len(), 128);

        let err = client.get_bytes(&url, 40).await.unwrap_err();
        assert!(matches!(err, SearchError::Transport(_)));
    }

    #[tokio::test]
    async fn test_extra_headers_on_every_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("X-Instance", "home"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 8]))
            .expect(2)
            .mount(&server)
            .await;

        let mut settings = OutgoingSettings::default();
        settings
            .extra_headers
            .insert("X-Instance".to_string(), "home".to_string());
        let client = HttpClient::with_settings(&settings).unwrap();

        let response = client
            .execute(ProviderRequest::get(format!("{}/search", server.uri())))
            .await
            .unwrap();
        assert!(response.is_success());

        let bytes = client
            .get_bytes(&format!("{}/image.png", server.uri()), 1024)
            .await
            .unwrap();
        assert_eq!(bytes.len(), 8);
    }
}
