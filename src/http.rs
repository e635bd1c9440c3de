use crate::config::Config;
use crate::types::Credentials;
use crate::{Result, ScanError};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, SET_COOKIE};
use reqwest::{Client, Method};

/// An outgoing request. Query pairs are appended to `url`; `form` is sent
/// as an `application/x-www-form-urlencoded` body.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub form: Option<Vec<(String, String)>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            form: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_query(mut self, params: Vec<(String, String)>) -> Self {
        self.query = params;
        self
    }

    pub fn with_form(mut self, params: Vec<(String, String)>) -> Self {
        self.form = Some(params);
        self
    }
}

/// A fully read response. The body is decoded as text; HEAD responses carry an empty body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Final URL after redirects.
    pub url: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, url: impl Into<String>) -> Self {
        Self {
            status,
            url: url.into(),
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }

    /// Appends a header; invalid names or values are dropped.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    pub fn content_type(&self) -> &str {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Names of the cookies set by this response, in header order.
    pub fn cookie_names(&self) -> Vec<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|cookie| cookie.split(';').next())
            .filter_map(|pair| pair.split('=').next())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

/// The HTTP session shared by the crawler, the fingerprinter and every probe.
///
/// Implementations must be safe to call from concurrent tasks. Session state
/// such as cookies is shared: a cookie set in response to one probe is visible
/// to the requests of every other probe.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;

    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.send(HttpRequest::get(url)).await
    }

    async fn get_with_headers(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        let request = headers
            .iter()
            .fold(HttpRequest::get(url), |req, (name, value)| req.with_header(*name, *value));
        self.send(request).await
    }

    async fn post_form(&self, url: &str, form: Vec<(String, String)>) -> Result<HttpResponse> {
        self.send(HttpRequest::new(Method::POST, url).with_form(form)).await
    }

    async fn request(&self, method: Method, url: &str) -> Result<HttpResponse> {
        self.send(HttpRequest::new(method, url)).await
    }
}

/// `reqwest`-backed session with a persistent cookie jar, a fixed user agent,
/// a per-request timeout and optional HTTP Basic auth on every request.
pub struct ReqwestClient {
    client: Client,
    auth: Option<Credentials>,
    custom_headers: Vec<(String, String)>,
}

impl ReqwestClient {
    pub fn new(config: &Config, auth: Option<Credentials>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(!config.web_scan.verify_ssl)
            .redirect(if config.web_scan.follow_redirects {
                reqwest::redirect::Policy::limited(config.web_scan.max_redirects as usize)
            } else {
                reqwest::redirect::Policy::none()
            })
            .user_agent(&config.scan.user_agent)
            .cookie_store(true)
            .build()
            .map_err(|e| ScanError::WebScan(format!("Failed to create HTTP client: {}", e)))?;

        let mut custom_headers: Vec<(String, String)> = config
            .web_scan
            .custom_headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        custom_headers.sort();

        Ok(Self {
            client,
            auth,
            custom_headers,
        })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let is_head = request.method == Method::HEAD;
        let mut builder = self.client.request(request.method, &request.url);

        for (name, value) in self.custom_headers.iter().chain(request.headers.iter()) {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }
        if let Some(auth) = &self.auth {
            builder = builder.basic_auth(&auth.username, Some(&auth.password));
        }

        let response = builder.send().await.map_err(|e| {
            debug!("Request to {} failed: {}", request.url, e);
            if e.is_timeout() {
                ScanError::Timeout {
                    operation: format!("request to {}", request.url),
                }
            } else {
                ScanError::Http(e)
            }
        })?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = response.headers().clone();
        let body = if is_head { String::new() } else { response.text().await? };

        Ok(HttpResponse {
            status,
            url,
            headers,
            body,
        })
    }
}
