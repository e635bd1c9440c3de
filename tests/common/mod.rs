#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use rwebscan::http::{HttpClient, HttpRequest, HttpResponse};
use rwebscan::types::Target;
use rwebscan::{Result, ScanError};

pub const SITE: &str = "http://site.test";

type Route = dyn Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync;

/// Canned `HttpClient`: every request is answered by `route` and recorded.
pub struct MockClient {
    route: Box<Route>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockClient {
    pub fn new(
        route: impl Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            route: Box::new(route),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request fails as if the host refused the connection.
    pub fn unreachable() -> Self {
        Self::new(|request| Err(ScanError::WebScan(format!("connection refused: {}", request.url))))
    }

    /// The same response for every request.
    pub fn fixed(response: HttpResponse) -> Self {
        Self::new(move |request| {
            let mut response = response.clone();
            response.url = request.url.clone();
            Ok(response)
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().push(request.clone());
        (self.route)(&request)
    }
}

pub fn target() -> Target {
    Target::new(SITE, 4, None).unwrap()
}

pub fn target_with_threads(threads: usize) -> Target {
    Target::new(SITE, threads, None).unwrap()
}

pub const HOME_PAGE: &str = r#"<html>
<head><title>Test shop</title></head>
<body>
  <a href="/item?id=1">Item</a>
  <a href="/about">About</a>
  <form action="/search" method="get">
    <input type="text" name="q">
    <input type="submit" value="Search">
  </form>
</body>
</html>"#;

/// A small site with one SQL-injectable parameter and one reflecting search form.
pub fn canned_site() -> MockClient {
    MockClient::new(|request| {
        let url = request.url.as_str();
        if request.method != reqwest::Method::GET {
            return Ok(HttpResponse::new(405, url));
        }
        if url == SITE {
            return Ok(HttpResponse::new(200, url)
                .with_header("Content-Type", "text/html")
                .with_body(HOME_PAGE));
        }
        if url.starts_with(&format!("{}/item?", SITE)) {
            if url.contains("id='") {
                return Ok(HttpResponse::new(500, url)
                    .with_body("You have an error in your SQL syntax near ''1'"));
            }
            return Ok(HttpResponse::new(200, url).with_body("Item 1"));
        }
        if url == format!("{}/search", SITE) {
            let query = request
                .query
                .iter()
                .find(|(name, _)| name == "q")
                .map(|(_, value)| value.as_str())
                .unwrap_or("");
            return Ok(HttpResponse::new(200, url).with_body(format!("Results for {}", query)));
        }
        Ok(HttpResponse::new(404, url))
    })
}
