use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// HTTP GET request issued by the fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP response returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport-level HTTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// Transport contract used by the fetcher.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;
}

/// Production HTTP client using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .user_agent(concat!("tickvault/", env!("CARGO_PKG_VERSION")))
                    .build()
                    .unwrap_or_else(|_| reqwest::Client::new()),
            ),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            // Errors are rendered without the URL: it carries the API key.
            let response = self
                .client
                .get(&request.url)
                .timeout(request.timeout)
                .send()
                .await
                .map_err(|e| {
                    let e = e.without_url();
                    if e.is_timeout() {
                        HttpError::new(format!("request timeout: {e}"))
                    } else if e.is_connect() {
                        HttpError::new(format!("connection failed: {e}"))
                    } else {
                        HttpError::new(format!("request failed: {e}"))
                    }
                })?;

            let status = response.status().as_u16();
            let body = response.text().await.map_err(|e| {
                HttpError::new(format!("failed to read response body: {}", e.without_url()))
            })?;

            Ok(HttpResponse { status, body })
        })
    }
}

/// Deterministic in-memory transport for offline runs and tests.
///
/// Requests are matched against routes by URL substring, in registration
/// order. A route replays its responses in sequence and keeps repeating the
/// last one. Unmatched requests fail with a transport error unless a
/// fallback response is set.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    routes: Mutex<Vec<ScriptedRoute>>,
    fallback: Option<HttpResponse>,
    requests: Mutex<Vec<HttpRequest>>,
}

#[derive(Debug)]
struct ScriptedRoute {
    url_fragment: String,
    responses: VecDeque<Result<HttpResponse, HttpError>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Response for requests no route matches.
    pub fn with_fallback(mut self, response: HttpResponse) -> Self {
        self.fallback = Some(response);
        self
    }

    /// Always answer URLs containing `url_fragment` with `response`.
    pub fn respond(self, url_fragment: impl Into<String>, response: HttpResponse) -> Self {
        self.respond_sequence(url_fragment, vec![Ok(response)])
    }

    /// Answer URLs containing `url_fragment` with `responses` in order.
    pub fn respond_sequence(
        self,
        url_fragment: impl Into<String>,
        responses: Vec<Result<HttpResponse, HttpError>>,
    ) -> Self {
        lock(&self.routes).push(ScriptedRoute {
            url_fragment: url_fragment.into(),
            responses: responses.into(),
        });
        self
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Number of requests whose URL contains `url_fragment`.
    pub fn count_matching(&self, url_fragment: &str) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|request| request.url.contains(url_fragment))
            .count()
    }

    fn answer(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let mut routes = lock(&self.routes);
        if let Some(route) = routes
            .iter_mut()
            .find(|route| url.contains(&route.url_fragment))
        {
            let next = if route.responses.len() > 1 {
                route.responses.pop_front()
            } else {
                route.responses.front().cloned()
            };
            return next.unwrap_or_else(|| Err(HttpError::new("route has no responses")));
        }

        self.fallback
            .clone()
            .ok_or_else(|| HttpError::new("no scripted response for request"))
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let result = self.answer(&request.url);
        lock(&self.requests).push(request);
        Box::pin(async move { result })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_route_replays_sequence_then_repeats_last() {
        let client = ScriptedHttpClient::new().respond_sequence(
            "/v3/profile",
            vec![
                Err(HttpError::new("connection reset")),
                Ok(HttpResponse::ok_json("[]")),
            ],
        );

        let first = client.execute(HttpRequest::get("https://x/v3/profile/A")).await;
        let second = client.execute(HttpRequest::get("https://x/v3/profile/A")).await;
        let third = client.execute(HttpRequest::get("https://x/v3/profile/B")).await;

        assert!(first.is_err());
        assert_eq!(second.expect("ok").body, "[]");
        assert_eq!(third.expect("ok").body, "[]");
        assert_eq!(client.count_matching("/v3/profile"), 3);
    }

    #[tokio::test]
    async fn unmatched_request_uses_fallback_or_fails() {
        let strict = ScriptedHttpClient::new();
        let err = strict
            .execute(HttpRequest::get("https://x/unknown"))
            .await
            .expect_err("no route");
        assert!(err.message().contains("no scripted response"));

        let lenient = ScriptedHttpClient::new().with_fallback(HttpResponse::ok_json("{}"));
        let response = lenient
            .execute(HttpRequest::get("https://x/unknown"))
            .await
            .expect("fallback");
        assert!(response.is_success());
    }
}
