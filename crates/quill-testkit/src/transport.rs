//! Scripted HTTP transport
//!
//! Responses are keyed by method and path (query string included). Each
//! route holds a queue; the last scripted response for a route is reused
//! once the queue is down to one entry. Unscripted routes answer 404.

use async_trait::async_trait;
use parking_lot::Mutex;
use quill_core::effects::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

type Route = (HttpMethod, String);
type Scripted = Result<HttpResponse, TransportError>;

/// Transport double with canned responses
#[derive(Default)]
pub struct StubTransport {
    routes: Mutex<HashMap<Route, VecDeque<Scripted>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `method path`.
    pub fn respond(&self, method: HttpMethod, path: &str, response: HttpResponse) {
        self.script(method, path, Ok(response));
    }

    /// Queue a JSON response.
    pub fn respond_json(&self, method: HttpMethod, path: &str, status: u16, body: Value) {
        self.respond(method, path, HttpResponse::new(status, Some(body)));
    }

    /// Queue a bodiless response.
    pub fn respond_status(&self, method: HttpMethod, path: &str, status: u16) {
        self.respond(method, path, HttpResponse::new(status, None));
    }

    /// Queue a transport failure.
    pub fn fail(&self, method: HttpMethod, path: &str, error: TransportError) {
        self.script(method, path, Err(error));
    }

    /// Queue an "offline" failure.
    pub fn offline(&self, method: HttpMethod, path: &str) {
        self.fail(method, path, TransportError::Unreachable("offline".into()));
    }

    fn script(&self, method: HttpMethod, path: &str, scripted: Scripted) {
        self.routes
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(scripted);
    }

    /// Every request seen so far, in order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Requests to one route
    pub fn requests_to(&self, method: HttpMethod, path: &str) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    /// `METHOD path` for each request, handy for ordering assertions
    pub fn request_lines(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let route = (request.method, request.path.clone());
        self.requests.lock().push(request);
        let mut routes = self.routes.lock();
        match routes.get_mut(&route) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| Ok(HttpResponse::new(404, None))),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Ok(HttpResponse::new(404, None))),
            None => {
                tracing::debug!(method = %route.0, path = %route.1, "unscripted request, answering 404");
                Ok(HttpResponse::new(404, None))
            }
        }
    }
}
