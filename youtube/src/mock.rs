//! Mock HTTP server standing in for the YouTube and Google OAuth endpoints in tests.
//!
//! Every request is recorded so tests can assert which calls were made, in what order,
//! and with which parameters. Responses come from canned routes keyed by method and path,
//! optionally narrowed to one form field value; the first matching route wins and anything
//! without a route gets a 404.

use crate::credentials::ClientSecrets;
use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper::{Request, Response, body};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    path: String,
    form_field: Option<(String, String)>,
    status: StatusCode,
    body: serde_json::Value,
}

/// A request as seen by the mock server.
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
    pub body: Bytes,
}

impl RecordedRequest {
    /// The body parsed as JSON, or `Null` for an empty body.
    pub fn json(&self) -> serde_json::Value {
        if self.body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&self.body).expect("request body is JSON")
        }
    }

    /// The body parsed as `application/x-www-form-urlencoded`.
    pub fn form(&self) -> HashMap<String, String> {
        form_urlencoded::parse(&self.body).into_owned().collect()
    }
}

#[derive(Debug, Default)]
struct State {
    routes: Vec<Route>,
    requests: Vec<RecordedRequest>,
}

#[derive(Debug)]
pub(crate) struct MockServer {
    addr: SocketAddr,
    state: Arc<Mutex<State>>,
    server: tokio::task::JoinHandle<()>,
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl MockServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");
        let state = Arc::new(Mutex::new(State::default()));

        let server = tokio::spawn({
            let state = Arc::clone(&state);
            async move {
                loop {
                    let Ok((conn, _)) = listener.accept().await else {
                        break;
                    };
                    let conn = hyper_util::rt::TokioIo::new(conn);
                    let state = Arc::clone(&state);
                    let service = service_fn(move |req: Request<body::Incoming>| {
                        let state = Arc::clone(&state);
                        async move { Ok::<_, Infallible>(handle(req, &state).await) }
                    });
                    tokio::spawn(async move {
                        let _ = hyper::server::conn::http1::Builder::new()
                            .serve_connection(conn, service)
                            .await;
                    });
                }
            }
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Answers `method path` with `status` and a JSON `body`.
    pub fn route(
        self,
        method: Method,
        path: &str,
        status: StatusCode,
        body: serde_json::Value,
    ) -> Self {
        self.push_route(method, path, None, status, body)
    }

    /// Like [`Self::route`], but only for form-encoded requests where `field` is `value`.
    pub fn route_form(
        self,
        method: Method,
        path: &str,
        (field, value): (&str, &str),
        status: StatusCode,
        body: serde_json::Value,
    ) -> Self {
        let form_field = Some((field.to_string(), value.to_string()));
        self.push_route(method, path, form_field, status, body)
    }

    fn push_route(
        self,
        method: Method,
        path: &str,
        form_field: Option<(String, String)>,
        status: StatusCode,
        body: serde_json::Value,
    ) -> Self {
        self.state.lock().unwrap().routes.push(Route {
            method,
            path: path.to_string(),
            form_field,
            status,
            body,
        });
        self
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client secrets whose OAuth endpoints point at this server.
    pub fn client_secrets(&self) -> ClientSecrets {
        ClientSecrets {
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            auth_uri: format!("{}/auth", self.base_url()),
            token_uri: format!("{}/token", self.base_url()),
        }
    }

    /// All requests received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

async fn handle(req: Request<body::Incoming>, state: &Mutex<State>) -> Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => Bytes::new(),
    };
    let query = form_urlencoded::parse(parts.uri.query().unwrap_or("").as_bytes())
        .into_owned()
        .collect();
    let authorization = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let request = RecordedRequest {
        method: parts.method.clone(),
        path: parts.uri.path().to_string(),
        query,
        authorization,
        body,
    };
    let form = request.form();

    let mut state = state.lock().unwrap();
    state.requests.push(request);

    let route = state.routes.iter().find(|r| {
        r.method == parts.method
            && r.path == parts.uri.path()
            && r.form_field
                .as_ref()
                .is_none_or(|(k, v)| form.get(k) == Some(v))
    });
    let (status, body) = match route {
        Some(route) => (route.status, route.body.to_string()),
        None => (
            StatusCode::NOT_FOUND,
            serde_json::json!({"error": {"code": 404, "message": "no such route"}}).to_string(),
        ),
    };

    let mut response = Response::new(Full::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    response
}
