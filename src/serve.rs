//! HTTP API server
//!
//! `decisio serve` → binds the REST surface the frontend talks to.
//!
//! Routing lives in [`ApiServer::route`], which maps a method, URL and body to
//! a status and JSON body without touching the socket. `handle_request` only
//! adds transport concerns (body reading, CORS headers).

use crate::config::ServerConfig;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::model::{DecisionContextSnapshotCreate, DecisionCreate, Page, ProjectContextUpdate};
use crate::service::{DecisionService, ProjectContextService};
use colored::Colorize;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Read;
use std::sync::Arc;
use std::time::Instant;
use tiny_http::{Header, Method, Request, Response, Server};

/// Request bodies larger than this are rejected
const MAX_BODY_BYTES: u64 = 1024 * 1024;

const SERVICE_NAME: &str = "Decisio API";

/// Error payload; `detail` is shown to the end user as-is
#[derive(Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
}

/// A routed response, before it is written to the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReply {
    pub status: u16,
    pub body: String,
}

impl ApiReply {
    fn json<T: Serialize>(status: u16, value: &T) -> Result<Self> {
        Ok(Self {
            status,
            body: serde_json::to_string(value)?,
        })
    }

    fn error(status: u16, detail: &str) -> Self {
        let body = serde_json::to_string(&ErrorBody { detail })
            .unwrap_or_else(|_| r#"{"detail":"Internal server error"}"#.to_string());
        Self { status, body }
    }

    fn empty(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }
}

/// HTTP status for a client error; anything else is a 500
fn status_for(err: &Error) -> u16 {
    match err {
        Error::Validation(_) => 422,
        Error::NotFound(_) => 404,
        Error::Precondition(_) => 400,
        _ => 500,
    }
}

/// The REST API bound to its services
pub struct ApiServer {
    decisions: DecisionService,
    contexts: ProjectContextService,
    config: ServerConfig,
}

impl ApiServer {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        Self {
            decisions: DecisionService::new(db.clone()),
            contexts: ProjectContextService::new(db),
            config,
        }
    }

    /// Dispatch one request
    pub fn route(&self, method: &Method, url: &str, body: &str) -> ApiReply {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, query),
            None => (url, ""),
        };

        if *method == Method::Options {
            return ApiReply::empty(204);
        }

        match self.dispatch(method, path, query, body) {
            Ok(reply) => reply,
            Err(err) if err.is_client_error() => {
                ApiReply::error(status_for(&err), &err.to_string())
            }
            Err(err) => {
                tracing::error!(%method, path, error = %err, "request failed");
                ApiReply::error(500, "Internal server error")
            }
        }
    }

    fn dispatch(&self, method: &Method, path: &str, query: &str, body: &str) -> Result<ApiReply> {
        match (method, path) {
            (Method::Get, "/") => {
                return ApiReply::json(
                    200,
                    &serde_json::json!({
                        "message": "Welcome to Decisio API",
                        "api": self.config.api_prefix,
                        "health": "/health",
                    }),
                )
            }
            (Method::Get, "/health") => {
                return ApiReply::json(
                    200,
                    &serde_json::json!({ "status": "healthy", "service": SERVICE_NAME }),
                )
            }
            _ => {}
        }

        let Some(rest) = strip_api_prefix(path, &self.config.api_prefix) else {
            return Ok(ApiReply::error(404, "Not Found"));
        };
        let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

        match (method, segments.as_slice()) {
            (Method::Get, ["decisions"]) => {
                let page: Page = parse_query(query)?;
                ApiReply::json(200, &self.decisions.list_decisions(page)?)
            }
            (Method::Post, ["decisions"]) => {
                let input: DecisionCreate = parse_body(body)?;
                ApiReply::json(201, &self.decisions.create_decision(input)?)
            }
            (Method::Get, ["decisions", id]) => {
                let id = parse_decision_id(id)?;
                ApiReply::json(200, &self.decisions.get_decision(id)?)
            }
            (Method::Get, ["decisions", id, "snapshots"]) => {
                let id = parse_decision_id(id)?;
                ApiReply::json(200, &self.decisions.list_snapshots(id)?)
            }
            (Method::Post, ["decisions", id, "snapshot"]) => {
                let id = parse_decision_id(id)?;
                let input: DecisionContextSnapshotCreate = parse_body(body)?;
                ApiReply::json(201, &self.decisions.create_snapshot(id, input)?)
            }
            (Method::Post, ["decisions", id, "evaluate"]) => {
                let id = parse_decision_id(id)?;
                ApiReply::json(201, &self.decisions.evaluate(id)?)
            }
            (Method::Get, ["decisions", id, "evaluations"]) => {
                let id = parse_decision_id(id)?;
                ApiReply::json(200, &self.decisions.list_evaluations(id)?)
            }
            (Method::Get, ["project-context"]) => ApiReply::json(200, &self.contexts.get()?),
            (Method::Put, ["project-context"]) => {
                let update: ProjectContextUpdate = parse_body(body)?;
                ApiReply::json(200, &self.contexts.update(update)?)
            }
            (_, segments) if is_known_route(segments) => {
                Ok(ApiReply::error(405, "Method Not Allowed"))
            }
            _ => Ok(ApiReply::error(404, "Not Found")),
        }
    }

    /// CORS headers for a request from `origin`, if that origin is allowed
    fn cors_headers(&self, origin: Option<&str>) -> Vec<Header> {
        let Some(origin) = origin.filter(|o| self.config.allows_origin(o)) else {
            return Vec::new();
        };
        [
            ("Access-Control-Allow-Origin", origin),
            ("Access-Control-Allow-Credentials", "true"),
            ("Access-Control-Allow-Methods", "GET, POST, PUT, OPTIONS"),
            ("Access-Control-Allow-Headers", "Content-Type"),
            ("Vary", "Origin"),
        ]
        .into_iter()
        .filter_map(|(name, value)| Header::from_bytes(name.as_bytes(), value.as_bytes()).ok())
        .collect()
    }
}

/// Path below the API prefix, or None if the path is outside it
fn strip_api_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let prefix = prefix.trim_end_matches('/');
    let rest = path.strip_prefix(prefix)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

fn is_known_route(segments: &[&str]) -> bool {
    matches!(
        segments,
        ["decisions"]
            | ["decisions", _]
            | ["decisions", _, "snapshots" | "snapshot" | "evaluate" | "evaluations"]
            | ["project-context"]
    )
}

fn parse_decision_id(raw: &str) -> Result<&str> {
    uuid::Uuid::parse_str(raw)
        .map(|_| raw)
        .map_err(|_| Error::Validation(format!("Invalid decision id '{}'", raw)))
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| Error::Validation(format!("Invalid request body: {}", e)))
}

fn parse_query<T: DeserializeOwned>(query: &str) -> Result<T> {
    serde_urlencoded::from_str(query)
        .map_err(|e| Error::Validation(format!("Invalid query string: {}", e)))
}

/// Start the API server and block serving requests
pub fn start_api_server(db: Database, config: &ServerConfig) -> Result<()> {
    let addr = config.bind_addr();
    let server = Server::http(&addr).map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;
    let server = Arc::new(server);
    let api = Arc::new(ApiServer::new(db, config.clone()));
    let workers = config.workers.max(1);

    eprintln!("\n{}", "Decisio".bold().green());
    eprintln!("   API:     http://{}{}", addr, config.api_prefix);
    eprintln!("   Health:  http://{}/health", addr);
    eprintln!("   Press Ctrl+C to stop\n");
    tracing::info!(%addr, workers, "api server listening");

    let handles = (0..workers)
        .map(|i| {
            let server = Arc::clone(&server);
            let api = Arc::clone(&api);
            std::thread::Builder::new()
                .name(format!("decisio-http-{}", i))
                .spawn(move || {
                    for request in server.incoming_requests() {
                        if let Err(e) = handle_request(&api, request) {
                            tracing::warn!(error = %e, "failed to write response");
                        }
                    }
                })
        })
        .collect::<std::io::Result<Vec<_>>>()?;

    for handle in handles {
        if handle.join().is_err() {
            tracing::error!("http worker panicked");
        }
    }
    Ok(())
}

fn handle_request(api: &ApiServer, mut request: Request) -> std::io::Result<()> {
    let started = Instant::now();
    let method = request.method().clone();
    let url = request.url().to_string();
    let origin = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Origin"))
        .map(|h| h.value.as_str().to_string());

    let reply = match read_body(&mut request) {
        Ok(body) => api.route(&method, &url, &body),
        Err(err) => ApiReply::error(status_for(&err), &err.to_string()),
    };

    tracing::debug!(
        %method,
        url = %url,
        status = reply.status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );

    let mut response = Response::from_string(reply.body).with_status_code(reply.status);
    if let Ok(content_type) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response.add_header(content_type);
    }
    for header in api.cors_headers(origin.as_deref()) {
        response.add_header(header);
    }
    request.respond(response)
}

fn read_body(request: &mut Request) -> Result<String> {
    let mut body = String::new();
    request
        .as_reader()
        .take(MAX_BODY_BYTES + 1)
        .read_to_string(&mut body)
        .map_err(|e| Error::Validation(format!("Failed to read body: {}", e)))?;
    if body.len() as u64 > MAX_BODY_BYTES {
        return Err(Error::Validation("Request body too large".to_string()));
    }
    Ok(body)
}
