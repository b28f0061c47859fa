//! Shared fixtures for store integration tests: an in-memory server that
//! answers by method and path, plus JSON builders for API entities.

#![allow(dead_code)]

use buglense_core::api::{ApiClient, HttpRequest, HttpResponse, Method, RequestBody, Transport};
use buglense_core::error::ApiError;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

pub const BASE: &str = "http://bugs.test/api";
pub const TS: &str = "2024-03-01T12:00:00Z";

struct Route {
    method: Method,
    path: String,
    reply: Result<HttpResponse, ApiError>,
}

/// Scripted API server. Unrouted requests get a JSON 404.
#[derive(Default)]
pub struct FakeServer {
    routes: Mutex<Vec<Route>>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer `method path` with `status` and a JSON body. Replaces any
    /// earlier answer for the same route.
    pub fn route(&self, method: Method, path: &str, status: u16, body: &Value) -> &Self {
        self.set(
            method,
            path,
            Ok(HttpResponse {
                status,
                status_text: status_text(status).to_string(),
                body: body.to_string(),
            }),
        )
    }

    /// Make `method path` fail before any response arrives.
    pub fn unreachable(&self, method: Method, path: &str) -> &Self {
        let err = ApiError::Network("connection refused".to_string());
        self.set(method, path, Err(err))
    }

    fn set(&self, method: Method, path: &str, reply: Result<HttpResponse, ApiError>) -> &Self {
        let mut routes = self.routes.lock().unwrap();
        routes.retain(|r| !(r.method == method && r.path == path));
        routes.push(Route {
            method,
            path: path.to_string(),
            reply,
        });
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        let url = format!("{BASE}{path}");
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }

    pub fn last_json(&self) -> Value {
        let last = self.requests().pop().unwrap();
        match last.body {
            RequestBody::Json(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("expected JSON body, got {other:?}"),
        }
    }
}

impl Transport for FakeServer {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = request.url.as_str();
        let path = url.strip_prefix(BASE).unwrap_or(url).to_string();
        let method = request.method;
        self.seen.lock().unwrap().push(request);

        let routes = self.routes.lock().unwrap();
        routes
            .iter()
            .find(|r| r.method == method && r.path == path)
            .map_or_else(
                || {
                    Ok(HttpResponse {
                        status: 404,
                        status_text: "Not Found".to_string(),
                        body: json!({ "message": format!("no route for {method} {path}") })
                            .to_string(),
                    })
                },
                |r| r.reply.clone(),
            )
    }
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        _ => "",
    }
}

pub fn client(server: &Arc<FakeServer>) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(BASE, Arc::clone(server)))
}

pub fn data(value: Value) -> Value {
    json!({ "data": value })
}

/// Error body in the server's `{ "message": ... }` shape.
pub fn message(text: &str) -> Value {
    json!({ "message": text })
}

pub fn user(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("User {id}"),
        "email": format!("{}@example.com", id.to_lowercase()),
        "role": "developer",
        "createdAt": TS,
    })
}

pub fn bug(id: &str, title: &str, status: &str, priority: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": format!("details for {id}"),
        "status": status,
        "priority": priority,
        "projectId": "P1",
        "reporterId": "U1",
        "createdAt": TS,
        "updatedAt": TS,
    })
}

pub fn assigned(mut bug: Value, user_id: &str) -> Value {
    bug["assigneeId"] = json!(user_id);
    bug
}

pub fn project(id: &str, key: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Project {key}"),
        "key": key,
        "teamId": "T1",
        "createdAt": TS,
        "updatedAt": TS,
    })
}

pub fn team(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "ownerId": "U1",
        "members": [{
            "id": "M1",
            "userId": "U1",
            "user": user("U1"),
            "teamId": id,
            "role": "owner",
            "joinedAt": TS,
        }],
        "createdAt": TS,
        "updatedAt": TS,
    })
}
