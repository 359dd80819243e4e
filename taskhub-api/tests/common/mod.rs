//! Common test utilities for integration tests
//!
//! Every test gets its own router over a fresh in-memory store, so tests
//! need no database and never share state.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::Value;
use taskhub_api::app::{build_router, AppState};
use taskhub_api::config::Config;
use taskhub_shared::auth::jwt::{create_token, Claims};
use taskhub_shared::auth::password::hash_password;
use taskhub_shared::models::user::CreateUser;
use taskhub_shared::store::Stores;
use tower::Service as _;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret-that-is-long-enough";

/// A registered user and a valid token for them
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

/// Test context containing the router and the store behind it
pub struct TestContext {
    pub app: axum::Router,
    pub stores: Stores,
    pub config: Config,
}

impl TestContext {
    pub fn new() -> Self {
        let config = Config::from_lookup(|key| match key {
            "STORAGE" => Some("memory".to_string()),
            "JWT_SECRET" => Some(JWT_SECRET.to_string()),
            _ => None,
        })
        .expect("test config");

        let stores = Stores::in_memory();
        let app = build_router(AppState::new(stores.clone(), config.clone()));

        TestContext { app, stores, config }
    }

    /// Inserts a user directly and mints a token for them
    pub async fn user(&self, name: &str) -> TestUser {
        let email = format!("{}@example.com", name.to_lowercase());
        let user = self
            .stores
            .users
            .create(CreateUser {
                name: name.to_string(),
                email: email.clone(),
                password_hash: hash_password("password123").expect("hash"),
            })
            .await
            .expect("create user");

        let token = create_token(&Claims::new(user.id), JWT_SECRET).expect("token");

        TestUser {
            id: user.id,
            email,
            token,
        }
    }

    /// Sends a request and returns the status with the parsed JSON body
    ///
    /// An empty body parses as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.app.clone().call(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(&user.token), None).await
    }

    pub async fn post(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(&user.token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(&user.token), Some(body)).await
    }

    pub async fn delete(
        &self,
        uri: &str,
        user: &TestUser,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(&user.token), body).await
    }

    /// Creates a project owned by `owner` and returns its id
    pub async fn project(&self, owner: &TestUser, name: &str) -> String {
        let (status, body) = self
            .post("/api/projects", owner, serde_json::json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().expect("project id").to_string()
    }

    /// Adds `member` to the project through the API
    pub async fn share(&self, project_id: &str, owner: &TestUser, member: &TestUser) {
        let (status, body) = self
            .post(
                &format!("/api/projects/{}/collaborators", project_id),
                owner,
                serde_json::json!({ "email": member.email }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
    }

    /// Creates a task and returns its id
    pub async fn task(&self, project_id: &str, user: &TestUser, body: Value) -> String {
        let (status, body) = self
            .post(&format!("/api/projects/{}/tasks", project_id), user, body)
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().expect("task id").to_string()
    }
}
