//! Router harness for handler tests

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::auth::password::hash_password;
use crate::core::{Config, Server, ServerState};
use crate::db::test_pool;
use crate::payment::fake::FakeGateway;

pub(crate) const PASSWORD: &str = "correct-horse";

pub(crate) struct TestApp {
    pub app: Router,
    pub state: ServerState,
    pub gateway: Arc<FakeGateway>,
    _dir: TempDir,
}

pub(crate) async fn test_app() -> TestApp {
    test_app_with(FakeGateway::default()).await
}

pub(crate) async fn test_app_with(gateway: FakeGateway) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::for_work_dir(dir.path());
    let gateway = Arc::new(gateway);
    let state = ServerState::new(config, test_pool().await, gateway.clone());
    TestApp {
        app: Server::build_app(state.clone()),
        state,
        gateway,
        _dir: dir,
    }
}

impl TestApp {
    /// Insert an account whose password is [`PASSWORD`]
    pub async fn user(&self, email: &str, is_admin: bool) {
        sqlx::query("INSERT INTO Users (email, password, first_name, is_admin) VALUES (?, ?, 'Test', ?)")
            .bind(email)
            .bind(hash_password(PASSWORD).unwrap())
            .bind(is_admin)
            .execute(&self.state.pool)
            .await
            .unwrap();
    }

    pub fn token(&self, email: &str, is_admin: bool) -> String {
        self.state
            .get_jwt_service()
            .generate_token(email, is_admin)
            .unwrap()
    }

    pub async fn exec(&self, sql: &str) {
        sqlx::raw_sql(sql).execute(&self.state.pool).await.unwrap();
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.call(request).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = self.call_raw(request).await;
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn call_raw(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }
}
