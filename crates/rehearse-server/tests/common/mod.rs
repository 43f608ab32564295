#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    routing::post,
    Json, Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use rehearse_identity::{AuthConfig, SessionClaims};
use rehearse_server::{app, config::Config, AppState};
use rehearse_voice::RealtimeConfig;
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::TempDir;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret";

/// A router over a throwaway database. The directory lives as long as this.
pub struct TestApp {
    pub router: Router,
    _dir: TempDir,
}

pub fn setup() -> TestApp {
    setup_with_realtime(RealtimeConfig::default())
}

pub fn setup_with_realtime(realtime: RealtimeConfig) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.database.path = dir.path().join("rehearse.db").to_string_lossy().into_owned();
    config.auth = AuthConfig::hs256(SECRET);
    config.realtime = realtime;

    let state = AppState::from_config(&config).unwrap();
    TestApp {
        router: app(state),
        _dir: dir,
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

pub fn sign(sub: &str, exp: u64, secret: &str) -> String {
    let claims = SessionClaims {
        sub: sub.to_string(),
        exp,
        iss: None,
        sid: Some(format!("sess_{sub}")),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// A valid session token for `sub`.
pub fn token_for(sub: &str) -> String {
    sign(sub, now() + 3_600, SECRET)
}

pub fn expired_token_for(sub: &str) -> String {
    sign(sub, now() - 3_600, SECRET)
}

impl TestApp {
    /// Sends a request with an optional bearer token and JSON body.
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
        self.request(request).await
    }

    pub async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    /// Creates a question as `user` and returns its id.
    pub async fn create_question(&self, user: &str, title: &str, orientation: &str) -> String {
        let (status, json) = self
            .send(
                Method::POST,
                "/questions",
                Some(&token_for(user)),
                Some(serde_json::json!({
                    "title": title,
                    "description": format!("Walk me through {title}."),
                    "orientation": orientation,
                    "username": user,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json["id"].as_str().unwrap().to_string()
    }

    pub async fn vote(&self, user: &str, question_id: &str, vote_type: &str) -> (StatusCode, Value) {
        self.send(
            Method::PUT,
            &format!("/questions/{question_id}/vote"),
            Some(&token_for(user)),
            Some(serde_json::json!({ "voteType": vote_type })),
        )
        .await
    }

    pub async fn list(&self, viewer: Option<&str>) -> Vec<Value> {
        let token = viewer.map(token_for);
        let (status, json) = self
            .send(Method::GET, "/questions", token.as_deref(), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        json.as_array().unwrap().clone()
    }
}

/// Starts a stand-in realtime API answering `status`/`reply` and returns its
/// base URL.
pub async fn spawn_realtime_upstream(status: StatusCode, reply: Value) -> String {
    let upstream = Router::new().route(
        "/v1/realtime/client_secrets",
        post(move || {
            let reply = reply.clone();
            async move { (status, Json(reply)) }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, upstream).await.unwrap();
    });

    format!("http://{addr}/v1")
}
