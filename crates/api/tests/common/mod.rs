#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::PropagateRequestIdLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use club_api::auth::jwt::{generate_access_token, JwtConfig};
use club_api::config::{ServerConfig, DEFAULT_STUDENT_SERVICE_NAME};
use club_api::routes;
use club_api::state::AppState;
use club_core::trace::{SpanContext, REQUEST_ID_HEADER, SPAN_CONTEXT_HEADER};
use club_db::models::club::Club;
use club_db::AccessorManager;
use club_remote::{
    CallMetadata, DirectoryResponse, RemoteError, RemoteServiceClient, ServiceNode, StudentInform,
};

pub const ADMIN: &str = "admin-000000000001";
pub const LEADER: &str = "student-000000000001";
pub const MEMBER: &str = "student-000000000002";
pub const OUTSIDER: &str = "student-000000000003";
pub const CLUB: &str = "club-000000000001";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        db_max_connections: 5,
        student_service_name: DEFAULT_STUDENT_SERVICE_NAME.to_string(),
        remote_timeout_secs: 5,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router with the same middleware stack as
/// `main.rs`, over the given accessors and remote client.
pub fn build_test_app(
    accessors: AccessorManager,
    remote: Arc<dyn RemoteServiceClient>,
    shutdown: CancellationToken,
) -> Router {
    build_test_app_with_config(test_config(), accessors, remote, shutdown)
}

/// Like [`build_test_app`], over a caller-supplied config.
pub fn build_test_app_with_config(
    config: ServerConfig,
    accessors: AccessorManager,
    remote: Arc<dyn RemoteServiceClient>,
    shutdown: CancellationToken,
) -> Router {
    let timeout_layer_limit = config.timeout_layer_limit();

    let state = AppState {
        accessors,
        remote,
        config: Arc::new(config),
        shutdown,
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .merge(routes::health::router())
        .nest("/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout_layer_limit,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Signed access token for `identity`.
pub fn token(identity: &str) -> String {
    generate_access_token(identity, &test_config().jwt).unwrap()
}

/// Request carrying full call metadata for `identity`.
pub fn request(
    method: Method,
    uri: &str,
    identity: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    request_builder(method, uri, identity)
        .body(json_body(body))
        .unwrap()
}

/// Like [`request`], with an `X-Request-Timeout-Ms` budget.
pub fn request_with_budget(
    method: Method,
    uri: &str,
    identity: &str,
    budget_ms: u64,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    request_builder(method, uri, identity)
        .header("x-request-timeout-ms", budget_ms.to_string())
        .body(json_body(body))
        .unwrap()
}

/// Request with full call metadata and a raw, possibly malformed, body.
pub fn raw_request(method: Method, uri: &str, identity: &str, body: &str) -> Request<Body> {
    request_builder(method, uri, identity)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn request_builder(method: Method, uri: &str, identity: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(REQUEST_ID_HEADER, uuid::Uuid::new_v4().to_string())
        .header(SPAN_CONTEXT_HEADER, SpanContext::new_root().to_string())
        .header(AUTHORIZATION, format!("Bearer {}", token(identity)))
        .header(CONTENT_TYPE, "application/json")
}

fn json_body(body: Option<serde_json::Value>) -> Body {
    match body {
        Some(json) => Body::from(json.to_string()),
        None => Body::empty(),
    }
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn club(uuid: &str, leader_uuid: &str) -> Club {
    let now = chrono::Utc::now();
    Club {
        uuid: uuid.to_string(),
        leader_uuid: leader_uuid.to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn student(uuid: &str) -> StudentInform {
    StudentInform {
        student_uuid: uuid.to_string(),
        student_number: 2101,
        name: "student".to_string(),
        profile_uri: String::new(),
    }
}

// ---------------------------------------------------------------------------
// Scripted remote client
// ---------------------------------------------------------------------------

/// [`RemoteServiceClient`] that answers directory lookups from a queue.
#[derive(Default)]
pub struct ScriptedRemote {
    replies: Mutex<VecDeque<Result<DirectoryResponse, RemoteError>>>,
    delay: Option<Duration>,
    cancel_on_lookup: Option<CancellationToken>,
    lookups: Mutex<Vec<(CallMetadata, Vec<String>)>>,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, reply: Result<DirectoryResponse, RemoteError>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    /// Hold every lookup for `delay` before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Cancel `token` as soon as a lookup starts.
    pub fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancel_on_lookup = Some(token);
        self
    }

    /// Every lookup made so far, with the metadata it carried.
    pub fn lookups(&self) -> Vec<(CallMetadata, Vec<String>)> {
        self.lookups.lock().unwrap().clone()
    }

    async fn answer(
        &self,
        meta: &CallMetadata,
        student_uuids: Vec<String>,
    ) -> Result<DirectoryResponse, RemoteError> {
        self.lookups
            .lock()
            .unwrap()
            .push((meta.clone(), student_uuids));
        if let Some(token) = &self.cancel_on_lookup {
            token.cancel();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected directory lookup")
    }
}

#[async_trait]
impl RemoteServiceClient for ScriptedRemote {
    async fn next_service_node(&self, _service: &str) -> Result<ServiceNode, RemoteError> {
        Ok(ServiceNode::new("127.0.0.1", 9))
    }

    async fn student_inform_with_uuid(
        &self,
        _node: &ServiceNode,
        meta: &CallMetadata,
        student_uuid: &str,
    ) -> Result<DirectoryResponse, RemoteError> {
        self.answer(meta, vec![student_uuid.to_string()]).await
    }

    async fn student_informs_with_uuids(
        &self,
        _node: &ServiceNode,
        meta: &CallMetadata,
        student_uuids: &[String],
    ) -> Result<DirectoryResponse, RemoteError> {
        self.answer(meta, student_uuids.to_vec()).await
    }
}
