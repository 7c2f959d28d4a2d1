#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use ax_architect::config::Config;
use ax_architect::gateway::ChatGateway;
use ax_architect::mock::{MockBehavior, MockGateway, COMPLETIONS_PATH};
use ax_architect::server::build_router;
use ax_architect::service::ArchitectService;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

/// Config pointing at a mock gateway, with a credential set.
pub fn config_for(gateway_addr: SocketAddr) -> Config {
    let mut config = Config::default();
    config.gateway.base_url = format!("http://{gateway_addr}{COMPLETIONS_PATH}");
    config.gateway.api_key = Some("test-key".into());
    config.gateway.timeout_secs = 5;
    config.gateway.retry_base_delay_ms = 1;
    config
}

pub async fn spawn_mock(behavior: MockBehavior) -> (MockGateway, SocketAddr) {
    let mock = MockGateway::new(behavior);
    let addr = mock
        .spawn("127.0.0.1:0".parse().unwrap())
        .await
        .expect("mock gateway binds");
    (mock, addr)
}

/// Router wired to a real `HttpGateway` talking to a fresh mock gateway.
pub async fn app_with_mock(
    behavior: MockBehavior,
    tweak: impl FnOnce(&mut Config),
) -> (Router, MockGateway) {
    let (mock, addr) = spawn_mock(behavior).await;
    let mut config = config_for(addr);
    tweak(&mut config);
    let service = ArchitectService::from_config(&config).expect("service builds");
    (build_router(service), mock)
}

pub fn router_with(service: ArchitectService) -> Router {
    build_router(service)
}

pub fn shared<T: ChatGateway + 'static>(gw: Arc<T>) -> Option<Arc<dyn ChatGateway>> {
    Some(gw)
}

pub async fn post_json(app: Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

pub fn workflow_body() -> Value {
    serde_json::json!({
        "role": "QA 엔지니어",
        "workflow": "10+ character workflow text describing nightly regression runs"
    })
}

pub fn ideas_body() -> Value {
    serde_json::json!({
        "businessArea": "QA",
        "painPoints": "회귀 테스트를 수작업으로 반복합니다",
        "expectations": "테스트 선택과 실행 자동화"
    })
}
