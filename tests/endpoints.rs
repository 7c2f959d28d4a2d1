//! Endpoint contract tests against a scripted in-memory gateway.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use ax_architect::config::{Config, NarrativeOutput};
use ax_architect::error::{NOT_CONFIGURED_MESSAGE, NO_ANALYSIS_MESSAGE, NO_IDEAS_MESSAGE};
use ax_architect::gateway::{
    ChatGateway, ChatRequest, ChatResponse, Choice, FunctionCall, GatewayError, ResponseMessage,
    ToolCall,
};
use ax_architect::mock::{sample_ideas, sample_markdown};
use ax_architect::service::ArchitectService;
use ax_architect::validation::{
    IDEA_FIELDS_MISSING_MESSAGE, ROLE_RANGE_MESSAGE, WORKFLOW_MISSING_MESSAGE,
    WORKFLOW_RANGE_MESSAGE,
};
use common::{ideas_body, post_json, router_with, send, shared, workflow_body};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

struct StubGateway {
    calls: AtomicUsize,
    content: Option<String>,
    arguments: Option<String>,
}

impl StubGateway {
    fn text(content: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            content: Some(content.to_string()),
            arguments: None,
        })
    }

    fn tool(arguments: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            content: None,
            arguments: Some(arguments.to_string()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatGateway for StubGateway {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let tool_calls = request.tools.as_ref().and(self.arguments.as_ref()).map(|args| {
            vec![ToolCall {
                id: None,
                function: FunctionCall {
                    name: Some("generate_ax_ideas".into()),
                    arguments: Some(args.clone()),
                },
            }]
        });
        Ok(ChatResponse {
            choices: vec![Choice {
                message: ResponseMessage {
                    content: self.content.clone(),
                    tool_calls,
                },
            }],
        })
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}

fn service(gw: &Arc<StubGateway>, config: &Config) -> ArchitectService {
    ArchitectService::with_gateway(shared(gw.clone()), config)
}

#[tokio::test]
async fn analysis_is_passed_through_unmodified() {
    let gw = StubGateway::text(sample_markdown());
    let app = router_with(service(&gw, &Config::default()));

    let (status, body) = post_json(app, "/analyze-architecture", workflow_body()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "analysis": sample_markdown() }));
    assert_eq!(gw.calls(), 1);
}

#[tokio::test]
async fn sections_deployment_returns_four_sections() {
    let gw = StubGateway::text(sample_markdown());
    let mut config = Config::default();
    config.narrative.output = NarrativeOutput::Sections;
    let app = router_with(service(&gw, &config));

    let (status, body) = post_json(app, "/analyze-architecture", workflow_body()).await;

    assert_eq!(status, StatusCode::OK);
    let numbers: Vec<u64> = body["sections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["number"].as_u64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
    assert_eq!(body["missingSections"], json!([]));
    assert_eq!(body["analysis"], json!(sample_markdown()));
}

#[tokio::test]
async fn ideas_are_passed_through_unchanged() {
    let gw = StubGateway::tool(&sample_ideas().to_string());
    let app = router_with(service(&gw, &Config::default()));

    let (status, body) = post_json(app, "/generate-ax-ideas", ideas_body()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, sample_ideas());
    assert_eq!(gw.calls(), 1);
}

#[tokio::test]
async fn validation_failures_never_dispatch() {
    let gw = StubGateway::text(sample_markdown());
    let cases: Vec<(Value, &str)> = vec![
        (json!({ "workflow": "long enough workflow" }), WORKFLOW_MISSING_MESSAGE),
        (json!({ "role": "", "workflow": "long enough workflow" }), WORKFLOW_MISSING_MESSAGE),
        (json!({ "role": "   ", "workflow": "long enough workflow" }), ROLE_RANGE_MESSAGE),
        (
            json!({ "role": "r".repeat(201), "workflow": "long enough workflow" }),
            ROLE_RANGE_MESSAGE,
        ),
        (json!({ "role": "QA", "workflow": "too short" }), WORKFLOW_RANGE_MESSAGE),
        (json!({ "role": "QA", "workflow": "w".repeat(2001) }), WORKFLOW_RANGE_MESSAGE),
        (json!({ "role": 7, "workflow": "long enough workflow" }), WORKFLOW_MISSING_MESSAGE),
    ];

    for (body, message) in cases {
        let app = router_with(service(&gw, &Config::default()));
        let (status, reply) = post_json(app, "/analyze-architecture", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(reply, json!({ "error": message }));
    }
    assert_eq!(gw.calls(), 0);
}

#[tokio::test]
async fn malformed_body_is_a_400() {
    let gw = StubGateway::tool(&sample_ideas().to_string());
    let app = router_with(service(&gw, &Config::default()));
    let request = Request::builder()
        .method("POST")
        .uri("/generate-ax-ideas")
        .body(Body::from("not json"))
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": IDEA_FIELDS_MISSING_MESSAGE }));
    assert_eq!(gw.calls(), 0);
}

#[tokio::test]
async fn blank_idea_field_is_rejected() {
    let gw = StubGateway::tool(&sample_ideas().to_string());
    let app = router_with(service(&gw, &Config::default()));
    let mut body = ideas_body();
    body["expectations"] = json!("  ");

    let (status, reply) = post_json(app, "/generate-ax-ideas", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["error"], json!(IDEA_FIELDS_MISSING_MESSAGE));
    assert_eq!(gw.calls(), 0);
}

#[tokio::test]
async fn empty_content_is_an_extraction_failure() {
    let gw = StubGateway::text("");
    let app = router_with(service(&gw, &Config::default()));

    let (status, body) = post_json(app, "/analyze-architecture", workflow_body()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": NO_ANALYSIS_MESSAGE }));
}

#[tokio::test]
async fn unparsable_tool_arguments_get_the_ideas_message() {
    let gw = StubGateway::tool("{\"ideas\": [");
    let app = router_with(service(&gw, &Config::default()));

    let (status, body) = post_json(app, "/generate-ax-ideas", ideas_body()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": NO_IDEAS_MESSAGE }));
}

#[tokio::test]
async fn duplicate_categories_depend_on_enforcement() {
    let mut ideas = sample_ideas();
    ideas["ideas"][0]["role"] = json!("Agent");
    let gw = StubGateway::tool(&ideas.to_string());

    let app = router_with(service(&gw, &Config::default()));
    let (status, _) = post_json(app, "/generate-ax-ideas", ideas_body()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let mut trusting = Config::default();
    trusting.ideas.enforce_schema = false;
    let app = router_with(service(&gw, &trusting));
    let (status, body) = post_json(app, "/generate-ax-ideas", ideas_body()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ideas);
}

#[tokio::test]
async fn trusted_mode_returns_an_incomplete_idea_unchanged() {
    let mut ideas = sample_ideas();
    ideas["ideas"][1].as_object_mut().unwrap().remove("keywords");
    let gw = StubGateway::tool(&ideas.to_string());

    let mut trusting = Config::default();
    trusting.ideas.enforce_schema = false;
    let app = router_with(service(&gw, &trusting));
    let (status, body) = post_json(app, "/generate-ax-ideas", ideas_body()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ideas);
    assert!(body["ideas"][1].get("keywords").is_none());
}

#[tokio::test]
async fn undeclared_idea_keys_fail_enforcement() {
    let mut ideas = sample_ideas();
    ideas["ideas"][0]["priority"] = json!("high");
    let gw = StubGateway::tool(&ideas.to_string());

    let app = router_with(service(&gw, &Config::default()));
    let (status, body) = post_json(app, "/generate-ax-ideas", ideas_body()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": NO_IDEAS_MESSAGE }));
}

#[tokio::test]
async fn unconfigured_service_answers_500_on_both_endpoints() {
    let app = router_with(ArchitectService::with_gateway(None, &Config::default()));

    let (status, body) = post_json(app.clone(), "/analyze-architecture", workflow_body()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": NOT_CONFIGURED_MESSAGE }));

    let (status, body) = post_json(app, "/generate-ax-ideas", ideas_body()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": NOT_CONFIGURED_MESSAGE }));
}

#[tokio::test]
async fn preflight_is_an_empty_200_with_open_cors() {
    let gw = StubGateway::text(sample_markdown());
    for path in ["/analyze-architecture", "/generate-ax-ideas"] {
        let app = router_with(service(&gw, &Config::default()));
        let request = Request::builder()
            .method("OPTIONS")
            .uri(path)
            .header("origin", "https://example.com")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type,apikey")
            .body(Body::empty())
            .unwrap();

        let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    // Bare OPTIONS without CORS headers.
    let app = router_with(service(&gw, &Config::default()));
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/analyze-architecture")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
    assert_eq!(gw.calls(), 0);
}

#[tokio::test]
async fn responses_carry_allow_origin() {
    let gw = StubGateway::text(sample_markdown());
    let app = router_with(service(&gw, &Config::default()));
    let request = Request::builder()
        .method("POST")
        .uri("/analyze-architecture")
        .header("origin", "https://example.com")
        .header("content-type", "application/json")
        .body(Body::from(workflow_body().to_string()))
        .unwrap();

    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}
