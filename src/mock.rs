//! In-process stand-in for the chat-completion gateway.
//!
//! Answers `POST /v1/chat/completions` with canned markdown, a canned
//! `generate_ax_ideas` tool call (when the request declares tools), or a
//! forced error status. Every call is counted.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::gateway::{ChatRequest, ChatResponse, Choice, FunctionCall, ResponseMessage, ToolCall};
use crate::idea::IDEAS_TOOL_NAME;

pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Markdown for plain requests, tool-call arguments for tool requests.
    Reply { markdown: String, ideas: Value },
    /// Non-2xx with the given body.
    Fail { status: u16, body: String },
    /// 200 with a choice that has neither content nor tool calls.
    Empty,
}

impl Default for MockBehavior {
    fn default() -> Self {
        MockBehavior::Reply {
            markdown: sample_markdown().to_string(),
            ideas: sample_ideas(),
        }
    }
}

#[derive(Clone, Default)]
pub struct MockGateway {
    behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<ChatRequest>>>,
}

impl MockGateway {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last_request.lock().ok().and_then(|guard| guard.clone())
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(COMPLETIONS_PATH, post(complete))
            .with_state(self.clone())
    }

    /// Serve on `addr` in a background task and return the bound address.
    /// Pass port 0 for an ephemeral port.
    pub async fn spawn(&self, addr: SocketAddr) -> std::io::Result<SocketAddr> {
        let listener = TcpListener::bind(addr).await?;
        let bound = listener.local_addr()?;
        let router = self.router();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!(error = %e, "mock gateway stopped");
            }
        });
        Ok(bound)
    }
}

async fn complete(State(mock): State<MockGateway>, Json(request): Json<ChatRequest>) -> Response {
    let attempt = mock.calls.fetch_add(1, Ordering::SeqCst) + 1;
    let wants_tool = request.tools.is_some();
    info!(attempt, model = %request.model, wants_tool, "mock gateway received request");
    if let Ok(mut guard) = mock.last_request.lock() {
        *guard = Some(request);
    }

    match &mock.behavior {
        MockBehavior::Fail { status, body } => {
            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, body.clone()).into_response()
        }
        MockBehavior::Empty => Json(ChatResponse {
            choices: vec![Choice::default()],
        })
        .into_response(),
        MockBehavior::Reply { markdown, ideas } => {
            let message = if wants_tool {
                ResponseMessage {
                    content: None,
                    tool_calls: Some(vec![ToolCall {
                        id: Some(format!("call_{attempt}")),
                        function: FunctionCall {
                            name: Some(IDEAS_TOOL_NAME.to_string()),
                            arguments: Some(ideas.to_string()),
                        },
                    }]),
                }
            } else {
                ResponseMessage {
                    content: Some(markdown.clone()),
                    tool_calls: None,
                }
            };
            Json(ChatResponse {
                choices: vec![Choice { message }],
            })
            .into_response()
        }
    }
}

pub fn sample_markdown() -> &'static str {
    "## 1. 역할 및 책임\n\
- QA 엔지니어: 테스트 전략 수립과 결과 승인\n\
- 개발자: 결함 수정\n\n\
## 2. 기대 효과\n\
- 회귀 테스트 시간 60% 단축\n\n\
## 3. 핵심 키워드\n\
테스트 자동화, 회귀 테스트, CI/CD, 결함 예측, 품질 게이트\n\n\
## 4. 권장 기술 스택\n\
- Playwright: E2E 자동화\n\
- GitHub Actions: 파이프라인 통합\n"
}

/// Tool-call arguments with one idea per category.
pub fn sample_ideas() -> Value {
    json!({
        "ideas": [
            {
                "title": "테스트 케이스 초안 작성 보조",
                "role": "Assistant",
                "description": "요구사항 문서에서 테스트 케이스 초안을 생성합니다.",
                "userRole": "초안 검토 및 확정",
                "expectedEffect": "테스트 설계 시간 단축",
                "effectDetails": ["설계 시간 40% 단축", "누락 케이스 감소"],
                "keywords": ["테스트 설계", "생성형 AI"],
                "technologies": ["LLM", "RAG"]
            },
            {
                "title": "결함 원인 분석 자문",
                "role": "Advisor",
                "description": "과거 결함 이력을 기반으로 원인 후보를 제시합니다.",
                "userRole": "최종 원인 판단",
                "expectedEffect": "분석 리드타임 단축",
                "effectDetails": ["원인 파악 시간 50% 단축"],
                "keywords": ["근본 원인 분석", "결함 이력"],
                "technologies": ["벡터 검색", "LLM"]
            },
            {
                "title": "회귀 테스트 자율 실행 에이전트",
                "role": "Agent",
                "description": "변경 영향 범위를 판단해 회귀 테스트를 선택하고 실행합니다.",
                "userRole": "실행 결과 모니터링",
                "expectedEffect": "야간 회귀 테스트 무인화",
                "effectDetails": ["수작업 실행 제거", "피드백 주기 단축"],
                "keywords": ["자율 에이전트", "회귀 테스트"],
                "technologies": ["CI/CD", "Playwright", "LLM Agent"]
            }
        ]
    })
}
