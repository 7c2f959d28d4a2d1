use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::{Config, NarrativeOutput};
use crate::error::ServiceError;
use crate::extract::{extract_analysis, extract_ideas, split_sections, Section};
use crate::gateway::{ChatGateway, ChatRequest, GatewayError, HttpGateway};
use crate::idea::Idea;
use crate::lifecycle::{Lifecycle, Phase};
use crate::prompt::{compose_ideas, compose_narrative};
use crate::validation::{check_ideas, check_workflow, IdeaForm, WorkflowForm};

/// Endpoint A success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReply {
    pub analysis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<Section>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_sections: Option<Vec<u8>>,
}

/// Endpoint B success body. `ideas` is the tool-call array as the gateway
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeasReply {
    pub ideas: Vec<Value>,
}

impl IdeasReply {
    /// Typed view of the ideas, for callers that render them.
    pub fn cards(&self) -> Result<Vec<Idea>, serde_json::Error> {
        self.ideas.iter().map(Idea::deserialize).collect()
    }
}

/// Stateless request pipeline: validate, compose, dispatch, extract.
///
/// `gateway` is `None` when no credential was configured; every request then
/// ends in a configuration error without touching the network.
#[derive(Clone)]
pub struct ArchitectService {
    gateway: Option<Arc<dyn ChatGateway>>,
    narrative_output: NarrativeOutput,
    enforce_idea_schema: bool,
    max_field_chars: usize,
}

impl ArchitectService {
    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        let gateway: Option<Arc<dyn ChatGateway>> =
            match HttpGateway::from_config(&config.gateway) {
                Ok(gateway) => Some(Arc::new(gateway)),
                Err(GatewayError::NotConfigured) => {
                    error!("LOVABLE_API_KEY not configured, every request will fail");
                    None
                }
                Err(e) => return Err(e),
            };
        Ok(Self::with_gateway(gateway, config))
    }

    pub fn with_gateway(gateway: Option<Arc<dyn ChatGateway>>, config: &Config) -> Self {
        Self {
            gateway,
            narrative_output: config.narrative.output,
            enforce_idea_schema: config.ideas.enforce_schema,
            max_field_chars: config.server.max_field_chars,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.gateway.is_some()
    }

    fn gateway(&self, lc: &mut Lifecycle) -> Result<&Arc<dyn ChatGateway>, ServiceError> {
        self.gateway.as_ref().ok_or_else(|| {
            lc.fail();
            ServiceError::Configuration
        })
    }

    pub async fn analyze_workflow(
        &self,
        form: &WorkflowForm,
    ) -> Result<AnalysisReply, ServiceError> {
        let mut lc = Lifecycle::new("analyze-architecture");
        step(&mut lc, Phase::Validating);
        let input = check_workflow(form).map_err(|v| {
            lc.fail();
            ServiceError::from(v)
        })?;

        step(&mut lc, Phase::Dispatching);
        let gateway = self.gateway(&mut lc)?;
        let prompt = compose_narrative(&input);
        let request = ChatRequest::from_prompt(&prompt, gateway.model_name());
        info!("Calling gateway for workflow analysis");
        let response = gateway.complete(&request).await.map_err(|e| {
            lc.fail();
            ServiceError::from(e)
        })?;

        step(&mut lc, Phase::Extracting);
        let analysis = extract_analysis(&response).map_err(|e| {
            lc.fail();
            ServiceError::from(e)
        })?;

        let reply = match self.narrative_output {
            NarrativeOutput::Raw => AnalysisReply {
                analysis,
                sections: None,
                missing_sections: None,
            },
            NarrativeOutput::Sections => {
                let split = split_sections(&analysis);
                if !split.missing.is_empty() {
                    warn!(missing = ?split.missing, "analysis is missing canonical sections");
                }
                AnalysisReply {
                    analysis,
                    sections: Some(split.sections),
                    missing_sections: Some(split.missing),
                }
            }
        };

        step(&mut lc, Phase::Ready);
        info!("Analysis generated successfully");
        Ok(reply)
    }

    pub async fn generate_ideas(&self, form: &IdeaForm) -> Result<IdeasReply, ServiceError> {
        let mut lc = Lifecycle::new("generate-ax-ideas");
        step(&mut lc, Phase::Validating);
        let input = check_ideas(form, self.max_field_chars).map_err(|v| {
            lc.fail();
            ServiceError::from(v)
        })?;

        step(&mut lc, Phase::Dispatching);
        let gateway = self.gateway(&mut lc)?;
        let prompt = compose_ideas(&input);
        let request = ChatRequest::from_prompt(&prompt, gateway.model_name());
        info!("Calling gateway for AX ideas generation");
        let response = gateway.complete(&request).await.map_err(|e| {
            lc.fail();
            ServiceError::from(e)
        })?;

        step(&mut lc, Phase::Extracting);
        let ideas = extract_ideas(&response, self.enforce_idea_schema).map_err(|e| {
            lc.fail();
            ServiceError::from(e)
        })?;

        step(&mut lc, Phase::Ready);
        info!(count = ideas.len(), "Ideas generated successfully");
        Ok(IdeasReply { ideas })
    }
}

fn step(lc: &mut Lifecycle, next: Phase) {
    if let Err(e) = lc.advance(next) {
        warn!(error = %e, "request lifecycle out of order");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{ChatResponse, Choice, ResponseMessage};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedGateway {
        calls: AtomicUsize,
        last: Mutex<Option<ChatRequest>>,
        reply: fn() -> Result<ChatResponse, GatewayError>,
    }

    #[async_trait]
    impl ChatGateway for ScriptedGateway {
        async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(request.clone());
            (self.reply)()
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn scripted(reply: fn() -> Result<ChatResponse, GatewayError>) -> Arc<ScriptedGateway> {
        Arc::new(ScriptedGateway {
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
            reply,
        })
    }

    fn markdown() -> Result<ChatResponse, GatewayError> {
        Ok(ChatResponse {
            choices: vec![Choice {
                message: ResponseMessage {
                    content: Some("## 1. 역할 및 책임\n검증\n## 2. 기대 효과\n품질".into()),
                    tool_calls: None,
                },
            }],
        })
    }

    fn valid_form() -> WorkflowForm {
        WorkflowForm {
            role: Some("QA 엔지니어".into()),
            workflow: Some("회귀 테스트를 매일 수동으로 수행합니다".into()),
        }
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_gateway() {
        let gw = scripted(markdown);
        let service = ArchitectService::with_gateway(Some(gw.clone()), &Config::default());
        let form = WorkflowForm {
            role: Some("QA".into()),
            workflow: Some("short".into()),
        };
        let err = service.analyze_workflow(&form).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(gw.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn raw_mode_returns_markdown_unmodified() {
        let gw = scripted(markdown);
        let service = ArchitectService::with_gateway(Some(gw.clone()), &Config::default());
        let reply = service.analyze_workflow(&valid_form()).await.unwrap();
        assert_eq!(reply.analysis, "## 1. 역할 및 책임\n검증\n## 2. 기대 효과\n품질");
        assert!(reply.sections.is_none());

        let sent = gw.last.lock().unwrap().clone().unwrap();
        assert_eq!(sent.model, "scripted");
        assert!(sent.messages[1].content.starts_with("담당 업무: QA 엔지니어"));
    }

    #[tokio::test]
    async fn sections_mode_reports_missing_headers() {
        let mut config = Config::default();
        config.narrative.output = NarrativeOutput::Sections;
        let service = ArchitectService::with_gateway(Some(scripted(markdown)), &config);
        let reply = service.analyze_workflow(&valid_form()).await.unwrap();
        assert_eq!(reply.sections.map(|s| s.len()), Some(2));
        assert_eq!(reply.missing_sections, Some(vec![3, 4]));
    }

    #[tokio::test]
    async fn unconfigured_service_fails_after_validation() {
        let service = ArchitectService::with_gateway(None, &Config::default());
        assert!(!service.is_configured());
        let err = service.analyze_workflow(&valid_form()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Configuration));

        // Validation still runs first.
        let err = service
            .analyze_workflow(&WorkflowForm::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn gateway_errors_map_through() {
        let service = ArchitectService::with_gateway(
            Some(scripted(|| Err(GatewayError::CreditsExhausted))),
            &Config::default(),
        );
        let err = service.analyze_workflow(&valid_form()).await.unwrap_err();
        assert!(matches!(err, ServiceError::UpstreamCreditsExhausted));
    }

    #[tokio::test]
    async fn ideas_without_tool_call_is_extraction_failure() {
        let service = ArchitectService::with_gateway(Some(scripted(markdown)), &Config::default());
        let form = IdeaForm {
            business_area: Some("QA".into()),
            pain_points: Some("수작업".into()),
            expectations: Some("자동화".into()),
        };
        let err = service.generate_ideas(&form).await.unwrap_err();
        assert!(matches!(err, ServiceError::Extraction(_)));
    }
}
