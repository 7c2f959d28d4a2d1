use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::error::ErrorBody;
use crate::server::{ANALYZE_PATH, IDEAS_PATH};
use crate::service::{AnalysisReply, IdeasReply};
use crate::validation::{preflight_ideas, preflight_workflow, Violation};

#[derive(Debug, Error)]
pub enum ClientError {
    /// Pre-flight failed; nothing was sent. Shows the first violation.
    #[error("{}", .0.first().map(|v| v.message.as_str()).unwrap_or("invalid input"))]
    Invalid(Vec<Violation>),

    #[error("server answered {status}: {message}")]
    Server { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("failed to decode server response: {0}")]
    Decode(#[from] std::io::Error),

    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Blocking client for the two endpoints. Runs the client-side checks before
/// every request, so invalid input never leaves the process.
pub struct ArchitectClient {
    agent: ureq::Agent,
    base_url: String,
}

impl ArchitectClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn analyze(&self, role: &str, workflow: &str) -> Result<AnalysisReply, ClientError> {
        let request = preflight_workflow(role, workflow).map_err(ClientError::Invalid)?;
        self.post(ANALYZE_PATH, &request)
    }

    pub fn generate_ideas(
        &self,
        business_area: &str,
        pain_points: &str,
        expectations: &str,
    ) -> Result<IdeasReply, ClientError> {
        let request =
            preflight_ideas(business_area, pain_points, expectations)
                .map_err(ClientError::Invalid)?;
        self.post(IDEAS_PATH, &request)
    }

    fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let payload = serde_json::to_value(body)?;

        match self.agent.post(&url).send_json(payload) {
            Ok(resp) => Ok(resp.into_json::<R>()?),
            Err(ureq::Error::Status(status, resp)) => {
                let message = resp
                    .into_json::<ErrorBody>()
                    .map(|b| b.error)
                    .unwrap_or_else(|_| format!("HTTP {status}"));
                Err(ClientError::Server { status, message })
            }
            Err(ureq::Error::Transport(t)) => Err(ClientError::Transport(t.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_is_stopped_before_sending() {
        // Port 9 is discard; nothing should be dialled anyway.
        let client = ArchitectClient::new("http://127.0.0.1:9/", Duration::from_secs(1));
        let err = client.analyze("", "short").unwrap_err();
        assert_eq!(err.to_string(), "담당 업무를 입력해주세요");
        match err {
            ClientError::Invalid(violations) => assert_eq!(violations.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = client.generate_ideas("QA", "", "x").unwrap_err();
        assert_eq!(err.to_string(), "모든 필드를 입력해주세요");
    }

    #[test]
    fn base_url_is_normalised() {
        let client = ArchitectClient::new("http://localhost:8080///", Duration::from_secs(1));
        assert_eq!(client.base_url, "http://localhost:8080");
    }
}
