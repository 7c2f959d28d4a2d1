//! Input checks run before any prompt is built.
//!
//! There are two independent implementations: `preflight_*` is what
//! a client runs before sending (trim first, collect every violation), and
//! `check_*` is what the service runs on whatever arrives over the wire. The
//! service never relies on a client having run its half.

use serde::{Deserialize, Serialize};

pub const ROLE_MAX_CHARS: usize = 200;
pub const WORKFLOW_MIN_CHARS: usize = 10;
pub const WORKFLOW_MAX_CHARS: usize = 2000;
pub const DEFAULT_FIELD_CEILING: usize = 2000;

pub const WORKFLOW_MISSING_MESSAGE: &str = "담당 업무와 워크플로우를 모두 입력해주세요";
pub const ROLE_RANGE_MESSAGE: &str = "담당 업무는 1-200자 사이여야 합니다";
pub const WORKFLOW_RANGE_MESSAGE: &str = "워크플로우는 10-2000자 사이여야 합니다";
pub const IDEA_FIELDS_MISSING_MESSAGE: &str = "모든 필드를 입력해주세요";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Role,
    Workflow,
    BusinessArea,
    PainPoints,
    Expectations,
}

impl Field {
    pub fn wire_name(self) -> &'static str {
        match self {
            Field::Role => "role",
            Field::Workflow => "workflow",
            Field::BusinessArea => "businessArea",
            Field::PainPoints => "painPoints",
            Field::Expectations => "expectations",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: Field,
    pub message: String,
}

impl Violation {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field.wire_name(), self.message)
    }
}

impl std::error::Error for Violation {}

/// Endpoint A body as received. Fields are optional so a missing field is a
/// validation failure rather than a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowForm {
    pub role: Option<String>,
    pub workflow: Option<String>,
}

/// Endpoint B body as received.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaForm {
    pub business_area: Option<String>,
    pub pain_points: Option<String>,
    pub expectations: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowRequest {
    pub role: String,
    pub workflow: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaRequest {
    pub business_area: String,
    pub pain_points: String,
    pub expectations: String,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Service-side check for Endpoint A.
///
/// Lower bounds apply to the trimmed text, upper bounds to the text as sent.
pub fn check_workflow(form: &WorkflowForm) -> Result<WorkflowRequest, Violation> {
    let (Some(role), Some(workflow)) = (present(&form.role), present(&form.workflow)) else {
        let field = if present(&form.role).is_none() {
            Field::Role
        } else {
            Field::Workflow
        };
        return Err(Violation::new(field, WORKFLOW_MISSING_MESSAGE));
    };

    if char_len(role.trim()) < 1 || char_len(role) > ROLE_MAX_CHARS {
        return Err(Violation::new(Field::Role, ROLE_RANGE_MESSAGE));
    }
    if char_len(workflow.trim()) < WORKFLOW_MIN_CHARS || char_len(workflow) > WORKFLOW_MAX_CHARS {
        return Err(Violation::new(Field::Workflow, WORKFLOW_RANGE_MESSAGE));
    }

    Ok(WorkflowRequest {
        role: role.trim().to_string(),
        workflow: workflow.trim().to_string(),
    })
}

/// Service-side check for Endpoint B. `ceiling` caps each field.
pub fn check_ideas(form: &IdeaForm, ceiling: usize) -> Result<IdeaRequest, Violation> {
    let fields = [
        (Field::BusinessArea, &form.business_area),
        (Field::PainPoints, &form.pain_points),
        (Field::Expectations, &form.expectations),
    ];

    let mut values = Vec::with_capacity(fields.len());
    for (field, value) in fields {
        let Some(text) = present(value).filter(|s| !s.trim().is_empty()) else {
            return Err(Violation::new(field, IDEA_FIELDS_MISSING_MESSAGE));
        };
        if char_len(text) > ceiling {
            return Err(Violation::new(
                field,
                format!("각 항목은 {ceiling}자 이내로 입력해주세요"),
            ));
        }
        values.push(text.trim().to_string());
    }

    let expectations = values.pop().unwrap_or_default();
    let pain_points = values.pop().unwrap_or_default();
    let business_area = values.pop().unwrap_or_default();
    Ok(IdeaRequest {
        business_area,
        pain_points,
        expectations,
    })
}

/// Client-side check for Endpoint A. Every violation is returned, in field
/// order; callers show the first one.
pub fn preflight_workflow(role: &str, workflow: &str) -> Result<WorkflowRequest, Vec<Violation>> {
    let role = role.trim();
    let workflow = workflow.trim();
    let mut violations = Vec::new();

    if role.is_empty() {
        violations.push(Violation::new(Field::Role, "담당 업무를 입력해주세요"));
    } else if char_len(role) > ROLE_MAX_CHARS {
        violations.push(Violation::new(
            Field::Role,
            "담당 업무는 200자 이내로 입력해주세요",
        ));
    }

    if char_len(workflow) < WORKFLOW_MIN_CHARS {
        violations.push(Violation::new(
            Field::Workflow,
            "워크플로우를 최소 10자 이상 입력해주세요",
        ));
    } else if char_len(workflow) > WORKFLOW_MAX_CHARS {
        violations.push(Violation::new(
            Field::Workflow,
            "워크플로우는 2000자 이내로 입력해주세요",
        ));
    }

    if violations.is_empty() {
        Ok(WorkflowRequest {
            role: role.to_string(),
            workflow: workflow.to_string(),
        })
    } else {
        Err(violations)
    }
}

/// Client-side check for Endpoint B.
pub fn preflight_ideas(
    business_area: &str,
    pain_points: &str,
    expectations: &str,
) -> Result<IdeaRequest, Vec<Violation>> {
    let violations: Vec<Violation> = [
        (Field::BusinessArea, business_area),
        (Field::PainPoints, pain_points),
        (Field::Expectations, expectations),
    ]
    .into_iter()
    .filter(|(_, v)| v.trim().is_empty())
    .map(|(field, _)| Violation::new(field, IDEA_FIELDS_MISSING_MESSAGE))
    .collect();

    if violations.is_empty() {
        Ok(IdeaRequest {
            business_area: business_area.trim().to_string(),
            pain_points: pain_points.trim().to_string(),
            expectations: expectations.trim().to_string(),
        })
    } else {
        Err(violations)
    }
}
