//! Turns validated input into the system/user instruction pair sent to the
//! gateway.
//!
//! The narrative headers live in [`NARRATIVE_SECTIONS`] and nowhere else: the
//! system prompt renders them and `extract::split_sections` matches them, so
//! the two cannot disagree.

use crate::validation::{IdeaRequest, WorkflowRequest};

/// One fixed `## N. <title>` section of the narrative report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpec {
    pub number: u8,
    pub title: &'static str,
    pub guidance: &'static str,
}

impl SectionSpec {
    pub fn header(&self) -> String {
        format!("## {}. {}", self.number, self.title)
    }
}

pub const NARRATIVE_SECTIONS: [SectionSpec; 4] = [
    SectionSpec {
        number: 1,
        title: "역할 및 책임",
        guidance: "List all human roles involved, their responsibilities, and how they interact. Pay special attention to the user's role and how the solution will support them.",
    },
    SectionSpec {
        number: 2,
        title: "기대 효과",
        guidance: "Specific, measurable outcomes and improvements this solution will deliver, especially for the user's role and department.",
    },
    SectionSpec {
        number: 3,
        title: "핵심 키워드",
        guidance: "5-7 technical and business keywords that define this solution and are relevant to the user's domain.",
    },
    SectionSpec {
        number: 4,
        title: "권장 기술 스택",
        guidance: "Specific technologies, frameworks, and tools with brief justifications. Consider the user's role when recommending technologies.",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Markdown with the four fixed headers.
    Narrative,
    /// Exactly three idea records through a forced tool call.
    Structured,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
    pub mode: Mode,
}

pub fn compose_narrative(input: &WorkflowRequest) -> PromptPair {
    PromptPair {
        system: narrative_system_prompt(),
        user: format!(
            "담당 업무: {}\n\n워크플로우 분석 요청:\n{}",
            input.role, input.workflow
        ),
        mode: Mode::Narrative,
    }
}

pub fn compose_ideas(input: &IdeaRequest) -> PromptPair {
    let mut user = String::new();
    user.push_str("다음 사용자 정보를 기반으로 AX 과제 아이디어 3개를 생성해 주세요. ");
    user.push_str("각 아이디어는 Assistant, Advisor, Agent 역할에 대해 하나씩 만들어야 합니다.\n\n");
    user.push_str("- 업무 영역: ");
    user.push_str(&input.business_area);
    user.push_str("\n- 현행 업무 고충 및 한계점: ");
    user.push_str(&input.pain_points);
    user.push_str("\n- AX 도입을 통한 기대 사항: ");
    user.push_str(&input.expectations);

    PromptPair {
        system: IDEAS_SYSTEM_PROMPT.to_string(),
        user,
        mode: Mode::Structured,
    }
}

fn narrative_system_prompt() -> String {
    let mut s = String::new();

    s.push_str("You are an expert solution architect. Analyze the provided workflow and business process, ");
    s.push_str("taking into account the user's specific role and responsibilities. ");
    s.push_str("Generate a comprehensive architecture report in Korean that is tailored to their position.\n\n");
    s.push_str("Your report MUST include these exact sections with EXACTLY these headers:\n");

    for section in &NARRATIVE_SECTIONS {
        s.push_str(&section.header());
        s.push('\n');
        s.push_str(section.guidance);
        s.push_str("\n\n");
    }

    s.push_str("Format the response in clean markdown with these exact section headers. ");
    s.push_str("Be specific, actionable, and professional. ");
    s.push_str("Make the analysis relevant to the user's specific role and responsibilities.");

    s
}

const IDEAS_SYSTEM_PROMPT: &str = "당신은 제조 산업 프로세스에 대한 깊은 지식을 갖춘 전문 AI 전환(AX) 컨설턴트입니다. \
당신의 임무는 사용자의 입력을 기반으로 세 가지 뚜렷한 AI 솔루션 아이디어를 생성하는 것입니다. \
각 아이디어는 다음 역할 중 하나에 해당해야 합니다:
- Assistant: 업무 생산성 향상에 중점을 둔 업무 수행 보조.
- Advisor: 업무 지식을 기반으로 한 분석 및 의사결정 자문.
- Agent: 목표 지향적인 자율적 의사결정 및 실행.

각 아이디어는 제목, 역할, 솔루션 설명, 사람의 역할, 기대효과, 기대효과 세부사항(배열), 키워드(배열), 기술(배열)을 포함해야 합니다. \
모든 텍스트는 한국어로 작성해야 합니다.";
