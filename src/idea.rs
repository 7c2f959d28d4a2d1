use serde::{Deserialize, Serialize};

use crate::schema::{FieldDef, TypeDef};

pub const IDEAS_TOOL_NAME: &str = "generate_ax_ideas";
pub const IDEAS_TOOL_DESCRIPTION: &str = "Generate 3 AX solution ideas with specific roles";
pub const IDEAS_PER_RESPONSE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Assistant,
    Advisor,
    Agent,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Assistant, Category::Advisor, Category::Agent];
    pub const NAMES: &'static [&'static str] = &["Assistant", "Advisor", "Agent"];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Assistant => "Assistant",
            Category::Advisor => "Advisor",
            Category::Agent => "Agent",
        }
    }
}

/// One idea card. Wire names follow the tool schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub title: String,
    #[serde(rename = "role")]
    pub category: Category,
    pub description: String,
    pub user_role: String,
    pub expected_effect: String,
    pub effect_details: Vec<String>,
    pub keywords: Vec<String>,
    pub technologies: Vec<String>,
}

/// Tool-call arguments as declared to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeasPayload {
    pub ideas: Vec<Idea>,
}

fn idea_typedef() -> TypeDef {
    TypeDef::Object(vec![
        FieldDef::described("title", TypeDef::Text, "아이디어 제목"),
        FieldDef::new("role", TypeDef::Enum(Category::NAMES)),
        FieldDef::described("description", TypeDef::Text, "솔루션 설명"),
        FieldDef::described("userRole", TypeDef::Text, "사람의 역할"),
        FieldDef::described("expectedEffect", TypeDef::Text, "기대 효과 요약"),
        FieldDef::described(
            "effectDetails",
            TypeDef::list_of(TypeDef::Text),
            "기대 효과 세부사항",
        ),
        FieldDef::described("keywords", TypeDef::list_of(TypeDef::Text), "핵심 키워드"),
        FieldDef::described(
            "technologies",
            TypeDef::list_of(TypeDef::Text),
            "권장 기술",
        ),
    ])
}

// TypeDef for the tool parameters (and for checking the returned arguments)
pub fn ideas_payload_typedef() -> TypeDef {
    TypeDef::Object(vec![FieldDef::new(
        "ideas",
        TypeDef::exactly(IDEAS_PER_RESPONSE, idea_typedef()),
    )])
}

/// Categories that appear more than once, or not at all.
pub fn category_gaps(ideas: &[Idea]) -> Vec<Category> {
    Category::ALL
        .into_iter()
        .filter(|c| ideas.iter().filter(|i| i.category == *c).count() != 1)
        .collect()
}
