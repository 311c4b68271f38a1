//! Agent persona shown next to agent messages

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub description: String,
    pub is_active: bool,
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            name: "Assistant".to_string(),
            avatar: "🤖".to_string(),
            description: "Your helpful AI assistant".to_string(),
            is_active: true,
        }
    }
}
