use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Fixed listing page size used by the history view.
pub const PAGE_SIZE: u32 = 10;

pub const DEFAULT_QUESTION_TYPE: &str = "单选题2道 判断题2道";

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(CaseId);

/// Opaque per-profile client label. Not a credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Returns `None` for blank tokens.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DifficultyLevel {
    #[serde(rename = "初级", alias = "beginner")]
    Beginner,
    #[default]
    #[serde(rename = "中级", alias = "intermediate")]
    Intermediate,
    #[serde(rename = "高级", alias = "advanced")]
    Advanced,
}

/// Coarse severity hint for renderers, one per difficulty label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyTone {
    Low,
    Medium,
    High,
    Neutral,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    pub fn wire_label(self) -> &'static str {
        match self {
            Self::Beginner => "初级",
            Self::Intermediate => "中级",
            Self::Advanced => "高级",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    pub fn tone(self) -> DifficultyTone {
        match self {
            Self::Beginner => DifficultyTone::Low,
            Self::Intermediate => DifficultyTone::Medium,
            Self::Advanced => DifficultyTone::High,
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown difficulty level '{0}' (expected beginner, intermediate or advanced)")]
pub struct ParseDifficultyError(pub String);

impl FromStr for DifficultyLevel {
    type Err = ParseDifficultyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        DifficultyLevel::ALL
            .into_iter()
            .find(|level| {
                level.wire_label() == trimmed || level.name().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| ParseDifficultyError(trimmed.to_string()))
    }
}

/// Generated questions: plain text or whatever structure the backend produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Questions {
    Text(String),
    Structured(Value),
}

impl Questions {
    /// Null, blank strings and empty containers all mean "no questions".
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(text) if text.trim().is_empty() => None,
            Value::String(text) => Some(Self::Text(text)),
            Value::Array(items) if items.is_empty() => None,
            Value::Object(map) if map.is_empty() => None,
            other => Some(Self::Structured(other)),
        }
    }

    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

pub(crate) fn deserialize_questions<'de, D>(deserializer: D) -> Result<Option<Questions>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(Questions::from_value))
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Inputs collected by the case-authoring form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRequest {
    pub knowledge_points: String,
    pub learning_objectives: String,
    pub case_scenario: String,
    pub case_materials: Option<String>,
    pub generate_questions: bool,
    pub question_type: String,
    pub difficulty: DifficultyLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseArtifact {
    pub case_content: String,
    pub questions: Option<Questions>,
    pub session_id: Option<String>,
    pub case_id: Option<CaseId>,
    pub tokens_used: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSummary {
    pub id: CaseId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub difficulty_level: Option<String>,
    #[serde(default)]
    pub knowledge_points: Option<String>,
    #[serde(default)]
    pub learning_objectives: Option<String>,
    #[serde(default)]
    pub case_scenario: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub view_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub like_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_public: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

impl CaseSummary {
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => "Untitled case",
        }
    }

    pub fn difficulty(&self) -> Option<DifficultyLevel> {
        self.difficulty_level.as_deref()?.parse().ok()
    }

    pub fn tone(&self) -> DifficultyTone {
        self.difficulty()
            .map(DifficultyLevel::tone)
            .unwrap_or(DifficultyTone::Neutral)
    }

    /// `YYYY-MM-DD HH:MM`, or the raw backend value when it does not parse.
    pub fn created_at_display(&self) -> String {
        let Some(raw) = self.created_at.as_deref() else {
            return String::new();
        };
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return parsed.format("%Y-%m-%d %H:%M").to_string();
        }
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return parsed.format("%Y-%m-%d %H:%M").to_string();
        }
        raw.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseDetail {
    #[serde(flatten)]
    pub summary: CaseSummary,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "deserialize_questions")]
    pub questions: Option<Questions>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    page: u32,
    per_page: u32,
    keyword: Option<String>,
}

impl ListQuery {
    /// `None` when `page` is zero.
    pub fn new(page: u32, keyword: Option<&str>) -> Option<Self> {
        if page == 0 {
            return None;
        }
        let keyword = keyword
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty())
            .map(str::to_string);
        Some(Self {
            page,
            per_page: PAGE_SIZE,
            keyword,
        })
    }

    pub fn first_page() -> Self {
        Self {
            page: 1,
            per_page: PAGE_SIZE,
            keyword: None,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CaseList {
    pub cases: Vec<CaseSummary>,
    pub total: u64,
    pub pages: Option<u32>,
    pub current_page: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn difficulty_parses_wire_labels_and_names() {
        assert_eq!("初级".parse(), Ok(DifficultyLevel::Beginner));
        assert_eq!("Advanced".parse(), Ok(DifficultyLevel::Advanced));
        assert!("expert".parse::<DifficultyLevel>().is_err());
    }

    #[test]
    fn difficulty_serializes_to_backend_label() {
        let encoded = serde_json::to_value(DifficultyLevel::Intermediate).expect("encode");
        assert_eq!(encoded, json!("中级"));
    }

    #[test]
    fn empty_question_payloads_mean_no_questions() {
        assert_eq!(Questions::from_value(json!(null)), None);
        assert_eq!(Questions::from_value(json!("  ")), None);
        assert_eq!(Questions::from_value(json!([])), None);
        assert_eq!(
            Questions::from_value(json!("Q1")),
            Some(Questions::Text("Q1".into()))
        );
    }

    #[test]
    fn list_query_rejects_page_zero_and_drops_blank_keyword() {
        assert!(ListQuery::new(0, None).is_none());
        let query = ListQuery::new(2, Some("   ")).expect("query");
        assert_eq!(query.keyword(), None);
        assert_eq!(query.per_page(), PAGE_SIZE);
    }

    #[test]
    fn summary_tolerates_nulls_and_naive_timestamps() {
        let summary: CaseSummary = serde_json::from_value(json!({
            "id": 4,
            "title": null,
            "difficulty_level": "高级",
            "created_at": "2024-05-01T08:30:12.123456",
            "view_count": null
        }))
        .expect("decode");
        assert_eq!(summary.display_title(), "Untitled case");
        assert_eq!(summary.view_count, 0);
        assert_eq!(summary.tone(), DifficultyTone::High);
        assert_eq!(summary.created_at_display(), "2024-05-01 08:30");
    }
}
