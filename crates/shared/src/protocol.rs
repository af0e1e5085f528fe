use serde::{Deserialize, Serialize};

use crate::domain::{
    deserialize_questions, null_as_default, CaseDetail, CaseId, CaseList, CaseRequest,
    CaseSummary, ClientIdentity, DifficultyLevel, Questions,
};

/// Body of `POST /api/workflow/execute`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteWorkflowBody {
    pub user_uuid: ClientIdentity,
    #[serde(rename = "knowledgePoints")]
    pub knowledge_points: String,
    #[serde(rename = "learningObjectives")]
    pub learning_objectives: String,
    #[serde(rename = "caseScenario")]
    pub case_scenario: String,
    #[serde(rename = "caseMaterials")]
    pub case_materials: String,
    pub yes_or_no: String,
    #[serde(rename = "questionType")]
    pub question_type: String,
    #[serde(rename = "difficultyLevel")]
    pub difficulty_level: DifficultyLevel,
}

impl ExecuteWorkflowBody {
    pub fn new(user_uuid: &ClientIdentity, request: &CaseRequest) -> Self {
        Self {
            user_uuid: user_uuid.clone(),
            knowledge_points: request.knowledge_points.clone(),
            learning_objectives: request.learning_objectives.clone(),
            case_scenario: request.case_scenario.clone(),
            case_materials: request.case_materials.clone().unwrap_or_default(),
            yes_or_no: yes_or_no(request.generate_questions).to_string(),
            question_type: request.question_type.clone(),
            difficulty_level: request.difficulty,
        }
    }
}

pub fn yes_or_no(flag: bool) -> &'static str {
    if flag {
        "是"
    } else {
        "否"
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WorkflowResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(default)]
    pub case_content: Option<String>,
    #[serde(default, deserialize_with = "deserialize_questions")]
    pub questions: Option<Questions>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub case_id: Option<CaseId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tokens_used: u64,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CaseListResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cases: Vec<CaseSummary>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u64,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl From<CaseListResponse> for CaseList {
    fn from(value: CaseListResponse) -> Self {
        Self {
            cases: value.cases,
            total: value.total,
            pages: value.pages,
            current_page: value.current_page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaseDetailResponse {
    #[serde(default)]
    pub case: Option<CaseDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LikeResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub like_count: u64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error envelope the backend attaches to non-success responses.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
