use std::fmt;

use thiserror::Error;

/// Failure of a single gateway round trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("{message}")]
    Server { status: Option<u16>, message: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("invalid request: {0}")]
    Request(String),
}

impl ApiError {
    pub fn server(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseField {
    KnowledgePoints,
    LearningObjectives,
    CaseScenario,
    QuestionType,
}

impl CaseField {
    pub fn label(self) -> &'static str {
        match self {
            Self::KnowledgePoints => "knowledge points",
            Self::LearningObjectives => "learning objectives",
            Self::CaseScenario => "case scenario",
            Self::QuestionType => "question type",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: CaseField,
    pub message: String,
}

impl FieldError {
    pub fn required(field: CaseField) -> Self {
        Self {
            field,
            message: format!("{} is required", field.label()),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Local form rejection. Never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid form: {}", join_messages(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn has(&self, field: CaseField) -> bool {
        self.fields.iter().any(|error| error.field == field)
    }
}

fn join_messages(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("network error: {0}")]
    Network(String),
    #[error("{message}")]
    Server { status: Option<u16>, message: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("no client identity available; generate a case first")]
    MissingIdentity,
}

impl From<ApiError> for ClientError {
    fn from(value: ApiError) -> Self {
        match value {
            ApiError::Network(message) => Self::Network(message),
            ApiError::Server { status, message } => Self::Server { status, message },
            ApiError::MalformedResponse(message) => Self::MalformedResponse(message),
            ApiError::Request(message) => Self::Server {
                status: None,
                message,
            },
        }
    }
}
