//! Transient user-facing messages produced by flow transitions.

use std::fmt;

use shared::error::{ApiError, ClientError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }

    pub fn from_client_error(err: &ClientError) -> Self {
        Self::error(describe_failure(err))
    }

    pub fn from_api_error(err: &ApiError) -> Self {
        Self::from_client_error(&ClientError::from(err.clone()))
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        write!(f, "[{label}] {}", self.text)
    }
}

/// Server messages are shown verbatim; transport failures get a hint.
pub fn describe_failure(err: &ClientError) -> String {
    match err {
        ClientError::Network(detail) => {
            let lower = detail.to_ascii_lowercase();
            if lower.contains("timed out") || lower.contains("timeout") {
                "Server did not answer in time; check that the backend is running and retry."
                    .to_string()
            } else {
                "Network connection failed; check that the backend server is running.".to_string()
            }
        }
        ClientError::MissingIdentity => {
            "No client identity found; create a case first to start a history.".to_string()
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_failures_get_a_server_hint() {
        let notice =
            Notice::from_api_error(&ApiError::Network("error sending request: connection refused".into()));
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.text.contains("backend server"));
    }

    #[test]
    fn server_messages_pass_through() {
        let notice = Notice::from_api_error(&ApiError::server(Some(400), "bad input"));
        assert_eq!(notice.text, "bad input");
    }
}
