//! Per-task state machines. Each flow issues tickets for outbound calls and
//! only applies results whose ticket it is still waiting on.

use shared::error::{ApiError, ClientError, ValidationError};
use thiserror::Error;

pub mod history;
pub mod submission;

pub use history::HistoryFlow;
pub use submission::{CaseForm, SubmissionFlow, SubmissionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    flow: FlowId,
    seq: u64,
}

impl Ticket {
    pub fn flow(&self) -> FlowId {
        self.flow
    }
}

#[derive(Debug, Default)]
pub(crate) struct TicketCounter {
    next: u64,
}

impl TicketCounter {
    pub(crate) fn issue(&mut self, flow: FlowId) -> Ticket {
        self.next += 1;
        Ticket {
            flow,
            seq: self.next,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("another request is already in flight")]
    Busy,
    #[error("page numbers start at 1")]
    InvalidPage,
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl From<ValidationError> for FlowError {
    fn from(value: ValidationError) -> Self {
        Self::Client(ClientError::Validation(value))
    }
}

impl From<ApiError> for FlowError {
    fn from(value: ApiError) -> Self {
        Self::Client(ClientError::from(value))
    }
}
