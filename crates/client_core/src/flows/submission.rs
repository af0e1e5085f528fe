//! Case-authoring form: `Idle -> Submitting -> {Success, Failed}`.

use shared::{
    domain::{CaseArtifact, CaseRequest, ClientIdentity, DifficultyLevel, DEFAULT_QUESTION_TYPE},
    error::{ApiError, CaseField, ClientError, FieldError, ValidationError},
};
use tracing::{debug, info, warn};

use super::{FlowError, FlowId, Ticket, TicketCounter};
use crate::{api, gateway::Gateway, notice::describe_failure, notice::Notice};

/// Raw form input as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseForm {
    pub knowledge_points: String,
    pub learning_objectives: String,
    pub case_scenario: String,
    pub case_materials: String,
    pub generate_questions: bool,
    pub question_type: String,
    pub difficulty: DifficultyLevel,
}

impl Default for CaseForm {
    fn default() -> Self {
        Self {
            knowledge_points: String::new(),
            learning_objectives: String::new(),
            case_scenario: String::new(),
            case_materials: String::new(),
            generate_questions: true,
            question_type: DEFAULT_QUESTION_TYPE.to_string(),
            difficulty: DifficultyLevel::default(),
        }
    }
}

/// Blank (or whitespace-only) required fields are reported in form order.
pub fn validate(form: &CaseForm) -> Result<CaseRequest, ValidationError> {
    let required = [
        (CaseField::KnowledgePoints, &form.knowledge_points),
        (CaseField::LearningObjectives, &form.learning_objectives),
        (CaseField::CaseScenario, &form.case_scenario),
    ];
    let mut fields: Vec<FieldError> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| FieldError::required(*field))
        .collect();
    if form.generate_questions && form.question_type.trim().is_empty() {
        fields.push(FieldError::required(CaseField::QuestionType));
    }
    if !fields.is_empty() {
        return Err(ValidationError { fields });
    }

    let materials = form.case_materials.trim();
    Ok(CaseRequest {
        knowledge_points: form.knowledge_points.trim().to_string(),
        learning_objectives: form.learning_objectives.trim().to_string(),
        case_scenario: form.case_scenario.trim().to_string(),
        case_materials: (!materials.is_empty()).then(|| materials.to_string()),
        generate_questions: form.generate_questions,
        question_type: form.question_type.trim().to_string(),
        difficulty: form.difficulty,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Submitting,
    Success,
    Failed { message: String },
}

/// A validated submission waiting for its gateway round trip.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    ticket: Ticket,
    request: CaseRequest,
}

impl PendingSubmission {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn request(&self) -> &CaseRequest {
        &self.request
    }
}

pub struct SubmissionFlow {
    id: FlowId,
    tickets: TicketCounter,
    identity: ClientIdentity,
    state: SubmissionState,
    artifact: Option<CaseArtifact>,
    // Artifact shown before the current attempt; restored if the attempt fails.
    previous: Option<CaseArtifact>,
    field_errors: Vec<FieldError>,
    in_flight: Option<Ticket>,
}

impl SubmissionFlow {
    pub fn new(id: FlowId, identity: ClientIdentity) -> Self {
        Self {
            id,
            tickets: TicketCounter::default(),
            identity,
            state: SubmissionState::Idle,
            artifact: None,
            previous: None,
            field_errors: Vec::new(),
            in_flight: None,
        }
    }

    pub fn id(&self) -> FlowId {
        self.id
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn artifact(&self) -> Option<&CaseArtifact> {
        self.artifact.as_ref()
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    /// The submit control is inert while this is false.
    pub fn can_submit(&self) -> bool {
        self.state != SubmissionState::Submitting
    }

    pub fn begin(&mut self, form: &CaseForm) -> Result<PendingSubmission, FlowError> {
        if !self.can_submit() {
            debug!(flow = self.id.0, "submission ignored while another is in flight");
            return Err(FlowError::Busy);
        }
        self.state = SubmissionState::Idle;

        let request = match validate(form) {
            Ok(request) => request,
            Err(err) => {
                self.field_errors = err.fields.clone();
                return Err(err.into());
            }
        };

        self.field_errors.clear();
        let ticket = self.tickets.issue(self.id);
        self.in_flight = Some(ticket);
        self.previous = self.artifact.take();
        self.state = SubmissionState::Submitting;
        info!(flow = self.id.0, scenario = %request.case_scenario, "submitting case request");

        Ok(PendingSubmission { ticket, request })
    }

    /// Applies the gateway result. Results for tickets this flow is not
    /// waiting on are dropped.
    pub fn complete(
        &mut self,
        pending: PendingSubmission,
        result: Result<CaseArtifact, ApiError>,
    ) -> Result<Vec<Notice>, ClientError> {
        if self.in_flight != Some(pending.ticket) {
            debug!(flow = self.id.0, "dropping stale submission result");
            return Ok(Vec::new());
        }
        self.in_flight = None;

        match result {
            Ok(artifact) => {
                let mut notices = vec![Notice::success("Case generated.")];
                if artifact.tokens_used > 0 {
                    notices.push(Notice::info(format!(
                        "This run used {} tokens.",
                        artifact.tokens_used
                    )));
                }
                self.previous = None;
                self.artifact = Some(artifact);
                self.state = SubmissionState::Success;
                Ok(notices)
            }
            Err(err) => {
                let err = ClientError::from(err);
                let message = describe_failure(&err);
                warn!(flow = self.id.0, error = %err, "case submission failed");
                self.artifact = self.previous.take();
                self.state = SubmissionState::Failed { message };
                Err(err)
            }
        }
    }

    /// Validates, makes exactly one gateway call, and applies its result.
    pub async fn submit(
        &mut self,
        gateway: &dyn Gateway,
        form: &CaseForm,
    ) -> Result<Vec<Notice>, FlowError> {
        let pending = self.begin(form)?;
        let result = api::execute_workflow(gateway, &self.identity, pending.request()).await;
        Ok(self.complete(pending, result)?)
    }
}

#[cfg(test)]
#[path = "tests/submission_tests.rs"]
mod tests;
