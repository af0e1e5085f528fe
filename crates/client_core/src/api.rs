//! Typed calls on top of [`Gateway`]: raw JSON in, tagged results out.

use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::{CaseArtifact, CaseDetail, CaseId, CaseList, CaseRequest, ClientIdentity, ListQuery},
    error::ApiError,
    protocol::{
        CaseDetailResponse, CaseListResponse, ExecuteWorkflowBody, LikeResponse,
        WorkflowResponse,
    },
};
use tracing::info;

use crate::gateway::{send, Endpoint, Gateway};

const GENERIC_GENERATION_FAILURE: &str = "case generation failed, please retry";

fn decode<T: DeserializeOwned>(endpoint: &Endpoint, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value)
        .map_err(|err| ApiError::MalformedResponse(format!("{}: {err}", endpoint.path())))
}

pub async fn execute_workflow(
    gateway: &dyn Gateway,
    identity: &ClientIdentity,
    request: &CaseRequest,
) -> Result<CaseArtifact, ApiError> {
    let endpoint = Endpoint::ExecuteWorkflow;
    let body = serde_json::to_value(ExecuteWorkflowBody::new(identity, request))
        .map_err(|err| ApiError::Request(err.to_string()))?;
    let raw = send(gateway, &endpoint, Some(body)).await?;
    let response: WorkflowResponse = decode(&endpoint, raw)?;
    artifact_from_response(response)
}

pub fn artifact_from_response(response: WorkflowResponse) -> Result<CaseArtifact, ApiError> {
    if !response.success {
        let message = response
            .error
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| GENERIC_GENERATION_FAILURE.to_string());
        return Err(ApiError::server(None, message));
    }

    let case_content = response
        .case_content
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| {
            ApiError::MalformedResponse("successful response carried no case content".into())
        })?;

    info!(
        session_id = response.session_id.as_deref().unwrap_or("-"),
        tokens_used = response.tokens_used,
        "case generated"
    );

    Ok(CaseArtifact {
        case_content,
        questions: response.questions,
        session_id: response.session_id,
        case_id: response.case_id,
        tokens_used: response.tokens_used,
    })
}

pub async fn list_user_cases(
    gateway: &dyn Gateway,
    identity: &ClientIdentity,
    query: &ListQuery,
) -> Result<CaseList, ApiError> {
    let endpoint = Endpoint::UserCases {
        user: identity.clone(),
        query: query.clone(),
    };
    let raw = send(gateway, &endpoint, None).await?;
    let response: CaseListResponse = decode(&endpoint, raw)?;
    Ok(response.into())
}

pub async fn get_case(gateway: &dyn Gateway, id: CaseId) -> Result<CaseDetail, ApiError> {
    let endpoint = Endpoint::Case(id);
    let raw = send(gateway, &endpoint, None).await?;
    let response: CaseDetailResponse = decode(&endpoint, raw)?;
    response
        .case
        .ok_or_else(|| ApiError::MalformedResponse(format!("case {id} missing from response")))
}

/// Returns the updated like count.
pub async fn like_case(gateway: &dyn Gateway, id: CaseId) -> Result<u64, ApiError> {
    let endpoint = Endpoint::LikeCase(id);
    let raw = send(gateway, &endpoint, None).await?;
    let response: LikeResponse = decode(&endpoint, raw)?;
    Ok(response.like_count)
}
