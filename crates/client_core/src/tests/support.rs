//! Scripted in-process gateway shared by flow and shell tests.

use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use shared::error::ApiError;

use crate::gateway::{Endpoint, Gateway};

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub endpoint: Endpoint,
    pub method: Method,
    pub body: Option<Value>,
}

#[derive(Default)]
pub(crate) struct RecordingGateway {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<VecDeque<Result<Value, ApiError>>>,
}

impl RecordingGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(self, response: Result<Value, ApiError>) -> Self {
        self.push(response);
        self
    }

    pub(crate) fn push(&self, response: Result<Value, ApiError>) {
        self.responses.lock().expect("responses").push_back(response);
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls").clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().expect("calls").len()
    }

    pub(crate) fn last_call(&self) -> RecordedCall {
        self.calls().pop().expect("at least one call")
    }
}

#[async_trait]
impl Gateway for RecordingGateway {
    async fn call(
        &self,
        endpoint: &Endpoint,
        method: Method,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        self.calls.lock().expect("calls").push(RecordedCall {
            endpoint: endpoint.clone(),
            method,
            body,
        });
        self.responses
            .lock()
            .expect("responses")
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no scripted response".into())))
    }
}

pub(crate) fn summary_json(id: i64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "difficulty_level": "中级",
        "knowledge_points": "digital transformation",
        "learning_objectives": "explain the rollout plan",
        "case_scenario": "manufacturing",
        "created_at": "2024-03-02T10:15:00",
        "view_count": 2,
        "like_count": 0,
        "is_public": false
    })
}

pub(crate) fn page_json(ids: std::ops::RangeInclusive<i64>, total: u64) -> Value {
    let cases: Vec<Value> = ids.map(|id| summary_json(id, &format!("Case {id}"))).collect();
    json!({ "cases": cases, "total": total })
}
