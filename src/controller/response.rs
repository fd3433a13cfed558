use std::sync::Arc;

use serde_json::{Value, json};
use uuid::Uuid;

pub const OUTCOME: &str = "outcome";
pub const SUCCESS: &str = "success";
pub const FAILED: &str = "failed";
pub const CANCELLED: &str = "cancelled";
pub const RESULT: &str = "result";
pub const FAILURE_DESCRIPTION: &str = "failure-description";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
    Cancelled,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => SUCCESS,
            Outcome::Failed => FAILED,
            Outcome::Cancelled => CANCELLED,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            SUCCESS => Some(Outcome::Success),
            FAILED => Some(Outcome::Failed),
            CANCELLED => Some(Outcome::Cancelled),
            _ => None,
        }
    }
}

/// An output stream attached to a response, addressed by uuid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseStream {
    pub uuid: String,
    pub mime_type: String,
    data: Arc<[u8]>,
}

impl ResponseStream {
    pub fn new(mime_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            mime_type: mime_type.into(),
            data: Arc::from(data.into().into_boxed_slice()),
        }
    }

    pub fn bytes(&self) -> &[u8] { &self.data }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationResponse {
    node: Value,
    streams: Vec<ResponseStream>,
}

impl OperationResponse {
    pub fn new(node: Value) -> Self {
        Self { node, streams: Vec::new() }
    }

    pub fn with_streams(node: Value, streams: Vec<ResponseStream>) -> Self {
        Self { node, streams }
    }

    pub fn success(result: Value) -> Self {
        Self::new(json!({ OUTCOME: SUCCESS, RESULT: result }))
    }

    pub fn failed(description: impl Into<String>) -> Self {
        Self::new(json!({ OUTCOME: FAILED, FAILURE_DESCRIPTION: description.into() }))
    }

    pub fn cancelled() -> Self {
        Self::new(json!({ OUTCOME: CANCELLED }))
    }

    pub fn response_node(&self) -> &Value { &self.node }

    pub fn into_response_node(self) -> Value { self.node }

    pub fn streams(&self) -> &[ResponseStream] { &self.streams }

    pub fn stream(&self, uuid: &str) -> Option<&ResponseStream> {
        self.streams.iter().find(|s| s.uuid == uuid)
    }

    /// `None` when the document carries no `outcome` or an unrecognised value.
    pub fn outcome(&self) -> Option<Outcome> {
        self.node.get(OUTCOME).and_then(|v| v.as_str()).and_then(Outcome::parse)
    }

    pub fn is_cancelled(&self) -> bool {
        self.outcome() == Some(Outcome::Cancelled)
    }

    /// Release any attached streams.
    pub fn close(&mut self) -> std::io::Result<()> {
        self.streams.clear();
        Ok(())
    }
}
