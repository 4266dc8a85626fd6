use std::fmt;

use pipeline_core::{
    ActionResponse, ApiRequest, PostId, PostStatus, ProgressSnapshot, QueueSnapshot,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown when a response body cannot be understood.
pub const MALFORMED_RESPONSE_MESSAGE: &str = "Unexpected response from server";

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    QueueFetched(Result<QueueSnapshot, ApiError>),
    RequestCompleted {
        request: ApiRequest,
        result: Result<ActionResponse, ApiError>,
    },
    HealthChecked(Result<HealthReport, ApiError>),
    Progress {
        post_id: PostId,
        snapshot: ProgressSnapshot,
    },
    SimulationFinished {
        post_id: PostId,
    },
}

/// Optional filters accepted by the queue endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueueQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub status: Option<PostStatus>,
    pub platform: Option<String>,
}

impl QueueQuery {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub(crate) fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(platform) = &self.platform {
            pairs.push(("platform", platform.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        pairs
    }
}

/// Component states reported by the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub api: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub scheduler: String,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.api == "healthy" && self.database == "healthy"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Connectivity problems, as opposed to the backend answering with an error.
    pub fn is_connectivity(&self) -> bool {
        matches!(self.kind, FailureKind::Network | FailureKind::Timeout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Malformed,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Malformed => write!(f, "malformed response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
