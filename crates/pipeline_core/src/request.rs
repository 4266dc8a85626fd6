use serde::{Deserialize, Serialize};

use crate::{Action, Post, PostId, PostKind, RegenerateOptions};

/// A lifecycle mutation sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    Approve {
        post_id: PostId,
    },
    ApproveVideo {
        post_id: PostId,
    },
    Reject {
        post_id: PostId,
    },
    Regenerate {
        post_id: PostId,
        kind: PostKind,
        options: RegenerateOptions,
    },
    GenerateVideo {
        post_id: PostId,
    },
}

impl ApiRequest {
    /// Request for an action that carries no options.
    ///
    /// Regenerate needs options and is built directly instead.
    pub fn simple(action: Action, post_id: PostId) -> Option<Self> {
        match action {
            Action::Approve => Some(ApiRequest::Approve { post_id }),
            Action::ApproveVideo => Some(ApiRequest::ApproveVideo { post_id }),
            Action::Reject => Some(ApiRequest::Reject { post_id }),
            Action::GenerateVideo => Some(ApiRequest::GenerateVideo { post_id }),
            Action::Regenerate => None,
        }
    }

    pub fn post_id(&self) -> PostId {
        match self {
            ApiRequest::Approve { post_id }
            | ApiRequest::ApproveVideo { post_id }
            | ApiRequest::Reject { post_id }
            | ApiRequest::Regenerate { post_id, .. }
            | ApiRequest::GenerateVideo { post_id } => *post_id,
        }
    }

    pub fn action(&self) -> Action {
        match self {
            ApiRequest::Approve { .. } => Action::Approve,
            ApiRequest::ApproveVideo { .. } => Action::ApproveVideo,
            ApiRequest::Reject { .. } => Action::Reject,
            ApiRequest::Regenerate { .. } => Action::Regenerate,
            ApiRequest::GenerateVideo { .. } => Action::GenerateVideo,
        }
    }

    pub(crate) fn confirmation_prompt(&self) -> String {
        match self {
            ApiRequest::Approve { post_id } => format!("Approve post {post_id}?"),
            ApiRequest::ApproveVideo { post_id } => format!("Approve video {post_id}?"),
            ApiRequest::Reject { post_id } => format!("Reject post {post_id}?"),
            ApiRequest::Regenerate { post_id, .. } => format!("Regenerate post {post_id}?"),
            ApiRequest::GenerateVideo { post_id } => {
                format!("Generate a video for post {post_id}?")
            }
        }
    }

    pub(crate) fn default_success_message(&self) -> &'static str {
        match self {
            ApiRequest::Approve { .. } => "Post approved",
            ApiRequest::ApproveVideo { .. } => "Video approved! Scheduled for publishing...",
            ApiRequest::Reject { .. } => "Post rejected",
            ApiRequest::Regenerate { .. } => "Regenerated successfully!",
            ApiRequest::GenerateVideo { .. } => "Video generation started",
        }
    }
}

/// Successful mutation response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub message: String,
    /// Set by approve when the backend spawned a video post.
    #[serde(default)]
    pub video_post_id: Option<PostId>,
}

/// Body of the queue endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueueSnapshot {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub total: u64,
}
