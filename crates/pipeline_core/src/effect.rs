use crate::{ApiRequest, PostId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchQueue { limit: u32 },
    /// Ask the user before `Send`ing the pending request.
    Confirm { prompt: String },
    Send(ApiRequest),
    Notify(Notice),
    StartProgress { post_id: PostId },
    StopProgress { post_id: PostId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// User-visible acknowledgment of an action outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}
