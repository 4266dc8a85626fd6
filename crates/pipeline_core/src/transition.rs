use std::fmt;

use thiserror::Error;

use crate::{Post, PostId, PostKind, PostStatus};

/// User actions that move a post through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Approve,
    ApproveVideo,
    Reject,
    Regenerate,
    GenerateVideo,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::Approve => "approve",
            Action::ApproveVideo => "approve video",
            Action::Reject => "reject",
            Action::Regenerate => "regenerate",
            Action::GenerateVideo => "generate video",
        }
    }

    /// Actions that must be confirmed by the user before the request goes out.
    pub fn needs_confirmation(self) -> bool {
        matches!(self, Action::Approve | Action::ApproveVideo | Action::Reject)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("post {0} is not in the queue")]
    UnknownPost(PostId),
    #[error("cannot {action} a {kind} post")]
    WrongKind { action: Action, kind: PostKind },
    #[error("cannot {action} a post that is {status}")]
    InvalidStatus { action: Action, status: PostStatus },
}

/// Transition table: the status a post reaches when `action` succeeds.
///
/// Decisions use the post's effective status so a video whose assets
/// arrived before its status flipped is treated as produced.
pub fn next_status(post: &Post, action: Action) -> Result<PostStatus, TransitionError> {
    let status = post.effective_status();
    let invalid = || TransitionError::InvalidStatus { action, status };

    match action {
        Action::Approve => match status {
            PostStatus::Draft => Ok(PostStatus::Approved),
            _ => Err(invalid()),
        },
        Action::ApproveVideo => {
            require_kind(post, action, PostKind::Video)?;
            match status {
                PostStatus::Approved => Ok(PostStatus::ReadyToPublish),
                _ => Err(invalid()),
            }
        }
        Action::Reject => match status {
            PostStatus::Draft | PostStatus::Approved | PostStatus::VideoProduction => {
                Ok(PostStatus::Rejected)
            }
            _ => Err(invalid()),
        },
        Action::Regenerate => {
            if status.is_terminal() {
                Err(invalid())
            } else {
                Ok(PostStatus::Draft)
            }
        }
        Action::GenerateVideo => {
            require_kind(post, action, PostKind::Video)?;
            match status {
                PostStatus::Approved | PostStatus::VideoProduction | PostStatus::Failed
                    if !post.has_assets() =>
                {
                    Ok(PostStatus::VideoProduction)
                }
                _ => Err(invalid()),
            }
        }
    }
}

fn require_kind(post: &Post, action: Action, expected: PostKind) -> Result<(), TransitionError> {
    if post.kind == expected {
        Ok(())
    } else {
        Err(TransitionError::WrongKind {
            action,
            kind: post.kind,
        })
    }
}
