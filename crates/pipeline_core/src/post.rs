use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

pub type PostId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    Text,
    Video,
}

impl PostKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PostKind::Text => "text",
            PostKind::Video => "video",
        }
    }
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Approved,
    VideoProduction,
    ReadyToPublish,
    Scheduled,
    Published,
    Failed,
    Rejected,
}

impl PostStatus {
    pub const ALL: [PostStatus; 8] = [
        PostStatus::Draft,
        PostStatus::Approved,
        PostStatus::VideoProduction,
        PostStatus::ReadyToPublish,
        PostStatus::Scheduled,
        PostStatus::Published,
        PostStatus::Failed,
        PostStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Approved => "approved",
            PostStatus::VideoProduction => "video_production",
            PostStatus::ReadyToPublish => "ready_to_publish",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Published => "published",
            PostStatus::Failed => "failed",
            PostStatus::Rejected => "rejected",
        }
    }

    /// No user action may move a post out of a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, PostStatus::Rejected | PostStatus::Published)
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Video,
    Audio,
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub post_id: Option<PostId>,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    pub path: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One unit of content as reported by the queue endpoint.
///
/// A `Post` is always a snapshot from a single fetch; `status` and `assets`
/// must never be combined from different fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub kind: PostKind,
    pub status: PostStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub platforms: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assets: Vec<Asset>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub regeneration_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_cost: f64,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub video_duration: Option<f64>,
    #[serde(default)]
    pub scheduled_at: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Post {
    /// Minimal post with empty content, used as a builder base.
    pub fn new(id: PostId, kind: PostKind, status: PostStatus) -> Self {
        Self {
            id,
            kind,
            status,
            title: String::new(),
            body: String::new(),
            platforms: BTreeSet::new(),
            tags: Vec::new(),
            assets: Vec::new(),
            regeneration_count: 0,
            total_cost: 0.0,
            source_url: None,
            video_duration: None,
            scheduled_at: None,
            published_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn has_assets(&self) -> bool {
        !self.assets.is_empty()
    }

    /// Status used for every client-side decision.
    ///
    /// The backend may populate `assets` before it updates `status`; a video
    /// post that already has assets is treated as finished production.
    pub fn effective_status(&self) -> PostStatus {
        if self.kind == PostKind::Video
            && self.status == PostStatus::VideoProduction
            && self.has_assets()
        {
            PostStatus::Approved
        } else {
            self.status
        }
    }

    pub fn in_production(&self) -> bool {
        self.effective_status() == PostStatus::VideoProduction
    }

    pub fn primary_video(&self) -> Option<&Asset> {
        self.assets.iter().find(|asset| asset.kind == AssetKind::Video)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_asset(path: &str) -> Asset {
        Asset {
            id: Some(1),
            post_id: Some(7),
            kind: AssetKind::Video,
            path: path.to_string(),
            created_at: None,
        }
    }

    #[test]
    fn assets_override_in_production_status() {
        let mut post = Post::new(7, PostKind::Video, PostStatus::VideoProduction);
        assert!(post.in_production());

        post.assets.push(video_asset("out/7.mp4"));
        assert_eq!(post.effective_status(), PostStatus::Approved);
        assert!(!post.in_production());
        assert_eq!(post.primary_video().unwrap().path, "out/7.mp4");
    }

    #[test]
    fn text_posts_keep_reported_status() {
        let post = Post::new(3, PostKind::Text, PostStatus::Draft);
        assert_eq!(post.effective_status(), PostStatus::Draft);
    }

    #[test]
    fn only_rejected_and_published_are_terminal() {
        let terminal: Vec<_> = PostStatus::ALL
            .into_iter()
            .filter(|status| status.is_terminal())
            .collect();
        assert_eq!(terminal, vec![PostStatus::Published, PostStatus::Rejected]);
    }
}
