use std::fmt;

use crate::{
    CostQuote, Notice, PipelineSummary, Post, PostId, PostKind, PostStatus, ProgressSnapshot,
};

/// Named queue views. `Approved` and `Scheduled` overlap on purpose: an
/// approved post shows up under both lenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    Text,
    Video,
    Approved,
    Scheduled,
    All,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Text, Tab::Video, Tab::Approved, Tab::Scheduled, Tab::All];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Text => "Text Posts",
            Tab::Video => "Video Production",
            Tab::Approved => "Approved",
            Tab::Scheduled => "Scheduled",
            Tab::All => "All Posts",
        }
    }

    pub fn includes(self, post: &Post) -> bool {
        match self {
            Tab::Text => post.kind == PostKind::Text && post.status == PostStatus::Draft,
            Tab::Video => {
                post.kind == PostKind::Video
                    && matches!(
                        post.status,
                        PostStatus::VideoProduction | PostStatus::Approved
                    )
            }
            Tab::Approved => post.status == PostStatus::Approved,
            Tab::Scheduled => matches!(
                post.status,
                PostStatus::ReadyToPublish | PostStatus::Approved
            ),
            Tab::All => true,
        }
    }

    pub fn select<'a>(self, posts: &'a [Post]) -> impl Iterator<Item = &'a Post> + 'a {
        posts.iter().filter(move |post| self.includes(post))
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub loading: bool,
    pub active_tab: Tab,
    pub total: u64,
    pub tab_counts: Vec<(Tab, usize)>,
    pub rows: Vec<PostRow>,
    pub generating: Vec<GenerationView>,
    pub pipeline: PipelineSummary,
    pub notice: Option<Notice>,
    pub pending_prompt: Option<String>,
    pub regenerate: Option<RegenerateDialogView>,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn count(&self, tab: Tab) -> usize {
        self.tab_counts
            .iter()
            .find(|(t, _)| *t == tab)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn row_ids(&self) -> Vec<PostId> {
        self.rows.iter().map(|row| row.id).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostRow {
    pub id: PostId,
    pub kind: PostKind,
    pub status: PostStatus,
    pub effective_status: PostStatus,
    pub title: String,
    pub platforms: Vec<String>,
    pub regeneration_count: u32,
    pub total_cost: f64,
    /// Path of the produced video; when set the player wins over the progress view.
    pub video_path: Option<String>,
    pub generating: bool,
}

impl PostRow {
    pub(crate) fn from_post(post: &Post, generating: bool) -> Self {
        Self {
            id: post.id,
            kind: post.kind,
            status: post.status,
            effective_status: post.effective_status(),
            title: post.title.clone(),
            platforms: post.platforms.iter().cloned().collect(),
            regeneration_count: post.regeneration_count,
            total_cost: post.total_cost,
            video_path: post.primary_video().map(|asset| asset.path.clone()),
            generating: generating && !post.has_assets(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationView {
    pub post_id: PostId,
    /// `None` until the post shows up in a fetch.
    pub title: Option<String>,
    pub progress: Option<ProgressSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegenerateDialogView {
    pub post_id: PostId,
    pub kind: PostKind,
    pub quote: CostQuote,
}
