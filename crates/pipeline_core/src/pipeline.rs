use std::collections::BTreeMap;
use std::fmt;

use crate::{Post, PostKind, PostStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PipelineStage {
    Ingestion,
    Ranking,
    Script,
    Video,
    Publishing,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 5] = [
        PipelineStage::Ingestion,
        PipelineStage::Ranking,
        PipelineStage::Script,
        PipelineStage::Video,
        PipelineStage::Publishing,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PipelineStage::Ingestion => "Ingestion",
            PipelineStage::Ranking => "Ranking",
            PipelineStage::Script => "Script",
            PipelineStage::Video => "Video",
            PipelineStage::Publishing => "Publishing",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Where a post sits in the ingestion-to-publishing pipeline.
pub fn stage_of(post: &Post) -> (PipelineStage, StageStatus) {
    let production_stage = match post.kind {
        PostKind::Text => PipelineStage::Script,
        PostKind::Video => PipelineStage::Video,
    };

    match (post.kind, post.effective_status()) {
        (PostKind::Text, PostStatus::Draft) => (PipelineStage::Script, StageStatus::Pending),
        (PostKind::Text, PostStatus::Approved) => (PipelineStage::Video, StageStatus::Pending),
        (PostKind::Video, PostStatus::Draft) => (PipelineStage::Video, StageStatus::Pending),
        (PostKind::Video, PostStatus::Approved) => (PipelineStage::Video, StageStatus::Completed),
        (_, PostStatus::VideoProduction) => (PipelineStage::Video, StageStatus::Processing),
        (_, PostStatus::ReadyToPublish | PostStatus::Scheduled) => {
            (PipelineStage::Publishing, StageStatus::Pending)
        }
        (_, PostStatus::Published) => (PipelineStage::Publishing, StageStatus::Completed),
        (_, PostStatus::Failed | PostStatus::Rejected) => (production_stage, StageStatus::Failed),
    }
}

/// Post counts per stage and stage status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelineSummary {
    counts: BTreeMap<(PipelineStage, StageStatus), usize>,
}

impl PipelineSummary {
    pub fn from_posts<'a>(posts: impl IntoIterator<Item = &'a Post>) -> Self {
        let mut counts = BTreeMap::new();
        for post in posts {
            *counts.entry(stage_of(post)).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn count(&self, stage: PipelineStage, status: StageStatus) -> usize {
        self.counts.get(&(stage, status)).copied().unwrap_or(0)
    }

    pub fn stage_total(&self, stage: PipelineStage) -> usize {
        self.counts
            .iter()
            .filter(|((s, _), _)| *s == stage)
            .map(|(_, count)| count)
            .sum()
    }
}
