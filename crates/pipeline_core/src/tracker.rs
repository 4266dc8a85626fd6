use std::collections::BTreeSet;

use crate::{Post, PostId};

/// Ids of posts whose video production is being watched.
///
/// Every operation is idempotent so the completion signal and the poll
/// reconciliation can both touch the same id without coordination.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationTracker {
    ids: BTreeSet<PostId>,
}

impl GenerationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the id was not tracked before.
    pub fn add(&mut self, id: PostId) -> bool {
        self.ids.insert(id)
    }

    /// Returns `true` if the id was tracked. Unknown ids are ignored.
    pub fn remove(&mut self, id: PostId) -> bool {
        self.ids.remove(&id)
    }

    pub fn contains(&self, id: PostId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = PostId> + '_ {
        self.ids.iter().copied()
    }

    pub fn reconcile_with(&mut self, latest: &[Post]) -> TrackerDiff {
        let next = reconcile(&self.ids, latest);
        let diff = TrackerDiff {
            adopted: next.difference(&self.ids).copied().collect(),
            dropped: self.ids.difference(&next).copied().collect(),
        };
        self.ids = next;
        diff
    }
}

/// Ids that entered and left the tracker during one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackerDiff {
    pub adopted: Vec<PostId>,
    pub dropped: Vec<PostId>,
}

impl TrackerDiff {
    pub fn is_empty(&self) -> bool {
        self.adopted.is_empty() && self.dropped.is_empty()
    }
}

/// Tracked ids after observing `latest`.
///
/// Keeps tracked ids whose post is still in production, drops ids whose post
/// moved on or vanished, and adopts every in-production post not yet tracked.
pub fn reconcile(tracked: &BTreeSet<PostId>, latest: &[Post]) -> BTreeSet<PostId> {
    let in_production: BTreeSet<PostId> = latest
        .iter()
        .filter(|post| post.in_production())
        .map(|post| post.id)
        .collect();

    let kept = tracked.intersection(&in_production).copied();
    let adopted = in_production.difference(tracked).copied();
    kept.chain(adopted).collect()
}
