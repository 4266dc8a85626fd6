use std::collections::BTreeMap;

use crate::view_model::{AppViewModel, GenerationView, PostRow, RegenerateDialogView};
use crate::{
    quote, ApiRequest, GenerationTracker, Notice, PipelineSummary, Post, PostId, PostKind,
    PostStatus, ProgressSnapshot, Tab, VariantCount,
};

/// Page size used by the queue fetch.
pub const DEFAULT_QUEUE_LIMIT: u32 = 100;

/// Pre-regeneration snapshot kept until the resync that follows the request.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RegenerationCheck {
    pub(crate) before: Post,
    /// `None` until the backend accepts the request. After that, the number
    /// of queue fetches issued before the resync that are still outstanding.
    pub(crate) earlier_fetches: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegenerateDialog {
    pub post_id: PostId,
    pub kind: PostKind,
    /// Variant count the quote is computed for.
    pub variants: VariantCount,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    posts: Vec<Post>,
    total: u64,
    loading: bool,
    queue_limit: u32,
    tracker: GenerationTracker,
    progress: BTreeMap<PostId, ProgressSnapshot>,
    active_tab: Tab,
    pending_confirmation: Option<ApiRequest>,
    regenerate_dialog: Option<RegenerateDialog>,
    regeneration_checks: BTreeMap<PostId, RegenerationCheck>,
    notice: Option<Notice>,
    fetches_in_flight: u32,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            posts: Vec::new(),
            total: 0,
            loading: true,
            queue_limit: DEFAULT_QUEUE_LIMIT,
            tracker: GenerationTracker::new(),
            progress: BTreeMap::new(),
            active_tab: Tab::default(),
            pending_confirmation: None,
            regenerate_dialog: None,
            regeneration_checks: BTreeMap::new(),
            notice: None,
            fetches_in_flight: 0,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queue_limit(limit: u32) -> Self {
        Self {
            queue_limit: limit.clamp(1, DEFAULT_QUEUE_LIMIT),
            ..Self::default()
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn post(&self, id: PostId) -> Option<&Post> {
        self.posts.iter().find(|post| post.id == id)
    }

    pub fn tracker(&self) -> &GenerationTracker {
        &self.tracker
    }

    pub fn queue_limit(&self) -> u32 {
        self.queue_limit
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn pending_confirmation(&self) -> Option<&ApiRequest> {
        self.pending_confirmation.as_ref()
    }

    pub fn regenerate_dialog(&self) -> Option<RegenerateDialog> {
        self.regenerate_dialog
    }

    /// Polling only pays off while some job is still producing.
    pub fn needs_poll(&self) -> bool {
        !self.tracker.is_empty()
            || self
                .posts
                .iter()
                .any(|post| post.status == PostStatus::VideoProduction)
    }

    pub fn view(&self) -> AppViewModel {
        let tab_counts = Tab::ALL
            .into_iter()
            .map(|tab| (tab, tab.select(&self.posts).count()))
            .collect();

        let rows = self
            .active_tab
            .select(&self.posts)
            .map(|post| PostRow::from_post(post, self.tracker.contains(post.id)))
            .collect();

        let generating = self
            .tracker
            .ids()
            .map(|post_id| GenerationView {
                post_id,
                title: self.post(post_id).map(|post| post.title.clone()),
                progress: self.progress.get(&post_id).cloned(),
            })
            .collect();

        let regenerate = self.regenerate_dialog.map(|dialog| RegenerateDialogView {
            post_id: dialog.post_id,
            kind: dialog.kind,
            quote: quote(dialog.kind, dialog.variants),
        });

        AppViewModel {
            loading: self.loading,
            active_tab: self.active_tab,
            total: self.total,
            tab_counts,
            rows,
            generating,
            pipeline: PipelineSummary::from_posts(&self.posts),
            notice: self.notice.clone(),
            pending_prompt: self
                .pending_confirmation
                .as_ref()
                .map(ApiRequest::confirmation_prompt),
            regenerate,
            dirty: self.dirty,
        }
    }

    /// Returns whether the state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn replace_posts(&mut self, posts: Vec<Post>, total: u64) {
        self.posts = posts;
        self.total = total;
        self.loading = false;
    }

    pub(crate) fn finish_loading(&mut self) {
        self.loading = false;
    }

    pub(crate) fn fetches_in_flight(&self) -> u32 {
        self.fetches_in_flight
    }

    pub(crate) fn fetch_issued(&mut self) {
        self.fetches_in_flight += 1;
    }

    pub(crate) fn fetch_settled(&mut self) {
        self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);
    }

    pub(crate) fn tracker_mut(&mut self) -> &mut GenerationTracker {
        &mut self.tracker
    }

    pub(crate) fn set_progress(&mut self, post_id: PostId, snapshot: ProgressSnapshot) {
        self.progress.insert(post_id, snapshot);
    }

    pub(crate) fn clear_progress(&mut self, post_id: PostId) {
        self.progress.remove(&post_id);
    }

    pub(crate) fn set_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    pub(crate) fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub(crate) fn set_pending_confirmation(&mut self, request: ApiRequest) {
        self.pending_confirmation = Some(request);
    }

    pub(crate) fn take_pending_confirmation(&mut self) -> Option<ApiRequest> {
        self.pending_confirmation.take()
    }

    pub(crate) fn open_regenerate_dialog(&mut self, dialog: RegenerateDialog) {
        self.regenerate_dialog = Some(dialog);
    }

    pub(crate) fn choose_regenerate_variants(&mut self, variants: VariantCount) -> bool {
        match &mut self.regenerate_dialog {
            Some(dialog) if dialog.variants != variants => {
                dialog.variants = variants;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn close_regenerate_dialog(&mut self) -> Option<RegenerateDialog> {
        self.regenerate_dialog.take()
    }

    pub(crate) fn regeneration_checks_mut(&mut self) -> &mut BTreeMap<PostId, RegenerationCheck> {
        &mut self.regeneration_checks
    }
}
