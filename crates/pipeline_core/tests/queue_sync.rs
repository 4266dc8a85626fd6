use std::sync::Once;

use pipeline_core::{
    update, Asset, AssetKind, AppState, Effect, Msg, Post, PostKind, PostStatus, QueueSnapshot,
    Tab, DEFAULT_QUEUE_LIMIT,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(pipeline_logging::initialize_for_tests);
}

fn post(id: u64, kind: PostKind, status: PostStatus) -> Post {
    let mut post = Post::new(id, kind, status);
    post.title = format!("Post {id}");
    post
}

fn load(state: AppState, posts: Vec<Post>) -> (AppState, Vec<Effect>) {
    let total = posts.len() as u64;
    update(state, Msg::QueueLoaded(QueueSnapshot { posts, total }))
}

#[test]
fn started_fetches_one_page() {
    init_logging();
    let state = AppState::new();
    assert!(state.view().loading);

    let (_state, effects) = update(state, Msg::Started);
    assert_eq!(
        effects,
        vec![Effect::FetchQueue {
            limit: DEFAULT_QUEUE_LIMIT
        }]
    );
}

#[test]
fn queue_limit_is_clamped_to_backend_range() {
    assert_eq!(AppState::with_queue_limit(0).queue_limit(), 1);
    assert_eq!(AppState::with_queue_limit(500).queue_limit(), 100);
    assert_eq!(AppState::with_queue_limit(25).queue_limit(), 25);
}

#[test]
fn single_text_draft_lands_in_text_view_only() {
    init_logging();
    let (mut state, effects) = load(
        AppState::new(),
        vec![post(1, PostKind::Text, PostStatus::Draft)],
    );
    assert!(effects.is_empty());
    assert!(state.consume_dirty());

    let view = state.view();
    assert!(!view.loading);
    assert_eq!(view.total, 1);
    assert_eq!(view.active_tab, Tab::Text);
    assert_eq!(view.row_ids(), vec![1]);
    assert_eq!(view.count(Tab::Text), 1);
    assert_eq!(view.count(Tab::Video), 0);
    assert_eq!(view.count(Tab::All), 1);
}

#[test]
fn approved_posts_appear_in_both_approved_and_scheduled_views() {
    init_logging();
    let (state, _) = load(
        AppState::new(),
        vec![
            post(1, PostKind::Text, PostStatus::Approved),
            post(2, PostKind::Video, PostStatus::ReadyToPublish),
            post(3, PostKind::Video, PostStatus::Approved),
            post(4, PostKind::Video, PostStatus::VideoProduction),
            post(5, PostKind::Text, PostStatus::Published),
        ],
    );

    let (state, _) = update(state, Msg::TabSelected(Tab::Scheduled));
    assert_eq!(state.view().row_ids(), vec![1, 2, 3]);

    let (state, _) = update(state, Msg::TabSelected(Tab::Approved));
    assert_eq!(state.view().row_ids(), vec![1, 3]);

    let (state, _) = update(state, Msg::TabSelected(Tab::Video));
    assert_eq!(state.view().row_ids(), vec![3, 4]);
}

#[test]
fn each_fetch_replaces_the_collection() {
    init_logging();
    let (state, _) = load(
        AppState::new(),
        vec![
            post(1, PostKind::Text, PostStatus::Draft),
            post(2, PostKind::Text, PostStatus::Draft),
        ],
    );
    let (state, _) = load(state, vec![post(3, PostKind::Text, PostStatus::Draft)]);

    let ids: Vec<_> = state.posts().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![3]);
}

#[test]
fn failed_refresh_keeps_previous_posts() {
    init_logging();
    let (state, _) = load(
        AppState::new(),
        vec![post(1, PostKind::Video, PostStatus::VideoProduction)],
    );
    let before = state.view();

    let (mut state, effects) = update(state, Msg::QueueLoadFailed("connection refused".into()));
    assert!(effects.is_empty());
    assert_eq!(state.view().rows, before.rows);
    assert_eq!(state.view().generating.len(), 1);
    assert!(state.notice().is_none());
    state.consume_dirty();

    // The failure is not surfaced, and an already-loaded view stays clean.
    let (mut state, _) = update(state, Msg::QueueLoadFailed("timeout".into()));
    assert!(!state.consume_dirty());
}

#[test]
fn failed_first_load_clears_loading_flag() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::QueueLoadFailed("offline".into()));
    let view = state.view();
    assert!(!view.loading);
    assert!(view.rows.is_empty());
}

#[test]
fn poll_only_fires_while_something_is_producing() {
    init_logging();
    let (state, _) = load(
        AppState::new(),
        vec![post(1, PostKind::Text, PostStatus::Draft)],
    );
    let (state, effects) = update(state, Msg::PollTick);
    assert!(effects.is_empty());

    let (state, _) = load(
        state,
        vec![post(2, PostKind::Video, PostStatus::VideoProduction)],
    );
    let (_state, effects) = update(state, Msg::PollTick);
    assert_eq!(effects, vec![Effect::FetchQueue { limit: 100 }]);
}

#[test]
fn populated_assets_win_over_production_status() {
    init_logging();
    let mut video = post(7, PostKind::Video, PostStatus::VideoProduction);
    video.assets.push(Asset {
        id: Some(1),
        post_id: Some(7),
        kind: AssetKind::Video,
        path: "output/videos/7.mp4".into(),
        created_at: None,
    });

    let (state, effects) = load(AppState::new(), vec![video]);
    // Not adopted by the tracker, no progress view.
    assert!(effects.is_empty());
    assert!(state.tracker().is_empty());

    let (state, _) = update(state, Msg::TabSelected(Tab::Video));
    let row = &state.view().rows[0];
    assert_eq!(row.status, PostStatus::VideoProduction);
    assert_eq!(row.effective_status, PostStatus::Approved);
    assert_eq!(row.video_path.as_deref(), Some("output/videos/7.mp4"));
    assert!(!row.generating);
}
