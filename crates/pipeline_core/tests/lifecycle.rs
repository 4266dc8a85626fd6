use std::sync::Once;

use pipeline_core::{
    quote, update, Action, ActionResponse, ApiRequest, AppState, Effect, Msg, Notice, Post,
    PostKind, PostStatus, QueueSnapshot, RegenerateOptions, Severity, Tab, VariantCount,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(pipeline_logging::initialize_for_tests);
}

fn post(id: u64, kind: PostKind, status: PostStatus) -> Post {
    let mut post = Post::new(id, kind, status);
    post.title = format!("Title {id}");
    post.body = format!("Body {id}");
    post
}

fn loaded(posts: Vec<Post>) -> AppState {
    let total = posts.len() as u64;
    let (state, _) = update(
        AppState::new(),
        Msg::QueueLoaded(QueueSnapshot { posts, total }),
    );
    state
}

fn request(state: AppState, post_id: u64, action: Action) -> (AppState, Vec<Effect>) {
    update(state, Msg::ActionRequested { post_id, action })
}

#[test]
fn approve_asks_for_confirmation_before_sending() {
    init_logging();
    let state = loaded(vec![post(1, PostKind::Text, PostStatus::Draft)]);

    let (state, effects) = request(state, 1, Action::Approve);
    assert_eq!(
        effects,
        vec![Effect::Confirm {
            prompt: "Approve post 1?".into()
        }]
    );
    assert_eq!(state.view().pending_prompt.as_deref(), Some("Approve post 1?"));

    let (state, effects) = update(state, Msg::ConfirmationResolved { accepted: true });
    assert_eq!(effects, vec![Effect::Send(ApiRequest::Approve { post_id: 1 })]);
    assert!(state.pending_confirmation().is_none());
}

#[test]
fn declined_confirmation_is_a_silent_noop() {
    init_logging();
    let state = loaded(vec![post(1, PostKind::Text, PostStatus::Draft)]);
    let posts_before = state.posts().to_vec();

    let (state, _) = request(state, 1, Action::Reject);
    let (state, effects) = update(state, Msg::ConfirmationResolved { accepted: false });

    assert!(effects.is_empty());
    assert!(state.notice().is_none());
    assert_eq!(state.posts(), posts_before.as_slice());

    // A stray answer with nothing pending does nothing.
    let (_state, effects) = update(state, Msg::ConfirmationResolved { accepted: true });
    assert!(effects.is_empty());
}

#[test]
fn approve_spawning_video_tracks_it_until_poll_shows_it_done() {
    init_logging();
    let state = loaded(vec![post(1, PostKind::Text, PostStatus::Draft)]);

    let (state, effects) = update(
        state,
        Msg::RequestSucceeded {
            request: ApiRequest::Approve { post_id: 1 },
            response: ActionResponse {
                message: "Post approved successfully".into(),
                video_post_id: Some(42),
            },
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::Notify(Notice::info("Post approved successfully")),
            Effect::StartProgress { post_id: 42 },
            Effect::FetchQueue { limit: 100 },
        ]
    );
    assert!(state.tracker().contains(42));
    assert_eq!(state.tracker().len(), 1);
    assert_eq!(state.view().active_tab, Tab::Video);
    // Local posts are untouched until the resync lands.
    assert_eq!(state.post(1).unwrap().status, PostStatus::Draft);

    let (state, effects) = update(
        state,
        Msg::QueueLoaded(QueueSnapshot {
            posts: vec![
                post(1, PostKind::Text, PostStatus::Approved),
                post(42, PostKind::Video, PostStatus::VideoProduction),
            ],
            total: 2,
        }),
    );
    assert!(effects.is_empty());
    assert!(state.tracker().contains(42));

    let (state, effects) = update(
        state,
        Msg::QueueLoaded(QueueSnapshot {
            posts: vec![
                post(1, PostKind::Text, PostStatus::Approved),
                post(42, PostKind::Video, PostStatus::Approved),
            ],
            total: 2,
        }),
    );
    assert_eq!(effects, vec![Effect::StopProgress { post_id: 42 }]);
    assert!(state.tracker().is_empty());
}

#[test]
fn approve_without_video_keeps_current_tab() {
    init_logging();
    let state = loaded(vec![post(1, PostKind::Text, PostStatus::Draft)]);
    let (state, effects) = update(
        state,
        Msg::RequestSucceeded {
            request: ApiRequest::Approve { post_id: 1 },
            response: ActionResponse::default(),
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::Notify(Notice::info("Post approved")),
            Effect::FetchQueue { limit: 100 },
        ]
    );
    assert_eq!(state.view().active_tab, Tab::Text);
}

#[test]
fn failed_reject_surfaces_server_message_and_keeps_posts() {
    init_logging();
    let state = loaded(vec![post(1, PostKind::Text, PostStatus::Draft)]);
    let (state, _) = request(state, 1, Action::Reject);
    let (state, _) = update(state, Msg::ConfirmationResolved { accepted: true });

    let (state, effects) = update(
        state,
        Msg::RequestFailed {
            request: ApiRequest::Reject { post_id: 1 },
            message: "locked".into(),
        },
    );
    assert_eq!(effects, vec![Effect::Notify(Notice::error("locked"))]);
    let notice = state.view().notice.unwrap();
    assert_eq!(notice.severity, Severity::Error);
    assert_eq!(notice.text, "locked");
    assert_eq!(state.post(1).unwrap().status, PostStatus::Draft);
    assert_eq!(state.posts().len(), 1);
}

#[test]
fn invalid_transitions_never_reach_the_network() {
    init_logging();
    let state = loaded(vec![
        post(1, PostKind::Text, PostStatus::Published),
        post(2, PostKind::Text, PostStatus::Approved),
    ]);

    let (state, effects) = request(state, 1, Action::Reject);
    assert_eq!(
        effects,
        vec![Effect::Notify(Notice::error(
            "cannot reject a post that is published"
        ))]
    );

    let (state, effects) = request(state, 2, Action::ApproveVideo);
    assert_eq!(
        effects,
        vec![Effect::Notify(Notice::error("cannot approve video a text post"))]
    );

    let (state, effects) = request(state, 99, Action::Approve);
    assert_eq!(
        effects,
        vec![Effect::Notify(Notice::error("post 99 is not in the queue"))]
    );
    assert!(state.pending_confirmation().is_none());
}

#[test]
fn generate_video_is_sent_without_confirmation() {
    init_logging();
    let state = loaded(vec![post(8, PostKind::Video, PostStatus::Failed)]);
    let (state, effects) = request(state, 8, Action::GenerateVideo);
    assert_eq!(
        effects,
        vec![Effect::Send(ApiRequest::GenerateVideo { post_id: 8 })]
    );

    let (_state, effects) = update(
        state,
        Msg::RequestSucceeded {
            request: ApiRequest::GenerateVideo { post_id: 8 },
            response: ActionResponse {
                message: String::new(),
                video_post_id: None,
            },
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::Notify(Notice::info("Video generation started")),
            Effect::FetchQueue { limit: 100 },
        ]
    );
}

#[test]
fn regenerate_dialog_stays_open_on_failure_and_closes_on_success() {
    init_logging();
    let mut original = post(3, PostKind::Video, PostStatus::Approved);
    original.regeneration_count = 1;
    original.total_cost = 0.4;
    let state = loaded(vec![original.clone()]);

    let (state, effects) = request(state, 3, Action::Regenerate);
    assert!(effects.is_empty());
    let dialog = state.view().regenerate.unwrap();
    assert_eq!(dialog.post_id, 3);
    assert_eq!(dialog.kind, PostKind::Video);

    let options = RegenerateOptions {
        variant_count: VariantCount::One,
        change_hook_style: true,
        ..RegenerateOptions::default()
    };
    let sent = ApiRequest::Regenerate {
        post_id: 3,
        kind: PostKind::Video,
        options: options.clone(),
    };

    let (state, effects) = update(
        state,
        Msg::RegenerateSubmitted {
            options: options.clone(),
        },
    );
    assert_eq!(effects, vec![Effect::Send(sent.clone())]);

    let (state, _) = update(
        state,
        Msg::RequestFailed {
            request: sent.clone(),
            message: "HTTP 503: Regeneration failed".into(),
        },
    );
    assert!(state.regenerate_dialog().is_some());

    let (state, _) = update(state, Msg::RegenerateSubmitted { options });
    let (state, effects) = update(
        state,
        Msg::RequestSucceeded {
            request: sent,
            response: ActionResponse {
                message: "Generated 1 variant".into(),
                video_post_id: None,
            },
        },
    );
    assert!(state.regenerate_dialog().is_none());
    assert_eq!(effects.last(), Some(&Effect::FetchQueue { limit: 100 }));

    let mut regenerated = original.clone();
    regenerated.status = PostStatus::Draft;
    regenerated.regeneration_count = 2;
    regenerated.total_cost = 0.467;
    regenerated.title = "Fresh title".into();
    regenerated.body = "Fresh body".into();
    let (state, _) = update(
        state,
        Msg::QueueLoaded(QueueSnapshot {
            posts: vec![regenerated],
            total: 1,
        }),
    );

    let after = state.post(3).unwrap();
    assert_eq!(after.regeneration_count, original.regeneration_count + 1);
    assert!(after.total_cost >= original.total_cost);
    assert_eq!(after.title, "Fresh title");
    assert_eq!(after.body, "Fresh body");
    assert_eq!(after.kind, PostKind::Video);
}

#[test]
fn cancelled_regenerate_dialog_sends_nothing() {
    init_logging();
    let state = loaded(vec![post(1, PostKind::Text, PostStatus::Draft)]);
    let (state, _) = request(state, 1, Action::Regenerate);
    let (state, _) = update(state, Msg::RegenerateCancelled);
    assert!(state.regenerate_dialog().is_none());

    let (_state, effects) = update(
        state,
        Msg::RegenerateSubmitted {
            options: RegenerateOptions::default(),
        },
    );
    assert!(effects.is_empty());
}

#[test]
fn regenerate_dialog_quotes_the_chosen_variant_count() {
    init_logging();
    let state = loaded(vec![post(5, PostKind::Video, PostStatus::Draft)]);

    let (state, _) = request(state, 5, Action::Regenerate);
    let dialog = state.view().regenerate.unwrap();
    assert_eq!(dialog.quote, quote(PostKind::Video, VariantCount::Three));

    let (mut state, effects) = update(state, Msg::RegenerateVariantsChosen(VariantCount::Five));
    assert!(effects.is_empty());
    assert!(state.consume_dirty());
    let dialog = state.view().regenerate.unwrap();
    assert_eq!(dialog.quote.variants, 5);
    assert_eq!(dialog.quote, quote(PostKind::Video, VariantCount::Five));

    // A failed submit keeps quoting what was sent.
    let options = RegenerateOptions {
        variant_count: VariantCount::One,
        ..RegenerateOptions::default()
    };
    let (state, _) = update(
        state,
        Msg::RegenerateSubmitted {
            options: options.clone(),
        },
    );
    let (state, _) = update(
        state,
        Msg::RequestFailed {
            request: ApiRequest::Regenerate {
                post_id: 5,
                kind: PostKind::Video,
                options,
            },
            message: "HTTP 500".into(),
        },
    );
    let dialog = state.view().regenerate.unwrap();
    assert_eq!(dialog.quote, quote(PostKind::Video, VariantCount::One));
}
