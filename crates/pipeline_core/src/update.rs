use pipeline_logging::{pipeline_debug, pipeline_info, pipeline_warn};

use crate::state::{RegenerateDialog, RegenerationCheck};
use crate::{
    check_regeneration, next_status, Action, ActionResponse, ApiRequest, AppState, Effect, Msg,
    Notice, Post, PostId, PostKind, PostStatus, QueueSnapshot, RegenerateOptions, Tab,
    TransitionError, VariantCount,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Mutations never touch the local post collection. A successful request
/// always ends in a `FetchQueue` effect and the fetched snapshot replaces
/// the collection wholesale.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started => vec![fetch_queue(&mut state)],
        Msg::PollTick => {
            if state.needs_poll() {
                pipeline_debug!("Poll tick: jobs in production, refreshing queue");
                vec![fetch_queue(&mut state)]
            } else {
                pipeline_debug!("Poll tick: nothing in production, skipping");
                Vec::new()
            }
        }
        Msg::QueueLoaded(snapshot) => {
            state.fetch_settled();
            apply_snapshot(&mut state, snapshot)
        }
        Msg::QueueLoadFailed(message) => {
            // Stale data beats a blank dashboard.
            pipeline_warn!("Queue refresh failed, keeping previous posts: {}", message);
            state.fetch_settled();
            skip_earlier_fetch(&mut state);
            if state.is_loading() {
                state.finish_loading();
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::TabSelected(tab) => {
            if state.active_tab() != tab {
                state.set_tab(tab);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ActionRequested { post_id, action } => request_action(&mut state, post_id, action),
        Msg::ConfirmationResolved { accepted } => match state.take_pending_confirmation() {
            Some(request) if accepted => {
                state.mark_dirty();
                vec![Effect::Send(request)]
            }
            Some(request) => {
                pipeline_debug!("User declined {} for post {}", request.action(), request.post_id());
                state.mark_dirty();
                Vec::new()
            }
            None => Vec::new(),
        },
        Msg::RegenerateVariantsChosen(variants) => {
            if state.choose_regenerate_variants(variants) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::RegenerateSubmitted { options } => submit_regeneration(&mut state, options),
        Msg::RegenerateCancelled => {
            if state.close_regenerate_dialog().is_some() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::RequestSucceeded { request, response } => {
            request_succeeded(&mut state, request, response)
        }
        Msg::RequestFailed { request, message } => {
            pipeline_warn!(
                "{} failed for post {}: {}",
                request.action(),
                request.post_id(),
                message
            );
            if let ApiRequest::Regenerate { post_id, .. } = &request {
                // Dialog stays open so the user can retry.
                state.regeneration_checks_mut().remove(post_id);
            }
            state.set_notice(Notice::error(message.clone()));
            state.mark_dirty();
            vec![Effect::Notify(Notice::error(message))]
        }
        Msg::ProgressUpdated { post_id, snapshot } => {
            // Late ticks from a cancelled simulation are dropped.
            if state.tracker().contains(post_id) {
                state.set_progress(post_id, snapshot);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SimulationFinished { post_id } => {
            if state.tracker_mut().remove(post_id) {
                pipeline_info!("Progress estimate finished for post {}", post_id);
                state.clear_progress(post_id);
                state.mark_dirty();
            }
            Vec::new()
        }
    };

    (state, effects)
}

fn apply_snapshot(state: &mut AppState, snapshot: QueueSnapshot) -> Vec<Effect> {
    let QueueSnapshot { posts, total } = snapshot;
    pipeline_debug!(
        "Queue loaded: {} posts (total {}), {} text, {} video, {} in production",
        posts.len(),
        total,
        posts.iter().filter(|p| p.kind == PostKind::Text).count(),
        posts.iter().filter(|p| p.kind == PostKind::Video).count(),
        posts
            .iter()
            .filter(|p| p.status == PostStatus::VideoProduction)
            .count()
    );

    check_regenerations(state, &posts);

    let diff = state.tracker_mut().reconcile_with(&posts);
    state.replace_posts(posts, total);
    state.mark_dirty();

    let mut effects = Vec::with_capacity(diff.adopted.len() + diff.dropped.len());
    for post_id in diff.dropped {
        pipeline_info!("Post {} left video production", post_id);
        state.clear_progress(post_id);
        effects.push(Effect::StopProgress { post_id });
    }
    for post_id in diff.adopted {
        pipeline_info!("Tracking video production for post {}", post_id);
        effects.push(Effect::StartProgress { post_id });
    }
    effects
}

fn fetch_queue(state: &mut AppState) -> Effect {
    state.fetch_issued();
    Effect::FetchQueue {
        limit: state.queue_limit(),
    }
}

/// Counts one settled fetch against every accepted check still waiting for
/// fetches that were issued before its resync. Returns the checks whose
/// resync result is the one that just arrived.
fn skip_earlier_fetch(state: &mut AppState) -> Vec<PostId> {
    let mut ready = Vec::new();
    for (post_id, check) in state.regeneration_checks_mut().iter_mut() {
        match &mut check.earlier_fetches {
            Some(0) => ready.push(*post_id),
            Some(earlier) => *earlier -= 1,
            None => {}
        }
    }
    ready
}

fn check_regenerations(state: &mut AppState, posts: &[Post]) {
    let ready = skip_earlier_fetch(state);
    let checks = state.regeneration_checks_mut();

    for post_id in ready {
        let Some(check) = checks.remove(&post_id) else {
            continue;
        };
        match posts.iter().find(|post| post.id == post_id) {
            Some(after) => {
                for anomaly in check_regeneration(&check.before, after) {
                    pipeline_warn!("Regenerated post {} looks inconsistent: {:?}", post_id, anomaly);
                }
            }
            None => pipeline_warn!("Regenerated post {} missing from queue", post_id),
        }
    }
}

fn request_action(state: &mut AppState, post_id: PostId, action: Action) -> Vec<Effect> {
    let (kind, allowed) = match state.post(post_id) {
        Some(post) => (post.kind, next_status(post, action)),
        None => return reject_locally(state, TransitionError::UnknownPost(post_id)),
    };
    if let Err(err) = allowed {
        return reject_locally(state, err);
    }

    let Some(request) = ApiRequest::simple(action, post_id) else {
        state.open_regenerate_dialog(RegenerateDialog {
            post_id,
            kind,
            variants: VariantCount::default(),
        });
        state.mark_dirty();
        return Vec::new();
    };

    if action.needs_confirmation() {
        let prompt = request.confirmation_prompt();
        state.set_pending_confirmation(request);
        state.mark_dirty();
        vec![Effect::Confirm { prompt }]
    } else {
        vec![Effect::Send(request)]
    }
}

fn submit_regeneration(state: &mut AppState, options: RegenerateOptions) -> Vec<Effect> {
    let Some(dialog) = state.regenerate_dialog() else {
        return Vec::new();
    };
    let post = match state.post(dialog.post_id) {
        Some(post) => post.clone(),
        None => return reject_locally(state, TransitionError::UnknownPost(dialog.post_id)),
    };
    if let Err(err) = next_status(&post, Action::Regenerate) {
        return reject_locally(state, err);
    }

    // A failed attempt leaves the dialog quoting what was submitted.
    if state.choose_regenerate_variants(options.variant_count) {
        state.mark_dirty();
    }
    state.regeneration_checks_mut().insert(
        post.id,
        RegenerationCheck {
            before: post.clone(),
            earlier_fetches: None,
        },
    );
    vec![Effect::Send(ApiRequest::Regenerate {
        post_id: post.id,
        kind: post.kind,
        options,
    })]
}

fn request_succeeded(
    state: &mut AppState,
    request: ApiRequest,
    response: ActionResponse,
) -> Vec<Effect> {
    let text = if response.message.trim().is_empty() {
        request.default_success_message().to_string()
    } else {
        response.message.clone()
    };
    pipeline_info!("{} succeeded for post {}: {}", request.action(), request.post_id(), text);

    let mut effects = vec![Effect::Notify(Notice::info(text.clone()))];
    state.set_notice(Notice::info(text));

    match &request {
        ApiRequest::Approve { .. } => {
            if let Some(video_post_id) = response.video_post_id {
                if state.tracker_mut().add(video_post_id) {
                    pipeline_info!("Approval spawned video post {}", video_post_id);
                    effects.push(Effect::StartProgress {
                        post_id: video_post_id,
                    });
                }
                state.set_tab(Tab::Video);
            }
        }
        ApiRequest::Regenerate { post_id, .. } => {
            let earlier = state.fetches_in_flight();
            if let Some(check) = state.regeneration_checks_mut().get_mut(post_id) {
                check.earlier_fetches = Some(earlier);
            }
            if state
                .regenerate_dialog()
                .is_some_and(|dialog| dialog.post_id == *post_id)
            {
                state.close_regenerate_dialog();
            }
        }
        ApiRequest::ApproveVideo { .. }
        | ApiRequest::Reject { .. }
        | ApiRequest::GenerateVideo { .. } => {}
    }

    state.mark_dirty();
    effects.push(fetch_queue(state));
    effects
}

fn reject_locally(state: &mut AppState, err: TransitionError) -> Vec<Effect> {
    pipeline_warn!("Rejected locally: {}", err);
    let notice = Notice::error(err.to_string());
    state.set_notice(notice.clone());
    state.mark_dirty();
    vec![Effect::Notify(notice)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snapshot(posts: Vec<Post>) -> Msg {
        let total = posts.len() as u64;
        Msg::QueueLoaded(QueueSnapshot { posts, total })
    }

    fn waiting_fetches(state: &mut AppState, post_id: PostId) -> Option<Option<u32>> {
        state
            .regeneration_checks_mut()
            .get(&post_id)
            .map(|check| check.earlier_fetches)
    }

    #[test]
    fn poll_result_in_flight_does_not_consume_the_regeneration_check() {
        let rendering = Post::new(1, PostKind::Video, PostStatus::VideoProduction);
        let original = Post::new(3, PostKind::Text, PostStatus::Draft);
        let (state, _) = update(
            AppState::new(),
            snapshot(vec![rendering.clone(), original.clone()]),
        );

        let (state, effects) = update(state, Msg::PollTick);
        assert_eq!(effects, vec![Effect::FetchQueue { limit: 100 }]);

        let (state, _) = update(
            state,
            Msg::ActionRequested {
                post_id: 3,
                action: Action::Regenerate,
            },
        );
        let options = RegenerateOptions::default();
        let (state, _) = update(
            state,
            Msg::RegenerateSubmitted {
                options: options.clone(),
            },
        );
        let (mut state, _) = update(
            state,
            Msg::RequestSucceeded {
                request: ApiRequest::Regenerate {
                    post_id: 3,
                    kind: PostKind::Text,
                    options,
                },
                response: ActionResponse {
                    message: String::new(),
                    video_post_id: None,
                },
            },
        );
        assert_eq!(waiting_fetches(&mut state, 3), Some(Some(1)));

        // The poll issued before the resync lands first, carrying the old post.
        let (mut state, _) = update(state, snapshot(vec![rendering.clone(), original.clone()]));
        assert_eq!(waiting_fetches(&mut state, 3), Some(Some(0)));

        let mut regenerated = original;
        regenerated.regeneration_count += 1;
        let (mut state, _) = update(state, snapshot(vec![rendering, regenerated]));
        assert_eq!(waiting_fetches(&mut state, 3), None);
    }

    #[test]
    fn failed_earlier_fetch_still_counts_toward_the_resync() {
        let original = Post::new(3, PostKind::Text, PostStatus::Draft);
        let (state, _) = update(AppState::new(), snapshot(vec![original.clone()]));
        let (state, _) = update(state, Msg::Started);

        let (state, _) = update(
            state,
            Msg::ActionRequested {
                post_id: 3,
                action: Action::Regenerate,
            },
        );
        let options = RegenerateOptions::default();
        let (state, _) = update(
            state,
            Msg::RegenerateSubmitted {
                options: options.clone(),
            },
        );
        let (state, _) = update(
            state,
            Msg::RequestSucceeded {
                request: ApiRequest::Regenerate {
                    post_id: 3,
                    kind: PostKind::Text,
                    options,
                },
                response: ActionResponse {
                    message: "ok".into(),
                    video_post_id: None,
                },
            },
        );

        let (mut state, _) = update(state, Msg::QueueLoadFailed("timeout".into()));
        assert_eq!(waiting_fetches(&mut state, 3), Some(Some(0)));

        let (mut state, _) = update(state, snapshot(vec![original]));
        assert_eq!(waiting_fetches(&mut state, 3), None);
    }
}
