use crate::{
    Action, ActionResponse, ApiRequest, PostId, ProgressSnapshot, QueueSnapshot,
    RegenerateOptions, Tab, VariantCount,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Dashboard opened; triggers the initial load.
    Started,
    /// Background poll interval elapsed.
    PollTick,
    /// Queue fetch returned a fresh snapshot.
    QueueLoaded(QueueSnapshot),
    /// Queue fetch failed; existing posts are kept.
    QueueLoadFailed(String),
    /// User switched the visible queue tab.
    TabSelected(Tab),
    /// User asked for a lifecycle action on a post.
    ActionRequested { post_id: PostId, action: Action },
    /// User answered the pending confirmation prompt.
    ConfirmationResolved { accepted: bool },
    /// User picked how many variants the regenerate dialog should quote.
    RegenerateVariantsChosen(VariantCount),
    /// User submitted the regenerate dialog.
    RegenerateSubmitted { options: RegenerateOptions },
    /// User closed the regenerate dialog without submitting.
    RegenerateCancelled,
    /// Backend accepted a mutation.
    RequestSucceeded {
        request: ApiRequest,
        response: ActionResponse,
    },
    /// Backend or network rejected a mutation.
    RequestFailed { request: ApiRequest, message: String },
    /// Engine recomputed the progress estimate for a tracked job.
    ProgressUpdated {
        post_id: PostId,
        snapshot: ProgressSnapshot,
    },
    /// Progress estimate for a job ran to completion.
    SimulationFinished { post_id: PostId },
}
