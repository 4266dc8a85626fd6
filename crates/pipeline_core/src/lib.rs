//! Pipeline core: pure post lifecycle state machine and view-model helpers.
mod effect;
mod msg;
mod pipeline;
mod post;
mod progress;
mod regenerate;
mod request;
mod state;
mod tracker;
mod transition;
mod update;
mod view_model;

pub use effect::{Effect, Notice, Severity};
pub use msg::Msg;
pub use pipeline::{stage_of, PipelineStage, PipelineSummary, StageStatus};
pub use post::{Asset, AssetKind, Post, PostId, PostKind, PostStatus};
pub use progress::{
    format_clock, ProgressSimulator, ProgressSnapshot, Step, StepStatus, StepView,
    COMPLETION_DELAY, RUNNING_PERCENT_CAP, TICK_INTERVAL,
};
pub use regenerate::{
    check_regeneration, quote, CostQuote, RegenerateOptions, RegenerationAnomaly, VariantCount,
    NEW_TEXT_POST_COST, NEW_VIDEO_POST_COST, TEXT_VARIANT_RATE, VIDEO_VARIANT_RATE,
};
pub use request::{ActionResponse, ApiRequest, QueueSnapshot};
pub use state::{AppState, RegenerateDialog, DEFAULT_QUEUE_LIMIT};
pub use tracker::{reconcile, GenerationTracker, TrackerDiff};
pub use transition::{next_status, Action, TransitionError};
pub use update::update;
pub use view_model::{AppViewModel, GenerationView, PostRow, RegenerateDialogView, Tab};
