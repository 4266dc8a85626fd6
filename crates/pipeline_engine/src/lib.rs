//! Pipeline engine: backend client, poll timer and progress simulation IO.
mod client;
mod clock;
mod engine;
mod poll;
mod simulation;
mod types;

pub use client::{parse_base_url, ClientSettings, ContentApi, ReqwestContentApi, DEFAULT_BASE_URL};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{EngineHandle, EngineSettings};
pub use poll::{PollScheduler, DEFAULT_POLL_INTERVAL};
pub use simulation::{run_simulation, ChannelProgressSink, ProgressSink, SimulationSettings};
pub use types::{
    ApiError, EngineEvent, FailureKind, HealthReport, QueueQuery, MALFORMED_RESPONSE_MESSAGE,
};
