use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};

use pipeline_core::{Effect, Msg, ProgressSimulator, Severity};
use pipeline_engine::{ApiError, EngineEvent, EngineHandle, HealthReport, QueueQuery};
use pipeline_logging::{pipeline_debug, pipeline_error, pipeline_info, pipeline_warn};

/// Answers the yes/no questions raised by `Effect::Confirm`.
pub trait Confirmer {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Accepts everything (`--yes`).
pub struct AutoConfirm;

impl Confirmer for AutoConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        pipeline_debug!("Auto-confirming: {}", prompt);
        true
    }
}

pub struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn confirm(&mut self, prompt: &str) -> bool {
        let mut stdout = io::stdout();
        let _ = write!(stdout, "{prompt} [y/N] ");
        let _ = stdout.flush();
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(err) => {
                pipeline_warn!("Could not read confirmation: {}", err);
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Executes core effects against the engine and turns engine events back
/// into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    confirmer: Box<dyn Confirmer>,
    plan: ProgressSimulator,
    fetches_in_flight: usize,
    requests_in_flight: usize,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, confirmer: Box<dyn Confirmer>) -> Self {
        Self {
            engine,
            confirmer,
            plan: ProgressSimulator::video_generation(),
            fetches_in_flight: 0,
            requests_in_flight: 0,
        }
    }

    /// Runs one effect. Effects answered locally produce a message right away.
    pub fn run(&mut self, effect: Effect) -> Option<Msg> {
        match effect {
            Effect::FetchQueue { limit } => {
                self.fetches_in_flight += 1;
                self.engine.fetch_queue(QueueQuery::with_limit(limit));
                None
            }
            Effect::Confirm { prompt } => {
                let accepted = self.confirmer.confirm(&prompt);
                Some(Msg::ConfirmationResolved { accepted })
            }
            Effect::Send(request) => {
                self.requests_in_flight += 1;
                self.engine.send(request);
                None
            }
            Effect::Notify(notice) => {
                match notice.severity {
                    Severity::Info => pipeline_info!("{}", notice.text),
                    Severity::Error => pipeline_error!("{}", notice.text),
                }
                None
            }
            Effect::StartProgress { post_id } => {
                self.engine.start_simulation(post_id, self.plan.clone());
                None
            }
            Effect::StopProgress { post_id } => {
                self.engine.stop_simulation(post_id);
                None
            }
        }
    }

    /// Waits up to `timeout` for the next engine event that maps to a message.
    pub fn next_msg(&mut self, timeout: Duration) -> Option<Msg> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let event = self.engine.recv_timeout(remaining)?;
            match &event {
                EngineEvent::QueueFetched(_) => {
                    self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1)
                }
                EngineEvent::RequestCompleted { .. } => {
                    self.requests_in_flight = self.requests_in_flight.saturating_sub(1)
                }
                _ => {}
            }
            if let Some(msg) = event_to_msg(event) {
                return Some(msg);
            }
        }
    }

    /// True when no fetch or request is waiting for an answer.
    pub fn is_idle(&self) -> bool {
        self.fetches_in_flight == 0 && self.requests_in_flight == 0
    }

    pub fn check_health(&mut self, timeout: Duration) -> Option<Result<HealthReport, ApiError>> {
        self.engine.check_health();
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if let EngineEvent::HealthChecked(result) = self.engine.recv_timeout(remaining)? {
                return Some(result);
            }
        }
    }
}

pub fn event_to_msg(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::QueueFetched(Ok(snapshot)) => Some(Msg::QueueLoaded(snapshot)),
        EngineEvent::QueueFetched(Err(err)) => Some(Msg::QueueLoadFailed(err.to_string())),
        EngineEvent::RequestCompleted {
            request,
            result: Ok(response),
        } => Some(Msg::RequestSucceeded { request, response }),
        EngineEvent::RequestCompleted {
            request,
            result: Err(err),
        } => Some(Msg::RequestFailed {
            request,
            message: err.message,
        }),
        EngineEvent::Progress { post_id, snapshot } => {
            Some(Msg::ProgressUpdated { post_id, snapshot })
        }
        EngineEvent::SimulationFinished { post_id } => Some(Msg::SimulationFinished { post_id }),
        EngineEvent::HealthChecked(result) => {
            pipeline_debug!("Unsolicited health result: {:?}", result);
            None
        }
    }
}
