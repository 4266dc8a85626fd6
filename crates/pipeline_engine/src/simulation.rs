use std::sync::mpsc;
use std::time::Duration;

use pipeline_core::{PostId, ProgressSimulator, COMPLETION_DELAY, TICK_INTERVAL};
use pipeline_logging::pipeline_debug;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::EngineEvent;

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationSettings {
    pub tick: Duration,
    pub completion_delay: Duration,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick: TICK_INTERVAL,
            completion_delay: COMPLETION_DELAY,
        }
    }
}

/// Emits a progress snapshot every tick until the plan's estimate runs out,
/// then a completion event after the configured delay.
///
/// Returns `false` if `cancel` fired first; nothing is emitted after that.
pub async fn run_simulation(
    post_id: PostId,
    plan: ProgressSimulator,
    settings: SimulationSettings,
    sink: &dyn ProgressSink,
    cancel: CancellationToken,
) -> bool {
    let started = Instant::now();
    // interval() panics on a zero period.
    let mut ticker = tokio::time::interval(settings.tick.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                pipeline_debug!("Simulation for post {} cancelled", post_id);
                return false;
            }
            _ = ticker.tick() => {}
        }

        let snapshot = plan.snapshot(started.elapsed());
        let finished = snapshot.finished;
        sink.emit(EngineEvent::Progress { post_id, snapshot });
        if finished {
            break;
        }
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            pipeline_debug!("Simulation for post {} cancelled before completion", post_id);
            false
        }
        _ = tokio::time::sleep(settings.completion_delay) => {
            sink.emit(EngineEvent::SimulationFinished { post_id });
            true
        }
    }
}
