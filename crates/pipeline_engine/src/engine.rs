use std::collections::HashMap;
use std::io;
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use pipeline_core::{ApiRequest, PostId, ProgressSimulator};
use pipeline_logging::{pipeline_debug, pipeline_info};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::simulation::{run_simulation, ChannelProgressSink, ProgressSink, SimulationSettings};
use crate::{ContentApi, EngineEvent, QueueQuery};

enum EngineCommand {
    FetchQueue(QueueQuery),
    Send(ApiRequest),
    CheckHealth,
    StartSimulation {
        post_id: PostId,
        plan: ProgressSimulator,
    },
    StopSimulation {
        post_id: PostId,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EngineSettings {
    pub simulation: SimulationSettings,
}

/// Running simulations keyed by post id. The generation number lets a
/// finished task remove its own entry without touching a newer one.
#[derive(Default)]
struct Simulations {
    next_generation: u64,
    running: HashMap<PostId, (u64, CancellationToken)>,
}

type SharedSimulations = Arc<Mutex<Simulations>>;

/// Forwards simulation events and frees the registry slot before the
/// completion event goes out, so a start sent in reaction to it is accepted.
struct RegistrySink {
    simulations: SharedSimulations,
    post_id: PostId,
    generation: u64,
    inner: ChannelProgressSink,
}

impl RegistrySink {
    fn release(&self) {
        let mut registry = self.simulations.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(registry.running.get(&self.post_id), Some((current, _)) if *current == self.generation)
        {
            registry.running.remove(&self.post_id);
        }
    }
}

impl ProgressSink for RegistrySink {
    fn emit(&self, event: EngineEvent) {
        if matches!(event, EngineEvent::SimulationFinished { .. }) {
            self.release();
        }
        self.inner.emit(event);
    }
}

pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(api: Arc<dyn ContentApi>, settings: EngineSettings) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("pipeline-engine")
            .build()?;

        thread::Builder::new()
            .name("pipeline-engine".into())
            .spawn(move || {
                let simulations = SharedSimulations::default();
                while let Ok(command) = cmd_rx.recv() {
                    handle_command(
                        &runtime,
                        &api,
                        &simulations,
                        settings,
                        command,
                        &event_tx,
                    );
                }
                pipeline_debug!("Engine command channel closed, shutting down");
            })?;

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn fetch_queue(&self, query: QueueQuery) {
        let _ = self.cmd_tx.send(EngineCommand::FetchQueue(query));
    }

    pub fn send(&self, request: ApiRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Send(request));
    }

    pub fn check_health(&self) {
        let _ = self.cmd_tx.send(EngineCommand::CheckHealth);
    }

    /// Starts a progress simulation unless one is already running for `post_id`.
    pub fn start_simulation(&self, post_id: PostId, plan: ProgressSimulator) {
        let _ = self
            .cmd_tx
            .send(EngineCommand::StartSimulation { post_id, plan });
    }

    pub fn stop_simulation(&self, post_id: PostId) {
        let _ = self.cmd_tx.send(EngineCommand::StopSimulation { post_id });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

fn handle_command(
    runtime: &Runtime,
    api: &Arc<dyn ContentApi>,
    simulations: &SharedSimulations,
    settings: EngineSettings,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::FetchQueue(query) => {
            let api = api.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = api.fetch_queue(&query).await;
                let _ = event_tx.send(EngineEvent::QueueFetched(result));
            });
        }
        EngineCommand::Send(request) => {
            let api = api.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                pipeline_info!("Sending {:?}", request);
                let result = api.send(&request).await;
                let _ = event_tx.send(EngineEvent::RequestCompleted { request, result });
            });
        }
        EngineCommand::CheckHealth => {
            let api = api.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = api.health().await;
                let _ = event_tx.send(EngineEvent::HealthChecked(result));
            });
        }
        EngineCommand::StartSimulation { post_id, plan } => {
            let mut registry = simulations.lock().unwrap_or_else(PoisonError::into_inner);
            if registry.running.contains_key(&post_id) {
                pipeline_debug!("Simulation for post {} already running", post_id);
                return;
            }
            let generation = registry.next_generation;
            registry.next_generation += 1;
            let cancel = CancellationToken::new();
            registry
                .running
                .insert(post_id, (generation, cancel.clone()));
            drop(registry);

            pipeline_debug!("Starting simulation for post {}", post_id);
            let sink = RegistrySink {
                simulations: simulations.clone(),
                post_id,
                generation,
                inner: ChannelProgressSink::new(event_tx.clone()),
            };
            runtime.spawn(async move {
                if !run_simulation(post_id, plan, settings.simulation, &sink, cancel).await {
                    sink.release();
                }
            });
        }
        EngineCommand::StopSimulation { post_id } => {
            let removed = simulations
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .running
                .remove(&post_id);
            if let Some((_, cancel)) = removed {
                pipeline_debug!("Stopping simulation for post {}", post_id);
                cancel.cancel();
            }
        }
    }
}
