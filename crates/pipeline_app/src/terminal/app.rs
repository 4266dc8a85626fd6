use std::collections::VecDeque;
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use log::LevelFilter;
use pipeline_core::{update, Action, AppState, Msg, PostId, RegenerateOptions, Severity, Tab};
use pipeline_engine::{EngineHandle, PollScheduler, ReqwestContentApi};
use pipeline_logging::{parse_level, pipeline_debug, pipeline_info, pipeline_warn};

use super::cli::{Cli, Command};
use super::config::AppConfig;
use super::effects::{AutoConfirm, Confirmer, EffectRunner, StdinConfirmer};
use super::{logging, render};

/// Longest pause between checks of the poll timer while watching.
const WATCH_WAKEUP: Duration = Duration::from_millis(250);

pub fn run_app() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.write_default_config {
        AppConfig::default().save(&cli.config)?;
        println!("Wrote default configuration to {}", cli.config.display());
        return Ok(ExitCode::SUCCESS);
    }

    let (mut config, load_warning) = match AppConfig::load(&cli.config) {
        Ok(loaded) => (loaded.unwrap_or_default(), None),
        Err(err) => (AppConfig::default(), Some(format!("{err:#}"))),
    };
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    let level = parse_level(&config.log_level);
    logging::initialize(config.log_destination, level.unwrap_or(LevelFilter::Info));
    if let Some(warning) = load_warning {
        pipeline_warn!("{}; using defaults", warning);
    }
    if level.is_none() {
        pipeline_warn!("Unknown log level {:?}, using info", config.log_level);
    }

    let api = ReqwestContentApi::new(config.client_settings())
        .with_context(|| format!("invalid backend url {:?}", config.base_url))?;
    pipeline_info!("Using backend at {}", api.base_url());
    let engine = EngineHandle::new(Arc::new(api), config.engine_settings())
        .context("failed to start engine")?;
    let confirmer: Box<dyn Confirmer> = if cli.yes {
        Box::new(AutoConfirm)
    } else {
        Box::new(StdinConfirmer)
    };
    let mut session = Session::new(EffectRunner::new(engine, confirmer), &config);

    let command = cli.command.unwrap_or(Command::Watch { once: false });
    match &command {
        Command::Watch { once } => session.watch(*once),
        Command::Queue { tab } => session.print_queue((*tab).into()),
        Command::Approve { id } => session.act(*id, Action::Approve),
        Command::ApproveVideo { id } => session.act(*id, Action::ApproveVideo),
        Command::Reject { id } => session.act(*id, Action::Reject),
        Command::GenerateVideo { id } => session.act(*id, Action::GenerateVideo),
        Command::Regenerate { id, .. } => {
            let options = command.regenerate_options().unwrap_or_default();
            session.regenerate(*id, options)
        }
        Command::Health => session.health(),
    }
}

/// One run of the state machine against the engine.
struct Session {
    state: AppState,
    runner: EffectRunner,
    response_wait: Duration,
    poll_interval: Duration,
    last_fetch_error: Option<String>,
    declined: bool,
}

impl Session {
    fn new(runner: EffectRunner, config: &AppConfig) -> Self {
        Self {
            state: AppState::with_queue_limit(config.queue_limit()),
            runner,
            response_wait: config.response_wait(),
            poll_interval: config.poll_interval(),
            last_fetch_error: None,
            declined: false,
        }
    }

    /// Applies `msg` and every message its effects answer synchronously.
    fn dispatch(&mut self, msg: Msg) {
        let mut inbox = VecDeque::from([msg]);
        while let Some(msg) = inbox.pop_front() {
            match &msg {
                Msg::QueueLoaded(_) => self.last_fetch_error = None,
                Msg::QueueLoadFailed(message) => self.last_fetch_error = Some(message.clone()),
                Msg::ConfirmationResolved { accepted: false } => self.declined = true,
                _ => {}
            }
            let state = std::mem::take(&mut self.state);
            let (state, effects) = update(state, msg);
            self.state = state;
            for effect in effects {
                inbox.extend(self.runner.run(effect));
            }
        }
    }

    /// Feeds engine results back until no fetch or request is outstanding.
    fn settle(&mut self) -> Result<()> {
        while !self.runner.is_idle() {
            match self.runner.next_msg(self.response_wait) {
                Some(msg) => self.dispatch(msg),
                None => bail!("backend did not answer within {:?}", self.response_wait),
            }
        }
        Ok(())
    }

    fn load(&mut self) -> Result<()> {
        self.dispatch(Msg::Started);
        self.settle()?;
        if let Some(err) = &self.last_fetch_error {
            bail!("could not load the queue: {err}");
        }
        Ok(())
    }

    fn watch(&mut self, once: bool) -> Result<ExitCode> {
        self.load()?;
        let mut stdout = io::stdout();
        let clear = stdout.is_terminal();
        self.redraw(&mut stdout, clear)?;
        if once {
            return Ok(ExitCode::SUCCESS);
        }

        let mut scheduler = PollScheduler::with_system_clock(self.poll_interval);
        scheduler.start();
        loop {
            let wait = scheduler
                .time_until_due()
                .map_or(WATCH_WAKEUP, |due| due.min(WATCH_WAKEUP));
            if let Some(msg) = self.runner.next_msg(wait) {
                self.dispatch(msg);
                while let Some(msg) = self.runner.next_msg(Duration::ZERO) {
                    self.dispatch(msg);
                }
            }
            if scheduler.poll_due() {
                self.dispatch(Msg::PollTick);
            }
            if self.state.consume_dirty() {
                self.redraw(&mut stdout, clear)?;
            }
        }
    }

    fn redraw(&self, out: &mut impl Write, clear: bool) -> io::Result<()> {
        if clear {
            write!(out, "\x1b[2J\x1b[H")?;
        }
        let updated = Local::now().format("%H:%M:%S").to_string();
        writeln!(out, "{}", render::render(&self.state.view(), &updated))?;
        out.flush()
    }

    fn print_queue(&mut self, tab: Tab) -> Result<ExitCode> {
        self.load()?;
        self.dispatch(Msg::TabSelected(tab));
        self.redraw(&mut io::stdout(), false)?;
        Ok(ExitCode::SUCCESS)
    }

    fn act(&mut self, post_id: PostId, action: Action) -> Result<ExitCode> {
        self.load()?;
        self.dispatch(Msg::ActionRequested { post_id, action });
        self.settle()?;
        Ok(self.report(post_id))
    }

    fn regenerate(&mut self, post_id: PostId, options: RegenerateOptions) -> Result<ExitCode> {
        self.load()?;
        self.dispatch(Msg::ActionRequested {
            post_id,
            action: Action::Regenerate,
        });
        self.dispatch(Msg::RegenerateVariantsChosen(options.variant_count));
        if let Some(dialog) = self.state.view().regenerate {
            println!("{}", render::render_quote(post_id, dialog.kind, &dialog.quote));
            self.dispatch(Msg::RegenerateSubmitted { options });
            self.settle()?;
            if self.state.regenerate_dialog().is_some() {
                self.dispatch(Msg::RegenerateCancelled);
            }
        }
        Ok(self.report(post_id))
    }

    fn report(&self, post_id: PostId) -> ExitCode {
        if self.declined {
            println!("Cancelled, nothing was sent.");
            return ExitCode::SUCCESS;
        }
        let Some(notice) = self.state.notice() else {
            pipeline_debug!("Action on post {} finished without a notice", post_id);
            return ExitCode::SUCCESS;
        };
        if notice.severity == Severity::Error {
            eprintln!("Error: {}", notice.text);
            return ExitCode::FAILURE;
        }

        println!("{}", notice.text);
        if let Some(post) = self.state.post(post_id) {
            println!("Post {} is now {}", post.id, post.effective_status());
        }
        for tracked in self.state.tracker().ids() {
            println!("Video for post {tracked} is in production");
        }
        ExitCode::SUCCESS
    }

    fn health(&mut self) -> Result<ExitCode> {
        match self.runner.check_health(self.response_wait) {
            None => bail!("backend did not answer within {:?}", self.response_wait),
            Some(Ok(report)) => {
                println!("{}", render::render_health(&report));
                Ok(if report.is_healthy() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                })
            }
            Some(Err(err)) => {
                eprintln!("Backend unreachable: {err}");
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
