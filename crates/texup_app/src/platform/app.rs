use std::time::Duration;

use anyhow::{Context, Result};
use texup_core::{update, Activity, AppState, Msg};
use texup_engine::EngineHandle;
use texup_logging::{texup_info, LevelFilter, LogDestination};

use super::config::{load_file_config, AppConfig, FileConfig};
use super::effects::EffectRunner;
use super::picker;
use super::render::StatusPrinter;
use crate::cli::Cli;

/// How long one wait for engine events may block before the loop re-checks state.
const EVENT_WAIT: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    Failed,
}

impl RunOutcome {
    pub fn succeeded(self) -> bool {
        self == RunOutcome::Succeeded
    }
}

pub fn run(cli: Cli) -> Result<RunOutcome> {
    let file_config = match &cli.config {
        Some(path) => load_file_config(path)?,
        None => FileConfig::default(),
    };
    let config = AppConfig::resolve(&cli, file_config)?;
    init_logging(&cli, &config);

    texup_info!(
        "texup starting: server={} mode={:?} output={:?}",
        config.client.base_url,
        config.mode,
        config.output_dir
    );
    let engine = EngineHandle::new(config.client.clone(), config.output_dir.clone())
        .context("cannot set up the conversion client")?;

    let mut session = Session {
        state: AppState::with_mode(config.mode, config.poll),
        runner: EffectRunner::new(engine),
        printer: StatusPrinter::new(cli.quiet),
    };

    session.dispatch(picker::pick(&cli.input, cli.media_type.as_deref()));
    if !session.state.view().upload_enabled {
        return Ok(RunOutcome::Failed);
    }
    session.dispatch(Msg::UploadClicked);

    let outcome = loop {
        let view = session.state.view();
        match view.activity {
            Activity::Finished => break RunOutcome::Succeeded,
            Activity::Failed => break RunOutcome::Failed,
            Activity::Ready if view.download_enabled => session.dispatch(Msg::DownloadClicked),
            _ => {}
        }
        let msg = session.runner.next_msg(EVENT_WAIT).unwrap_or(Msg::Tick);
        session.dispatch(msg);
    };

    session.dispatch(Msg::Teardown);
    Ok(outcome)
}

struct Session {
    state: AppState,
    runner: EffectRunner,
    printer: StatusPrinter,
}

impl Session {
    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            self.printer.render(&state.view());
        }
        self.state = state;
        self.runner.enqueue(effects);
    }
}

fn init_logging(cli: &Cli, config: &AppConfig) {
    let level = if cli.quiet {
        LevelFilter::Error
    } else {
        match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    let destination = match &config.log_file {
        Some(path) => LogDestination::Both(path.clone()),
        None => LogDestination::Terminal,
    };
    texup_logging::initialize(destination, level);
}

