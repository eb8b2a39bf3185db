//! Settings resolution: defaults, then the RON file, then command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use ron::extensions::Extensions;
use serde::Deserialize;
use texup_core::{DeliveryMode, PollPolicy};
use texup_engine::{ClientSettings, TextMode};

use crate::cli::{Cli, ModeSetting, TextModeSetting};

const DEFAULT_OUTPUT_DIR: &str = "output";

/// Contents of a `--config` file. Every field is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub server: Option<String>,
    pub mode: Option<ModeSetting>,
    pub text_mode: Option<TextModeSetting>,
    pub output_dir: Option<PathBuf>,
    pub poll_interval_ms: Option<u64>,
    pub max_poll_failures: Option<u32>,
    pub connect_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub stream_idle_timeout_ms: Option<u64>,
    pub max_download_bytes: Option<u64>,
    pub upload_path: Option<String>,
    pub status_path: Option<String>,
    pub download_path: Option<String>,
    pub process_path: Option<String>,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub(crate) struct AppConfig {
    pub client: ClientSettings,
    pub mode: DeliveryMode,
    pub poll: PollPolicy,
    pub output_dir: PathBuf,
    pub log_file: Option<PathBuf>,
}

pub(crate) fn load_file_config(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_file_config(&content).with_context(|| format!("invalid config file {}", path.display()))
}

pub(crate) fn parse_file_config(content: &str) -> Result<FileConfig> {
    let options = ron::Options::default().with_default_extension(Extensions::IMPLICIT_SOME);
    Ok(options.from_str(content)?)
}

impl AppConfig {
    pub(crate) fn resolve(cli: &Cli, file: FileConfig) -> Result<Self> {
        let mut client = ClientSettings::default();
        if let Some(server) = cli.server.clone().or(file.server) {
            client.base_url = server;
        }
        if let Some(text_mode) = cli.text_mode.or(file.text_mode) {
            client.text_mode = text_mode.into();
        }
        client.upload_path = file.upload_path;
        if let Some(path) = file.status_path {
            client.status_path = path;
        }
        if let Some(path) = file.download_path {
            client.download_path = path;
        }
        if let Some(path) = file.process_path {
            client.process_path = path;
        }
        if let Some(ms) = file.connect_timeout_ms {
            client.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = file.request_timeout_ms {
            client.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = file.stream_idle_timeout_ms {
            client.stream_idle_timeout = Duration::from_millis(ms);
        }
        if let Some(max) = file.max_download_bytes {
            client.max_download_bytes = max;
        }

        let mut poll = PollPolicy::default();
        if let Some(ms) = cli.poll_interval_ms.or(file.poll_interval_ms) {
            if ms == 0 {
                bail!("poll interval must be greater than zero");
            }
            poll.interval = Duration::from_millis(ms);
        }
        if let Some(max) = cli.max_poll_failures.or(file.max_poll_failures) {
            if max == 0 {
                bail!("max poll failures must be at least 1");
            }
            poll.max_consecutive_failures = max;
        }

        let mode: DeliveryMode = cli.mode.or(file.mode).map(Into::into).unwrap_or_default();
        let output_dir = cli
            .output_dir
            .clone()
            .or(file.output_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        Ok(Self {
            client,
            mode,
            poll,
            output_dir,
            log_file: cli.log_file.clone().or(file.log_file),
        })
    }
}

impl From<ModeSetting> for DeliveryMode {
    fn from(value: ModeSetting) -> Self {
        match value {
            ModeSetting::Poll => DeliveryMode::Poll,
            ModeSetting::Acknowledge => DeliveryMode::Acknowledge,
            ModeSetting::Stream => DeliveryMode::Stream,
        }
    }
}

impl From<TextModeSetting> for TextMode {
    fn from(value: TextModeSetting) -> Self {
        match value {
            TextModeSetting::Verbatim => TextMode::Verbatim,
            TextModeSetting::Rewriting => TextMode::Rewriting,
            TextModeSetting::Summarizing => TextMode::Summarizing,
        }
    }
}
