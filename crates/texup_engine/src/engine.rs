use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use texup_logging::{texup_debug, texup_warn};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::client::{ClientSettings, ConversionApi, ReqwestClient, StreamSink};
use crate::persist::AtomicFileWriter;
use crate::{ClientError, EngineEvent, FailureKind, Generation, ServerEvent, UploadFile};

enum EngineCommand {
    Upload {
        generation: Generation,
        file: UploadFile,
    },
    Submit {
        generation: Generation,
        file: UploadFile,
    },
    CheckStatus {
        generation: Generation,
        task: String,
    },
    Download {
        generation: Generation,
        task: String,
        file_name: String,
    },
    OpenStream {
        generation: Generation,
        file: UploadFile,
    },
    CloseStream {
        generation: Generation,
    },
    StartPolling {
        generation: Generation,
        interval: Duration,
    },
    StopPolling {
        generation: Generation,
    },
}

/// Runs conversion-service I/O on a background tokio runtime.
///
/// Commands are fire-and-forget; their outcomes arrive as [`EngineEvent`]s.
/// Dropping the handle cancels timers and open streams.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings, output_dir: PathBuf) -> Result<Self, ClientError> {
        let api = Arc::new(ReqwestClient::new(settings)?);
        Ok(Self::with_api(api, AtomicFileWriter::new(output_dir)))
    }

    pub fn with_api(api: Arc<dyn ConversionApi>, writer: AtomicFileWriter) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let writer = Arc::new(writer);

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let mut workers = Workers::default();
            while let Ok(command) = cmd_rx.recv() {
                handle_command(
                    &runtime,
                    &mut workers,
                    &api,
                    &writer,
                    command,
                    event_tx.clone(),
                );
            }
            workers.cancel_all();
        });

        Self { cmd_tx, event_rx }
    }

    pub fn upload(&self, generation: Generation, file: UploadFile) {
        self.send(EngineCommand::Upload { generation, file });
    }

    pub fn submit(&self, generation: Generation, file: UploadFile) {
        self.send(EngineCommand::Submit { generation, file });
    }

    pub fn check_status(&self, generation: Generation, task: impl Into<String>) {
        self.send(EngineCommand::CheckStatus {
            generation,
            task: task.into(),
        });
    }

    pub fn download(
        &self,
        generation: Generation,
        task: impl Into<String>,
        file_name: impl Into<String>,
    ) {
        self.send(EngineCommand::Download {
            generation,
            task: task.into(),
            file_name: file_name.into(),
        });
    }

    pub fn open_stream(&self, generation: Generation, file: UploadFile) {
        self.send(EngineCommand::OpenStream { generation, file });
    }

    pub fn close_stream(&self, generation: Generation) {
        self.send(EngineCommand::CloseStream { generation });
    }

    pub fn start_polling(&self, generation: Generation, interval: Duration) {
        self.send(EngineCommand::StartPolling {
            generation,
            interval,
        });
    }

    pub fn stop_polling(&self, generation: Generation) {
        self.send(EngineCommand::StopPolling { generation });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }
}

/// Cancellation handles for long-lived work, keyed by generation.
#[derive(Default)]
struct Workers {
    timers: HashMap<Generation, CancellationToken>,
    streams: HashMap<Generation, CancellationToken>,
}

impl Workers {
    fn register(
        map: &mut HashMap<Generation, CancellationToken>,
        generation: Generation,
    ) -> CancellationToken {
        map.retain(|_, token| !token.is_cancelled());
        let token = CancellationToken::new();
        if let Some(previous) = map.insert(generation, token.clone()) {
            previous.cancel();
        }
        token
    }

    fn cancel(map: &mut HashMap<Generation, CancellationToken>, generation: Generation) {
        if let Some(token) = map.remove(&generation) {
            token.cancel();
        }
    }

    fn cancel_all(&mut self) {
        for (_, token) in self.timers.drain().chain(self.streams.drain()) {
            token.cancel();
        }
    }
}

struct ChannelStreamSink {
    generation: Generation,
    tx: mpsc::Sender<EngineEvent>,
}

impl StreamSink for ChannelStreamSink {
    fn on_event(&self, event: ServerEvent) {
        let _ = self.tx.send(EngineEvent::Stream {
            generation: self.generation,
            event,
        });
    }
}

fn handle_command(
    runtime: &tokio::runtime::Runtime,
    workers: &mut Workers,
    api: &Arc<dyn ConversionApi>,
    writer: &Arc<AtomicFileWriter>,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Upload { generation, file } => {
            let api = Arc::clone(api);
            runtime.spawn(async move {
                let result = api.upload(&file).await;
                log_failure("upload", generation, &result);
                let _ = event_tx.send(EngineEvent::Uploaded { generation, result });
            });
        }
        EngineCommand::Submit { generation, file } => {
            let api = Arc::clone(api);
            runtime.spawn(async move {
                let result = api.submit(&file).await;
                log_failure("submit", generation, &result);
                let _ = event_tx.send(EngineEvent::Submitted { generation, result });
            });
        }
        EngineCommand::CheckStatus { generation, task } => {
            let api = Arc::clone(api);
            runtime.spawn(async move {
                let result = api.status(&task).await;
                log_failure("status", generation, &result);
                let _ = event_tx.send(EngineEvent::Status {
                    generation,
                    task,
                    result,
                });
            });
        }
        EngineCommand::Download {
            generation,
            task,
            file_name,
        } => {
            let api = Arc::clone(api);
            let writer = Arc::clone(writer);
            runtime.spawn(async move {
                let result = match api.download(&task).await {
                    Ok(bytes) => writer
                        .write(&file_name, &bytes)
                        .map_err(|err| ClientError::new(FailureKind::Io, err.to_string())),
                    Err(err) => Err(err),
                };
                log_failure("download", generation, &result);
                let _ = event_tx.send(EngineEvent::Downloaded { generation, result });
            });
        }
        EngineCommand::OpenStream { generation, file } => {
            let token = Workers::register(&mut workers.streams, generation);
            let api = Arc::clone(api);
            runtime.spawn(async move {
                let sink = ChannelStreamSink {
                    generation,
                    tx: event_tx.clone(),
                };
                let outcome = api.stream(&file, &sink, &token).await;
                token.cancel();
                let result = match outcome {
                    Ok(Some(end)) => Ok(end),
                    Ok(None) => {
                        texup_debug!("stream for generation {} cancelled", generation);
                        return;
                    }
                    Err(err) => Err(err),
                };
                log_failure("stream", generation, &result);
                let _ = event_tx.send(EngineEvent::StreamClosed { generation, result });
            });
        }
        EngineCommand::CloseStream { generation } => {
            Workers::cancel(&mut workers.streams, generation);
        }
        EngineCommand::StartPolling {
            generation,
            interval,
        } => {
            let token = Workers::register(&mut workers.timers, generation);
            // `interval_at` panics on a zero period.
            let interval = interval.max(Duration::from_millis(1));
            runtime.spawn(async move {
                let mut ticker = time::interval_at(Instant::now() + interval, interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = ticker.tick() => {
                            if event_tx.send(EngineEvent::PollTick { generation }).is_err() {
                                break;
                            }
                        }
                    }
                }
            });
        }
        EngineCommand::StopPolling { generation } => {
            Workers::cancel(&mut workers.timers, generation);
        }
    }
}

fn log_failure<T>(operation: &str, generation: Generation, result: &Result<T, ClientError>) {
    if let Err(err) = result {
        texup_warn!("{} failed (generation {}): {}", operation, generation, err);
    }
}
