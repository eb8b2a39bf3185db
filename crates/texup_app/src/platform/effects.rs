use std::time::Duration;

use texup_core::{Effect, Msg, SelectedFile, TaskId};
use texup_engine::{EngineEvent, EngineHandle, UploadFile};
use texup_logging::{texup_debug, texup_info};

/// Executes core effects on the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            texup_debug!("effect {:?}", effect);
            match effect {
                Effect::Upload { generation, file } => {
                    self.engine.upload(generation, upload_file(&file));
                }
                Effect::Submit { generation, file } => {
                    self.engine.submit(generation, upload_file(&file));
                }
                Effect::OpenStream { generation, file } => {
                    self.engine.open_stream(generation, upload_file(&file));
                }
                Effect::CloseStream { generation } => self.engine.close_stream(generation),
                Effect::StartPolling {
                    generation,
                    interval,
                } => self.engine.start_polling(generation, interval),
                Effect::StopPolling { generation } => self.engine.stop_polling(generation),
                Effect::CheckStatus { generation, task } => {
                    self.engine.check_status(generation, task.as_str());
                }
                Effect::Download {
                    generation,
                    task,
                    file_name,
                } => {
                    texup_info!("downloading task {} as {}", task, file_name);
                    self.engine.download(generation, task.as_str(), file_name);
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(map_event)
    }
}

fn upload_file(file: &SelectedFile) -> UploadFile {
    UploadFile {
        name: file.name().to_string(),
        media_type: file.media_type().to_string(),
        bytes: file.shared_bytes(),
    }
}

/// User-facing reasons are the short failure kind; details stay in the log.
pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Uploaded { generation, result } => match result {
            Ok(tid) => Msg::UploadAccepted {
                generation,
                task: TaskId::new(tid),
            },
            Err(err) => Msg::UploadFailed {
                generation,
                reason: err.kind.to_string(),
            },
        },
        EngineEvent::Submitted { generation, result } => match result {
            Ok(()) => Msg::SubmitAcknowledged { generation },
            Err(err) => Msg::UploadFailed {
                generation,
                reason: err.kind.to_string(),
            },
        },
        EngineEvent::PollTick { generation } => Msg::PollTick { generation },
        EngineEvent::Status {
            generation,
            task,
            result,
        } => match result {
            Ok(status) => Msg::StatusReceived {
                generation,
                task: TaskId::new(task),
                status,
            },
            Err(err) => Msg::StatusFailed {
                generation,
                task: TaskId::new(task),
                reason: err.kind.to_string(),
            },
        },
        EngineEvent::Downloaded { generation, result } => match result {
            Ok(path) => Msg::DownloadSaved {
                generation,
                file_name: path.display().to_string(),
            },
            Err(err) => Msg::DownloadFailed {
                generation,
                reason: err.kind.to_string(),
            },
        },
        EngineEvent::Stream { generation, event } => Msg::StreamMessage {
            generation,
            data: event.data,
        },
        EngineEvent::StreamClosed { generation, result } => match result {
            Ok(end) => Msg::StreamEnded {
                generation,
                data: end.data,
            },
            Err(err) => Msg::StreamFailed {
                generation,
                reason: err.kind.to_string(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texup_engine::{ClientError, FailureKind};

    #[test]
    fn failures_map_to_short_reasons() {
        let event = EngineEvent::Downloaded {
            generation: 2,
            result: Err(ClientError {
                kind: FailureKind::HttpStatus(404),
                message: "404 Not Found with a very long body".to_string(),
            }),
        };
        assert_eq!(
            map_event(event),
            Msg::DownloadFailed {
                generation: 2,
                reason: "http status 404".to_string(),
            }
        );
    }

    #[test]
    fn status_keeps_task_identity() {
        let event = EngineEvent::Status {
            generation: 1,
            task: "abc".to_string(),
            result: Ok("pending".to_string()),
        };
        assert_eq!(
            map_event(event),
            Msg::StatusReceived {
                generation: 1,
                task: TaskId::new("abc"),
                status: "pending".to_string(),
            }
        );
    }
}
