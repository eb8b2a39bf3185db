use crate::{
    normalize_media_type, output_filename, Activity, AppState, DeliveryMode, Effect, Generation, Msg,
    TaskId,
};

pub const REJECTED_FILE_MESSAGE: &str = "Only PDF or image files (JPG, PNG) are allowed.";
pub const ACKNOWLEDGED_MESSAGE: &str = "file uploaded successfully";
pub const STREAM_SENT_MESSAGE: &str = "file sent, waiting for results";
/// Terminal value of the `status` field.
pub const DONE_STATUS: &str = "done";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSelected(file) => {
            match normalize_media_type(file.media_type()) {
                Some(media_type) => state.select_file(file.with_media_type(media_type)),
                None => state.clear_selection(REJECTED_FILE_MESSAGE),
            }
            Vec::new()
        }
        Msg::FileUnavailable { reason } => {
            state.clear_selection(format!("cannot read file: {reason}"));
            Vec::new()
        }
        Msg::UploadClicked => start_upload(&mut state),
        Msg::UploadAccepted { generation, task } => {
            if !state.is_current(generation)
                || state.mode() != DeliveryMode::Poll
                || state.activity() != Activity::Uploading
            {
                return (state, Vec::new());
            }
            state.set_message(format!("task {task} is ready to go!"));
            state.track_task(task);
            vec![Effect::StartPolling {
                generation,
                interval: state.poll_policy().interval,
            }]
        }
        Msg::SubmitAcknowledged { generation } => {
            if state.is_current(generation) && state.activity() == Activity::Uploading {
                state.set_message(ACKNOWLEDGED_MESSAGE);
                state.set_activity(Activity::Finished);
            }
            Vec::new()
        }
        Msg::UploadFailed { generation, reason } => {
            if state.is_current(generation)
                && matches!(state.activity(), Activity::Uploading | Activity::Streaming)
            {
                state.forget_upload();
                state.set_message(format!("upload failed: {reason}"));
                state.set_activity(Activity::Failed);
            }
            Vec::new()
        }
        Msg::PollTick { generation } => poll_tick(&mut state, generation),
        Msg::StatusReceived {
            generation,
            task,
            status,
        } => {
            if !accepts_status(&state, generation, &task) {
                return (state, Vec::new());
            }
            let poll = state.poll_state_mut();
            poll.in_flight = false;
            poll.failures = 0;
            poll.skip_ticks = 0;
            state.set_message(format!("status: {status}"));
            if status == DONE_STATUS {
                state.mark_done();
                vec![Effect::StopPolling { generation }]
            } else {
                Vec::new()
            }
        }
        Msg::StatusFailed {
            generation,
            task,
            reason,
        } => {
            if !accepts_status(&state, generation, &task) {
                return (state, Vec::new());
            }
            let policy = state.poll_policy();
            let poll = state.poll_state_mut();
            poll.in_flight = false;
            poll.failures += 1;
            let failures = poll.failures;
            if failures >= policy.max_consecutive_failures {
                poll.active = false;
                state.set_message(format!(
                    "status check failed after {failures} attempts: {reason}"
                ));
                state.set_activity(Activity::Failed);
                vec![Effect::StopPolling { generation }]
            } else {
                poll.skip_ticks = policy.backoff_ticks(failures);
                state.set_message(format!(
                    "status check failed ({failures}/{}), retrying",
                    policy.max_consecutive_failures
                ));
                Vec::new()
            }
        }
        Msg::DownloadClicked => {
            if !state.can_download() || state.activity() == Activity::Downloading {
                return (state, Vec::new());
            }
            let Some(task) = state.tracked_task().cloned() else {
                return (state, Vec::new());
            };
            let file_name = output_filename(&task.source_name);
            state.set_message(format!("downloading {file_name}"));
            state.set_activity(Activity::Downloading);
            vec![Effect::Download {
                generation: state.generation(),
                task: task.id,
                file_name,
            }]
        }
        Msg::DownloadSaved {
            generation,
            file_name,
        } => {
            if state.is_current(generation) && state.activity() == Activity::Downloading {
                state.set_message(format!("saved {file_name}"));
                state.set_activity(Activity::Finished);
            }
            Vec::new()
        }
        Msg::DownloadFailed { generation, reason } => {
            if state.is_current(generation) && state.activity() == Activity::Downloading {
                state.set_message(format!("download failed: {reason}"));
                state.set_activity(Activity::Failed);
            }
            Vec::new()
        }
        Msg::StreamMessage { .. } => Vec::new(),
        Msg::StreamEnded { generation, data } => {
            if state.is_current(generation) && state.activity() == Activity::Streaming {
                let data = data.trim();
                if data.is_empty() {
                    state.set_message("processing finished");
                } else {
                    state.set_message(format!("processing finished: {data}"));
                }
                state.set_activity(Activity::Finished);
            }
            Vec::new()
        }
        Msg::StreamFailed { generation, reason } => {
            if state.is_current(generation) && state.activity() == Activity::Streaming {
                state.set_message(format!("stream failed: {reason}"));
                state.set_activity(Activity::Failed);
            }
            Vec::new()
        }
        Msg::Teardown => {
            let effects = retire(&mut state);
            if !matches!(state.activity(), Activity::Finished | Activity::Failed) {
                state.set_activity(Activity::Idle);
            }
            effects
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn start_upload(state: &mut AppState) -> Vec<Effect> {
    let Some(file) = state.selected_file().cloned() else {
        return Vec::new();
    };

    let mut effects = retire(state);
    let generation = state.generation();
    match state.mode() {
        DeliveryMode::Poll => {
            state.begin_upload(file.name(), Activity::Uploading);
            state.set_message(format!("uploading {}", file.name()));
            effects.push(Effect::Upload { generation, file });
        }
        DeliveryMode::Acknowledge => {
            state.begin_upload(file.name(), Activity::Uploading);
            state.set_message(format!("uploading {}", file.name()));
            effects.push(Effect::Submit { generation, file });
        }
        DeliveryMode::Stream => {
            state.begin_upload(file.name(), Activity::Streaming);
            state.set_message(STREAM_SENT_MESSAGE);
            effects.push(Effect::OpenStream { generation, file });
        }
    }
    effects
}

/// Moves to a new generation and stops whatever the old one had running.
fn retire(state: &mut AppState) -> Vec<Effect> {
    let (retired, was_polling, was_streaming) = state.retire_generation();
    let mut effects = Vec::new();
    if was_polling {
        effects.push(Effect::StopPolling {
            generation: retired,
        });
    }
    if was_streaming {
        effects.push(Effect::CloseStream {
            generation: retired,
        });
    }
    effects
}

fn poll_tick(state: &mut AppState, generation: Generation) -> Vec<Effect> {
    if !state.is_current(generation) || !state.is_polling() || state.poll_state().in_flight {
        return Vec::new();
    }
    let Some(task) = state.task().cloned() else {
        return Vec::new();
    };
    let poll = state.poll_state_mut();
    if poll.skip_ticks > 0 {
        poll.skip_ticks -= 1;
        return Vec::new();
    }
    poll.in_flight = true;
    vec![Effect::CheckStatus { generation, task }]
}

fn accepts_status(state: &AppState, generation: Generation, task: &TaskId) -> bool {
    state.is_current(generation)
        && state.is_polling()
        && state.poll_state().in_flight
        && state.task() == Some(task)
}
