use crate::{Generation, SelectedFile, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a file.
    FileSelected(SelectedFile),
    /// The picker could not read the chosen file.
    FileUnavailable { reason: String },
    /// User clicked Upload.
    UploadClicked,
    /// User clicked Download.
    DownloadClicked,
    /// Upload endpoint answered with a task id.
    UploadAccepted { generation: Generation, task: TaskId },
    /// Fire-and-acknowledge submission succeeded.
    SubmitAcknowledged { generation: Generation },
    /// Upload, submission or stream opening failed.
    UploadFailed { generation: Generation, reason: String },
    /// Poll timer fired.
    PollTick { generation: Generation },
    /// Status endpoint answered.
    StatusReceived {
        generation: Generation,
        task: TaskId,
        status: String,
    },
    /// Status request failed or returned garbage.
    StatusFailed {
        generation: Generation,
        task: TaskId,
        reason: String,
    },
    /// Result was downloaded and written under `file_name`.
    DownloadSaved {
        generation: Generation,
        file_name: String,
    },
    DownloadFailed { generation: Generation, reason: String },
    /// `message` event received on the processing stream.
    StreamMessage { generation: Generation, data: String },
    /// `end` event received; the stream is closed.
    StreamEnded { generation: Generation, data: String },
    /// Stream broke before an `end` event.
    StreamFailed { generation: Generation, reason: String },
    /// The view is going away; stop timers and streams.
    Teardown,
    /// UI/render tick to coalesce rendering.
    Tick,
    NoOp,
}
