use std::time::Duration;

use crate::{Generation, SelectedFile, TaskId};

/// Side effects requested by `update`. Every variant carries the generation it
/// belongs to so results can be matched back or discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// POST the file and expect a task id back.
    Upload {
        generation: Generation,
        file: SelectedFile,
    },
    /// POST the file and only check that the server accepted it.
    Submit {
        generation: Generation,
        file: SelectedFile,
    },
    /// POST the file as the payload of an event stream.
    OpenStream {
        generation: Generation,
        file: SelectedFile,
    },
    CloseStream { generation: Generation },
    StartPolling {
        generation: Generation,
        interval: Duration,
    },
    StopPolling { generation: Generation },
    CheckStatus { generation: Generation, task: TaskId },
    Download {
        generation: Generation,
        task: TaskId,
        file_name: String,
    },
}
