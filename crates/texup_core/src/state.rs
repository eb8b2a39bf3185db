use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::view_model::AppViewModel;

/// Identifies one upload attempt. Results tagged with an older generation are stale.
pub type Generation = u64;

/// A file picked by the user, held in memory until it is uploaded or replaced.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    media_type: String,
    bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the content; cloning it does not copy the file.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn with_media_type(mut self, media_type: &str) -> Self {
        if self.media_type != media_type {
            self.media_type = media_type.to_string();
        }
        self
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Server-assigned identifier of a conversion task (`tid`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How completion of a server-side job is delivered. Fixed per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Upload, then poll the status endpoint and download the result.
    #[default]
    Poll,
    /// Upload and report success; no task tracking.
    Acknowledge,
    /// Upload as the payload of an event stream and follow its events.
    Stream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Consecutive status failures after which polling gives up.
    pub max_consecutive_failures: u32,
    /// Upper bound on the backoff factor, in ticks.
    pub max_backoff_ticks: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(3000),
            max_consecutive_failures: 5,
            max_backoff_ticks: 8,
        }
    }
}

impl PollPolicy {
    /// Number of ticks to skip after the `failures`-th consecutive failure.
    ///
    /// The first failure retries on the very next tick; later ones double the wait
    /// up to `max_backoff_ticks`.
    pub fn backoff_ticks(&self, failures: u32) -> u32 {
        if failures == 0 {
            return 0;
        }
        let factor = 1u32.checked_shl(failures - 1).unwrap_or(u32::MAX);
        factor.min(self.max_backoff_ticks.max(1)) - 1
    }
}

/// Coarse progress of the current upload, used by front ends to decide what to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activity {
    #[default]
    Idle,
    Uploading,
    Polling,
    Ready,
    Downloading,
    Streaming,
    Finished,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TrackedTask {
    pub(crate) id: TaskId,
    pub(crate) source_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct PollState {
    pub(crate) active: bool,
    pub(crate) in_flight: bool,
    pub(crate) failures: u32,
    pub(crate) skip_ticks: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    mode: DeliveryMode,
    poll_policy: PollPolicy,
    selected: Option<SelectedFile>,
    message: Option<String>,
    upload_source: Option<String>,
    task: Option<TrackedTask>,
    done: bool,
    generation: Generation,
    activity: Activity,
    poll: PollState,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: DeliveryMode, poll_policy: PollPolicy) -> Self {
        Self {
            mode,
            poll_policy,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        let busy = matches!(self.activity, Activity::Downloading);
        AppViewModel {
            mode: self.mode,
            selected_file: self.selected.as_ref().map(|file| file.name().to_string()),
            message: self.message.clone(),
            task: self.task.as_ref().map(|task| task.id.clone()),
            done: self.done,
            activity: self.activity,
            upload_enabled: self.selected.is_some(),
            download_enabled: self.can_download() && !busy,
            dirty: self.dirty,
        }
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.poll_policy
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn task(&self) -> Option<&TaskId> {
        self.task.as_ref().map(|task| &task.id)
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn is_polling(&self) -> bool {
        self.poll.active
    }

    pub(crate) fn can_download(&self) -> bool {
        self.done && self.task.is_some()
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn is_current(&self, generation: Generation) -> bool {
        generation == self.generation
    }

    pub(crate) fn tracked_task(&self) -> Option<&TrackedTask> {
        self.task.as_ref()
    }

    pub(crate) fn poll_state(&self) -> &PollState {
        &self.poll
    }

    pub(crate) fn poll_state_mut(&mut self) -> &mut PollState {
        self.dirty = true;
        &mut self.poll
    }

    pub(crate) fn select_file(&mut self, file: SelectedFile) {
        self.selected = Some(file);
        self.message = None;
        self.dirty = true;
    }

    pub(crate) fn clear_selection(&mut self, message: impl Into<String>) {
        self.selected = None;
        self.message = Some(message.into());
        self.dirty = true;
    }

    pub(crate) fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
        self.dirty = true;
    }

    pub(crate) fn set_activity(&mut self, activity: Activity) {
        self.activity = activity;
        self.dirty = true;
    }

    /// Drops the tracked task and moves to a fresh generation.
    ///
    /// Returns whether a poll timer was running and whether a stream was open,
    /// both for the generation that was just retired.
    pub(crate) fn retire_generation(&mut self) -> (Generation, bool, bool) {
        let retired = self.generation;
        let was_polling = self.poll.active;
        let was_streaming = self.activity == Activity::Streaming;
        self.generation += 1;
        self.task = None;
        self.upload_source = None;
        self.done = false;
        self.poll = PollState::default();
        self.dirty = true;
        (retired, was_polling, was_streaming)
    }

    pub(crate) fn begin_upload(&mut self, source_name: &str, activity: Activity) {
        self.upload_source = Some(source_name.to_string());
        self.activity = activity;
        self.dirty = true;
    }

    pub(crate) fn track_task(&mut self, id: TaskId) {
        let source_name = self.upload_source.take().unwrap_or_default();
        self.task = Some(TrackedTask { id, source_name });
        self.poll = PollState {
            active: true,
            ..PollState::default()
        };
        self.activity = Activity::Polling;
        self.dirty = true;
    }

    pub(crate) fn forget_upload(&mut self) {
        self.upload_source = None;
        self.task = None;
        self.dirty = true;
    }

    pub(crate) fn mark_done(&mut self) {
        self.done = true;
        self.poll.active = false;
        self.poll.in_flight = false;
        self.activity = Activity::Ready;
        self.dirty = true;
    }
}
