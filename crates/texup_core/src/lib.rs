//! Texup core: pure upload/poll/download state machine and view-model helpers.
mod effect;
mod filename;
mod media;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use filename::output_filename;
pub use media::{normalize_media_type, ALLOWED_MEDIA_TYPES};
pub use msg::Msg;
pub use state::{
    Activity, AppState, DeliveryMode, Generation, PollPolicy, SelectedFile, TaskId,
};
pub use update::{
    update, ACKNOWLEDGED_MESSAGE, DONE_STATUS, REJECTED_FILE_MESSAGE, STREAM_SENT_MESSAGE,
};
pub use view_model::AppViewModel;
