use crate::{Activity, DeliveryMode, TaskId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub mode: DeliveryMode,
    pub selected_file: Option<String>,
    pub message: Option<String>,
    pub task: Option<TaskId>,
    pub done: bool,
    pub activity: Activity,
    pub upload_enabled: bool,
    pub download_enabled: bool,
    pub dirty: bool,
}
