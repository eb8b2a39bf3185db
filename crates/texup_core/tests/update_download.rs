use std::sync::Once;

use texup_core::{update, Activity, AppState, Effect, Generation, Msg, SelectedFile, TaskId};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(texup_logging::initialize_for_tests);
}

fn select(state: AppState, name: &str, media_type: &str) -> AppState {
    let file = SelectedFile::new(name, media_type, vec![1, 2, 3]);
    update(state, Msg::FileSelected(file)).0
}

fn finished_task(name: &str) -> (AppState, Generation) {
    let state = select(AppState::new(), name, "image/jpeg");
    let (state, _) = update(state, Msg::UploadClicked);
    let generation = state.generation();
    let (state, _) = update(
        state,
        Msg::UploadAccepted {
            generation,
            task: TaskId::new("t9"),
        },
    );
    let (state, _) = update(state, Msg::PollTick { generation });
    let (state, _) = update(
        state,
        Msg::StatusReceived {
            generation,
            task: TaskId::new("t9"),
            status: "done".to_string(),
        },
    );
    (state, generation)
}

#[test]
fn download_is_noop_until_done() {
    init_logging();
    let state = select(AppState::new(), "scan.pdf", "application/pdf");
    let (state, effects) = update(state, Msg::DownloadClicked);
    assert!(effects.is_empty());

    let (state, _) = update(state, Msg::UploadClicked);
    let generation = state.generation();
    let (state, _) = update(
        state,
        Msg::UploadAccepted {
            generation,
            task: TaskId::new("t1"),
        },
    );
    assert!(!state.view().download_enabled);
    let (_, effects) = update(state, Msg::DownloadClicked);
    assert!(effects.is_empty());
}

#[test]
fn download_uses_uploaded_file_name() {
    init_logging();
    let (state, generation) = finished_task("photo.jpeg");
    // Picking another file afterwards does not rename the pending result.
    let state = select(state, "other.pdf", "application/pdf");

    let (state, effects) = update(state, Msg::DownloadClicked);
    assert_eq!(
        effects,
        vec![Effect::Download {
            generation,
            task: TaskId::new("t9"),
            file_name: "photo.tex".to_string(),
        }]
    );
    assert_eq!(state.activity(), Activity::Downloading);
    assert!(!state.view().download_enabled);

    // A second click while the first download runs is ignored.
    let (state, effects) = update(state, Msg::DownloadClicked);
    assert!(effects.is_empty());

    let (state, _) = update(
        state,
        Msg::DownloadSaved {
            generation,
            file_name: "photo.tex".to_string(),
        },
    );
    assert_eq!(state.message(), Some("saved photo.tex"));
    assert_eq!(state.activity(), Activity::Finished);
}

#[test]
fn download_failure_is_reported_and_retryable() {
    init_logging();
    let (state, generation) = finished_task("scan.jpg");
    let (state, _) = update(state, Msg::DownloadClicked);

    let (state, effects) = update(
        state,
        Msg::DownloadFailed {
            generation,
            reason: "http status 404".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.message(), Some("download failed: http status 404"));
    assert_eq!(state.activity(), Activity::Failed);
    assert!(state.view().download_enabled);

    let (_, effects) = update(state, Msg::DownloadClicked);
    assert_eq!(effects.len(), 1);
}

#[test]
fn stale_download_result_is_ignored() {
    init_logging();
    let (state, generation) = finished_task("scan.jpg");
    let (state, _) = update(state, Msg::DownloadClicked);
    let (state, _) = update(state, Msg::UploadClicked);

    let (state, _) = update(
        state,
        Msg::DownloadSaved {
            generation,
            file_name: "scan.tex".to_string(),
        },
    );
    assert_eq!(state.activity(), Activity::Uploading);
    assert_ne!(state.message(), Some("saved scan.tex"));
}
