use std::fs;
use std::path::Path;

use texup_core::{Msg, SelectedFile};
use texup_logging::{texup_debug, texup_warn};

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Media type a browser file picker would declare for `path`.
pub(crate) fn media_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => FALLBACK_MEDIA_TYPE,
    }
}

/// Reads the chosen file and turns it into the selection message for the core.
pub(crate) fn pick(path: &Path, media_type: Option<&str>) -> Msg {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match fs::read(path) {
        Ok(bytes) => {
            let media_type = media_type.unwrap_or_else(|| media_type_for(path));
            texup_debug!("picked {:?} ({}, {} bytes)", path, media_type, bytes.len());
            Msg::FileSelected(SelectedFile::new(name, media_type, bytes))
        }
        Err(err) => {
            texup_warn!("cannot read {:?}: {}", path, err);
            Msg::FileUnavailable {
                reason: err.kind().to_string(),
            }
        }
    }
}
