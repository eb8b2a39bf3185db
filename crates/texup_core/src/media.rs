/// Media types the conversion service accepts.
pub const ALLOWED_MEDIA_TYPES: [&str; 3] = ["application/pdf", "image/png", "image/jpeg"];

/// Returns the canonical allowed media type for `raw`, or `None` when unsupported.
///
/// Parameters after `;` are ignored and `image/jpg` is folded into `image/jpeg`.
pub fn normalize_media_type(raw: &str) -> Option<&'static str> {
    let essence = raw.split(';').next().unwrap_or(raw).trim();
    if essence.eq_ignore_ascii_case("image/jpg") {
        return Some("image/jpeg");
    }
    ALLOWED_MEDIA_TYPES
        .iter()
        .copied()
        .find(|allowed| allowed.eq_ignore_ascii_case(essence))
}
