/// Name under which a converted result is saved: `{stem}.tex`.
///
/// Only the last path component of `original` is used. The extension is whatever
/// follows the last `.`, unless that dot starts or ends the name.
pub fn output_filename(original: &str) -> String {
    let name = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => &name[..idx],
        _ => name,
    };
    if stem.is_empty() {
        "output.tex".to_string()
    } else {
        format!("{stem}.tex")
    }
}
