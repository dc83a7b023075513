//! String path helpers shared by host handles.
//!
//! Host paths are plain strings. A root starting with a drive letter or a
//! UNC prefix is treated as a Windows path; everything else uses `/`.

const SEPARATORS: &[char] = &['/', '\\'];

fn is_windows_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    let drive = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    drive || path.starts_with("\\\\")
}

fn separator(path: &str) -> char {
    if is_windows_path(path) {
        '\\'
    } else {
        '/'
    }
}

/// Whether `path` is absolute in either the posix or the Windows sense.
pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || is_windows_path(path)
}

/// Join `name` onto `root`. An absolute `name` replaces `root`.
pub fn join(root: &str, name: &str) -> String {
    if is_absolute(name) || root.is_empty() {
        return name.to_string();
    }
    let sep = separator(root);
    let base = root.trim_end_matches(SEPARATORS);
    let name = name.trim_start_matches(SEPARATORS);
    if name.is_empty() {
        return if base.is_empty() { sep.to_string() } else { root.to_string() };
    }
    format!("{base}{sep}{name}")
}

/// Parent directory of `path`. The root is its own parent.
pub fn dirname(path: &str) -> String {
    let sep = separator(path);
    let trimmed = path.trim_end_matches(SEPARATORS);

    if trimmed.is_empty() {
        return if path.is_empty() { ".".to_string() } else { sep.to_string() };
    }
    if is_windows_path(path) && trimmed.len() == 2 {
        return format!("{trimmed}{sep}");
    }

    match trimmed.rfind(SEPARATORS) {
        Some(0) => sep.to_string(),
        Some(idx) => {
            let parent = &trimmed[..idx];
            if is_windows_path(path) && parent.len() == 2 {
                format!("{parent}{sep}")
            } else {
                parent.to_string()
            }
        }
        None => ".".to_string(),
    }
}
