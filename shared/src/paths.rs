//! Helpers for validating include paths found in project sources.

/// Returns true if an include path is safe to join onto a project directory.
///
/// Rules:
/// - Must be non-empty
/// - Must not be absolute (leading '/' or '\\', or a drive prefix like "C:")
/// - Must not contain a ".." component
/// - Must not contain control characters or NUL
pub fn is_safe_relative_path(path: &str) -> bool {
    if path.is_empty() {
        return false;
    }

    if path.starts_with('/') || path.starts_with('\\') {
        return false;
    }

    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        return false;
    }

    if path.chars().any(|c| c == '\0' || c.is_control()) {
        return false;
    }

    !path.split(['/', '\\']).any(|component| component == "..")
}

/// Normalize separators so paths render identically on every platform.
pub fn to_project_path(path: &str) -> String {
    path.replace('\\', "/")
}
