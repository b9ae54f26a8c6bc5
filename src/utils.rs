//! Remote path helpers.
//!
//! Remote paths are plain POSIX strings computed on the client. Nothing here
//! touches the remote filesystem, so symlinks are never resolved.

/// Lexically normalizes a POSIX path.
///
/// Collapses repeated separators, drops `.` segments and folds `..` into the
/// preceding segment. Leading `..` segments of a relative path are kept; `..`
/// directly under the root is dropped. An empty result becomes `.`.
///
/// # Examples
///
/// ```
/// use sshcli::utils::normalize;
///
/// assert_eq!(normalize("/home/user/../dev//./src/"), "/home/dev/src");
/// assert_eq!(normalize("../a/./b/.."), "../a");
/// assert_eq!(normalize(""), ".");
/// ```
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&"..") | None if !absolute => parts.push(".."),
                Some(_) => {
                    parts.pop();
                }
                None => {}
            },
            _ => parts.push(part),
        }
    }

    let joined = parts.join("/");

    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Resolves `fragment` against `base` and normalizes the result.
///
/// An absolute fragment replaces the base entirely.
///
/// # Examples
///
/// ```
/// use sshcli::utils::join;
///
/// assert_eq!(join("/home/user", "projects"), "/home/user/projects");
/// assert_eq!(join("/home/user", "../other"), "/home/other");
/// assert_eq!(join("/home/user", "/tmp"), "/tmp");
/// ```
pub fn join(base: &str, fragment: &str) -> String {
    if fragment.starts_with('/') {
        normalize(fragment)
    } else {
        normalize(&format!("{}/{}", base, fragment))
    }
}
