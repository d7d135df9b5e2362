//! Slash-separated virtual path handling.
//!
//! Every path the overlay and the bundled backends see is normalized to an
//! absolute form (`/a/b`) before it is used as a key, so that `a/b`, `/a/b`
//! and `/a//b/` all name the same entry. `..` never climbs above the root.

/// The root of every virtual filesystem.
pub const ROOT: &str = "/";

/// Normalize a virtual path to its absolute, slash-separated form.
pub fn normalize(path: &str) -> String {
    let mut components: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            name => components.push(name),
        }
    }

    if components.is_empty() {
        return ROOT.to_string();
    }

    let mut normalized = String::with_capacity(path.len() + 1);
    for component in components {
        normalized.push('/');
        normalized.push_str(component);
    }
    normalized
}

/// Join a directory and an entry name into a normalized path.
pub fn join(dir: &str, name: &str) -> String {
    normalize(&format!("{}/{}", dir, name))
}

/// The parent of a normalized path, or `None` for the root.
pub fn parent(path: &str) -> Option<String> {
    if path == ROOT {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT.to_string()),
        Some(idx) => Some(path[..idx].to_string()),
        None => Some(ROOT.to_string()),
    }
}

/// The final component of a normalized path (`/` for the root).
pub fn file_name(path: &str) -> &str {
    if path == ROOT {
        return ROOT;
    }
    path.rsplit('/').next().unwrap_or(path)
}

/// Proper ancestors of a normalized path, outermost first, excluding the root.
///
/// For `/a/b/c.txt` this yields `/a`, `/a/b`.
pub fn ancestors(path: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = parent(path);
    while let Some(dir) = current {
        if dir == ROOT {
            break;
        }
        current = parent(&dir);
        result.push(dir);
    }
    result.reverse();
    result
}

/// True if `path` is `dir` itself or lies underneath it.
pub fn is_within(path: &str, dir: &str) -> bool {
    if dir == ROOT || path == dir {
        return true;
    }
    path.strip_prefix(dir)
        .is_some_and(|rest| rest.starts_with('/'))
}
