//! Lexical path helpers.
//!
//! Entrypoints, changed files and dependency paths are compared as strings, so
//! they are all kept in one canonical spelling: `/`-separated, relative, with
//! no `.` components and no trailing separator. Nothing here touches the
//! filesystem or resolves symlinks.

use std::path::MAIN_SEPARATOR;

/// Normalize a relative path to its canonical `/`-separated spelling.
///
/// `./cmd/foo/` and `cmd//foo` both become `cmd/foo`. `..` removes the
/// preceding component when there is one. An empty result is `.`.
pub fn normalize(path: &str) -> String {
  let mut parts: Vec<&str> = Vec::new();
  for part in path.split(['/', '\\']) {
    match part {
      "" | "." => {}
      ".." => {
        if matches!(parts.last(), Some(last) if *last != "..") {
          parts.pop();
        } else {
          parts.push(part);
        }
      }
      _ => parts.push(part),
    }
  }
  if parts.is_empty() {
    ".".to_string()
  } else {
    parts.join("/")
  }
}

/// The directory a changed file lives in, which is its location for impact purposes.
///
/// `a/b/c.go` is located at `a/b`; a file at the repository root is located at `.`.
pub fn location(file: &str) -> String {
  let file = file.trim_end_matches('/');
  match file.rsplit_once('/') {
    Some(("", _)) => "/".to_string(),
    Some((dir, _)) => dir.to_string(),
    None => ".".to_string(),
  }
}

/// Spell `target` as an explicitly local path with a trailing separator, e.g. `./cmd/foo/`.
pub fn local_path(target: &str) -> String {
  let native: String = target
    .chars()
    .map(|c| if c == '/' { MAIN_SEPARATOR } else { c })
    .collect();
  format!(".{sep}{native}{sep}", sep = MAIN_SEPARATOR)
}

/// Turn an entrypoint into a flat file stem, e.g. `cmd/foo` -> `cmd_foo`.
pub fn flatten(target: &str) -> String {
  normalize(target).replace('/', "_")
}
