//! Local path rules for downloads

use std::io;
use std::path::{Path, PathBuf};

const FALLBACK_NAME: &str = "bosprobe-download";

/// Last path segment of an object key or URL path
pub fn base_name(key: &str) -> String {
    key.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_NAME)
        .to_string()
}

/// Base name of the object a URL points at, percent-decoded
///
/// Malformed escapes stay as written; a name that decodes to something
/// containing a separator is kept encoded.
pub fn url_base_name(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let name = base_name(parsed.path());
            let decoded = urlencoding::decode(&name)
                .ok()
                .filter(|decoded| !decoded.is_empty() && !decoded.contains('/'))
                .map(|decoded| decoded.into_owned());
            decoded.unwrap_or(name)
        }
        Err(_) => base_name(url),
    }
}

fn ends_with_separator(path: &str) -> bool {
    path.ends_with('/') || path.ends_with(std::path::MAIN_SEPARATOR)
}

/// Where a downloaded object is written
///
/// - no path: the object's base name in the working directory
/// - an existing directory: the base name inside it
/// - a missing path ending in a separator: create it, then the base name inside
/// - any other path: create its parent and use it as the file name
///
/// The error is the directory creation failure.
pub fn destination(local_path: Option<&str>, base_name: &str) -> io::Result<PathBuf> {
    let raw = match local_path.map(str::trim).filter(|s| !s.is_empty()) {
        None => return Ok(PathBuf::from(base_name)),
        Some(raw) => raw,
    };
    let path = Path::new(raw);

    if path.is_dir() {
        return Ok(path.join(base_name));
    }

    if ends_with_separator(raw) {
        std::fs::create_dir_all(path)?;
        return Ok(path.join(base_name));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(path.to_path_buf())
}
