/*!
Small, platform-specific path helpers. Kept minimal: the only operation this
crate still needs is stripping a literal `./` prefix from paths built by
joining a `.`-rooted recursive walk, to match grep's own convention of not
printing it.
*/
use std::ffi::OsStr;
use std::path::Path;

/// Strip `prefix` from the `path` and return the remainder.
///
/// If `path` doesn't have a prefix `prefix`, then return `None`.
#[cfg(unix)]
pub fn strip_prefix<'a, P: AsRef<Path> + ?Sized>(
    prefix: &'a P,
    path: &'a Path,
) -> Option<&'a Path> {
    use std::os::unix::ffi::OsStrExt;

    let prefix = prefix.as_ref().as_os_str().as_bytes();
    let path = path.as_os_str().as_bytes();
    if prefix.len() > path.len() || prefix != &path[0..prefix.len()] {
        None
    } else {
        Some(&Path::new(OsStr::from_bytes(&path[prefix.len()..])))
    }
}

/// Strip `prefix` from the `path` and return the remainder.
///
/// If `path` doesn't have a prefix `prefix`, then return `None`.
#[cfg(not(unix))]
pub fn strip_prefix<'a, P: AsRef<Path> + ?Sized>(
    prefix: &'a P,
    path: &'a Path,
) -> Option<&'a Path> {
    path.strip_prefix(prefix).ok()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::strip_prefix;

    #[test]
    fn strips_dot_slash() {
        let p = Path::new("./foo/bar.txt");
        assert_eq!(strip_prefix("./", p), Some(Path::new("foo/bar.txt")));
    }

    #[test]
    fn leaves_unrelated_paths_alone() {
        let p = Path::new("foo/bar.txt");
        assert_eq!(strip_prefix("./", p), None);
    }
}
