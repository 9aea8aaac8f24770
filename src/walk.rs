/*!
The Directory Walker. Enumerates a directory tree with an explicit work
stack rather than call-stack recursion (so depth is bounded by heap, not by
the process stack on adversarial trees), and detects symlink/bind-mount
loops by checking each directory's file identity against the chain of
directories already open on the current path.

File identity is delegated to the `same-file` crate rather than comparing
raw `(dev, ino)` pairs by hand, since it gives the same loop-detection
guarantee on both Unix and Windows.
*/
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use same_file::Handle;

use error::{Error, Result};

pub struct WalkEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

enum Item {
    Enter(PathBuf),
    Exit,
    Entry(PathBuf, bool),
}

/// An iterative, depth-first directory walker with ancestor cycle
/// detection. One `Walker` is created per root path given on the command
/// line under recurse policy.
pub struct Walker {
    stack: Vec<Item>,
    ancestors: Vec<Handle>,
    suppress_diagnostics: bool,
}

impl Walker {
    pub fn new<P: AsRef<Path>>(root: P) -> Walker {
        Walker {
            stack: vec![Item::Enter(root.as_ref().to_path_buf())],
            ancestors: Vec::new(),
            suppress_diagnostics: false,
        }
    }

    /// Silence the recursive-directory-loop diagnostic this walker would
    /// otherwise print to stderr, for `-s`.
    pub fn suppress_diagnostics(mut self, yes: bool) -> Walker {
        self.suppress_diagnostics = yes;
        self
    }
}

impl Iterator for Walker {
    type Item = Result<WalkEntry>;

    fn next(&mut self) -> Option<Result<WalkEntry>> {
        loop {
            match self.stack.pop()? {
                Item::Exit => {
                    self.ancestors.pop();
                }
                Item::Entry(path, is_dir) => {
                    return Some(Ok(WalkEntry { path: path, is_dir: is_dir }));
                }
                Item::Enter(dir) => {
                    let handle = match Handle::from_path(&dir) {
                        Ok(h) => h,
                        Err(err) => return Some(Err(Error::io(err, &dir))),
                    };
                    if self.ancestors.iter().any(|h| h == &handle) {
                        if !self.suppress_diagnostics {
                            eprintln!(
                                "{}: recursive directory loop",
                                dir.display()
                            );
                        }
                        debug!("{}: skipping, already on the ancestor chain", dir.display());
                        continue;
                    }
                    let entries = match read_dir_sorted(&dir) {
                        Ok(entries) => entries,
                        Err(err) => return Some(Err(Error::io(err, &dir))),
                    };
                    debug!("{}: recursing, {} entries", dir.display(), entries.len());
                    self.ancestors.push(handle);
                    self.stack.push(Item::Exit);
                    for entry in entries.into_iter().rev() {
                        if entry.1 {
                            self.stack.push(Item::Enter(entry.0.clone()));
                        }
                        self.stack.push(Item::Entry(entry.0, entry.1));
                    }
                }
            }
        }
    }
}

/// Snapshot a directory's contents into an owned vector up front, so the
/// directory handle itself is not held open across the recursive descent
/// that follows.
///
/// Directory-ness is resolved through symlinks (`fs::metadata`, not
/// `DirEntry::file_type`), since a directory reached only via a symlink is
/// exactly the case the ancestor-chain loop detection in `next` exists to
/// catch; a broken symlink's target simply fails to resolve and the entry
/// is treated as a non-directory, surfacing as an open error later.
fn read_dir_sorted(dir: &Path) -> io::Result<Vec<(PathBuf, bool)>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_dir = fs::metadata(&path).map(|md| md.is_dir()).unwrap_or(false);
        out.push((path, is_dir));
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::Walker;

    #[test]
    fn walks_nested_files() {
        let tmp = ::std::env::temp_dir().join("lgrep-walk-test");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("a/b")).unwrap();
        fs::write(tmp.join("a/one.txt"), b"x").unwrap();
        fs::write(tmp.join("a/b/two.txt"), b"y").unwrap();

        let files: Vec<_> = Walker::new(&tmp)
            .filter_map(|r| r.ok())
            .filter(|e| !e.is_dir)
            .map(|e| e.path)
            .collect();
        assert_eq!(files.len(), 2);

        fs::remove_dir_all(&tmp).unwrap();
    }
}
