/*!
A single error type threaded through the whole binary. Every fallible
operation in this crate returns `error::Result<T>`; only `main` ever turns an
`Err` into a process exit code and a message on stderr.
*/
use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use lgrep_matcher;

#[derive(Debug)]
pub enum Error {
    /// An I/O failure, tagged with the path that caused it.
    Io { err: io::Error, path: PathBuf },
    /// A problem with the command line or environment configuration
    /// (conflicting flags, an unreadable `-f` file, an unknown `-X` engine
    /// name).
    Config(String),
    /// A pattern failed to compile.
    Matcher(String),
}

impl Error {
    pub fn io<P: AsRef<Path>>(err: io::Error, path: P) -> Error {
        Error::Io { err: err, path: path.as_ref().to_path_buf() }
    }

    pub fn config<S: Into<String>>(msg: S) -> Error {
        Error::Config(msg.into())
    }
}

impl From<lgrep_matcher::Error> for Error {
    fn from(err: lgrep_matcher::Error) -> Error {
        Error::Matcher(err.to_string())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io { ref err, ref path } => {
                write!(f, "{}: {}", path.display(), err)
            }
            Error::Config(ref msg) => write!(f, "{}", msg),
            Error::Matcher(ref msg) => write!(f, "{}", msg),
        }
    }
}

impl StdError for Error {
    fn description(&self) -> &str {
        match *self {
            Error::Io { ref err, .. } => err.description(),
            Error::Config(ref msg) => msg,
            Error::Matcher(ref msg) => msg,
        }
    }

    fn cause(&self) -> Option<&StdError> {
        match *self {
            Error::Io { ref err, .. } => Some(err),
            Error::Config(_) | Error::Matcher(_) => None,
        }
    }
}

pub type Result<T> = ::std::result::Result<T, Error>;
