/*!
This crate defines the boundary between the scanning engine and the actual
pattern-matching backend. The engine never parses or compiles a pattern
itself; it only ever calls through the `Matcher` trait defined here.

A `Matcher` is a capability pair, much like the original grep's
`(compile, execute)` function pointers: `compile` runs once, `execute`
(here, `find_at`) runs many times and must not carry any hidden state
beyond what `compile` established.
*/

#[macro_use]
extern crate log;
extern crate regex;

use std::error;
use std::fmt;

mod regex_matcher;
mod registry;

pub use regex_matcher::RegexMatcher;
pub use registry::{Engine, build};

/// A byte-offset match within a haystack.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Match {
    start: usize,
    end: usize,
}

impl Match {
    /// Create a new match spanning `[start, end)`.
    pub fn new(start: usize, end: usize) -> Match {
        assert!(start <= end);
        Match { start, end }
    }

    /// The byte offset of the start of this match.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// The byte offset of the end of this match.
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// The length of this match, in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether this match is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Options that shape how a pattern is compiled, independent of the engine's
/// own dialect. The scanning engine fills these in from CLI flags; a
/// `Matcher` implementation is free to ignore options it cannot honor, but
/// the reference implementations here honor all of them.
#[derive(Clone, Debug)]
pub struct MatcherOptions {
    /// Match case-insensitively.
    pub case_insensitive: bool,
    /// Require the match to be surrounded by non-word characters (or
    /// start/end of line).
    pub whole_word: bool,
    /// Require the match to span the entire line.
    pub whole_line: bool,
    /// The byte that ends a line. The compiled pattern must never match
    /// across this byte.
    pub line_terminator: u8,
    /// Treat the pattern as a literal string rather than a regular
    /// expression (the `-F` engine).
    pub fixed_strings: bool,
}

impl Default for MatcherOptions {
    fn default() -> MatcherOptions {
        MatcherOptions {
            case_insensitive: false,
            whole_word: false,
            whole_line: false,
            line_terminator: b'\n',
            fixed_strings: false,
        }
    }
}

/// An error that can occur while compiling or running a matcher.
#[derive(Clone, Debug)]
pub enum Error {
    /// The pattern could not be compiled by the backing engine.
    Compile(String),
    /// The named engine (`-X name`) is not known to this binary.
    UnknownEngine(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Compile(ref msg) => write!(f, "{}", msg),
            Error::UnknownEngine(ref name) => {
                write!(f, "unknown matcher engine: {}", name)
            }
        }
    }
}

impl error::Error for Error {
    fn description(&self) -> &str {
        match *self {
            Error::Compile(ref msg) => msg,
            Error::UnknownEngine(_) => "unknown matcher engine",
        }
    }
}

pub type Result<T> = ::std::result::Result<T, Error>;

/// The capability pair every pattern engine exposes to the scanner.
///
/// `compile` is called exactly once, before scanning begins. `find_at` is
/// called many times afterward and must behave as a pure function of its
/// arguments: the scanner assumes no hidden state survives between calls
/// except whatever `compile` fixed in place.
pub trait Matcher: Send + Sync {
    /// Compile `pattern` (already assembled from `-e`/`-f` occurrences and
    /// joined with newlines, per the CLI layer) under the given options.
    fn compile(pattern: &[u8], opts: &MatcherOptions) -> Result<Self>
    where
        Self: Sized;

    /// Find the earliest match in `haystack[at..]`, if any, reported as
    /// absolute offsets into `haystack`.
    fn find_at(&self, haystack: &[u8], at: usize) -> Result<Option<Match>>;

    /// Find the earliest match anywhere in `haystack`.
    fn find(&self, haystack: &[u8]) -> Result<Option<Match>> {
        self.find_at(haystack, 0)
    }
}

/// An object-safe handle to a compiled matcher, used once the concrete
/// engine type has been erased behind the CLI's engine selection.
pub trait AnyMatcher: Send + Sync {
    fn find_at(&self, haystack: &[u8], at: usize) -> Result<Option<Match>>;
}

impl<M: Matcher> AnyMatcher for M {
    fn find_at(&self, haystack: &[u8], at: usize) -> Result<Option<Match>> {
        Matcher::find_at(self, haystack, at)
    }
}
