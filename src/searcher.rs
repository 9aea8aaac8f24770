/*!
The searcher module is the Line Scanner and Match Driver rolled into one: it
walks a byte buffer line by line, asks the compiled pattern whether each line
is selected, and feeds selected (and contextual) lines to the Output
Formatter.

It is deliberately buffer-source agnostic. The same `search_slice` function
processes the whole-file mmap strategy (one call, one buffer, no residue) and
the streaming strategy (one call per `LineBuffer` fill); the two strategies
differ only in how `buf` was produced; see `worker` for that split.

Unlike the original grep's internal state, which keeps a pointer into one
growing buffer alive across fills, this scanner keeps pending leading-context
lines as owned byte vectors rather than buffer offsets. That avoids having to
rebase saved offsets whenever the backing buffer's save region moves during a
`LineBuffer::fill`, at the cost of a small copy for each context line held;
context windows are short (typically single digits of lines), so the copy is
immaterial.
*/
use std::collections::VecDeque;
use std::path::Path;

use memchr::memchr;

use error::Result;
use lgrep_matcher::AnyMatcher;
use printer::Printer;

/// Policy for files whose content looks binary.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinaryMode {
    /// Search as if the file were text.
    Text,
    /// Report only that a binary file matched, never print lines.
    Binary,
    /// Skip the file entirely without searching it.
    Skip,
}

#[derive(Clone, Debug)]
pub struct SearchOptions {
    pub eol: u8,
    pub invert_match: bool,
    pub line_number: bool,
    pub byte_offset: bool,
    pub count_only: bool,
    pub files_with_matches: bool,
    pub files_without_matches: bool,
    pub quiet: bool,
    pub max_count: Option<u64>,
    pub before_context: usize,
    pub after_context: usize,
}

impl Default for SearchOptions {
    fn default() -> SearchOptions {
        SearchOptions {
            eol: b'\n',
            invert_match: false,
            line_number: false,
            byte_offset: false,
            count_only: false,
            files_with_matches: false,
            files_without_matches: false,
            quiet: false,
            max_count: None,
            before_context: 0,
            after_context: 0,
        }
    }
}

/// Carries per-file state across multiple calls to `search_slice` (one call
/// per streaming fill, or a single call for a whole mmap'd file).
pub struct SearchState {
    pub match_count: u64,
    pub line_number: u64,
    pub byte_offset: u64,
    pub after_remaining: usize,
    pub pending_before: VecDeque<Vec<u8>>,
    pub pending_before_lines: VecDeque<u64>,
    pub wrote_any: bool,
    pub stop: bool,
    last_printed_line: Option<u64>,
    before_context: usize,
}

impl SearchState {
    pub fn new(before_context: usize) -> SearchState {
        SearchState {
            match_count: 0,
            line_number: 1,
            byte_offset: 0,
            after_remaining: 0,
            pending_before: VecDeque::with_capacity(before_context),
            pending_before_lines: VecDeque::with_capacity(before_context),
            wrote_any: false,
            stop: false,
            last_printed_line: None,
            before_context: before_context,
        }
    }

    fn push_before(&mut self, line: &[u8], line_number: u64) {
        if self.before_context == 0 {
            return;
        }
        if self.pending_before.len() >= self.before_context {
            self.pending_before.pop_front();
            self.pending_before_lines.pop_front();
        }
        self.pending_before.push_back(line.to_vec());
        self.pending_before_lines.push_back(line_number);
    }
}

/// Returns true if `buf` looks like binary content: it contains a NUL byte,
/// or (when the line terminator itself has been remapped to NUL via `-z`)
/// a byte with the high bit set in its place.
pub fn is_binary(buf: &[u8], eol: u8) -> bool {
    let needle = if eol == 0 { 0x80 } else { 0 };
    memchr(needle, buf).is_some()
}

/// Search `buf` (one window of input, from either a whole-file mmap or a
/// streaming fill) and report selected lines to `printer`. Returns the
/// number of bytes of `buf` that were fully consumed; any trailing bytes
/// that do not end in a line terminator are the caller's responsibility to
/// carry forward as the next fill's save region.
pub fn search_slice<W: ::std::io::Write>(
    matcher: &AnyMatcher,
    buf: &[u8],
    path: &Path,
    at_eof: bool,
    printer: &mut Printer<W>,
    opts: &SearchOptions,
    state: &mut SearchState,
) -> Result<usize> {
    // `-m 0` means stop before considering a single line: the boundary
    // case the match-count-then-check ordering below can't express, since
    // that ordering always prints/counts the match that pushes the budget
    // to its limit.
    if opts.max_count == Some(0) {
        state.stop = true;
        return Ok(buf.len());
    }

    let mut pos = 0usize;
    while pos < buf.len() {
        let line_end_incl = match memchr(opts.eol, &buf[pos..]) {
            Some(i) => pos + i + 1,
            None if at_eof => buf.len(),
            None => break,
        };
        let line_end = if line_end_incl > pos && buf[line_end_incl - 1] == opts.eol {
            line_end_incl - 1
        } else {
            line_end_incl
        };
        let line = &buf[pos..line_end];

        let m = matcher.find_at(buf, pos)?;
        let matched = match m {
            Some(ref mm) => mm.start() < line_end_incl,
            None => false,
        };
        let selected = matched != opts.invert_match;

        if selected {
            state.match_count += 1;
            if !opts.quiet
                && !opts.count_only
                && !opts.files_with_matches
                && !opts.files_without_matches
            {
                flush_before_context(printer, path, state);
                printer.matched(path, line, state.line_number, state.byte_offset);
                state.wrote_any = true;
                state.last_printed_line = Some(state.line_number);
            }
            state.pending_before.clear();
            state.pending_before_lines.clear();
            state.after_remaining = opts.after_context;

            if opts.quiet
                || opts.max_count.map_or(false, |m| state.match_count >= m)
            {
                state.stop = true;
                advance(state, (line_end_incl - pos) as u64, line_end_incl, opts);
                return Ok(line_end_incl);
            }
        } else if state.after_remaining > 0 {
            printer.context(path, line, state.line_number, state.byte_offset);
            state.wrote_any = true;
            state.last_printed_line = Some(state.line_number);
            state.after_remaining -= 1;
        } else {
            state.push_before(line, state.line_number);
        }

        let consumed = (line_end_incl - pos) as u64;
        advance(state, consumed, line_end_incl, opts);
        pos = line_end_incl;
    }
    Ok(pos)
}

fn advance(state: &mut SearchState, consumed: u64, line_end_incl: usize, opts: &SearchOptions) {
    state.line_number += 1;
    state.byte_offset += consumed;
    let _ = (line_end_incl, opts);
}

fn flush_before_context<W: ::std::io::Write>(
    printer: &mut Printer<W>,
    path: &Path,
    state: &mut SearchState,
) {
    let contiguous = match (state.last_printed_line, state.pending_before_lines.front()) {
        (Some(last), Some(&next)) => next == last + 1,
        _ => false,
    };
    if !state.pending_before.is_empty() && state.wrote_any && !contiguous {
        printer.context_separator();
    }
    while let (Some(line), Some(ln)) =
        (state.pending_before.pop_front(), state.pending_before_lines.pop_front())
    {
        printer.context(path, &line, ln, 0);
        state.wrote_any = true;
        state.last_printed_line = Some(ln);
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use lgrep_matcher::{Matcher, MatcherOptions};
    use lgrep_matcher::RegexMatcher;
    use printer::Printer;

    use super::*;

    const SHERLOCK: &'static str = "\
For the Doctor Watsons of this world, as opposed to the Sherlock
Holmeses, success in the province of detective work must always
be, to a very large extent, the result of luck. Sherlock Holmes
can extract a clew from a wisp of straw or a flake of cigar ash;
but Doctor Watson has to have it taken out for him and dusted,
and exhibited clearly, with a label attached.\n";

    fn run(pat: &str, opts: SearchOptions) -> (u64, String) {
        let matcher = RegexMatcher::compile(pat.as_bytes(), &MatcherOptions::default()).unwrap();
        let mut printer = Printer::new(Vec::new()).with_filename(true);
        let mut state = SearchState::new(opts.before_context);
        search_slice(
            &matcher,
            SHERLOCK.as_bytes(),
            Path::new("/baz.rs"),
            true,
            &mut printer,
            &opts,
            &mut state,
        ).unwrap();
        (state.match_count, String::from_utf8(printer.into_inner()).unwrap())
    }

    #[test]
    fn basic_search() {
        let (count, out) = run("Sherlock", SearchOptions::default());
        assert_eq!(2, count);
        assert_eq!(out, "\
/baz.rs:For the Doctor Watsons of this world, as opposed to the Sherlock
/baz.rs:be, to a very large extent, the result of luck. Sherlock Holmes
");
    }

    #[test]
    fn invert_match() {
        let mut opts = SearchOptions::default();
        opts.invert_match = true;
        let (count, _) = run("Sherlock", opts);
        assert_eq!(4, count);
    }

    #[test]
    fn max_count_stops_early() {
        let mut opts = SearchOptions::default();
        opts.max_count = Some(1);
        let (count, out) = run("Sherlock", opts);
        assert_eq!(1, count);
        assert_eq!(out, "\
/baz.rs:For the Doctor Watsons of this world, as opposed to the Sherlock
");
    }

    #[test]
    fn max_count_zero_matches_nothing() {
        let mut opts = SearchOptions::default();
        opts.max_count = Some(0);
        let (count, out) = run("Sherlock", opts);
        assert_eq!(0, count);
        assert_eq!(out, "");
    }

    #[test]
    fn before_context_included() {
        let mut opts = SearchOptions::default();
        opts.before_context = 1;
        let (_, out) = run("luck", opts);
        assert!(out.contains("Holmeses, success"));
    }
}
