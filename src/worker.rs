/*!
The File Driver (spec component 5): opens each input, decides whether it is
eligible for the whole-file mmap strategy or must be streamed through the
`LineBuffer`, applies the binary-content policy, and dispatches to the
Line Scanner / Match Driver in `searcher`.
*/
use std::cmp;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use memmap::{Mmap, Protection};

use error::{Error, Result};
use lgrep_matcher::AnyMatcher;
use line_buffer::LineBuffer;
use pathutil::strip_prefix;
use printer::Printer;
use searcher::{self, SearchOptions, SearchState};

/// Policy for files whose content looks binary, selected by
/// `--binary-files`/`-a`/`-I`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinaryMode {
    /// Search as if the file were text.
    Text,
    /// Report only that a binary file matched, never print lines.
    Binary,
    /// Skip the file entirely, as if it never matched.
    Skip,
}

pub enum Work {
    Stdin,
    Path(::std::path::PathBuf),
}

/// Drives a single matcher over however many inputs are handed to it via
/// `run`. One `Worker` is built per process invocation and reused across
/// every input (mirroring the way the reusable input buffer is built once
/// in the original).
pub struct Worker {
    matcher: Box<AnyMatcher>,
    opts: SearchOptions,
    use_mmap: bool,
    binary_mode: BinaryMode,
    suppress_diagnostics: bool,
    line_buffer: LineBuffer,
}

impl Worker {
    pub fn new(
        matcher: Box<AnyMatcher>,
        opts: SearchOptions,
        use_mmap: bool,
        binary_mode: BinaryMode,
        suppress_diagnostics: bool,
    ) -> Worker {
        let line_buffer = LineBuffer::new(opts.eol);
        Worker {
            matcher: matcher,
            opts: opts,
            use_mmap: use_mmap,
            binary_mode: binary_mode,
            suppress_diagnostics: suppress_diagnostics,
            line_buffer: line_buffer,
        }
    }

    /// Execute the worker against a single piece of work, writing selected
    /// lines to `printer` and returning the number of matches found. I/O
    /// and matcher errors are reported to stderr here rather than
    /// propagated, mirroring the per-input error policy: one bad input
    /// must not abort the remaining inputs. The caller is told whether
    /// this input raised trouble, so it can fold that into the exit status.
    pub fn run<W: Write>(&mut self, printer: &mut Printer<W>, work: Work) -> (u64, bool) {
        let result = match work {
            Work::Stdin => {
                let stdin = io::stdin();
                self.search_stream(printer, Path::new("(standard input)"), stdin.lock(), true)
            }
            Work::Path(path) => self.search_path(printer, &path),
        };
        match result {
            Ok(count) => (count, false),
            Err(err) => {
                if !self.suppress_diagnostics {
                    eprintln!("lgrep: {}", err);
                }
                (0, true)
            }
        }
    }

    fn search_path<W: Write>(&mut self, printer: &mut Printer<W>, path: &Path) -> Result<u64> {
        let display_path = strip_prefix("./", path).unwrap_or(path);
        let file = File::open(path).map_err(|err| Error::io(err, path))?;
        let md = file.metadata().map_err(|err| Error::io(err, path))?;
        if self.use_mmap && md.len() > 0 {
            debug!("{}: searching via memory map", path.display());
            self.search_mmap(printer, display_path, &file)
        } else {
            debug!("{}: searching via streaming buffer", path.display());
            self.search_stream(printer, display_path, file, false)
        }
    }

    fn search_mmap<W: Write>(
        &mut self,
        printer: &mut Printer<W>,
        path: &Path,
        file: &File,
    ) -> Result<u64> {
        // Mapping a zero-length file fails on every platform this crate
        // cares about; such files have nothing in them, so the streaming
        // path handles them (and anything else that turns out not to be a
        // plain seekable file) correctly regardless. A mapping failure for
        // any other reason is likewise not fatal: fall back to streaming
        // rather than dropping the input.
        let mmap = match Mmap::open(file, Protection::Read) {
            Ok(mmap) => mmap,
            Err(err) => {
                debug!("{}: memory map failed ({}), falling back to streaming", path.display(), err);
                return self.search_stream(printer, path, file, false);
            }
        };
        let buf = unsafe { mmap.as_slice() };
        let upto = cmp::min(10240, buf.len());
        match self.classify(&buf[..upto]) {
            Classification::Skip => Ok(0),
            Classification::Binary => self.report_binary_only(printer, path, buf),
            Classification::Text => {
                let mut state = SearchState::new(self.opts.before_context);
                searcher::search_slice(
                    &*self.matcher, buf, path, true, printer, &self.opts, &mut state,
                )?;
                self.finish(printer, path, &state);
                Ok(state.match_count)
            }
        }
    }

    fn search_stream<W: Write, R: Read>(
        &mut self,
        printer: &mut Printer<W>,
        path: &Path,
        mut rdr: R,
        is_stdin: bool,
    ) -> Result<u64> {
        self.line_buffer.reset();
        let mut state = SearchState::new(self.opts.before_context);
        let mut save = 0usize;
        let mut classified: Option<Classification> = None;
        // Cumulative count of bytes actually pulled out of `rdr` across
        // every fill, used to reposition stdin's descriptor below.
        let mut fd_offset = 0u64;
        let mut window_len = 0usize;
        let mut consumed = 0usize;
        loop {
            let fill =
                self.line_buffer.fill(&mut rdr, save).map_err(|err| Error::io(err, path))?;
            let buf = self.line_buffer.buffer();
            if buf.is_empty() {
                break;
            }
            fd_offset += (buf.len() - save) as u64;
            let classification = *classified.get_or_insert_with(|| {
                let upto = cmp::min(10240, buf.len());
                classify_buf(self.binary_mode, self.opts.eol, &buf[..upto])
            });
            match classification {
                Classification::Skip => return Ok(0),
                Classification::Binary => {
                    return self.report_binary_only(printer, path, buf);
                }
                Classification::Text => {}
            }
            consumed = searcher::search_slice(
                &*self.matcher, buf, path, fill.eof, printer, &self.opts, &mut state,
            )?;
            window_len = buf.len();
            if state.stop {
                break;
            }
            save = buf.len() - consumed;
            if fill.eof && save == 0 {
                break;
            }
        }
        self.finish(printer, path, &state);
        if is_stdin {
            // Whatever of the last fill we pulled from the descriptor but
            // never scanned (because `-q`/`-m` stopped us early, or there
            // simply was nothing left) must be handed back: reposition the
            // descriptor to right after the last byte this search actually
            // looked at, so a caller chaining more reads onto the same
            // descriptor picks up where we left off. Failure is ignored;
            // most stdins (pipes) aren't seekable at all.
            seek_stdin_back(fd_offset - (window_len - consumed) as u64);
        }
        Ok(state.match_count)
    }

    fn classify(&self, head: &[u8]) -> Classification {
        classify_buf(self.binary_mode, self.opts.eol, head)
    }

    fn report_binary_only<W: Write>(
        &self,
        printer: &mut Printer<W>,
        path: &Path,
        buf: &[u8],
    ) -> Result<u64> {
        let mut probe = self.opts.clone();
        probe.quiet = true;
        let mut state = SearchState::new(0);
        searcher::search_slice(&*self.matcher, buf, path, true, printer, &probe, &mut state)?;
        if state.match_count > 0 {
            printer.binary_matched(path);
            Ok(1)
        } else {
            Ok(0)
        }
    }

    fn finish<W: Write>(&self, printer: &mut Printer<W>, path: &Path, state: &SearchState) {
        if self.opts.count_only {
            printer.path_count(path, state.match_count);
        }
        if self.opts.files_with_matches && state.match_count > 0 {
            printer.path(path);
        }
        if self.opts.files_without_matches && state.match_count == 0 {
            printer.path(path);
        }
    }
}

#[cfg(unix)]
fn seek_stdin_back(offset: u64) {
    use std::os::unix::io::AsRawFd;
    let stdin = io::stdin();
    unsafe {
        ::libc::lseek(stdin.as_raw_fd(), offset as ::libc::off_t, ::libc::SEEK_SET);
    }
}

#[cfg(not(unix))]
fn seek_stdin_back(_offset: u64) {}

#[derive(Clone, Copy)]
enum Classification {
    Text,
    Binary,
    Skip,
}

fn classify_buf(mode: BinaryMode, eol: u8, head: &[u8]) -> Classification {
    if mode == BinaryMode::Text || !searcher::is_binary(head, eol) {
        Classification::Text
    } else if mode == BinaryMode::Skip {
        Classification::Skip
    } else {
        Classification::Binary
    }
}
