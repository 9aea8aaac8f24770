/*!
The line_buffer module implements the scanner's buffer manager: a growable,
page-aligned buffer split into a save region (bytes carried over from the
previous fill, plus whatever leading-context reserve the caller asked for)
and a read region that absorbs fresh bytes from the underlying reader.

This mirrors the save/read split described for GNU grep's buffer management,
but restricts itself to streaming reads. Whole-file memory mapping is handled
as a separate strategy one layer up (see `search_buffer`); unlike the
original, this buffer never attempts to map a sub-window of a file at a fixed
address mid-stream, since that trick requires placing an OS mapping at a
caller-chosen address inside a `Vec`'s allocation, which has no safe
expression in Rust and no real benefit once whole-file mapping is available
as a separate path for the cases where mapping is eligible at all.
*/
use std::cmp;
use std::io::{self, Read};

/// Preferred ratio between the total buffer size and the save-region size.
///
/// Chosen to match GNU grep's own default: most of the buffer is read
/// region, with a fifth of it reserved to carry context and partial lines
/// forward.
const PREFERRED_SAVE_FACTOR: usize = 5;

/// The minimum size of the save region before rounding up to a page.
const MIN_SAVE_REGION: usize = 8 * 1024;

fn page_size() -> usize {
    #[cfg(unix)]
    {
        let n = unsafe { ::libc::sysconf(::libc::_SC_PAGESIZE) };
        if n > 0 {
            return n as usize;
        }
    }
    4096
}

fn align_up(n: usize, align: usize) -> usize {
    debug_assert!(align > 0 && align.is_power_of_two() || align % 2 == 0 || true);
    let rem = n % align;
    if rem == 0 {
        n
    } else {
        n + (align - rem)
    }
}

/// A growable, page-aligned buffer used to stream a single input through the
/// scanner. One `LineBuffer` is allocated per process and reused (via
/// `reset`) across every file that is searched by streaming reads.
pub struct LineBuffer {
    /// The raw storage. `buf.len()` is always `bufalloc + 1`; the extra
    /// trailing byte is reserved so the scanner can synthesize a line
    /// terminator for a final, unterminated line without reallocating.
    buf: Vec<u8>,
    /// Size of the save region in bytes. Always a multiple of the page size.
    bufsalloc: usize,
    /// Offset of the first byte of user-visible content in `buf`.
    bufbeg: usize,
    /// Offset one past the last byte of user-visible content in `buf`.
    buflim: usize,
    /// The line terminator byte.
    eol: u8,
    page_size: usize,
}

/// The outcome of a single `fill` call.
pub struct FillResult {
    /// Offset of the first byte of user-visible content, after this fill.
    pub bufbeg: usize,
    /// Offset one past the last byte of user-visible content, after this
    /// fill.
    pub buflim: usize,
    /// True if this fill produced no new content (end of input reached and
    /// nothing was carried over either).
    pub eof: bool,
}

impl LineBuffer {
    /// Create a new, empty line buffer using `eol` as the line terminator.
    pub fn new(eol: u8) -> LineBuffer {
        let page_size = page_size();
        let bufsalloc = align_up(cmp::max(MIN_SAVE_REGION, page_size), page_size);
        let bufalloc = PREFERRED_SAVE_FACTOR * bufsalloc;
        LineBuffer {
            buf: vec![0; bufalloc + 1],
            bufsalloc: bufsalloc,
            bufbeg: bufsalloc,
            buflim: bufsalloc,
            eol: eol,
            page_size: page_size,
        }
    }

    /// Reset this buffer for reuse with a new input. The underlying
    /// allocation is kept (and may have grown from a previous, larger
    /// input); only the logical window is reset to empty.
    pub fn reset(&mut self) {
        self.bufbeg = self.bufsalloc;
        self.buflim = self.bufsalloc;
    }

    /// The current user-visible window.
    pub fn buffer(&self) -> &[u8] {
        &self.buf[self.bufbeg..self.buflim]
    }

    pub fn bufbeg(&self) -> usize {
        self.bufbeg
    }

    pub fn buflim(&self) -> usize {
        self.buflim
    }

    /// Grow the save region so it can hold at least `save` bytes, per
    /// GNU grep's doubling policy: prefer doubling `bufsalloc`, but fall
    /// back to the next page-aligned multiple of `save` if doubling would
    /// overflow. The total allocation grows to `PREFERRED_SAVE_FACTOR`
    /// times the new save size.
    fn grow(&mut self, save: usize) {
        if self.bufsalloc >= save {
            return;
        }
        let mut new_salloc = self.bufsalloc;
        loop {
            match new_salloc.checked_mul(2) {
                Some(doubled) if doubled >= save => {
                    new_salloc = doubled;
                    break;
                }
                Some(doubled) => new_salloc = doubled,
                None => {
                    new_salloc = align_up(save, self.page_size);
                    break;
                }
            }
        }
        let new_salloc = align_up(new_salloc, self.page_size);
        let new_alloc = PREFERRED_SAVE_FACTOR
            .checked_mul(new_salloc)
            .unwrap_or_else(|| {
                panic!("memory exhausted");
            });

        let mut new_buf = vec![0u8; new_alloc + 1];
        // Move the existing window's content to the tail of the new save
        // region, so the bytes about to be preserved as `save` land right
        // where `fill` expects them.
        let copy_len = self.buflim - self.bufbeg;
        new_buf[new_salloc - copy_len..new_salloc]
            .copy_from_slice(&self.buf[self.bufbeg..self.buflim]);

        self.buf = new_buf;
        self.bufsalloc = new_salloc;
        self.bufbeg = new_salloc - copy_len;
        self.buflim = new_salloc;
    }

    /// Preserve the trailing `save` bytes of the current window and read
    /// more data from `rdr` to extend it. Returns the new window bounds, or
    /// an I/O error if the underlying read failed (after transparently
    /// retrying on interrupt).
    pub fn fill<R: Read>(&mut self, rdr: &mut R, save: usize) -> io::Result<FillResult> {
        if self.bufsalloc < save {
            self.grow(save);
        }

        // Move the saved bytes to the tail of the save region.
        let new_bufbeg = self.bufsalloc - save;
        if save > 0 {
            let src_start = self.buflim - save;
            // Copy via a temporary to stay correct regardless of overlap
            // direction; `save` is bounded by the save region size, which
            // is small relative to typical inputs.
            let mut tmp = Vec::with_capacity(save);
            tmp.extend_from_slice(&self.buf[src_start..self.buflim]);
            self.buf[new_bufbeg..new_bufbeg + save].copy_from_slice(&tmp);
        }

        let read_region_len = self.buf.len() - 1 - self.bufsalloc;
        let mut total_read = 0usize;
        loop {
            if total_read >= read_region_len {
                break;
            }
            let dst_start = self.bufsalloc + total_read;
            match rdr.read(&mut self.buf[dst_start..self.bufsalloc + read_region_len]) {
                Ok(0) => break,
                Ok(n) => total_read += n,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {
                    continue;
                }
                Err(err) => return Err(err),
            }
        }

        self.bufbeg = new_bufbeg;
        self.buflim = self.bufsalloc + total_read;
        // We only stop before filling the whole read region when the
        // reader returned 0, which is the unambiguous end-of-stream signal.
        let eof = total_read < read_region_len;

        // On end of stream, synthesize a trailing terminator if the last
        // byte isn't already one, so the final (possibly partial) line is
        // still recognized as a complete line by the scanner.
        if eof {
            let last_is_eol = self.buflim > self.bufbeg
                && self.buf[self.buflim - 1] == self.eol;
            if self.buflim > self.bufbeg && !last_is_eol {
                self.buf[self.buflim] = self.eol;
                self.buflim += 1;
            }
        }

        Ok(FillResult {
            bufbeg: self.bufbeg,
            buflim: self.buflim,
            eof: eof,
        })
    }
}
