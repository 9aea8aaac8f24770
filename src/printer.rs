/*!
The Output Formatter. This is a much-reduced descendant of the original
printer: no color, no headings, no replacement text. What survives is the
field layout grep itself defines: an optional filename, an optional line
number or byte offset, a separator that is `:` for a matching line and `-`
for a line of context, and a `--` group separator between non-adjacent
context blocks.
*/
use std::io::{self, Write};
use std::path::Path;

pub struct Printer<W> {
    wtr: W,
    with_filename: bool,
    line_number: bool,
    byte_offset: bool,
    null_sep: bool,
}

impl<W: Write> Printer<W> {
    pub fn new(wtr: W) -> Printer<W> {
        Printer {
            wtr: wtr,
            with_filename: false,
            line_number: false,
            byte_offset: false,
            null_sep: false,
        }
    }

    /// Prefix every line with its source path.
    pub fn with_filename(mut self, yes: bool) -> Self {
        self.with_filename = yes;
        self
    }

    /// Prefix every line with its 1-based line number.
    pub fn line_number(mut self, yes: bool) -> Self {
        self.line_number = yes;
        self
    }

    /// Prefix every line with its 0-based byte offset.
    pub fn byte_offset(mut self, yes: bool) -> Self {
        self.byte_offset = yes;
        self
    }

    /// Terminate the filename field with NUL instead of `:`/`-`, per `-Z`.
    pub fn null_data(mut self, yes: bool) -> Self {
        self.null_sep = yes;
        self
    }

    pub fn into_inner(self) -> W {
        self.wtr
    }

    fn write_path(&mut self, path: &Path, field_sep: u8) -> io::Result<()> {
        if self.with_filename {
            self.wtr.write_all(path.to_string_lossy().as_bytes())?;
            if self.null_sep {
                self.wtr.write_all(b"\0")?;
            } else {
                self.wtr.write_all(&[field_sep])?;
            }
        }
        Ok(())
    }

    fn write_line(
        &mut self,
        path: &Path,
        line: &[u8],
        line_number: u64,
        byte_offset: u64,
        field_sep: u8,
    ) -> io::Result<()> {
        self.write_path(path, field_sep)?;
        if self.line_number {
            write!(self.wtr, "{}{}", line_number, field_sep as char)?;
        }
        if self.byte_offset {
            write!(self.wtr, "{}{}", byte_offset, field_sep as char)?;
        }
        self.wtr.write_all(line)?;
        if line.last() != Some(&b'\n') {
            self.wtr.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Print a selected (matching, or inverted-selected) line.
    pub fn matched(&mut self, path: &Path, line: &[u8], line_number: u64, byte_offset: u64) {
        let _ = self.write_line(path, line, line_number, byte_offset, b':');
    }

    /// Print a line of surrounding context.
    pub fn context(&mut self, path: &Path, line: &[u8], line_number: u64, byte_offset: u64) {
        let _ = self.write_line(path, line, line_number, byte_offset, b'-');
    }

    /// Print the `--` separator between two non-adjacent context blocks.
    pub fn context_separator(&mut self) {
        let _ = self.wtr.write_all(b"--\n");
    }

    /// Print just a path, for `-l`/`-L`.
    pub fn path(&mut self, path: &Path) {
        let _ = self.wtr.write_all(path.to_string_lossy().as_bytes());
        if self.null_sep {
            let _ = self.wtr.write_all(b"\0");
        } else {
            let _ = self.wtr.write_all(b"\n");
        }
    }

    /// Print a path and its match count, for `-c`.
    pub fn path_count(&mut self, path: &Path, count: u64) {
        let _ = self.write_path(path, b':');
        let _ = writeln!(self.wtr, "{}", count);
    }

    /// Print the GNU grep convention for a binary match: `Binary file
    /// <path> matches`.
    pub fn binary_matched(&mut self, path: &Path) {
        let _ = writeln!(self.wtr, "Binary file {} matches", path.display());
    }
}
