//! Labeled block output.
//!
//! Every file is written as:
//!
//! ```text
//! --- <path> ---
//! <contents>
//! <empty line>
//! ```
//!
//! Contents are written untouched, so a file that already ends in a
//! newline is followed by two line breaks before the blank line.

use crate::models::FileRecord;
use std::io::{self, Write};
use std::path::Path;

/// Header line for a file, without the trailing newline.
pub fn header(path: &Path) -> String {
    format!("--- {} ---", path.display())
}

/// Write one complete block for a file.
pub fn write_block<W: Write>(out: &mut W, record: &FileRecord) -> io::Result<()> {
    writeln!(out, "{}", header(&record.path))?;
    out.write_all(record.contents.as_bytes())?;
    out.write_all(b"\n\n")
}

/// Write a path line (dry-run listing).
pub fn write_path<W: Write>(out: &mut W, path: &Path) -> io::Result<()> {
    writeln!(out, "{}", path.display())
}
