//! Newline-framed input from a character stream.

use std::io::{self, Read};

use colored::Colorize;
use tracing::{trace, warn};

/// Outcome of reading one line with `read_line`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    /// The buffer holds a line of 1 to `max_len` bytes, newline stripped.
    Ok,
    /// The line had no characters before the newline.
    Empty,
    /// The stream closed (or failed) before a newline was seen. Anything read
    /// on this call is discarded.
    EndOfStream,
    /// More than `max_len` bytes preceded the newline. The buffer holds the
    /// first `max_len` of them and the rest of the line has been consumed.
    Overflow,
}

/// Read one newline-terminated line from `src` into `buf`.
///
/// `buf` is cleared first and its contents are only meaningful when the
/// result is `Ok`. Bytes are pulled one at a time so nothing past the newline
/// is consumed from `src`.
pub fn read_line<R: Read>(
    src: &mut R,
    buf: &mut Vec<u8>,
    max_len: usize,
) -> LineStatus {
    buf.clear();
    let mut count = 0_usize;
    let mut byte = [0_u8; 1];

    loop {
        match src.read(&mut byte) {
            Ok(0) => {
                trace!(count, "end of stream while reading line");
                buf.clear();
                return LineStatus::EndOfStream;
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => {
                warn!(%error, "failed to read line");
                eprintln!(
                    "{} Failed to read from stdin. {}.",
                    "Warning:".yellow().bold(),
                    error
                );
                buf.clear();
                return LineStatus::EndOfStream;
            }
        }

        if byte[0] == b'\n' {
            break;
        }
        // Past the limit keep draining to the newline without storing.
        if count < max_len {
            buf.push(byte[0]);
        }
        count += 1;
    }

    if count > max_len {
        trace!(count, max_len, "line too long");
        LineStatus::Overflow
    } else if count == 0 {
        LineStatus::Empty
    } else {
        LineStatus::Ok
    }
}
