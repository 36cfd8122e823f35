//! Null-terminated message framing on the server connection.

use std::io::{self, Read};

use tracing::{trace, warn};

use crate::is_sentinel;

/// Outcome of reading one message with `recv_frame`.
#[derive(Debug)]
pub enum FrameStatus {
    /// The buffer holds one message, terminator stripped.
    Received,
    /// The buffer holds the sentinel. The peer is ending the session.
    RemoteShutdown,
    /// The connection reached end-of-stream. The peer disconnected.
    PeerClosed,
    /// A read failed. The buffer contents are undefined.
    Failed(io::Error),
}

/// Read one null-terminated message from `src` into `buf`.
///
/// Reading is byte-at-a-time, so a message split across any number of
/// transport segments is reassembled and nothing past the terminator is
/// consumed.
///
/// At most `cap` content bytes are stored. A message that reaches `cap`
/// without a terminator is returned truncated and the rest of it stays in the
/// stream, where the next call will read it as the start of a new message.
/// Peers are expected to respect the size limit, so this only bounds memory.
pub fn recv_frame<R: Read>(
    src: &mut R,
    buf: &mut Vec<u8>,
    cap: usize,
) -> FrameStatus {
    buf.clear();
    let mut byte = [0_u8; 1];

    loop {
        match src.read(&mut byte) {
            Ok(0) => {
                // Only a close before the first byte is an orderly
                // disconnect, but a close mid-message still means no more
                // data will ever arrive.
                if !buf.is_empty() {
                    warn!(len = buf.len(), "peer closed mid-message");
                }
                return FrameStatus::PeerClosed;
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return FrameStatus::Failed(e),
        }

        if byte[0] == 0 {
            break;
        }
        buf.push(byte[0]);
        if buf.len() >= cap {
            warn!(cap, "message reached capacity without a terminator");
            break;
        }
    }

    trace!(len = buf.len(), "received message");
    if is_sentinel(buf.as_slice()) {
        FrameStatus::RemoteShutdown
    } else {
        FrameStatus::Received
    }
}
