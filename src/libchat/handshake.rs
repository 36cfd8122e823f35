//! One-time identity exchange that precedes the session loop.

use std::io::{Read, Write};
use std::os::unix::io::AsRawFd;

use colored::Colorize;
use tracing::{debug, info};

use crate::{
    err::{ChatError, ChatResult},
    frame::{recv_frame, FrameStatus},
    line::{read_line, LineStatus},
    session::Session,
    sys::Connection,
    BUFLEN, MAX_NAME_LEN,
};

/// Ask for a username on `input` until a valid one is given.
///
/// Blank lines and names longer than `MAX_NAME_LEN` bytes re-prompt. The name
/// is returned as the exact bytes typed, whatever their encoding. Returns
/// `None` if `input` ends first.
pub fn prompt_username<R: Read, W: Write>(
    input: &mut R,
    out: &mut W,
    interactive: bool,
) -> ChatResult<Option<Vec<u8>>> {
    let mut buf = Vec::with_capacity(MAX_NAME_LEN);

    loop {
        if interactive {
            out.write_all(b"Enter your username: ")?;
            out.flush()?;
        }

        match read_line(input, &mut buf, MAX_NAME_LEN) {
            LineStatus::Ok => {
                debug!(name = %String::from_utf8_lossy(&buf), "username chosen");
                return Ok(Some(buf));
            }
            LineStatus::Empty => {}
            LineStatus::Overflow => eprintln!(
                "{} limit your username to {} characters.",
                "Sorry,".yellow(),
                MAX_NAME_LEN
            ),
            LineStatus::EndOfStream => {
                writeln!(out)?;
                out.flush()?;
                return Ok(None);
            }
        }
    }
}

impl<I, W, C> Session<I, W, C>
where
    I: Read + AsRawFd,
    W: Write,
    C: Connection,
{
    /// Receive the welcome message and reply with the username.
    ///
    /// A connection closed before any welcome byte means the server is at
    /// capacity and is reported as `ChatError::ServerBusy`. Every failure here
    /// is fatal to the session.
    pub fn handshake(&mut self) -> ChatResult<()> {
        match recv_frame(&mut self.sock, &mut self.inbound, BUFLEN) {
            // The welcome text is shown whatever it says.
            FrameStatus::Received | FrameStatus::RemoteShutdown => {}
            FrameStatus::PeerClosed => return Err(ChatError::ServerBusy),
            FrameStatus::Failed(e) => return Err(ChatError::Receive(e)),
        }

        let welcome = String::from_utf8_lossy(&self.inbound).into_owned();
        self.print(format!("\n{}\n\n", welcome))?;

        self.sock
            .send(&self.username)
            .map_err(ChatError::SendUsername)?;
        info!(user = %self.display_name(), "handshake complete");
        Ok(())
    }
}
