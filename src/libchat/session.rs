//! The steady-state chat loop.

use std::{
    borrow::Cow,
    io::{self, Read, Write},
    os::unix::io::AsRawFd,
};

use colored::{ColoredString, Colorize};
use tracing::{debug, info, trace, warn};

use crate::{
    err::{ChatError, ChatResult},
    frame::{recv_frame, FrameStatus},
    is_sentinel,
    line::{read_line, LineStatus},
    sys::{poll_readable, ClientSocket, Connection},
    StopSignal, BUFLEN, MAX_MSG_LEN, MAX_NAME_LEN,
};

/// Why a session loop ended without a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user sent the sentinel.
    LocalShutdown,
    /// The server sent the sentinel.
    RemoteShutdown,
    /// The server closed the connection.
    PeerClosed,
    /// The user closed their input.
    InputClosed,
    /// A stop signal interrupted the wait.
    Interrupted,
}

/// All state for one connection to the chat server.
///
/// `input` is the user's line source and `out` is where chat output goes.
/// Warnings and connection notices go to stderr.
///
/// The username is kept as the exact bytes the user typed and is only
/// decoded for display.
///
/// The connection is released exactly once, by `close()` or when the session
/// is dropped, whichever comes first.
pub struct Session<I, W, C = ClientSocket> {
    pub(crate) sock: C,
    pub(crate) username: Vec<u8>,
    pub(crate) inbound: Vec<u8>,
    outbound: Vec<u8>,
    input: I,
    out: W,
    interactive: bool,
    stop: Option<StopSignal>,
    prompt_out_warn: ColoredString,
}

impl<I, W, C> Session<I, W, C>
where
    I: Read + AsRawFd,
    W: Write,
    C: Connection,
{
    pub fn new(
        sock: C,
        username: impl Into<Vec<u8>>,
        input: I,
        out: W,
    ) -> ChatResult<Self> {
        let username = username.into();
        if username.is_empty() || username.len() > MAX_NAME_LEN {
            return Err(format!(
                "username must be 1 to {} bytes long, got {}",
                MAX_NAME_LEN,
                username.len()
            )
            .into());
        }

        Ok(Self {
            sock,
            username,
            inbound: Vec::with_capacity(BUFLEN),
            outbound: Vec::with_capacity(MAX_MSG_LEN),
            input,
            out,
            interactive: false,
            stop: None,
            prompt_out_warn: "Warning:".yellow().bold(),
        })
    }

    /// Print the `[name]: ` prompt before every wait.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// End the loop once `stop` is raised.
    pub fn stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Release the connection. Further calls are no-ops.
    pub fn close(&mut self) {
        self.sock.close();
    }

    /// The username decoded for display.
    pub(crate) fn display_name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.username)
    }

    //==================================================
    // Utilities - IO
    //==================================================

    /// Print `msg`, ensuring that it appears on the screen even if it contains
    /// no newline by calling `flush()`.
    pub(crate) fn print(&mut self, msg: impl AsRef<[u8]>) -> ChatResult<()> {
        self.out.write_all(msg.as_ref())?;
        self.out.flush()?;
        Ok(())
    }

    /// Print `msg` with a newline.
    pub(crate) fn println(&mut self, msg: impl AsRef<[u8]>) -> ChatResult<()> {
        self.out.write_all(msg.as_ref())?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }

    /// Print `msg` to stderr with the warning prompt.
    fn print_warn(&self, msg: impl AsRef<str>) {
        eprintln!("{} {}", self.prompt_out_warn, msg.as_ref());
    }

    fn stop_requested(&self) -> bool {
        self.stop.as_ref().map_or(false, StopSignal::is_raised)
    }

    //==================================================
    // Main Loop
    //==================================================

    /// Run the session until either side ends it.
    ///
    /// Each iteration waits, without a timeout, for the user's input, the
    /// connection or the stop signal to become readable, then services the
    /// input first and the connection second. Only a failed wait is an error;
    /// send and receive failures are reported and the loop continues.
    pub fn run(&mut self) -> ChatResult<SessionEnd> {
        info!(
            user = %self.display_name(),
            fd = self.sock.as_raw_fd(),
            "session started"
        );

        loop {
            if self.stop_requested() {
                self.println("")?;
                return Ok(SessionEnd::Interrupted);
            }

            if self.interactive {
                let prompt = format!("[{}]: ", self.display_name());
                self.print(prompt.as_str().bold().to_string())?;
            }

            // poll() ignores negative descriptors.
            let stop_fd = self.stop.as_ref().map_or(-1, |s| s.as_raw_fd());
            let ready = match poll_readable([
                self.input.as_raw_fd(),
                self.sock.as_raw_fd(),
                stop_fd,
            ]) {
                Ok(r) => r,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    debug!("wait interrupted");
                    continue;
                }
                Err(e) => return Err(ChatError::Wait(e)),
            };
            trace!(input = ready[0], conn = ready[1], stop = ready[2], "ready");

            if ready[2] {
                self.println("")?;
                return Ok(SessionEnd::Interrupted);
            }
            if ready[0] {
                if let Some(end) = self.handle_input()? {
                    return Ok(end);
                }
            }
            if ready[1] {
                if let Some(end) = self.handle_connection()? {
                    return Ok(end);
                }
            }
        }
    }

    /// Read one line of user input and send it.
    fn handle_input(&mut self) -> ChatResult<Option<SessionEnd>> {
        match read_line(&mut self.input, &mut self.outbound, MAX_MSG_LEN) {
            LineStatus::Empty => Ok(None),
            LineStatus::Overflow => {
                self.println(format!(
                    "Sorry, limit your message to 1 line of at most {} characters.",
                    MAX_MSG_LEN
                ))?;
                Ok(None)
            }
            LineStatus::EndOfStream => {
                debug!("input closed");
                self.println("")?;
                Ok(Some(SessionEnd::InputClosed))
            }
            LineStatus::Ok => {
                if let Err(error) = self.sock.send(&self.outbound) {
                    warn!(%error, "failed to send message");
                    self.print_warn(format!(
                        "Failed to send message to server. {}.",
                        error
                    ));
                }
                if is_sentinel(&self.outbound) {
                    self.println("Goodbye.")?;
                    return Ok(Some(SessionEnd::LocalShutdown));
                }
                Ok(None)
            }
        }
    }

    /// Receive one message from the server and display it.
    fn handle_connection(&mut self) -> ChatResult<Option<SessionEnd>> {
        match recv_frame(&mut self.sock, &mut self.inbound, BUFLEN) {
            FrameStatus::Received => {
                let msg = String::from_utf8_lossy(&self.inbound).into_owned();
                self.println(format!("\n{}", msg))?;
                Ok(None)
            }
            FrameStatus::RemoteShutdown => {
                self.println("\nServer initiated shutdown.")?;
                Ok(Some(SessionEnd::RemoteShutdown))
            }
            FrameStatus::PeerClosed => {
                info!(fd = self.sock.as_raw_fd(), "server closed connection");
                eprintln!("\nConnection to server has been lost.");
                Ok(Some(SessionEnd::PeerClosed))
            }
            FrameStatus::Failed(error) => {
                warn!(%error, "failed to receive message");
                eprintln!();
                self.print_warn(format!(
                    "Failed to receive incoming message. {}.",
                    error
                ));
                Ok(None)
            }
        }
    }
}
