pub mod err;

pub mod frame;
pub use frame::{recv_frame, FrameStatus};

pub mod handshake;

pub mod line;
pub use line::{read_line, LineStatus};

pub mod session;
pub use session::{Session, SessionEnd};

mod signal;
pub use signal::*;

pub mod sys;

/// Maximum number of content bytes in a chat message sent by the client.
pub const MAX_MSG_LEN: usize = 1024;

/// Maximum number of content bytes in a username.
pub const MAX_NAME_LEN: usize = 20;

/// Capacity of the inbound buffer.
///
/// Room for a full message prefixed by `[name]: `, i.e. the `[` before the
/// name and the `]: ` after it.
pub const BUFLEN: usize = MAX_MSG_LEN + MAX_NAME_LEN + 4;

/// Message content that ends the session for whichever side sends or
/// receives it.
pub const SENTINEL: &str = "bye";

/// Return whether `msg` is exactly the sentinel.
#[inline]
pub fn is_sentinel(msg: impl AsRef<[u8]>) -> bool {
    msg.as_ref() == SENTINEL.as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_exact_match() {
        assert!(is_sentinel("bye"));
        assert!(is_sentinel(b"bye".to_vec()));
        assert!(!is_sentinel("bye!"));
        assert!(!is_sentinel(" bye"));
        assert!(!is_sentinel("Bye"));
        assert!(!is_sentinel(""));
    }

    #[test]
    fn inbound_buffer_fits_prefixed_message() {
        let prefixed = format!("[{}]: {}", "n".repeat(MAX_NAME_LEN), "m".repeat(MAX_MSG_LEN));
        assert_eq!(prefixed.len(), BUFLEN);
    }
}
