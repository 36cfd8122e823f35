use std::{io, os::unix::io::RawFd};

use libc::{self, pollfd, POLLERR, POLLHUP, POLLIN, STDIN_FILENO};
use num_traits::{PrimInt, Unsigned};

/// Convert any unsigned int type from host byte order to network byte order.
#[inline]
pub fn hton<U: PrimInt + Unsigned>(u: U) -> U {
    u.to_be()
}

/// Return whether standard input is attached to a terminal.
#[inline]
pub fn stdin_is_tty() -> bool {
    unsafe { libc::isatty(STDIN_FILENO) == 1 }
}

/// Wrapper for `poll()` that blocks until at least one of `fds` is readable.
///
/// There is no timeout. The returned array says, per descriptor, whether a
/// read would not block; a hang-up or error condition counts as readable so
/// the caller observes it on the next read.
///
/// An interrupted wait is returned as an error of kind `Interrupted`.
pub fn poll_readable<const N: usize>(fds: [RawFd; N]) -> io::Result<[bool; N]> {
    let mut poll_fds = [pollfd {
        fd: -1,
        events: POLLIN,
        revents: 0,
    }; N];
    for (pfd, &fd) in poll_fds.iter_mut().zip(fds.iter()) {
        pfd.fd = fd;
    }

    let n_ready =
        unsafe { libc::poll(poll_fds.as_mut_ptr(), N as libc::nfds_t, -1) };
    if n_ready < 0 {
        return Err(io::Error::last_os_error());
    }

    let mut ready = [false; N];
    for (r, pfd) in ready.iter_mut().zip(poll_fds.iter()) {
        *r = pfd.revents & (POLLIN | POLLHUP | POLLERR) != 0;
    }
    Ok(ready)
}

#[cfg(test)]
mod tests {
    use std::{io::Write, os::unix::io::AsRawFd, os::unix::net::UnixStream};

    use super::*;

    #[test]
    fn hton_swaps_to_big_endian() {
        assert_eq!(hton(0x1234_u16), 0x1234_u16.to_be());
        assert_eq!(hton(1_u32).to_ne_bytes(), [0, 0, 0, 1]);
    }

    #[test]
    fn poll_reports_only_ready_sources() {
        let (mut a_tx, a_rx) = UnixStream::pair().unwrap();
        let (_b_tx, b_rx) = UnixStream::pair().unwrap();

        a_tx.write_all(b"x").unwrap();
        let ready = poll_readable([a_rx.as_raw_fd(), b_rx.as_raw_fd()]).unwrap();
        assert_eq!(ready, [true, false]);
    }

    #[test]
    fn poll_treats_hangup_as_readable() {
        let (tx, rx) = UnixStream::pair().unwrap();
        drop(tx);
        assert_eq!(poll_readable([rx.as_raw_fd()]).unwrap(), [true]);
    }
}
