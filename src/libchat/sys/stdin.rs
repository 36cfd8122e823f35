use std::{
    io::{self, Read},
    os::unix::io::{AsRawFd, RawFd},
};

use libc::{c_void, STDIN_FILENO};

/// Unbuffered handle to standard input.
///
/// `std::io::Stdin` buffers internally, which would let a readiness wait
/// block while a complete line already sits in user space. Every `read` here
/// is a single `read(2)` on fd 0.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawStdin;

impl Read for RawStdin {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe {
            libc::read(STDIN_FILENO, buf.as_mut_ptr() as *mut c_void, buf.len())
        };
        if n < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(n as usize)
        }
    }
}

impl AsRawFd for RawStdin {
    fn as_raw_fd(&self) -> RawFd {
        STDIN_FILENO
    }
}
