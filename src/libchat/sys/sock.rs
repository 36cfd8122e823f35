use std::{
    ffi::CString,
    fmt::{self, Display},
    io::{self, Read},
    mem::size_of,
    net::{Ipv4Addr, SocketAddrV4},
    os::unix::io::{AsRawFd, RawFd},
};

use libc::{
    c_int, c_void, close, connect, fcntl, in_addr, recv, sa_family_t, send,
    sockaddr, sockaddr_in, socket, socklen_t, AF_INET, F_GETFD, MSG_NOSIGNAL,
    SOCK_CLOEXEC, SOCK_STREAM,
};
use tracing::{debug, info, trace};

use super::hton;

use crate::err::{ChatError, ChatResult};

macro_rules! SIZEOF {
    ($ty:ty) => {
        size_of::<$ty>() as socklen_t
    };
}

/// Value of the descriptor once the socket has been released.
const CLOSED_FD: c_int = -1;

/// Represent an IPv4 socket address suitable for use with `ClientSocket`.
pub struct SockAddr {
    // Array has a method for casting to a mutable pointer, so use
    // single-element array to make ref->ptr cast easy
    addr: [sockaddr_in; 1],
}

impl SockAddr {
    /// Create a new SockAddr describing the given address and port.
    pub fn new(ip: Ipv4Addr, port: u16) -> Self {
        Self {
            addr: [sockaddr_in {
                sin_family: AF_INET as sa_family_t,
                sin_port: hton(port),
                sin_addr: in_addr {
                    s_addr: hton(u32::from(ip)),
                },
                sin_zero: [0; 8],
            }],
        }
    }

    /// Return a pointer suitable for use in socket API functions.
    pub fn as_ptr(&self) -> *const sockaddr {
        self.addr.as_ptr() as *const sockaddr
    }
}

impl From<SocketAddrV4> for SockAddr {
    fn from(addr: SocketAddrV4) -> Self {
        Self::new(*addr.ip(), addr.port())
    }
}

/// An interface for the connection a chat session talks over.
///
/// Reads go through `io::Read`, readiness is waited on via the raw
/// descriptor, and sends always carry a whole null-terminated message.
pub trait Connection: Read + AsRawFd {
    /// Send `msg` followed by a null terminator.
    fn send(&self, msg: &[u8]) -> io::Result<()>;

    /// Release the connection. Further calls are no-ops.
    fn close(&mut self);
}

/// An owned client-side TCP socket.
///
/// The descriptor is released exactly once: either by an explicit `close()`
/// or when the value is dropped. Closing an already closed socket is a no-op.
///
/// Implement syscall wrappers for the operations the chat client needs:
/// - connect
/// - send (whole null-terminated message)
/// - recv (via `io::Read`)
/// - close
pub struct ClientSocket {
    sock: c_int,
}

impl Drop for ClientSocket {
    fn drop(&mut self) {
        self.close();
    }
}

impl ClientSocket {
    /// Create a new, unconnected IPv4 stream socket.
    pub fn new() -> ChatResult<Self> {
        let sock = unsafe { socket(AF_INET, SOCK_STREAM | SOCK_CLOEXEC, 0) };
        if sock < 0 {
            return Err(ChatError::Socket(io::Error::last_os_error()));
        }
        debug!(sock, "created client socket");
        Ok(Self { sock })
    }

    /// Create a socket and connect it to `addr`.
    pub fn connect_to(addr: SocketAddrV4) -> ChatResult<Self> {
        let sock = Self::new()?;
        sock.connect(&SockAddr::from(addr))?;
        info!(sock = %sock, %addr, "connected to server");
        Ok(sock)
    }

    #[inline]
    pub fn fd(&self) -> c_int {
        self.sock
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.sock != CLOSED_FD
    }

    /// Wrapper for socket API `connect()`.
    pub fn connect(&self, addr: &SockAddr) -> ChatResult<()> {
        let res =
            unsafe { connect(self.sock, addr.as_ptr(), SIZEOF!(sockaddr_in)) };
        if res == 0 {
            Ok(())
        } else {
            Err(ChatError::Connect(io::Error::last_os_error()))
        }
    }

    /// Send `msg` followed by a null terminator.
    ///
    /// Fails with `InvalidInput` if `msg` contains an interior null byte since
    /// the peer would see it as two messages.
    pub fn send(&self, msg: impl AsRef<[u8]>) -> io::Result<()> {
        let msg = CString::new(msg.as_ref())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let mut rest = msg.as_bytes_with_nul();

        while !rest.is_empty() {
            let n = unsafe {
                send(
                    self.sock,
                    rest.as_ptr() as *const c_void,
                    rest.len(),
                    MSG_NOSIGNAL,
                )
            };
            if n < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            rest = &rest[n as usize..];
        }

        trace!(sock = self.sock, len = msg.as_bytes().len(), "sent message");
        Ok(())
    }

    /// Release the descriptor.
    ///
    /// Safe to call any number of times and on a descriptor the OS no longer
    /// considers valid.
    pub fn close(&mut self) {
        if !self.is_open() {
            return;
        }
        unsafe {
            if fcntl(self.sock, F_GETFD) != -1 {
                info!(sock = self.sock, "closing socket");
                close(self.sock);
            }
        }
        self.sock = CLOSED_FD;
    }
}

impl Read for ClientSocket {
    /// Wrapper for socket API `recv()`.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe {
            recv(self.sock, buf.as_mut_ptr() as *mut c_void, buf.len(), 0)
        };
        if n < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(n as usize)
        }
    }
}

impl Connection for ClientSocket {
    #[inline]
    fn send(&self, msg: &[u8]) -> io::Result<()> {
        ClientSocket::send(self, msg)
    }

    #[inline]
    fn close(&mut self) {
        ClientSocket::close(self)
    }
}

impl AsRawFd for ClientSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.sock
    }
}

impl Display for ClientSocket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ClientSocket{{{}}}", self.sock)
    }
}
