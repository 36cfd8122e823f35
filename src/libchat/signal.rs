use std::{
    io::Write,
    os::unix::{
        io::{AsRawFd, RawFd},
        net::UnixStream,
    },
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use signal_hook::{self, low_level::pipe};
use tracing::debug;

use crate::err::ChatResult;

/// A request to stop the session, raised by a signal or by `raise()`.
///
/// Besides the flag, every raise writes a byte to a socket pair whose read
/// end is part of the session's readiness wait. A signal that lands between
/// the flag check and the wait still wakes the wait.
pub struct StopSignal {
    flag: Arc<AtomicBool>,
    wake_rx: UnixStream,
    wake_tx: UnixStream,
}

impl StopSignal {
    /// Create a stop signal not yet tied to any OS signal.
    pub fn new() -> ChatResult<Self> {
        let (wake_tx, wake_rx) = UnixStream::pair()?;
        wake_tx.set_nonblocking(true)?;
        wake_rx.set_nonblocking(true)?;
        Ok(Self {
            flag: Arc::new(AtomicBool::new(false)),
            wake_rx,
            wake_tx,
        })
    }

    /// Raise this stop signal whenever `sig` is delivered, instead of running
    /// the default action.
    pub fn register(&self, sig: libc::c_int) -> ChatResult<()> {
        // Flag first so it is already set when the wait wakes up.
        signal_hook::flag::register(sig, Arc::clone(&self.flag))?;
        pipe::register(sig, self.wake_tx.try_clone()?)?;
        Ok(())
    }

    pub fn raise(&self) {
        self.flag.store(true, Ordering::SeqCst);
        // A full pipe already guarantees a wake-up.
        let _ = (&self.wake_tx).write(&[1]);
    }

    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl AsRawFd for StopSignal {
    /// The descriptor that becomes readable once the signal is raised.
    fn as_raw_fd(&self) -> RawFd {
        self.wake_rx.as_raw_fd()
    }
}

/// Register SIGINT and SIGTERM to raise the returned stop signal instead of
/// killing the process.
pub fn setup_stop_handler() -> ChatResult<StopSignal> {
    let stop = StopSignal::new()?;
    for &sig in &[libc::SIGINT, libc::SIGTERM] {
        stop.register(sig)?;
    }
    debug!("registered stop signal handlers");
    Ok(stop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::poll_readable;

    #[test]
    fn raise_sets_flag_and_wakes_poll() {
        let stop = StopSignal::new().unwrap();
        assert!(!stop.is_raised());

        stop.raise();
        assert!(stop.is_raised());
        assert_eq!(poll_readable([stop.as_raw_fd()]).unwrap(), [true]);
    }

    #[test]
    fn raising_twice_is_harmless() {
        let stop = StopSignal::new().unwrap();
        stop.raise();
        stop.raise();
        assert!(stop.is_raised());
    }
}
