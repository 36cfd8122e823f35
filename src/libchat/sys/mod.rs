//! Thin wrappers around the libc calls the client is built on.

mod sock;
pub use sock::*;

mod stdin;
pub use stdin::*;

mod util;
pub use util::*;
