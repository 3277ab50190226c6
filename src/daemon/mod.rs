//! Daemon side of the control socket.
//!
//! multipathd answers commands such as `show maps raw format %w|%n` on its
//! abstract socket. This module carries the keyword table and fingerprint
//! dispatcher those commands go through, and a small threaded [`Server`]
//! that speaks the same framing as the client. [`MockTopology`] wires the
//! three `raw format` listings the client needs to canned replies, so the
//! client can be exercised without a running multipathd.

pub mod dispatch;
pub mod keys;
pub mod server;

pub use dispatch::{CmdError, CmdKey, Command, Dispatcher, HandlerFn};
pub use keys::{Key, KeyCode, KeyMatch, Keywords};
pub use server::{MockTopology, Server};
