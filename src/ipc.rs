//! Length-prefixed request/response dialogue with multipathd.
//!
//! A frame is a native-endian, native-width `usize` length followed by that
//! many payload bytes, the last of which is a NUL. Both ends must agree on
//! the width of `usize`; a 32-bit client cannot talk to a 64-bit daemon.

use std::mem;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::time::Duration;

use rustix::event::{poll, PollFd, PollFlags};
use rustix::io::Errno;
use rustix::net::{AddressFamily, SendFlags, SocketAddrUnix, SocketType};

use crate::context::Context;
use crate::errcode::{DmmpError, Result};

/// Abstract-namespace endpoint of multipathd, without the leading NUL.
pub const DEFAULT_SOCKET_NAME: &str = "/org/kernel/linux/storage/multipathd";

/// On a system with 10k paths a full snapshot takes about 1.5 seconds.
pub const DEFAULT_IPC_TIMEOUT: Duration = Duration::from_secs(60);

const RECV_CHUNK: usize = 64 * 1024;

/// Blocks SIGPIPE for the calling thread until dropped.
struct SigpipeBlock {
    old: libc::sigset_t,
}

impl SigpipeBlock {
    fn new() -> Self {
        unsafe {
            let mut set: libc::sigset_t = mem::zeroed();
            let mut old: libc::sigset_t = mem::zeroed();
            libc::sigemptyset(&mut set);
            libc::sigaddset(&mut set, libc::SIGPIPE);
            libc::pthread_sigmask(libc::SIG_BLOCK, &set, &mut old);
            Self { old }
        }
    }
}

impl Drop for SigpipeBlock {
    fn drop(&mut self) {
        unsafe {
            libc::pthread_sigmask(libc::SIG_SETMASK, &self.old, std::ptr::null_mut());
        }
    }
}

fn poll_timeout_ms(ctx: &Context) -> i32 {
    i32::try_from(ctx.ipc_timeout().as_millis()).unwrap_or(i32::MAX)
}

/// Connect to the daemon's abstract socket named by the context.
pub(crate) fn connect(ctx: &Context) -> Result<OwnedFd> {
    let fd = rustix::net::socket(AddressFamily::UNIX, SocketType::STREAM, None)
        .map_err(|e| {
            ctx_error!(ctx, "BUG: Failed to create AF_UNIX/SOCK_STREAM socket error {}: {}",
                       e.raw_os_error(), e);
            DmmpError::Bug
        })?;

    let addr = SocketAddrUnix::new_abstract_name(ctx.socket_name().as_bytes())
        .map_err(|e| {
            ctx_error!(ctx, "BUG: Invalid abstract socket name '{}': {}", ctx.socket_name(), e);
            DmmpError::Bug
        })?;

    match rustix::net::connect_unix(&fd, &addr) {
        Ok(()) => Ok(fd),
        Err(Errno::CONNREFUSED) => {
            ctx_error!(ctx, "{}", DmmpError::NoDaemon);
            Err(DmmpError::NoDaemon)
        }
        Err(e) => {
            ctx_error!(ctx, "{}, error({}): {}", DmmpError::IpcError, e.raw_os_error(), e);
            Err(DmmpError::IpcError)
        }
    }
}

fn premature_close(ctx: &Context) -> DmmpError {
    ctx_error!(ctx, "{}", DmmpError::IpcTimeout);
    DmmpError::IpcTimeout
}

pub(crate) fn send_all(ctx: &Context, fd: BorrowedFd<'_>, mut buf: &[u8]) -> Result<()> {
    while !buf.is_empty() {
        // MSG_NOSIGNAL keeps a SIGPIPE from staying pending once the mask is lifted.
        match rustix::net::send(fd, buf, SendFlags::NOSIGNAL) {
            Ok(0) => return Err(premature_close(ctx)),
            Ok(n) => buf = &buf[n..],
            Err(Errno::INTR) | Err(Errno::AGAIN) => continue,
            Err(Errno::PIPE) | Err(Errno::CONNRESET) => return Err(premature_close(ctx)),
            Err(e) => {
                ctx_error!(ctx, "BUG: Got unexpected error when sending message to \
                                 multipathd via socket, {}: {}", e.raw_os_error(), e);
                return Err(DmmpError::Bug);
            }
        }
    }
    Ok(())
}

pub(crate) fn recv_all(ctx: &Context, fd: BorrowedFd<'_>, buf: &mut [u8]) -> Result<()> {
    let timeout = poll_timeout_ms(ctx);
    let mut done = 0;

    while done < buf.len() {
        let mut pfd = [PollFd::new(&fd, PollFlags::IN)];
        match poll(&mut pfd, timeout) {
            Ok(0) => {
                ctx_error!(ctx, "Connecting to multipathd socket got timeout");
                return Err(DmmpError::IpcError);
            }
            Ok(_) => {}
            Err(Errno::INTR) => continue,
            Err(e) => {
                ctx_error!(ctx, "BUG: Got unexpected error when receiving data from \
                                 multipathd via socket, {}: {}", e.raw_os_error(), e);
                return Err(DmmpError::Bug);
            }
        }
        if pfd[0].revents().is_empty() {
            continue;
        }

        match rustix::io::read(fd, &mut buf[done..]) {
            Ok(0) => return Err(premature_close(ctx)),
            Ok(n) => done += n,
            Err(Errno::INTR) | Err(Errno::AGAIN) => continue,
            Err(Errno::CONNRESET) => return Err(premature_close(ctx)),
            Err(e) => {
                ctx_error!(ctx, "BUG: Got unexpected error when receiving data from \
                                 multipathd via socket, {}: {}", e.raw_os_error(), e);
                return Err(DmmpError::Bug);
            }
        }
    }
    Ok(())
}

/// Send one frame: length (payload plus NUL) then the NUL-terminated payload.
pub fn send_packet(ctx: &Context, fd: BorrowedFd<'_>, payload: &str) -> Result<()> {
    let mut frame = Vec::new();
    frame.try_reserve_exact(payload.len() + 1 + mem::size_of::<usize>())?;

    let len = payload.len() + 1;
    frame.extend_from_slice(&len.to_ne_bytes());
    frame.extend_from_slice(payload.as_bytes());
    frame.push(0);

    let _sigpipe = SigpipeBlock::new();

    ctx_debug!(ctx, "IPC: Sending data size '{}'", len);
    send_all(ctx, fd, &frame[..mem::size_of::<usize>()])?;
    ctx_debug!(ctx, "IPC: Sending command '{}'", payload);
    send_all(ctx, fd, &frame[mem::size_of::<usize>()..])
}

/// Receive one frame and return its payload up to the first NUL.
pub fn recv_packet(ctx: &Context, fd: BorrowedFd<'_>) -> Result<String> {
    let mut len_buf = [0u8; mem::size_of::<usize>()];
    recv_all(ctx, fd, &mut len_buf)?;

    let len = usize::from_ne_bytes(len_buf);
    if len == 0 {
        ctx_error!(ctx, "BUG: Got zero length message");
        return Err(DmmpError::Bug);
    }
    ctx_debug!(ctx, "IPC: Received data size: {}", len);

    let Some(alloc_len) = len.checked_add(1) else {
        ctx_error!(ctx, "{}", DmmpError::NoMemory);
        return Err(DmmpError::NoMemory);
    };

    // Grow with the data actually received, not the announced length.
    let mut buf: Vec<u8> = Vec::new();
    while buf.len() < len {
        let start = buf.len();
        let want = (len - start).min(RECV_CHUNK);
        let extra = if start + want == len { want + 1 } else { want };
        buf.try_reserve(extra).map_err(|e| {
            ctx_error!(ctx, "{}: {} bytes", DmmpError::NoMemory, alloc_len);
            DmmpError::from(e)
        })?;
        buf.resize(start + want, 0);
        recv_all(ctx, fd, &mut buf[start..])?;
    }
    buf.push(0);

    let end = buf.iter().position(|&b| b == 0).unwrap_or(len);
    buf.truncate(end);

    String::from_utf8(buf).map_err(|e| {
        ctx_error!(ctx, "BUG: Got non UTF-8 reply from multipathd: {}", e);
        DmmpError::Bug
    })
}

/// One short-lived connection to the daemon. Closed on drop.
pub(crate) struct IpcSession<'a> {
    ctx: &'a Context,
    fd:  OwnedFd,
}

impl<'a> IpcSession<'a> {
    pub(crate) fn connect(ctx: &'a Context) -> Result<Self> {
        let fd = connect(ctx)?;
        ctx_info!(ctx, "IPC: Connected to multipathd at '@{}'", ctx.socket_name());
        Ok(Self { ctx, fd })
    }

    /// Send a command and wait for its reply.
    pub(crate) fn exec(&self, cmd: &str) -> Result<String> {
        send_packet(self.ctx, self.fd.as_fd(), cmd)?;
        recv_packet(self.ctx, self.fd.as_fd())
    }
}

impl Drop for IpcSession<'_> {
    fn drop(&mut self) {
        ctx_debug!(self.ctx, "IPC: Closing connection to multipathd");
    }
}
