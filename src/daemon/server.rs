use std::io;
use std::os::fd::AsFd;
use std::os::linux::net::SocketAddrExt;
use std::os::unix::net::{SocketAddr, UnixListener, UnixStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, bail};
use log::{debug, info, warn};
use rustix::event::{poll, PollFd, PollFlags};
use rustix::io::Errno;
use rustix::net::RecvFlags;

use crate::context::Context;
use crate::ipc::{recv_packet, send_packet};
use crate::logging::{log_crate_sink, LogPriority};

use super::dispatch::{Command, Dispatcher};
use super::keys::KeyCode;

/// Control-socket server answering framed commands on an abstract unix
/// socket. Connections are served one at a time on a background thread,
/// which stops when the handle is dropped, even if a client is still
/// connected and idle.
pub struct Server {
    name:   String,
    stop:   Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Server {
    pub fn spawn<S>(name: &str, dispatcher: Dispatcher<S>, state: S) -> io::Result<Server>
    where
        S: Send + Sync + 'static,
    {
        let addr = SocketAddr::from_abstract_name(name.as_bytes())?;
        let listener = UnixListener::bind_addr(&addr)?;
        info!("listening on '@{}'", name);

        let stop = Arc::new(AtomicBool::new(false));
        let thread = {
            let stop = stop.clone();
            thread::Builder::new()
                .name("dmmp-server".to_string())
                .spawn(move || serve(listener, &dispatcher, &state, &stop))?
        };

        Ok(Server {
            name: name.to_string(),
            stop,
            thread: Some(thread),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);

        // wake up accept()
        if let Ok(addr) = SocketAddr::from_abstract_name(self.name.as_bytes()) {
            let _ = UnixStream::connect_addr(&addr);
        }
        if let Some(t) = self.thread.take() {
            if t.join().is_err() {
                warn!("server thread for '@{}' panicked", self.name);
            }
        }
    }
}

fn server_context() -> Context {
    let mut ctx = Context::new();
    ctx.set_log_priority(LogPriority::Debug);
    ctx.set_log_func(log_crate_sink);
    ctx
}

fn serve<S>(listener: UnixListener, dispatcher: &Dispatcher<S>, state: &S, stop: &AtomicBool) {
    let ctx = server_context();

    for conn in listener.incoming() {
        if stop.load(Ordering::Acquire) {
            break;
        }
        match conn {
            Ok(stream) => serve_conn(&ctx, dispatcher, state, &stream, stop),
            Err(e) => warn!("accept failed: {}", e),
        }
    }
    debug!("server thread exiting");
}

const STOP_POLL_MS: i32 = 100;

/// Wait for the next request; false once the client has hung up or the
/// server is stopping.
fn wait_request(stream: &UnixStream, stop: &AtomicBool) -> bool {
    let mut byte = [0u8; 1];
    loop {
        if stop.load(Ordering::Acquire) {
            return false;
        }

        let mut fds = [PollFd::new(stream, PollFlags::IN)];
        match poll(&mut fds, STOP_POLL_MS) {
            Ok(0) | Err(Errno::INTR) => continue,
            Ok(_) => {}
            Err(_) => return false,
        }

        match rustix::net::recv(stream, &mut byte, RecvFlags::PEEK | RecvFlags::DONTWAIT) {
            Ok(n) => return n > 0,
            Err(Errno::INTR) | Err(Errno::AGAIN) => continue,
            Err(_) => return false,
        }
    }
}

fn serve_conn<S>(ctx: &Context, dispatcher: &Dispatcher<S>, state: &S,
                 stream: &UnixStream, stop: &AtomicBool) {
    while wait_request(stream, stop) {
        let cmd = match recv_packet(ctx, stream.as_fd()) {
            Ok(cmd) => cmd,
            Err(e) => {
                debug!("dropping connection: {}", e);
                return;
            }
        };
        debug!("got request '{}'", cmd);

        let reply = dispatcher.parse_cmd(&cmd, state);
        if let Err(e) = send_packet(ctx, stream.as_fd(), &reply) {
            debug!("dropping connection: {}", e);
            return;
        }
    }
}

/// Canned `raw format` listings, served the way multipathd would.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockTopology {
    /// `%w|%n` lines
    pub maps:   String,
    /// `%w|%g|%p|%t|%s` lines
    pub groups: String,
    /// `%d|%T|%w|%g` lines
    pub paths:  String,
}

fn raw_reply(cmd: &Command, want: &str, body: &str) -> anyhow::Result<String> {
    let fmt = cmd.keyparam(KeyCode::FMT)
        .ok_or_else(|| anyhow!("no format given"))?;
    if fmt != want {
        bail!("unsupported format '{}', only '{}'", fmt, want);
    }
    Ok(body.to_string())
}

impl MockTopology {
    pub fn dispatcher() -> Dispatcher<MockTopology> {
        use KeyCode as K;

        let mut d = Dispatcher::with_default_handlers();
        d.handle(K::LIST | K::MAPS | K::RAW | K::FMT,
                 |cmd, t: &MockTopology| raw_reply(cmd, "%w|%n", &t.maps));
        d.handle(K::LIST | K::GROUPS | K::RAW | K::FMT,
                 |cmd, t: &MockTopology| raw_reply(cmd, "%w|%g|%p|%t|%s", &t.groups));
        d.handle(K::LIST | K::PATHS | K::RAW | K::FMT,
                 |cmd, t: &MockTopology| raw_reply(cmd, "%d|%T|%w|%g", &t.paths));
        d
    }

    /// Serve this topology on the abstract socket `name`.
    pub fn spawn(self, name: &str) -> io::Result<Server> {
        Server::spawn(name, Self::dispatcher(), self)
    }
}
