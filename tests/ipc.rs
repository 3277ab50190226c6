mod common;

use std::io::{Read, Write};
use std::mem;
use std::os::fd::AsFd;
use std::os::linux::net::SocketAddrExt;
use std::os::unix::net::{SocketAddr, UnixListener, UnixStream};
use std::thread;
use std::time::Duration;

use common::{capture_logs, mock, serve, unique_socket_name};
use dmmp::ipc::{recv_packet, send_packet};
use dmmp::{Context, DmmpError};

/// Read one framed request off `conn` and return its payload.
fn read_request(conn: &mut UnixStream) -> Vec<u8> {
    let mut len = [0u8; mem::size_of::<usize>()];
    conn.read_exact(&mut len).unwrap();
    let mut payload = vec![0u8; usize::from_ne_bytes(len)];
    conn.read_exact(&mut payload).unwrap();
    payload
}

/// One-shot fake daemon: accepts one connection, consumes the first
/// request, then hands the stream to `reply`.
fn fake_daemon<F>(tag: &str, reply: F) -> (Context, thread::JoinHandle<()>)
where
    F: FnOnce(UnixStream) + Send + 'static,
{
    let name = unique_socket_name(tag);
    let addr = SocketAddr::from_abstract_name(name.as_bytes()).unwrap();
    let listener = UnixListener::bind_addr(&addr).unwrap();

    let handle = thread::spawn(move || {
        let (mut conn, _) = listener.accept().unwrap();
        let req = read_request(&mut conn);
        assert_eq!(req, b"show maps raw format %w|%n\0");
        reply(conn);
    });

    let mut ctx = Context::new();
    ctx.set_socket_name(name);
    capture_logs(&mut ctx);
    (ctx, handle)
}

#[test]
fn daemon_closes_mid_frame() {
    let (ctx, daemon) = fake_daemon("midframe", |mut conn| {
        conn.write_all(&100usize.to_ne_bytes()).unwrap();
        conn.write_all(b"3600|mp").unwrap();
    });

    assert_eq!(ctx.mpath_array_get(), Err(DmmpError::IpcTimeout));
    daemon.join().unwrap();
}

#[test]
fn daemon_sends_zero_length() {
    let (ctx, daemon) = fake_daemon("zerolen", |mut conn| {
        conn.write_all(&0usize.to_ne_bytes()).unwrap();
    });

    assert_eq!(ctx.mpath_array_get(), Err(DmmpError::Bug));
    daemon.join().unwrap();
}

#[test]
fn daemon_never_answers() {
    let (mut ctx, daemon) = fake_daemon("silent", |conn| {
        thread::sleep(Duration::from_millis(500));
        drop(conn);
    });
    ctx.set_ipc_timeout(Duration::from_millis(50));

    assert_eq!(ctx.mpath_array_get(), Err(DmmpError::IpcError));
    daemon.join().unwrap();
}

#[test]
fn unknown_command_gets_help() {
    let (server, ctx) = serve("help", mock("", "", ""));
    let addr = SocketAddr::from_abstract_name(server.name().as_bytes()).unwrap();
    let conn = UnixStream::connect_addr(&addr).unwrap();

    send_packet(&ctx, conn.as_fd(), "frobnicate all the things").unwrap();
    let help = recv_packet(&ctx, conn.as_fd()).unwrap();
    assert!(help.contains("CLI commands reference:\n"));
    assert!(help.contains("\n list|show paths\n"));

    send_packet(&ctx, conn.as_fd(), "show maps raw format %n").unwrap();
    assert_eq!(recv_packet(&ctx, conn.as_fd()).unwrap(), "fail\n");
}

#[test]
fn connect_is_logged_at_info() {
    let (_server, mut ctx) = serve("connect-info", mock("3600|mpatha\n", "", ""));
    ctx.set_log_priority(dmmp::LogPriority::Info);
    let seen = capture_logs(&mut ctx);

    ctx.mpath_array_get().unwrap();

    let seen = seen.lock().unwrap();
    let connected: Vec<_> = seen.iter()
        .filter(|(_, msg)| msg.contains("Connected to multipathd"))
        .collect();
    assert_eq!(connected.len(), 1);
    assert_eq!(connected[0].0, dmmp::LogPriority::Info);
}
