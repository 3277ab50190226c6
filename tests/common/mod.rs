//! Shared helpers for the integration tests. Import with `mod common;`.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dmmp::daemon::{MockTopology, Server};
use dmmp::{Context, LogPriority};

/// Route `log` output of the server thread to the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Abstract socket name no other test in this process uses.
pub fn unique_socket_name(tag: &str) -> String {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    format!("/dmmp/test/{}/{}/{}", std::process::id(), tag,
            NEXT.fetch_add(1, Ordering::Relaxed))
}

pub fn mock(maps: &str, groups: &str, paths: &str) -> MockTopology {
    MockTopology {
        maps:   maps.to_string(),
        groups: groups.to_string(),
        paths:  paths.to_string(),
    }
}

/// Start `topology` on a fresh socket and return the server with a context
/// pointed at it.
pub fn serve(tag: &str, topology: MockTopology) -> (Server, Context) {
    init_logging();
    let server = topology.spawn(&unique_socket_name(tag)).unwrap();
    let mut ctx = Context::new();
    ctx.set_socket_name(server.name());
    (server, ctx)
}

pub type Captured = Arc<Mutex<Vec<(LogPriority, String)>>>;

/// Replace the sink with one that records every delivered message.
pub fn capture_logs(ctx: &mut Context) -> Captured {
    let seen: Captured = Arc::default();
    let sink = seen.clone();
    ctx.set_log_func(move |_ctx, prio, _loc, args| {
        sink.lock().unwrap().push((prio, args.to_string()));
    });
    seen
}
