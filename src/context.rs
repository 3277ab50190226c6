use std::any::Any;
use std::fmt;
use std::time::Duration;

use crate::errcode::Result;
use crate::ipc::{DEFAULT_IPC_TIMEOUT, DEFAULT_SOCKET_NAME};
use crate::logging::{stderr_sink, LogFunc, LogLocation, LogPriority};
use crate::topology::Multipath;

/// Handle grouping diagnostics and daemon endpoint settings.
///
/// A context is used by one caller at a time; it is `Send` but not `Sync`.
/// Each [`Context::mpath_array_get()`] call opens and closes its own
/// connection, so independent contexts can query the daemon concurrently.
pub struct Context {
    log_func:     LogFunc,
    log_priority: LogPriority,
    userdata:     Option<Box<dyn Any + Send>>,
    socket_name:  String,
    ipc_timeout:  Duration,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("log_priority", &self.log_priority)
            .field("userdata", &self.userdata.is_some())
            .field("socket_name", &self.socket_name)
            .field("ipc_timeout", &self.ipc_timeout)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// New context: WARNING threshold, stderr sink, no userdata.
    pub fn new() -> Self {
        Self {
            log_func:     Box::new(stderr_sink),
            log_priority: LogPriority::default(),
            userdata:     None,
            socket_name:  DEFAULT_SOCKET_NAME.to_string(),
            ipc_timeout:  DEFAULT_IPC_TIMEOUT,
        }
    }

    pub fn log_priority(&self) -> LogPriority {
        self.log_priority
    }

    pub fn set_log_priority(&mut self, priority: LogPriority) {
        self.log_priority = priority;
    }

    /// Replace the log sink. The sink only sees messages that pass the
    /// current priority threshold.
    pub fn set_log_func<F>(&mut self, f: F)
    where
        F: Fn(&Context, LogPriority, &LogLocation<'_>, fmt::Arguments<'_>) + Send + 'static,
    {
        self.log_func = Box::new(f);
    }

    /// Opaque caller data, handed to the sink untouched.
    pub fn userdata(&self) -> Option<&(dyn Any + Send)> {
        self.userdata.as_deref()
    }

    pub fn set_userdata(&mut self, userdata: Option<Box<dyn Any + Send>>) {
        self.userdata = userdata;
    }

    /// Abstract socket name of the daemon, without the leading NUL.
    pub fn socket_name(&self) -> &str {
        &self.socket_name
    }

    pub fn set_socket_name(&mut self, name: impl Into<String>) {
        self.socket_name = name.into();
    }

    /// Poll cap applied to every read iteration.
    pub fn ipc_timeout(&self) -> Duration {
        self.ipc_timeout
    }

    pub fn set_ipc_timeout(&mut self, timeout: Duration) {
        self.ipc_timeout = timeout;
    }

    pub(crate) fn log_enabled(&self, priority: LogPriority) -> bool {
        priority.passes(self.log_priority)
    }

    pub(crate) fn log(&self, priority: LogPriority, loc: &LogLocation<'_>, args: fmt::Arguments<'_>) {
        (self.log_func)(self, priority, loc, args)
    }

    /// Query the daemon and return the full multipath topology.
    pub fn mpath_array_get(&self) -> Result<Vec<Multipath>> {
        crate::snapshot::mpath_array_get(self)
    }
}
