//! Context-scoped diagnostics.
//!
//! Every message the library emits goes through the sink installed on the
//! [`Context`](crate::Context) that drove the call, filtered by the
//! context's [`LogPriority`] threshold. Two sinks ship with the crate:
//! [`stderr_sink`] (the default) and [`log_crate_sink`], which hands
//! records to whatever `log` backend the application installed.

use std::any::Any;
use std::fmt;
use std::io::Write;

use strum::{Display, EnumIter, EnumString, FromRepr, IntoStaticStr};

use crate::context::Context;

const STDERR_ALIGN_WIDTH: usize = 80;

/// Log priorities, numbered like syslog. Lower is more severe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[derive(Display, EnumString, IntoStaticStr, FromRepr, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[repr(u32)]
pub enum LogPriority {
    Error   = 3,
    #[default]
    Warning = 4,
    Info    = 6,
    Debug   = 7,
}

impl LogPriority {
    /// True when a message at `self` passes a context threshold of
    /// `threshold`.
    pub fn passes(self, threshold: LogPriority) -> bool {
        self as u32 <= threshold as u32
    }
}

/// Name of a raw priority value, `"Invalid argument"` when unknown.
pub fn log_priority_str(priority: u32) -> &'static str {
    LogPriority::from_repr(priority)
        .map(<&'static str>::from)
        .unwrap_or("Invalid argument")
}

/// Where a message was emitted.
#[derive(Debug, Clone, Copy)]
pub struct LogLocation<'a> {
    pub file: &'a str,
    pub line: u32,
    pub func: &'a str,
}

/// A log sink. Receives the context, the message priority, its source
/// location and the pre-bound format arguments.
pub type LogFunc =
    Box<dyn Fn(&Context, LogPriority, &LogLocation<'_>, fmt::Arguments<'_>) + Send>;

pub(crate) fn format_stderr_line(
    ctx: &Context,
    priority: LogPriority,
    loc: &LogLocation<'_>,
    args: fmt::Arguments<'_>,
) -> String {
    let mut line = format!("libdmmp {}: {}", priority, args);
    let printed = line.len();

    if let Some(userdata) = ctx.userdata() {
        let addr = userdata as *const (dyn Any + Send) as *const ();
        line.push_str(&format!("(userdata address: {:p})", addr));
    }

    if printed < STDERR_ALIGN_WIDTH {
        let pad = STDERR_ALIGN_WIDTH - printed;
        line.push_str(&format!("{:pad$} # {}:{}():{}", "", loc.file, loc.func, loc.line));
    } else {
        line.push_str(&format!(" # {}:{}():{}", loc.file, loc.func, loc.line));
    }
    line
}

/// Default sink: one line per message on standard error.
pub fn stderr_sink(
    ctx: &Context,
    priority: LogPriority,
    loc: &LogLocation<'_>,
    args: fmt::Arguments<'_>,
) {
    let line = format_stderr_line(ctx, priority, loc, args);
    let _ = writeln!(std::io::stderr().lock(), "{}", line);
}

/// Sink that forwards into the `log` facade under the `dmmp` target.
pub fn log_crate_sink(
    _ctx: &Context,
    priority: LogPriority,
    loc: &LogLocation<'_>,
    args: fmt::Arguments<'_>,
) {
    let level = match priority {
        LogPriority::Error   => log::Level::Error,
        LogPriority::Warning => log::Level::Warn,
        LogPriority::Info    => log::Level::Info,
        LogPriority::Debug   => log::Level::Debug,
    };
    if level > log::max_level() {
        return;
    }

    log::logger().log(
        &log::Record::builder()
            .args(args)
            .level(level)
            .target("dmmp")
            .file(Some(loc.file))
            .line(Some(loc.line))
            .build(),
    );
}

/// Name of the enclosing function, without its module path.
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let name = name.strip_suffix("::f").unwrap_or(name);
        name.rsplit("::")
            .find(|s| *s != "{{closure}}")
            .unwrap_or(name)
    }};
}

macro_rules! dmmp_log {
    ($ctx:expr, $prio:expr, $($arg:tt)+) => {{
        let ctx: &$crate::context::Context = $ctx;
        let prio: $crate::logging::LogPriority = $prio;
        if ctx.log_enabled(prio) {
            let loc = $crate::logging::LogLocation {
                file: file!(),
                line: line!(),
                func: function_name!(),
            };
            ctx.log(prio, &loc, format_args!($($arg)+));
        }
    }};
}

macro_rules! ctx_debug {
    ($ctx:expr, $($arg:tt)+) => {
        dmmp_log!($ctx, $crate::logging::LogPriority::Debug, $($arg)+)
    };
}

macro_rules! ctx_info {
    ($ctx:expr, $($arg:tt)+) => {
        dmmp_log!($ctx, $crate::logging::LogPriority::Info, $($arg)+)
    };
}

macro_rules! ctx_warn {
    ($ctx:expr, $($arg:tt)+) => {
        dmmp_log!($ctx, $crate::logging::LogPriority::Warning, $($arg)+)
    };
}

macro_rules! ctx_error {
    ($ctx:expr, $($arg:tt)+) => {
        dmmp_log!($ctx, $crate::logging::LogPriority::Error, $($arg)+)
    };
}
