//! Client for the device-mapper multipath daemon.
//!
//! A [`Context`] connects to multipathd's abstract control socket, asks for
//! its raw map, path group and path listings, and stitches them into an
//! immutable snapshot:
//!
//! ```no_run
//! let ctx = dmmp::Context::new();
//! for mp in ctx.mpath_array_get()? {
//!     println!("{} {}", mp.name(), mp.wwid());
//!     for pg in mp.path_groups() {
//!         for p in pg.paths() {
//!             println!("  {} pg {} {}", p.blk_name(), pg.id(), p.status());
//!         }
//!     }
//! }
//! # Ok::<(), dmmp::DmmpError>(())
//! ```
//!
//! Diagnostics go to the sink installed on the context, stderr by default.

#[macro_use]
mod logging;

pub mod context;
pub mod daemon;
pub mod errcode;
pub mod ipc;
mod parse;
pub mod snapshot;
pub mod status;
pub mod topology;

pub use context::Context;
pub use errcode::{strerror, DmmpError, Result, DMMP_OK};
pub use logging::{log_crate_sink, log_priority_str, stderr_sink, LogFunc, LogLocation, LogPriority};
pub use snapshot::{mpath_array_free, mpath_array_get, mpath_find_by_blk_name,
                   mpath_find_by_name, mpath_find_by_wwid};
pub use status::{path_group_status_str, path_status_str, PathGroupStatus, PathStatus};
pub use topology::{Multipath, Path, PathGroup};
