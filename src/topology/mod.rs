//! The three-level multipath topology.
//!
//! Records are built in two phases. While the listings are being stitched
//! together, parents are `*Builder`s holding a growable child list; once
//! every child is attached, `finalize()` turns each builder into its
//! read-only record with a fixed child slice. Only finalized records are
//! public.

mod mpath;
mod path;
mod path_group;

pub use mpath::Multipath;
pub use path::Path;
pub use path_group::PathGroup;

pub(crate) use mpath::MultipathBuilder;
pub(crate) use path_group::PathGroupBuilder;

use crate::context::Context;
use crate::errcode::Result;

/// A record parsed from one line of a `show ... raw format` reply.
pub(crate) trait RawRecord: Sized {
    /// Query whose reply lines this record parses.
    const SHOW_CMD: &'static str;

    fn from_raw_line(ctx: &Context, line: &str) -> Result<Self>;
}

/// Block device name without a leading `/dev/`.
pub(crate) fn blk_name_of(name: &str) -> &str {
    name.strip_prefix("/dev/").unwrap_or(name)
}
