use serde::Serialize;

use crate::context::Context;
use crate::errcode::{DmmpError, Result};
use crate::parse::{required_field, split_fields, str_to_u32};
use crate::status::{path_group_status_from_token, PathGroupStatus};

use super::{Path, RawRecord};

const SHOW_PG_INDEX_WWID:     usize = 0;
const SHOW_PG_INDEX_PG_ID:    usize = 1;
const SHOW_PG_INDEX_PRI:      usize = 2;
const SHOW_PG_INDEX_STATUS:   usize = 3;
const SHOW_PG_INDEX_SELECTOR: usize = 4;

/// Path group while paths are still being attached.
#[derive(Debug)]
pub(crate) struct PathGroupBuilder {
    wwid:     String,
    id:       u32,
    status:   PathGroupStatus,
    priority: u32,
    selector: String,
    paths:    Vec<Path>,
}

impl PathGroupBuilder {
    pub(crate) fn wwid(&self) -> &str {
        &self.wwid
    }

    pub(crate) fn id(&self) -> u32 {
        self.id
    }

    pub(crate) fn add_path(&mut self, path: Path) {
        self.paths.push(path);
    }

    pub(crate) fn finalize(self) -> PathGroup {
        PathGroup {
            wwid:     self.wwid,
            id:       self.id,
            status:   self.status,
            priority: self.priority,
            selector: self.selector,
            paths:    self.paths.into_boxed_slice(),
        }
    }
}

impl RawRecord for PathGroupBuilder {
    const SHOW_CMD: &'static str = "show groups raw format %w|%g|%p|%t|%s";

    fn from_raw_line(ctx: &Context, line: &str) -> Result<Self> {
        ctx_debug!(ctx, "parsing line: '{}'", line);
        let items = split_fields(line);

        let wwid = required_field(ctx, &items, SHOW_PG_INDEX_WWID, "wwid")?;
        let pg_id_str = required_field(ctx, &items, SHOW_PG_INDEX_PG_ID, "pg_id_str")?;
        let pri_str = required_field(ctx, &items, SHOW_PG_INDEX_PRI, "pri_str")?;
        let status_str = required_field(ctx, &items, SHOW_PG_INDEX_STATUS, "status_str")?;
        let selector = required_field(ctx, &items, SHOW_PG_INDEX_SELECTOR, "selector")?;

        let id = str_to_u32(ctx, pg_id_str)?;
        if id == 0 {
            ctx_error!(ctx, "BUG: Got unknown(0) path group ID");
            return Err(DmmpError::Bug);
        }
        let priority = str_to_u32(ctx, pri_str)?;
        let status = path_group_status_from_token(ctx, status_str);

        ctx_debug!(ctx, "Got path group wwid: '{}'", wwid);
        ctx_debug!(ctx, "Got path group id: {}", id);
        ctx_debug!(ctx, "Got path group priority: {}", priority);
        ctx_debug!(ctx, "Got path group status: {}({})", status, status as u32);
        ctx_debug!(ctx, "Got path group selector: '{}'", selector);

        Ok(PathGroupBuilder {
            wwid: wwid.to_string(),
            id,
            status,
            priority,
            selector: selector.to_string(),
            paths: Vec::new(),
        })
    }
}

/// A set of paths sharing a priority class and selection policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathGroup {
    wwid:     String,
    id:       u32,
    status:   PathGroupStatus,
    priority: u32,
    selector: String,
    paths:    Box<[Path]>,
}

impl PathGroup {
    /// 1-based index of the group within its multipath device.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn status(&self) -> PathGroupStatus {
        self.status
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Path selector, e.g. `round-robin 0`.
    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn wwid(&self) -> &str {
        &self.wwid
    }

    /// Paths in the order multipathd listed them.
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }
}
