use serde::Serialize;

use crate::context::Context;
use crate::errcode::{DmmpError, Result};
use crate::parse::{field, required_field, split_fields, str_to_u32};
use crate::status::{path_status_from_token, PathStatus};

use super::RawRecord;

const SHOW_PS_INDEX_BLK_NAME: usize = 0;
const SHOW_PS_INDEX_STATUS:   usize = 1;
const SHOW_PS_INDEX_WWID:     usize = 2;
const SHOW_PS_INDEX_PGID:     usize = 3;

/// One block device through which a multipath target is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Path {
    blk_name: String,
    wwid:     String,
    pg_id:    u32,
    status:   PathStatus,
}

impl Path {
    /// Kernel block device name, e.g. `sdb`.
    pub fn blk_name(&self) -> &str {
        &self.blk_name
    }

    /// Empty for paths the daemon could not identify (usually faulty).
    pub fn wwid(&self) -> &str {
        &self.wwid
    }

    pub fn pg_id(&self) -> u32 {
        self.pg_id
    }

    pub fn status(&self) -> PathStatus {
        self.status
    }
}

impl RawRecord for Path {
    const SHOW_CMD: &'static str = "show paths raw format %d|%T|%w|%g";

    fn from_raw_line(ctx: &Context, line: &str) -> Result<Self> {
        ctx_debug!(ctx, "parsing line: '{}'", line);
        let items = split_fields(line);

        let blk_name = required_field(ctx, &items, SHOW_PS_INDEX_BLK_NAME, "blk_name")?;
        let status_str = required_field(ctx, &items, SHOW_PS_INDEX_STATUS, "status_str")?;
        let wwid = field(ctx, &items, SHOW_PS_INDEX_WWID, "wwid")?;

        let pg_id = if wwid.is_empty() {
            // Unidentified paths are dropped during assembly; their pg_id
            // is not checked.
            let pg_id = items.get(SHOW_PS_INDEX_PGID)
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(0);
            ctx_debug!(ctx, "path '{}' has no wwid, ignoring pg_id", blk_name);
            pg_id
        } else {
            let pg_id_str = required_field(ctx, &items, SHOW_PS_INDEX_PGID, "pg_id_str")?;
            let pg_id = str_to_u32(ctx, pg_id_str)?;
            if pg_id == 0 {
                ctx_error!(ctx, "BUG: Got unknown(0) path group ID from path '{}'", blk_name);
                return Err(DmmpError::Bug);
            }
            pg_id
        };

        let status = path_status_from_token(ctx, status_str);

        ctx_debug!(ctx, "Got path blk_name: '{}'", blk_name);
        ctx_debug!(ctx, "Got path wwid: '{}'", wwid);
        ctx_debug!(ctx, "Got path status: {}({})", status, status as u32);
        ctx_debug!(ctx, "Got path pg_id: {}", pg_id);

        Ok(Path {
            blk_name: blk_name.to_string(),
            wwid:     wwid.to_string(),
            pg_id,
            status,
        })
    }
}
