use serde::Serialize;

use crate::context::Context;
use crate::errcode::Result;
use crate::parse::{required_field, split_fields};

use super::{blk_name_of, PathGroup, PathGroupBuilder, RawRecord};

const SHOW_MPS_INDEX_WWID:  usize = 0;
const SHOW_MPS_INDEX_ALIAS: usize = 1;

/// Multipath device while path groups are still being attached.
#[derive(Debug)]
pub(crate) struct MultipathBuilder {
    wwid:  String,
    alias: String,
    pgs:   Vec<PathGroupBuilder>,
}

impl MultipathBuilder {
    pub(crate) fn wwid(&self) -> &str {
        &self.wwid
    }

    pub(crate) fn add_pg(&mut self, pg: PathGroupBuilder) {
        self.pgs.push(pg);
    }

    /// First attached group with the given id.
    pub(crate) fn pg_search_mut(&mut self, pg_id: u32) -> Option<&mut PathGroupBuilder> {
        self.pgs.iter_mut().find(|pg| pg.id() == pg_id)
    }

    pub(crate) fn finalize(self) -> Multipath {
        Multipath {
            wwid:        self.wwid,
            alias:       self.alias,
            path_groups: self.pgs
                .into_iter()
                .map(PathGroupBuilder::finalize)
                .collect(),
        }
    }
}

impl RawRecord for MultipathBuilder {
    const SHOW_CMD: &'static str = "show maps raw format %w|%n";

    fn from_raw_line(ctx: &Context, line: &str) -> Result<Self> {
        ctx_debug!(ctx, "parsing line: '{}'", line);
        let items = split_fields(line);

        let wwid = required_field(ctx, &items, SHOW_MPS_INDEX_WWID, "wwid")?;
        let alias = required_field(ctx, &items, SHOW_MPS_INDEX_ALIAS, "alias")?;

        ctx_debug!(ctx, "Got mpath wwid: '{}', alias: '{}'", wwid, alias);

        Ok(MultipathBuilder {
            wwid:  wwid.to_string(),
            alias: alias.to_string(),
            pgs:   Vec::new(),
        })
    }
}

/// A multipath device and its path groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Multipath {
    wwid:        String,
    alias:       String,
    path_groups: Box<[PathGroup]>,
}

impl Multipath {
    /// Map name, e.g. `mpatha`.
    pub fn name(&self) -> &str {
        &self.alias
    }

    pub fn wwid(&self) -> &str {
        &self.wwid
    }

    /// Path groups in the order multipathd listed them; may be empty.
    pub fn path_groups(&self) -> &[PathGroup] {
        &self.path_groups
    }

    /// Id of the group holding `blk_name` (`sdb` or `/dev/sdb`).
    pub fn path_group_id_search(&self, blk_name: &str) -> Option<u32> {
        let blk_name = blk_name_of(blk_name);
        self.path_groups
            .iter()
            .find(|pg| pg.paths().iter().any(|p| p.blk_name() == blk_name))
            .map(|pg| pg.id())
    }
}
