//! Assembly of the multipath topology from the three flat listings.
//!
//! multipathd reports maps, path groups and paths as separate tables.
//! [`mpath_array_get()`] fetches all three over one connection, then
//! attaches every group to the map with the same wwid and every path to
//! the group with the same `(wwid, pg_id)`. Records move into their parent
//! as they are attached; anything left over on an error path is dropped
//! with the tables that still own it.

use std::collections::HashMap;

use crate::context::Context;
use crate::errcode::{DmmpError, Result};
use crate::ipc::IpcSession;
use crate::parse::split_lines;
use crate::topology::{blk_name_of, Multipath, MultipathBuilder, Path, PathGroupBuilder, RawRecord};

/// Run `T::SHOW_CMD` and parse every non-empty reply line into a `T`.
fn all_get<T: RawRecord>(ctx: &Context, session: &IpcSession<'_>) -> Result<Vec<T>> {
    let reply = session.exec(T::SHOW_CMD)?;
    ctx_debug!(ctx, "Got multipathd output for '{}' query:\n{}\n", T::SHOW_CMD, reply);

    let lines = split_lines(ctx, &reply);
    let mut records = Vec::new();
    records.try_reserve_exact(lines.len())?;
    for line in lines {
        records.push(T::from_raw_line(ctx, line)?);
    }
    Ok(records)
}

/// Query multipathd for every multipath device with its groups and paths.
///
/// The result preserves the daemon's order at every level. On error nothing
/// partial is returned.
pub fn mpath_array_get(ctx: &Context) -> Result<Vec<Multipath>> {
    let session = IpcSession::connect(ctx).map_err(|e| {
        ctx_debug!(ctx, "IPC initialization failed: {}, {}", e.code(), e);
        e
    })?;

    let mps = all_get::<MultipathBuilder>(ctx, &session)?;
    let pgs = all_get::<PathGroupBuilder>(ctx, &session)?;
    let ps = all_get::<Path>(ctx, &session)?;
    drop(session);

    assemble(ctx, mps, pgs, ps)
}

/// Stitch the flat listings into a tree.
pub(crate) fn assemble(
    ctx: &Context,
    mut mps: Vec<MultipathBuilder>,
    pgs: Vec<PathGroupBuilder>,
    ps: Vec<Path>,
) -> Result<Vec<Multipath>> {
    let mut by_wwid: HashMap<String, usize> = HashMap::new();
    by_wwid.try_reserve(mps.len())?;
    for (i, mp) in mps.iter().enumerate() {
        by_wwid.entry(mp.wwid().to_string()).or_insert(i);
    }

    ctx_debug!(ctx, "Saving path_group into mpath");
    for pg in pgs {
        if pg.wwid().is_empty() {
            ctx_error!(ctx, "BUG: Got a path group with empty wwid");
            return Err(DmmpError::Bug);
        }

        let Some(&idx) = by_wwid.get(pg.wwid()) else {
            ctx_error!(ctx, "{}. Failed to find mpath for wwid {}",
                       DmmpError::InconsistentData, pg.wwid());
            return Err(DmmpError::InconsistentData);
        };
        mps[idx].add_pg(pg);
    }

    ctx_debug!(ctx, "Saving path into path_group");
    for p in ps {
        // Faulty paths carry no wwid.
        if p.wwid().is_empty() {
            ctx_warn!(ctx, "Got a path({}) with empty wwid ID and status: {}({})",
                      p.blk_name(), p.status(), p.status() as u32);
            continue;
        }

        let pg = by_wwid
            .get(p.wwid())
            .and_then(|&idx| mps[idx].pg_search_mut(p.pg_id()));
        let Some(pg) = pg else {
            ctx_error!(ctx, "{}. Failed to find path group for wwid {} pg_id {}",
                       DmmpError::InconsistentData, p.wwid(), p.pg_id());
            return Err(DmmpError::InconsistentData);
        };
        pg.add_path(p);
    }

    Ok(mps.into_iter().map(MultipathBuilder::finalize).collect())
}

/// Release a snapshot. Dropping it has the same effect.
pub fn mpath_array_free(mpaths: Vec<Multipath>) {
    drop(mpaths);
}

/// Multipath device with the given map name.
pub fn mpath_find_by_name<'a>(mpaths: &'a [Multipath], name: &str) -> Option<&'a Multipath> {
    mpaths.iter().find(|mp| mp.name() == name)
}

pub fn mpath_find_by_wwid<'a>(mpaths: &'a [Multipath], wwid: &str) -> Option<&'a Multipath> {
    mpaths.iter().find(|mp| mp.wwid() == wwid)
}

/// Multipath device that owns the path `blk_name` (`sdb` or `/dev/sdb`).
pub fn mpath_find_by_blk_name<'a>(mpaths: &'a [Multipath], blk_name: &str) -> Option<&'a Multipath> {
    let blk_name = blk_name_of(blk_name);
    mpaths.iter().find(|mp| {
        mp.path_groups()
            .iter()
            .flat_map(|pg| pg.paths())
            .any(|p| p.blk_name() == blk_name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogPriority;
    use crate::status::{PathGroupStatus, PathStatus};
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(LogPriority, String)>>>;

    fn capturing_ctx() -> (Context, Seen) {
        let mut ctx = Context::new();
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        ctx.set_log_func(move |_, prio, _, args| sink.lock().unwrap().push((prio, args.to_string())));
        (ctx, seen)
    }

    fn parse_all<T: RawRecord>(ctx: &Context, reply: &str) -> Vec<T> {
        split_lines(ctx, reply)
            .into_iter()
            .map(|l| T::from_raw_line(ctx, l).unwrap())
            .collect()
    }

    fn build(ctx: &Context, maps: &str, groups: &str, paths: &str) -> Result<Vec<Multipath>> {
        assemble(ctx, parse_all(ctx, maps), parse_all(ctx, groups), parse_all(ctx, paths))
    }

    #[test]
    fn one_map_one_group_two_paths() {
        let (ctx, _) = capturing_ctx();
        let mps = build(&ctx,
            "3600|mpatha\n",
            "3600|1|50|active|round-robin 0\n",
            "sdb|ready|3600|1\nsdc|ready|3600|1\n").unwrap();

        assert_eq!(mps.len(), 1);
        assert_eq!(mps[0].wwid(), "3600");
        assert_eq!(mps[0].name(), "mpatha");

        let pgs = mps[0].path_groups();
        assert_eq!(pgs.len(), 1);
        assert_eq!(pgs[0].id(), 1);
        assert_eq!(pgs[0].priority(), 50);
        assert_eq!(pgs[0].status(), PathGroupStatus::Active);
        assert_eq!(pgs[0].selector(), "round-robin 0");

        let paths: Vec<_> = pgs[0].paths().iter().map(|p| (p.blk_name(), p.status())).collect();
        assert_eq!(paths, [("sdb", PathStatus::Up), ("sdc", PathStatus::Up)]);
    }

    #[test]
    fn faulty_path_is_dropped_with_warning() {
        let (ctx, seen) = capturing_ctx();
        let mps = build(&ctx,
            "3600|mpatha\n",
            "3600|1|50|active|round-robin 0\n",
            "sdb|ready|3600|1\nsdz|faulty||0\nsdc|ready|3600|1\n").unwrap();

        let names: Vec<_> = mps[0].path_groups()[0].paths().iter().map(|p| p.blk_name()).collect();
        assert_eq!(names, ["sdb", "sdc"]);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, LogPriority::Warning);
        assert!(seen[0].1.contains("sdz"));
    }

    #[test]
    fn faulty_path_with_blank_group_is_dropped() {
        let (ctx, seen) = capturing_ctx();
        let mps = build(&ctx,
            "3600|mpatha\n",
            "3600|1|50|active|round-robin 0\n",
            "sdb|ready|3600|1\nsdz|faulty||\n").unwrap();

        let names: Vec<_> = mps[0].path_groups()[0].paths().iter().map(|p| p.blk_name()).collect();
        assert_eq!(names, ["sdb"]);

        let seen = seen.lock().unwrap();
        assert!(seen.iter().any(|(prio, msg)| *prio == LogPriority::Warning && msg.contains("sdz")));
        assert!(!seen.iter().any(|(prio, _)| *prio == LogPriority::Error));
    }

    #[test]
    fn interleaved_paths_keep_emission_order() {
        let (ctx, _) = capturing_ctx();
        let mps = build(&ctx,
            "3600|mpatha\n3601|mpathb\n",
            "3600|1|50|active|round-robin 0\n3601|1|10|enabled|service-time 0\n",
            "sdd|ready|3601|1\nsdb|ready|3600|1\nsdc|ready|3601|1\nsda|ready|3600|1\n").unwrap();

        let names = |mp: &Multipath| -> Vec<String> {
            mp.path_groups()[0].paths().iter().map(|p| p.blk_name().to_string()).collect()
        };
        assert_eq!(names(&mps[0]), ["sdb", "sda"]);
        assert_eq!(names(&mps[1]), ["sdd", "sdc"]);
    }

    #[test]
    fn map_without_groups_is_kept() {
        let (ctx, _) = capturing_ctx();
        let mps = build(&ctx, "3600|mpatha\n3601|mpathb\n", "3601|1|1|active|round-robin 0\n", "")
            .unwrap();

        assert_eq!(mps.len(), 2);
        assert!(mps[0].path_groups().is_empty());
        assert_eq!(mps[1].path_groups().len(), 1);
        assert!(mps[1].path_groups()[0].paths().is_empty());
    }

    #[test]
    fn empty_daemon() {
        let (ctx, _) = capturing_ctx();
        assert_eq!(build(&ctx, "", "", ""), Ok(vec![]));
    }

    #[test]
    fn group_for_unknown_map_is_inconsistent() {
        let (ctx, seen) = capturing_ctx();
        let r = build(&ctx, "3600|mpatha\n", "3601|1|50|active|round-robin 0\n", "");

        assert_eq!(r, Err(DmmpError::InconsistentData));
        assert!(seen.lock().unwrap().iter().any(|(p, m)| *p == LogPriority::Error && m.contains("3601")));
    }

    #[test]
    fn path_for_unknown_group_is_inconsistent() {
        let (ctx, _) = capturing_ctx();
        let r = build(&ctx,
            "3600|mpatha\n",
            "3600|1|50|active|round-robin 0\n",
            "sdb|ready|3600|2\n");
        assert_eq!(r, Err(DmmpError::InconsistentData));

        let r = build(&ctx,
            "3600|mpatha\n",
            "3600|1|50|active|round-robin 0\n",
            "sdb|ready|3602|1\n");
        assert_eq!(r, Err(DmmpError::InconsistentData));
    }

    #[test]
    fn duplicate_wwid_attaches_to_first_map() {
        let (ctx, _) = capturing_ctx();
        let mps = build(&ctx,
            "3600|mpatha\n3600|mpathdup\n",
            "3600|1|50|active|round-robin 0\n",
            "").unwrap();
        assert_eq!(mps[0].path_groups().len(), 1);
        assert!(mps[1].path_groups().is_empty());
    }

    #[test]
    fn lookups() {
        let (ctx, _) = capturing_ctx();
        let mps = build(&ctx,
            "3600|mpatha\n3601|mpathb\n",
            "3600|1|50|active|round-robin 0\n3601|1|10|enabled|round-robin 0\n3601|2|1|enabled|round-robin 0\n",
            "sdb|ready|3600|1\nsdc|ready|3601|2\n").unwrap();

        assert_eq!(mpath_find_by_name(&mps, "mpathb").map(|m| m.wwid()), Some("3601"));
        assert_eq!(mpath_find_by_wwid(&mps, "3600").map(|m| m.name()), Some("mpatha"));
        assert!(mpath_find_by_name(&mps, "mpathz").is_none());
        assert_eq!(mpath_find_by_blk_name(&mps, "/dev/sdc").map(|m| m.name()), Some("mpathb"));
        assert!(mpath_find_by_blk_name(&mps, "sdq").is_none());
        assert_eq!(mps[1].path_group_id_search("sdc"), Some(2));

        mpath_array_free(mps);
    }

    #[test]
    fn every_output_link_is_consistent() {
        let (ctx, _) = capturing_ctx();
        let mps = build(&ctx,
            "3600|mpatha\n3601|mpathb\n3602|mpathc\n",
            "3601|1|50|active|round-robin 0\n3600|1|50|active|round-robin 0\n3600|2|1|enabled|round-robin 0\n",
            "sda|ready|3600|2\nsdb|faulty|3600|1\nsdc|ready|3601|1\nsdd|faulty||0\n",
        ).unwrap();

        for mp in &mps {
            for pg in mp.path_groups() {
                assert_eq!(pg.wwid(), mp.wwid());
                assert_ne!(pg.id(), 0);
                for p in pg.paths() {
                    assert_eq!(p.wwid(), mp.wwid());
                    assert_eq!(p.pg_id(), pg.id());
                }
            }
        }
        let total: usize = mps.iter()
            .flat_map(|m| m.path_groups())
            .map(|pg| pg.paths().len())
            .sum();
        assert_eq!(total, 3);
    }
}
