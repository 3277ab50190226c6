use std::time::Duration;

use anyhow::{anyhow, Context as _, Result};
use clap::Parser;
use dmmp::{mpath_find_by_blk_name, mpath_find_by_name, mpath_find_by_wwid, Context,
           LogPriority, Multipath};

#[derive(Parser, Debug)]
#[command(about = "List multipath devices with their path groups and paths")]
pub struct Cli {
    /// Print the snapshot as JSON
    #[arg(short, long)]
    json: bool,

    /// Abstract socket name of multipathd
    #[arg(short, long, default_value = dmmp::ipc::DEFAULT_SOCKET_NAME)]
    socket: String,

    /// Seconds to wait for each chunk of a reply
    #[arg(short, long, default_value_t = 60)]
    timeout: u64,

    /// Increase library log verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only show this map: name, wwid, or one of its path devices
    device: Option<String>,
}

fn log_priority(verbose: u8) -> LogPriority {
    match verbose {
        0 => LogPriority::Warning,
        1 => LogPriority::Info,
        _ => LogPriority::Debug,
    }
}

fn find_mpath<'a>(mpaths: &'a [Multipath], dev: &str) -> Option<&'a Multipath> {
    mpath_find_by_name(mpaths, dev)
        .or_else(|| mpath_find_by_wwid(mpaths, dev))
        .or_else(|| mpath_find_by_blk_name(mpaths, dev))
}

fn print_mpath(mp: &Multipath) {
    println!("{} ({})", mp.name(), mp.wwid());
    for pg in mp.path_groups() {
        println!("  path group {}: {} prio {} '{}'",
                 pg.id(), pg.status(), pg.priority(), pg.selector());
        for p in pg.paths() {
            println!("    {:<12}{}", p.blk_name(), p.status());
        }
    }
}

pub fn cmd_show(argv: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(argv);
    super::init_logging(cli.verbose);

    let mut ctx = Context::new();
    ctx.set_log_priority(log_priority(cli.verbose));
    ctx.set_log_func(dmmp::log_crate_sink);
    ctx.set_socket_name(cli.socket.as_str());
    ctx.set_ipc_timeout(Duration::from_secs(cli.timeout));

    let mpaths = ctx.mpath_array_get()
        .with_context(|| format!("querying multipathd at '@{}'", cli.socket))?;

    let shown: Vec<&Multipath> = match cli.device.as_deref() {
        Some(dev) => vec![find_mpath(&mpaths, dev)
            .ok_or_else(|| anyhow!("no multipath device matches '{}'", dev))?],
        None => mpaths.iter().collect(),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
    } else {
        shown.into_iter().for_each(print_mpath);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::parse_from(["show", "-vv", "--json", "-t", "5", "/dev/sdb"]);
        assert!(cli.json);
        assert_eq!(cli.timeout, 5);
        assert_eq!(log_priority(cli.verbose), LogPriority::Debug);
        assert_eq!(cli.socket, dmmp::ipc::DEFAULT_SOCKET_NAME);
        assert_eq!(cli.device.as_deref(), Some("/dev/sdb"));
    }
}
