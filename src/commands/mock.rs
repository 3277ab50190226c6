use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use dmmp::daemon::MockTopology;
use log::info;

#[derive(Parser, Debug)]
#[command(about = "Serve canned raw listings on a multipathd-style socket")]
pub struct Cli {
    /// File with `%w|%n` map lines
    #[arg(long)]
    maps: PathBuf,

    /// File with `%w|%g|%p|%t|%s` path group lines
    #[arg(long)]
    groups: PathBuf,

    /// File with `%d|%T|%w|%g` path lines
    #[arg(long)]
    paths: PathBuf,

    /// Abstract socket name to listen on
    #[arg(short, long, default_value = dmmp::ipc::DEFAULT_SOCKET_NAME)]
    socket: String,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn read_listing(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))
}

pub fn cmd_mock(argv: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(argv);
    super::init_logging(cli.verbose.saturating_add(1));

    let topology = MockTopology {
        maps:   read_listing(&cli.maps)?,
        groups: read_listing(&cli.groups)?,
        paths:  read_listing(&cli.paths)?,
    };

    let _server = topology.spawn(&cli.socket)
        .with_context(|| format!("listening on '@{}'", cli.socket))?;
    info!("serving on '@{}', interrupt to stop", cli.socket);

    loop {
        std::thread::park();
    }
}
