use clap::{Command, CommandFactory};
use log::LevelFilter;

pub mod mock;
pub mod show;

pub use mock::cmd_mock;
pub use show::cmd_show;

/// Full command tree, for usage output.
pub fn build_cli() -> Command {
    Command::new("dmmp")
        .subcommand(show::Cli::command().name("show"))
        .subcommand(mock::Cli::command().name("mock"))
        .subcommand(Command::new("version").about("Display version"))
}

/// `-v` enables info, `-vv` and up debug.
pub fn verbosity_filter(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

pub fn init_logging(verbose: u8) {
    env_logger::Builder::new()
        .filter_level(verbosity_filter(verbose))
        .init();
}
