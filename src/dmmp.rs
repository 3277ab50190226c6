mod commands;

use std::process::{ExitCode, Termination};

fn dmmp_usage() {
    let cmd = commands::build_cli();

    println!("dmmp - query device-mapper multipath topology from multipathd");
    println!("usage: dmmp <command> [<args>]\n");
    println!("Commands:");
    for sub in cmd.get_subcommands() {
        if sub.get_name() == "help" { continue }
        let about = sub.get_about().map(|s| s.to_string()).unwrap_or_default();
        println!("  {:<26}{about}", sub.get_name());
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        println!("missing command");
        dmmp_usage();
        return ExitCode::from(1);
    }

    match args[1].as_str() {
        "--help" | "help" => {
            dmmp_usage();
            ExitCode::SUCCESS
        }
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        "show" => commands::cmd_show(args[1..].to_vec()).report(),
        "mock" => commands::cmd_mock(args[1..].to_vec()).report(),
        cmd => {
            println!("Unknown command {cmd}");
            dmmp_usage();
            ExitCode::from(1)
        }
    }
}
