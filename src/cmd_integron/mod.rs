//! Subcommand modules for the `integron` binary.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use integron::libs::options::Options;

pub mod cluster;
pub mod find;
pub mod merge;

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// `info` by default, moved by `-v`/`-q`; `RUST_LOG` wins
pub fn init_logger(verbose: u8, quiet: u8) {
    let idx = (2 + verbose as i32 - quiet as i32).clamp(0, LEVELS.len() as i32 - 1) as usize;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(LEVELS[idx]))
        .format_timestamp(None)
        .init();
}

/// Arguments shared by the commands that build attC arrays
pub fn clustering_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("linear")
            .long("linear")
            .action(ArgAction::SetTrue)
            .help("The replicon is linear, the default is circular"),
    )
    .arg(
        Arg::new("distance")
            .long("distance")
            .short('d')
            .value_parser(value_parser!(u64).range(1..))
            .default_value("4000")
            .help("Maximal distance between two attC sites of an array, or an array and its integrase"),
    )
    .arg(
        Arg::new("evalue")
            .long("evalue")
            .value_parser(value_parser!(f64))
            .default_value("1")
            .help("attC hits with an e-value at or above this are ignored"),
    )
    .arg(
        Arg::new("keep_palindromes")
            .long("keep-palindromes")
            .action(ArgAction::SetTrue)
            .help("Keep both strands of an attC found at the same position"),
    )
}

pub fn clustering_options(args: &ArgMatches) -> Options {
    Options {
        dist_threshold: *args.get_one::<u64>("distance").unwrap(),
        attc_evalue: *args.get_one::<f64>("evalue").unwrap(),
        keep_palindromes: args.get_flag("keep_palindromes"),
        linear: args.get_flag("linear"),
        ..Default::default()
    }
}

/// Fails early on a missing input instead of letting the reader panic
pub fn check_input(path: &str) -> anyhow::Result<()> {
    if path != "stdin" && !std::path::Path::new(path).is_file() {
        anyhow::bail!("can't find the input file {}", path);
    }
    Ok(())
}
