extern crate clap;
use clap::*;

mod cmd_integron;

fn main() -> anyhow::Result<()> {
    let app = Command::new("integron")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`integron` - Find integrons from attC and integrase hits")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("More log messages, repeat for more"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .global(true)
                .action(ArgAction::Count)
                .help("Fewer log messages, repeat for fewer"),
        )
        .subcommand(cmd_integron::cluster::make_subcommand())
        .subcommand(cmd_integron::find::make_subcommand())
        .subcommand(cmd_integron::merge::make_subcommand())
        .after_help(
            r###"Subcommands:

* cluster - Group attC hits into arrays
* find    - Pair arrays with integrases, optionally refine with cmsearch --max
* merge   - Join several .integrons reports

Log level is `info`; -v and -q move it, RUST_LOG overrides it.

"###,
        );

    let matches = app.get_matches();
    cmd_integron::init_logger(
        matches.get_count("verbose"),
        matches.get_count("quiet"),
    );

    match matches.subcommand() {
        Some(("cluster", sub_matches)) => cmd_integron::cluster::execute(sub_matches),
        Some(("find", sub_matches)) => cmd_integron::find::execute(sub_matches),
        Some(("merge", sub_matches)) => cmd_integron::merge::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
