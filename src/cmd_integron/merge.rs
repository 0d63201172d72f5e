use anyhow::Context;
use clap::*;

use integron::libs::report::{merge_reports, read_report, summarize, write_report, write_summary};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("merge")
        .about("Join .integrons reports")
        .after_help(
            r###"
Joins the reports of several replicons into one table. When a replicon shows up
in more than one report, the rows of the last report win, so a run with --max
given after the default run replaces it.

Reports holding `# No Integron found` add nothing.

Examples:
    integron merge chr.integrons plasmid.integrons -o all.integrons

    integron merge *.integrons --summary all.summary

"###,
        )
        .arg(
            Arg::new("infiles")
                .required(true)
                .num_args(1..)
                .index(1)
                .help("Set the input files to use"),
        )
        .arg(
            Arg::new("summary")
                .long("summary")
                .help("Also write integron counts per replicon to this file"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let mut reports = vec![];
    for infile in args.get_many::<String>("infiles").unwrap() {
        super::check_input(infile)?;
        let records =
            read_report(intspan::reader(infile)).with_context(|| format!("reading {}", infile))?;
        log::debug!("{}: {} row(s)", infile, records.len());
        reports.push(records);
    }
    let merged = merge_reports(reports);

    let mut writer = intspan::writer(args.get_one::<String>("outfile").unwrap());
    write_report(&mut writer, &merged)?;

    if let Some(summary) = args.get_one::<String>("summary") {
        let mut writer = intspan::writer(summary);
        write_summary(&mut writer, &summarize(&merged))?;
    }

    Ok(())
}
