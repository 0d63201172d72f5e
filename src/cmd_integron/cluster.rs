use anyhow::Context;
use clap::*;
use itertools::Itertools;
use std::io::Write;

use integron::libs::cluster::build_clusters;
use integron::libs::replicon::Replicon;
use integron::libs::report::format_evalue;
use integron::libs::tblout::read_cmsearch;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("cluster")
        .about("Group attC hits into arrays")
        .after_help(
            r###"
Reads a `cmsearch --tblout` table and groups the attC hits of one replicon into
arrays: same strand, successive starts at most --distance apart. On a circular
replicon the arrays on both sides of the origin are joined when close enough.

Output columns: array, ID_replicon, pos_beg, pos_end, strand, evalue, model.

Examples:
    integron cluster tests/integron/attc_table.res --size 20000 --linear

    integron cluster attc_table.res --size 4200000 --name NC_000913 -o arrays.tsv

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("cmsearch --tblout table, `stdin` for standard input"),
        )
        .arg(
            Arg::new("size")
                .long("size")
                .required(true)
                .value_parser(value_parser!(u64).range(1..))
                .help("Length of the replicon"),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .help("Keep hits of this replicon only"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        );
    super::clustering_args(cmd)
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let infile = args.get_one::<String>("infile").unwrap();
    let size = *args.get_one::<u64>("size").unwrap();
    let opt = super::clustering_options(args);

    super::check_input(infile)?;
    let hits = read_cmsearch(intspan::reader(infile), opt.attc_evalue)
        .with_context(|| format!("reading {}", infile))?;

    let name = match args.get_one::<String>("name") {
        Some(name) => name.clone(),
        None => {
            let names: Vec<&str> = hits.iter().map(|h| h.replicon()).unique().collect();
            match names.as_slice() {
                [] => "replicon".to_string(),
                [one] => one.to_string(),
                _ => anyhow::bail!("{} holds several replicons, pick one with --name", infile),
            }
        }
    };
    let hits: Vec<_> = hits.into_iter().filter(|h| h.replicon() == name).collect();

    let replicon = Replicon::new(&name, size, opt.topology(), opt.dist_threshold);
    let clusters = build_clusters(hits, &replicon, opt.keep_palindromes);
    log::info!("{} attC array(s) on {}", clusters.len(), replicon.name());

    let mut writer = intspan::writer(args.get_one::<String>("outfile").unwrap());
    writer.write_fmt(format_args!(
        "array\tID_replicon\tpos_beg\tpos_end\tstrand\tevalue\tmodel\n"
    ))?;
    for (i, cluster) in clusters.iter().enumerate() {
        for hit in cluster.hits() {
            writer.write_fmt(format_args!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                i + 1,
                hit.replicon(),
                hit.start(),
                hit.end(),
                hit.strand().sign(),
                format_evalue(hit.evalue()),
                hit.model(),
            ))?;
        }
    }

    Ok(())
}
