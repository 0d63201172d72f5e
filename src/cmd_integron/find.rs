use anyhow::Context;
use clap::*;
use itertools::Itertools;
use log::{info, warn};

use integron::libs::assemble::{assemble, log_summary, select_integrases};
use integron::libs::cluster::build_clusters;
use integron::libs::cmsearch::CmSearch;
use integron::libs::hit::Hit;
use integron::libs::options::Options;
use integron::libs::protein::read_proteins;
use integron::libs::refine::refine;
use integron::libs::replicon::Replicon;
use integron::libs::report::{describe, write_report};
use integron::libs::tblout::{read_cmsearch, read_hmmsearch, replicon_of};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("find")
        .about("Find integrons in one replicon")
        .after_help(
            r###"
Pairs attC arrays with integrases and writes a `.integrons` table.

Inputs are search results:
* --attc       `cmsearch --tblout` of the attC model against the replicon
* --intI       `hmmsearch --tblout` of the intI profile against prodigal proteins
* --phage-int  `hmmsearch --tblout` of the Phage_integrase profile, same proteins

Integrases are the proteins hit by both profiles. --union-integrases also
keeps proteins hit by one of them only.

--proteins adds a row for each Prodigal protein of an attC array: between the
integrase and the last attC, or around the array when there is no integrase,
up to 200 bp past the outer attC.

--max searches again around each integron with `cmsearch --max` and needs the
replicon sequence (--replicon) and the attC model (--model).

Examples:
    integron find --attc attc_table.res --intI intI.res --phage-int phage.res \
        --size 20000 --name ACBA.007.P01_13 --linear

    integron find --attc attc_table.res --intI intI.res --phage-int phage.res \
        --replicon ACBA.007.P01_13.fst --proteins ACBA.007.P01_13.prt \
        --max --model attc_4.cm -o ACBA.integrons

"###,
        )
        .arg(
            Arg::new("attc")
                .long("attc")
                .required(true)
                .help("cmsearch --tblout table of attC hits"),
        )
        .arg(
            Arg::new("int_i")
                .long("intI")
                .required(true)
                .help("hmmsearch --tblout table of the intI profile"),
        )
        .arg(
            Arg::new("phage_int")
                .long("phage-int")
                .required(true)
                .help("hmmsearch --tblout table of the Phage_integrase profile"),
        )
        .arg(
            Arg::new("replicon")
                .long("replicon")
                .conflicts_with("size")
                .help("Replicon FASTA file, only the first sequence is used"),
        )
        .arg(
            Arg::new("size")
                .long("size")
                .value_parser(value_parser!(u64).range(1..))
                .help("Length of the replicon, when no FASTA file is given"),
        )
        .group(
            ArgGroup::new("source")
                .args(["replicon", "size"])
                .required(true),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .requires("size")
                .help("Name of the replicon, defaults to the one in the attC table"),
        )
        .arg(
            Arg::new("proteins")
                .long("proteins")
                .help("Prodigal protein FASTA file, for the cassette rows"),
        )
        .arg(
            Arg::new("union_integrases")
                .long("union-integrases")
                .action(ArgAction::SetTrue)
                .help("Keep proteins hit by either integrase profile"),
        )
        .arg(
            Arg::new("max")
                .long("max")
                .action(ArgAction::SetTrue)
                .requires("model")
                .requires("replicon")
                .help("Exhaustive attC search around each integron"),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .help("attC covariance model for --max"),
        )
        .arg(
            Arg::new("cmsearch")
                .long("cmsearch")
                .default_value("cmsearch")
                .help("cmsearch executable, looked up in PATH"),
        )
        .arg(
            Arg::new("cpu")
                .long("cpu")
                .value_parser(value_parser!(usize))
                .default_value("1")
                .help("Threads for cmsearch"),
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

fn options(args: &ArgMatches) -> Options {
    Options {
        union_integrases: args.get_flag("union_integrases"),
        exhaustive: args.get_flag("max"),
        cmsearch: args.get_one::<String>("cmsearch").unwrap().to_string(),
        attc_model: args.get_one::<String>("model").cloned(),
        cpu: *args.get_one::<usize>("cpu").unwrap(),
        ..super::clustering_options(args)
    }
}

fn read_hmm(path: &str) -> anyhow::Result<Vec<Hit>> {
    super::check_input(path)?;
    read_hmmsearch(intspan::reader(path)).with_context(|| format!("reading {}", path))
}

/// Keeps the hits of one replicon, warning about the others
fn of_replicon(hits: Vec<Hit>, name: &str, what: &str) -> Vec<Hit> {
    let (kept, other): (Vec<Hit>, Vec<Hit>) = hits.into_iter().partition(|h| h.replicon() == name);
    if !other.is_empty() {
        warn!(
            "{} {} hit(s) on other replicons ignored: {}",
            other.len(),
            what,
            other.iter().map(|h| h.replicon()).unique().join(", ")
        );
    }
    kept
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let opt = options(args);

    //----------------------------
    // Loading
    //----------------------------
    let attc_file = args.get_one::<String>("attc").unwrap();
    super::check_input(attc_file)?;
    let attc = read_cmsearch(intspan::reader(attc_file), opt.attc_evalue)
        .with_context(|| format!("reading {}", attc_file))?;
    let int_i = read_hmm(args.get_one::<String>("int_i").unwrap())?;
    let phage_int = read_hmm(args.get_one::<String>("phage_int").unwrap())?;

    let replicon = if let Some(fasta) = args.get_one::<String>("replicon") {
        Replicon::from_fasta(fasta, opt.topology(), opt.dist_threshold)
            .with_context(|| format!("loading {}", fasta))?
    } else {
        let size = *args.get_one::<u64>("size").unwrap();
        let name = match args.get_one::<String>("name") {
            Some(name) => name.to_string(),
            None => attc
                .first()
                .or_else(|| int_i.first())
                .map(|h| h.replicon().to_string())
                .unwrap_or_else(|| "replicon".to_string()),
        };
        Replicon::new(&name, size, opt.topology(), opt.dist_threshold)
    };
    info!(
        "replicon {}: {} bp, {}",
        replicon.name(),
        replicon.len(),
        replicon.topology()
    );

    let attc = of_replicon(attc, replicon.name(), "attC");
    let int_i = of_replicon(int_i, replicon.name(), "intI");
    let phage_int = of_replicon(phage_int, replicon.name(), "Phage_integrase");

    //----------------------------
    // Detection
    //----------------------------
    let integrases = select_integrases(&int_i, &phage_int, opt.union_integrases);
    let clusters = build_clusters(attc, &replicon, opt.keep_palindromes);
    let mut integrons = assemble(integrases, clusters, &replicon);

    if opt.exhaustive {
        let model = opt.attc_model.as_deref().unwrap_or_default();
        let mut engine = CmSearch::new(&opt.cmsearch, model, opt.cpu, opt.attc_evalue)?;
        let (refined, report) = refine(integrons, &replicon, &mut engine, opt.keep_palindromes);
        integrons = refined;
        if !report.failures.is_empty() {
            warn!(
                "exhaustive search incomplete around {} integron(s), {} failed window(s)",
                report.failed_integrons(),
                report.failures.len()
            );
        }
    }
    log_summary(replicon.name(), &integrons);

    if let Some(infile) = args.get_one::<String>("proteins") {
        super::check_input(infile)?;
        let proteins =
            read_proteins(intspan::reader(infile)).with_context(|| format!("reading {}", infile))?;
        let (proteins, other): (Vec<_>, Vec<_>) = proteins
            .into_iter()
            .partition(|p| replicon_of(p.id()) == replicon.name());
        if !other.is_empty() {
            warn!("{} protein(s) of other replicons ignored", other.len());
        }
        for integron in integrons.iter_mut() {
            integron.add_proteins(&proteins);
        }
    }

    //----------------------------
    // Output
    //----------------------------
    let records = describe(&integrons, opt.exhaustive);
    let mut writer = intspan::writer(args.get_one::<String>("outfile").unwrap());
    write_report(&mut writer, &records)?;

    Ok(())
}
