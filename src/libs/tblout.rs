//! Readers for the `--tblout` tables of Infernal's `cmsearch` and HMMER's
//! `hmmsearch`.
//!
//! Both are whitespace-separated with `#` comment lines. Protein tables are
//! expected from Prodigal translations, whose descriptions carry the gene
//! location: `# 1001 # 1300 # 1 # ID=...`.

use crate::libs::error::Error;
use crate::libs::hit::{Hit, Strand};
use crate::libs::refine::{ATTC_MAX_LEN, ATTC_MIN_LEN};
use std::io::BufRead;

/// Integrase hits at or above this e-value are ignored
pub const INTEGRASE_MAX_EVALUE: f64 = 1.0;

fn field<'a>(parts: &[&'a str], idx: usize, line_no: usize, name: &str) -> Result<&'a str, Error> {
    parts
        .get(idx)
        .copied()
        .ok_or_else(|| Error::malformed(line_no, format!("missing {} (column {})", name, idx + 1)))
}

fn number<T: std::str::FromStr>(
    parts: &[&str],
    idx: usize,
    line_no: usize,
    name: &str,
) -> Result<T, Error> {
    let raw = field(parts, idx, line_no, name)?;
    raw.parse::<T>()
        .map_err(|_| Error::malformed(line_no, format!("{} is not a number: {}", name, raw)))
}

/// Calls `f` with the fields and the 1-based line number of each data line
fn for_each_record<R, F>(mut reader: R, mut f: F) -> Result<(), Error>
where
    R: BufRead,
    F: FnMut(&[&str], usize) -> Result<(), Error>,
{
    let mut line = String::new();
    let mut line_no = 0;
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        line_no += 1;

        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        f(&parts, line_no)?;
    }
    Ok(())
}

/// Reads attC hits from a `cmsearch --tblout` table.
///
/// Keeps hits with an e-value below `max_evalue` and a length
/// (`|to - from|`) within the attC bounds.
///
/// ```
/// # use integron::libs::tblout::read_cmsearch;
/// # use integron::libs::hit::Strand;
/// let tbl = "\
/// ## target name accession query name ...
/// chr - attc_4 - cm 1 47 1550 1500 - no 1 0.37 0.0 21.9 1.2e-05 ! -
/// ";
/// let hits = read_cmsearch(tbl.as_bytes(), 1.0).unwrap();
/// assert_eq!(hits.len(), 1);
/// assert_eq!((hits[0].start(), hits[0].end()), (1500, 1550));
/// assert_eq!(hits[0].strand(), Strand::Reverse);
/// ```
pub fn read_cmsearch<R: BufRead>(reader: R, max_evalue: f64) -> Result<Vec<Hit>, Error> {
    let mut hits = vec![];
    for_each_record(reader, |parts, line_no| {
        let target = field(parts, 0, line_no, "target name")?;
        let model = field(parts, 2, line_no, "query name")?;
        let from: u64 = number(parts, 7, line_no, "seq from")?;
        let to: u64 = number(parts, 8, line_no, "seq to")?;
        let strand = Strand::parse(field(parts, 9, line_no, "strand")?)
            .ok_or_else(|| Error::malformed(line_no, "strand is neither + nor -"))?;
        let evalue: f64 = number(parts, 15, line_no, "E-value")?;

        let len = from.abs_diff(to);
        if evalue >= max_evalue || !(ATTC_MIN_LEN..=ATTC_MAX_LEN).contains(&len) {
            return Ok(());
        }
        let hit = Hit::attc(target, from, to, strand, evalue, model)
            .map_err(|e| Error::malformed(line_no, e.to_string()))?;
        hits.push(hit);
        Ok(())
    })?;
    Ok(hits)
}

/// Replicon a Prodigal protein belongs to: the id without its `_N` suffix
pub fn replicon_of(protein: &str) -> &str {
    match protein.rsplit_once('_') {
        Some((replicon, n)) if !replicon.is_empty() && n.chars().all(|c| c.is_ascii_digit()) => {
            replicon
        }
        _ => protein,
    }
}

/// Reads integrase hits from an `hmmsearch --tblout` table run on Prodigal
/// proteins.
pub fn read_hmmsearch<R: BufRead>(reader: R) -> Result<Vec<Hit>, Error> {
    let mut hits = vec![];
    for_each_record(reader, |parts, line_no| {
        let protein = field(parts, 0, line_no, "target name")?;
        let model = field(parts, 2, line_no, "query name")?;
        let evalue: f64 = number(parts, 4, line_no, "E-value")?;
        let start: u64 = number(parts, 19, line_no, "gene start")?;
        let end: u64 = number(parts, 21, line_no, "gene end")?;
        let strand = Strand::parse(field(parts, 23, line_no, "gene strand")?)
            .ok_or_else(|| Error::malformed(line_no, "gene strand is neither 1 nor -1"))?;

        if evalue >= INTEGRASE_MAX_EVALUE {
            return Ok(());
        }
        let hit = Hit::integrase(replicon_of(protein), protein, start, end, strand, evalue, model)
            .map_err(|e| Error::malformed(line_no, e.to_string()))?;
        hits.push(hit);
        Ok(())
    })?;
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CMSEARCH: &str = "\
#target name         accession query name           accession mdl mdl from   mdl to seq from   seq to strand trunc pass   gc  bias  score   E-value inc description of target
#------------------- --------- -------------------- --------- --- -------- -------- -------- -------- ------ ----- ---- ---- ----- ------ --------- --- ---------------------
ACBA.007.P01_13      -         attc_4               -          cm        1       47     1500     1550      +    no    1 0.37   0.0   21.9   1.2e-05 !   -
ACBA.007.P01_13      -         attc_4               -          cm        1       47     1665     1600      -    no    1 0.40   0.0   15.1   3.4e-03 !   -
ACBA.007.P01_13      -         attc_4               -          cm        1       47     9000     9020      +    no    1 0.40   0.0   15.1   3.4e-03 !   -
ACBA.007.P01_13      -         attc_4               -          cm        1       47     9100     9160      +    no    1 0.40   0.0    5.1       4.2 ?   -
";

    const HMMSEARCH: &str = "\
#                                                               --- full sequence ---- --- best 1 domain ---- --- domain number estimation ----
# target name        accession  query name           accession    E-value  score  bias   E-value  score  bias   exp reg clu  ov env dom rep inc description of target
#------------------- ---------- -------------------- ---------- --------- ------ ----- --------- ------ -----   --- --- --- --- --- --- --- --- ---------------------
ACBA.007.P01_13_1    -          intI_Cterm           -            8.4e-50  157.0   0.1   9.8e-50  156.8   0.1   1.0   1   0   0   1   1   1   1 # 1001 # 1300 # 1 # ID=1_1;partial=00
ACBA.007.P01_13_20   -          intI_Cterm           -               2.5    1.0   0.1       2.5    1.0   0.1   1.0   1   0   0   1   1   1   1 # 20001 # 20900 # -1 # ID=1_20;partial=00
";

    #[test]
    fn cmsearch_filters_and_orients() {
        let hits = read_cmsearch(CMSEARCH.as_bytes(), 1.0).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].replicon(), "ACBA.007.P01_13");
        assert_eq!(hits[0].model(), "attc_4");
        assert_eq!((hits[1].start(), hits[1].end()), (1600, 1665));
        assert_eq!(hits[1].strand(), Strand::Reverse);

        let strict = read_cmsearch(CMSEARCH.as_bytes(), 1e-4).unwrap();
        assert_eq!(strict.len(), 1);
    }

    #[test]
    fn hmmsearch_reads_prodigal_location() {
        let hits = read_hmmsearch(HMMSEARCH.as_bytes()).unwrap();
        assert_eq!(hits.len(), 1);
        let int = &hits[0];
        assert_eq!(int.id(), Some("ACBA.007.P01_13_1"));
        assert_eq!(int.replicon(), "ACBA.007.P01_13");
        assert_eq!((int.start(), int.end()), (1001, 1300));
        assert_eq!(int.strand(), Strand::Forward);
        approx::assert_relative_eq!(int.evalue(), 8.4e-50);
    }

    #[test]
    fn malformed_lines_report_their_number() {
        let tbl = "# header\nchr - attc_4 - cm 1 47 1500\n";
        match read_cmsearch(tbl.as_bytes(), 1.0) {
            Err(Error::MalformedRecord { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {:?}", other),
        }

        let tbl = "chr - attc_4 - cm 1 47 1500 abc + no 1 0.37 0.0 21.9 1e-5 ! -\n";
        let err = read_cmsearch(tbl.as_bytes(), 1.0).unwrap_err();
        assert!(err.to_string().contains("seq to is not a number"));
    }

    #[test]
    fn replicon_names() {
        assert_eq!(replicon_of("ACBA.007.P01_13_1"), "ACBA.007.P01_13");
        assert_eq!(replicon_of("contig_12"), "contig");
        assert_eq!(replicon_of("lonely"), "lonely");
        assert_eq!(replicon_of("gene_x"), "gene_x");
    }

    #[test]
    fn empty_table() {
        assert!(read_cmsearch("".as_bytes(), 1.0).unwrap().is_empty());
        assert!(read_hmmsearch("# nothing\n\n".as_bytes()).unwrap().is_empty());
    }
}
