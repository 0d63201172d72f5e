//! Prodigal proteins, reported as the gene cassettes of an integron.
//!
//! Prodigal writes the gene location in the FASTA description:
//!
//! ```text
//! >ACBA.007.P01_13_2 # 1700 # 2500 # 1 # ID=1_2;partial=00;start_type=ATG
//! ```

use crate::libs::error::Error;
use crate::libs::hit::Strand;
use std::io::BufRead;

#[derive(Debug, Clone, PartialEq)]
pub struct Protein {
    id: String,
    start: u64,
    end: u64,
    strand: Strand,
}

impl Protein {
    pub fn new(id: &str, start: u64, end: u64, strand: Strand) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        Self {
            id: id.to_string(),
            start,
            end,
            strand,
        }
    }

    // Immutable accessors
    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn start(&self) -> u64 {
        self.start
    }
    pub fn end(&self) -> u64 {
        self.end
    }
    pub fn strand(&self) -> Strand {
        self.strand
    }
}

/// Start, end and strand out of a Prodigal description
///
/// ```
/// # use integron::libs::protein::parse_location;
/// # use integron::libs::hit::Strand;
/// let loc = parse_location("# 1700 # 2500 # -1 # ID=1_2;partial=00");
/// assert_eq!(loc, Some((1700, 2500, Strand::Reverse)));
/// assert_eq!(parse_location("hypothetical protein"), None);
/// ```
pub fn parse_location(description: &str) -> Option<(u64, u64, Strand)> {
    let fields: Vec<&str> = description.split('#').map(|s| s.trim()).collect();
    if fields.len() < 4 {
        return None;
    }
    let start = fields[1].parse::<u64>().ok()?;
    let end = fields[2].parse::<u64>().ok()?;
    let strand = Strand::parse(fields[3])?;
    Some((start, end, strand))
}

/// Reads the locations of a Prodigal protein FASTA file
pub fn read_proteins<R: BufRead>(reader: R) -> Result<Vec<Protein>, Error> {
    let mut fa_in = noodles_fasta::io::Reader::new(reader);

    let mut proteins = vec![];
    for result in fa_in.records() {
        let record = result?;
        let id = String::from_utf8_lossy(record.name()).to_string();
        let description = record
            .description()
            .map(|d| String::from_utf8_lossy(d).to_string())
            .unwrap_or_default();

        let (start, end, strand) = parse_location(&description).ok_or_else(|| {
            Error::InvalidHit(format!(
                "protein {} has no `# start # end # strand #` location",
                id
            ))
        })?;
        proteins.push(Protein::new(&id, start, end, strand));
    }
    Ok(proteins)
}
