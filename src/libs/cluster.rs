//! Groups attC hits into arrays.
//!
//! An array holds attC sites of one strand, sorted by start, where two
//! consecutive starts are at most `dist_threshold` apart. On a circular
//! replicon the last and the first array of a strand are joined when the gap
//! through the origin is below the threshold.
//!
//! ```text
//!            <= D       <= D                  > D
//!  + ---->--------->------->------------------------------->---->------
//!       |____ array 1 _____|                         |__ array 2 __|
//! ```

use crate::libs::hit::{by_start_evalue, Hit, Strand};
use crate::libs::replicon::Replicon;
use log::debug;

/// A non-empty, strand-homogeneous run of attC hits
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    hits: Vec<Hit>,
}

impl Cluster {
    fn from_hits(hits: Vec<Hit>) -> Self {
        debug_assert!(!hits.is_empty());
        Self { hits }
    }

    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    pub fn into_hits(self) -> Vec<Hit> {
        self.hits
    }

    pub fn strand(&self) -> Strand {
        self.hits[0].strand()
    }

    /// Start of the first site
    pub fn start(&self) -> u64 {
        self.hits[0].start()
    }

    /// End of the last site
    pub fn end(&self) -> u64 {
        self.hits[self.hits.len() - 1].end()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Keeps the lowest e-value hit for each start position.
///
/// `hits` must be sorted by (start, e-value); on equal e-values the first
/// one wins.
fn drop_palindromes(hits: Vec<Hit>) -> Vec<Hit> {
    let mut kept: Vec<Hit> = Vec::with_capacity(hits.len());
    for hit in hits {
        match kept.last() {
            Some(prev) if prev.start() == hit.start() => {
                debug!(
                    "palindrome at {} ({}) dropped, e-value {:e} >= {:e}",
                    hit.start(),
                    hit.strand(),
                    hit.evalue(),
                    prev.evalue()
                );
            }
            _ => kept.push(hit),
        }
    }
    kept
}

/// Cuts one strand's sorted hits where successive starts are more than
/// `dist` apart
fn split_strand(hits: Vec<Hit>, dist: u64) -> Vec<Vec<Hit>> {
    let mut groups: Vec<Vec<Hit>> = vec![];
    for hit in hits {
        match groups.last_mut() {
            Some(group) if hit.start() - group[group.len() - 1].start() <= dist => {
                group.push(hit);
            }
            _ => groups.push(vec![hit]),
        }
    }
    groups
}

/// Joins the last group to the first one through the origin
fn merge_through_origin(mut groups: Vec<Vec<Hit>>, replicon: &Replicon) -> Vec<Vec<Hit>> {
    if !replicon.is_circular() || groups.len() < 2 {
        return groups;
    }

    let first_start = groups[0][0].start();
    let last = &groups[groups.len() - 1];
    let last_start = last[last.len() - 1].start();
    let gap = replicon.distance(first_start, last_start);

    if gap < replicon.dist_threshold() as i64 {
        debug!(
            "arrays at {} and {} joined through the origin (gap {})",
            last[0].start(),
            first_start,
            gap
        );
        let mut merged = groups.pop().unwrap_or_default();
        merged.append(&mut groups[0]);
        groups[0] = merged;
    }
    groups
}

/// Builds the attC arrays of one replicon.
///
/// Plus-strand arrays come first, then minus-strand ones; arrays never mix
/// strands.
///
/// ```
/// # use integron::libs::cluster::build_clusters;
/// # use integron::libs::hit::{Hit, Strand, Topology};
/// # use integron::libs::replicon::Replicon;
/// let rep = Replicon::new("chr", 1_000_000, Topology::Linear, 4000);
/// let hits = vec![
///     Hit::attc("chr", 1500, 1550, Strand::Forward, 1e-5, "attc_4").unwrap(),
///     Hit::attc("chr", 1600, 1650, Strand::Forward, 1e-5, "attc_4").unwrap(),
///     Hit::attc("chr", 9000, 9060, Strand::Forward, 1e-5, "attc_4").unwrap(),
/// ];
/// let clusters = build_clusters(hits, &rep, false);
/// assert_eq!(clusters.len(), 2);
/// assert_eq!(clusters[0].len(), 2);
/// ```
pub fn build_clusters(mut hits: Vec<Hit>, replicon: &Replicon, keep_palindromes: bool) -> Vec<Cluster> {
    if hits.is_empty() {
        return vec![];
    }

    hits.sort_by(by_start_evalue);
    if !keep_palindromes {
        hits = drop_palindromes(hits);
    }

    let (plus, minus): (Vec<Hit>, Vec<Hit>) =
        hits.into_iter().partition(|h| h.strand() == Strand::Forward);

    let dist = replicon.dist_threshold();
    let mut clusters = vec![];
    for strand_hits in [plus, minus] {
        if strand_hits.is_empty() {
            continue;
        }
        let groups = merge_through_origin(split_strand(strand_hits, dist), replicon);
        clusters.extend(groups.into_iter().map(Cluster::from_hits));
    }

    debug!(
        "{} attC array(s) built on {}",
        clusters.len(),
        replicon.name()
    );
    clusters
}
