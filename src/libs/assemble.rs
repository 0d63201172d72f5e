//! Pairs attC arrays with integrases.
//!
//! Integrases are visited in (start, e-value) order. Each one takes the
//! closest remaining array, on either side, if it lies closer than the
//! distance threshold. This is a greedy nearest-neighbour pass, not an
//! optimal assignment: the visiting order decides who gets a contested array.

use crate::libs::cluster::Cluster;
use crate::libs::hit::{by_start_evalue, Hit};
use crate::libs::integron::{Integron, IntegronType};
use crate::libs::replicon::{Replicon, Side};
use log::{debug, info};
use std::collections::HashSet;

/// Model name given to integrases matched by both profiles
pub const INTERSECTION_MODEL: &str = "intersection_tyr_intI";

/// Model name of the tyrosine recombinase profile
pub const PHAGE_INT_MODEL: &str = "Phage_integrase";

/// Integrase candidates from the two profile families.
///
/// Proteins hit by both `intI` and `phage_int` are kept, relabelled
/// `intersection_tyr_intI`. With `union`, the proteins matched by only one
/// family are added as they are. A protein id appears once at most.
///
/// ```
/// # use integron::libs::assemble::select_integrases;
/// # use integron::libs::hit::{Hit, Strand};
/// let int_i = vec![
///     Hit::integrase("chr", "chr_1", 1000, 1300, Strand::Forward, 1e-50, "intI_Cterm").unwrap(),
///     Hit::integrase("chr", "chr_9", 9000, 9300, Strand::Forward, 1e-10, "intI_Cterm").unwrap(),
/// ];
/// let phage = vec![
///     Hit::integrase("chr", "chr_1", 1000, 1300, Strand::Forward, 1e-30, "Phage_integrase").unwrap(),
/// ];
/// let selected = select_integrases(&int_i, &phage, false);
/// assert_eq!(selected.len(), 1);
/// assert_eq!(selected[0].model(), "intersection_tyr_intI");
/// assert_eq!(select_integrases(&int_i, &phage, true).len(), 2);
/// ```
pub fn select_integrases(int_i: &[Hit], phage_int: &[Hit], union: bool) -> Vec<Hit> {
    let phage_ids: HashSet<&str> = phage_int.iter().filter_map(|h| h.id()).collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut selected: Vec<Hit> = vec![];

    for hit in int_i {
        if let Some(id) = hit.id() {
            if phage_ids.contains(id) && seen.insert(id.to_string()) {
                selected.push(hit.with_model(INTERSECTION_MODEL));
            }
        }
    }

    if union {
        for hit in int_i.iter().chain(phage_int.iter()) {
            if let Some(id) = hit.id() {
                if seen.insert(id.to_string()) {
                    selected.push(hit.clone());
                }
            }
        }
    }

    selected.sort_by(by_start_evalue);
    debug!(
        "{} integrase candidate(s) from {} intI and {} phage_int hits",
        selected.len(),
        int_i.len(),
        phage_int.len()
    );
    selected
}

/// Arrays not yet bound to an integrase. Binding moves the array out.
#[derive(Debug, Default)]
pub struct ClusterPool {
    clusters: Vec<Cluster>,
}

impl ClusterPool {
    pub fn new(clusters: Vec<Cluster>) -> Self {
        Self { clusters }
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Index, side and distance of the closest array.
    ///
    /// Equal distances go to the first array in pool order; for one array,
    /// an array lying right of the integrase is preferred.
    pub fn nearest(&self, integrase: &Hit, replicon: &Replicon) -> Option<(usize, Side, u64)> {
        let mut best: Option<(usize, Side, u64)> = None;
        for (idx, cluster) in self.clusters.iter().enumerate() {
            let after = replicon.ahead(cluster.start(), integrase.end());
            let before = replicon.ahead(integrase.start(), cluster.end());

            for (side, d) in [(Side::Right, after), (Side::Left, before)] {
                if let Some(d) = d {
                    if best.map_or(true, |(_, _, b)| d < b) {
                        best = Some((idx, side, d));
                    }
                }
            }
        }
        best
    }

    /// Removes and returns the array at `idx`
    pub fn take(&mut self, idx: usize) -> Cluster {
        self.clusters.remove(idx)
    }

    pub fn into_clusters(self) -> Vec<Cluster> {
        self.clusters
    }
}

/// Builds the integrons of one replicon.
///
/// `integrases` should be sorted by (start, e-value), as given by
/// [`select_integrases`].
pub fn assemble(integrases: Vec<Hit>, clusters: Vec<Cluster>, replicon: &Replicon) -> Vec<Integron> {
    let dist = replicon.dist_threshold();
    let mut pool = ClusterPool::new(clusters);
    let mut integrons: Vec<Integron> = vec![];
    let mut next_id = 1;

    for integrase in integrases {
        let nearest = pool.nearest(&integrase, replicon);
        match nearest {
            Some((idx, side, d)) if d < dist => {
                let array = pool.take(idx);
                debug!(
                    "integrase {} bound to the array at {}..{} ({:?}, {} bp)",
                    integrase.id().unwrap_or("-"),
                    array.start(),
                    array.end(),
                    side,
                    d
                );
                integrons.push(Integron::complete(next_id, replicon, integrase, array));
            }
            _ => {
                integrons.push(Integron::from_integrase(next_id, replicon, integrase));
            }
        }
        next_id += 1;
    }

    for array in pool.into_clusters() {
        integrons.push(Integron::from_array(next_id, replicon, array));
        next_id += 1;
    }

    integrons
}

/// Number of integrons and of attC sites for one type
pub fn count_type(integrons: &[Integron], integron_type: IntegronType) -> (usize, usize) {
    integrons
        .iter()
        .filter(|i| i.integron_type() == integron_type)
        .fold((0, 0), |(n, sites), i| (n + 1, sites + i.attc().len()))
}

pub fn log_summary(replicon: &str, integrons: &[Integron]) {
    info!("In replicon {}, there are:", replicon);
    for (integron_type, label) in [
        (IntegronType::Complete, "complete"),
        (IntegronType::AttC0, "attC0"),
        (IntegronType::In0, "In0"),
    ] {
        let (n, sites) = count_type(integrons, integron_type);
        info!(
            "- {} {} integron(s) found with {} attC site(s)",
            n, label, sites
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::cluster::build_clusters;
    use crate::libs::hit::{Strand, Topology};

    fn attc(rep: &Replicon, start: u64, end: u64, strand: Strand) -> Hit {
        Hit::attc(rep.name(), start, end, strand, 1e-5, "attc_4").unwrap()
    }

    fn integrase(id: &str, start: u64, end: u64) -> Hit {
        Hit::integrase("rep", id, start, end, Strand::Forward, 1e-50, INTERSECTION_MODEL).unwrap()
    }

    fn types(integrons: &[Integron]) -> Vec<IntegronType> {
        integrons.iter().map(|i| i.integron_type()).collect()
    }

    #[test]
    fn scenario_complete_on_linear() {
        let rep = Replicon::new("rep", 1_000_000, Topology::Linear, 4000);
        let clusters = build_clusters(
            vec![
                attc(&rep, 1500, 1550, Strand::Forward),
                attc(&rep, 1600, 1650, Strand::Forward),
            ],
            &rep,
            false,
        );
        let integrons = assemble(vec![integrase("rep_1", 1000, 1300)], clusters, &rep);

        assert_eq!(integrons.len(), 1);
        assert_eq!(integrons[0].integron_type(), IntegronType::Complete);
        assert_eq!(integrons[0].attc().len(), 2);
        assert_eq!(integrons[0].integrase().unwrap().id(), Some("rep_1"));
    }

    #[test]
    fn scenario_complete_through_origin() {
        let rep = Replicon::new("rep", 1_000_000, Topology::Circular, 4000);
        let clusters = build_clusters(vec![attc(&rep, 998_000, 998_050, Strand::Forward)], &rep, false);
        let integrons = assemble(vec![integrase("rep_1", 1000, 1300)], clusters, &rep);

        assert_eq!(types(&integrons), vec![IntegronType::Complete]);
        assert_eq!(integrons[0].integrase_side(&rep), Some(Side::Right));
    }

    #[test]
    fn far_clusters_stay_apart() {
        let rep = Replicon::new("rep", 1_000_000, Topology::Circular, 4000);
        // 98.7 kb and 100.9 kb away through the origin
        let clusters = build_clusters(
            vec![
                attc(&rep, 100_000, 100_060, Strand::Forward),
                attc(&rep, 900_000, 900_050, Strand::Forward),
            ],
            &rep,
            false,
        );
        assert_eq!(clusters.len(), 2);
        let integrons = assemble(vec![integrase("rep_1", 1000, 1300)], clusters, &rep);

        assert_eq!(
            types(&integrons),
            vec![IntegronType::In0, IntegronType::AttC0, IntegronType::AttC0]
        );
    }

    #[test]
    fn degenerate_inputs() {
        let rep = Replicon::new("rep", 1_000_000, Topology::Linear, 4000);
        assert!(assemble(vec![], vec![], &rep).is_empty());

        let clusters = build_clusters(vec![attc(&rep, 1500, 1550, Strand::Forward)], &rep, false);
        assert_eq!(types(&assemble(vec![], clusters, &rep)), vec![IntegronType::AttC0]);

        let ints = vec![integrase("rep_1", 1000, 1300), integrase("rep_2", 5000, 5300)];
        assert_eq!(
            types(&assemble(ints, vec![], &rep)),
            vec![IntegronType::In0, IntegronType::In0]
        );
    }

    #[test]
    fn one_array_per_integrase() {
        let rep = Replicon::new("rep", 1_000_000, Topology::Linear, 4000);
        let clusters = build_clusters(vec![attc(&rep, 1500, 1550, Strand::Forward)], &rep, false);
        let ints = vec![integrase("rep_1", 1000, 1300), integrase("rep_2", 1700, 2000)];
        let integrons = assemble(ints, clusters, &rep);

        assert_eq!(types(&integrons), vec![IntegronType::Complete, IntegronType::In0]);
        assert_eq!(integrons[1].integrase().unwrap().id(), Some("rep_2"));
    }

    #[test]
    fn equidistant_arrays_first_wins() {
        let rep = Replicon::new("rep", 1_000_000, Topology::Linear, 4000);
        // same distance (200 bp) on both sides, same size, two strands
        let clusters = build_clusters(
            vec![
                attc(&rep, 1500, 1550, Strand::Reverse),
                attc(&rep, 700, 800, Strand::Forward),
            ],
            &rep,
            false,
        );
        assert_eq!(clusters[0].strand(), Strand::Forward);
        let integrons = assemble(vec![integrase("rep_1", 1000, 1300)], clusters, &rep);

        assert_eq!(integrons[0].integron_type(), IntegronType::Complete);
        assert_eq!(integrons[0].attc()[0].start(), 700);
        assert_eq!(integrons[1].attc()[0].start(), 1500);
    }

    #[test]
    fn every_hit_lands_once() {
        let rep = Replicon::new("rep", 200_000, Topology::Circular, 4000);
        let attcs = vec![
            attc(&rep, 1500, 1550, Strand::Forward),
            attc(&rep, 2500, 2560, Strand::Forward),
            attc(&rep, 50_000, 50_060, Strand::Reverse),
            attc(&rep, 120_000, 120_070, Strand::Forward),
            attc(&rep, 199_000, 199_080, Strand::Reverse),
        ];
        let ints = vec![
            integrase("rep_1", 1000, 1300),
            integrase("rep_2", 46_000, 47_000),
            integrase("rep_3", 150_000, 151_000),
        ];
        let n_hits = attcs.len() + ints.len();
        let integrons = assemble(ints, build_clusters(attcs, &rep, false), &rep);

        let all: Vec<(u64, u64)> = integrons
            .iter()
            .flat_map(|i| i.hits().map(|h| (h.start(), h.end())))
            .collect();
        assert_eq!(all.len(), n_hits);
        let uniq: HashSet<(u64, u64)> = all.iter().copied().collect();
        assert_eq!(uniq.len(), n_hits);

        for i in &integrons {
            let t = i.integron_type();
            assert_eq!(t == IntegronType::Complete, i.has_integrase() && i.has_attc());
        }
        assert_eq!(count_type(&integrons, IntegronType::Complete), (2, 3));
    }

    #[test]
    fn intersection_and_union() {
        let int_i = vec![
            Hit::integrase("rep", "p2", 5000, 5300, Strand::Forward, 1e-9, "intI_Cterm").unwrap(),
            Hit::integrase("rep", "p1", 1000, 1300, Strand::Forward, 1e-50, "intI_Cterm").unwrap(),
        ];
        let phage = vec![
            Hit::integrase("rep", "p1", 1000, 1300, Strand::Forward, 1e-30, PHAGE_INT_MODEL).unwrap(),
            Hit::integrase("rep", "p3", 800, 1100, Strand::Reverse, 1e-12, PHAGE_INT_MODEL).unwrap(),
        ];

        let inter = select_integrases(&int_i, &phage, false);
        assert_eq!(inter.len(), 1);
        assert_eq!(inter[0].id(), Some("p1"));
        assert_eq!(inter[0].model(), INTERSECTION_MODEL);

        let union = select_integrases(&int_i, &phage, true);
        let ids: Vec<_> = union.iter().map(|h| h.id().unwrap()).collect();
        assert_eq!(ids, vec!["p3", "p1", "p2"]);
        assert_eq!(union[0].model(), PHAGE_INT_MODEL);
        assert_eq!(union[1].model(), INTERSECTION_MODEL);
    }
}
