use crate::libs::cluster::Cluster;
use crate::libs::hit::{Hit, Strand};
use crate::libs::protein::Protein;
use crate::libs::replicon::{Replicon, Side};
use std::fmt;

/// Bases past the outer attC where a cassette protein may still start
pub const CASSETTE_MARGIN: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegronType {
    /// an integrase and at least one attC
    Complete,
    /// attC sites without integrase
    AttC0,
    /// an integrase without attC
    In0,
}

impl fmt::Display for IntegronType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            IntegronType::Complete => "complete",
            IntegronType::AttC0 => "attC0",
            IntegronType::In0 => "In0",
        };
        write!(f, "{}", s)
    }
}

/// An integrase, its attC array, or both.
///
/// Only built from an integrase or from an array, so it is never empty.
#[derive(Debug, Clone)]
pub struct Integron {
    id: usize,
    replicon: String,
    replicon_len: u64,
    integrase: Option<Hit>,
    attc: Vec<Hit>,
    proteins: Vec<Protein>,
}

impl Integron {
    /// ```
    /// # use integron::libs::integron::{Integron, IntegronType};
    /// # use integron::libs::hit::{Hit, Strand, Topology};
    /// # use integron::libs::replicon::Replicon;
    /// let rep = Replicon::new("chr", 1_000_000, Topology::Linear, 4000);
    /// let int = Hit::integrase("chr", "chr_1", 1000, 1300, Strand::Forward, 1e-50, "intI_Cterm").unwrap();
    /// let integron = Integron::from_integrase(1, &rep, int);
    /// assert_eq!(integron.integron_type(), IntegronType::In0);
    /// ```
    pub fn from_integrase(id: usize, replicon: &Replicon, integrase: Hit) -> Self {
        Self {
            id,
            replicon: replicon.name().to_string(),
            replicon_len: replicon.len(),
            integrase: Some(integrase),
            attc: vec![],
            proteins: vec![],
        }
    }

    pub fn from_array(id: usize, replicon: &Replicon, array: Cluster) -> Self {
        let mut integron = Self {
            id,
            replicon: replicon.name().to_string(),
            replicon_len: replicon.len(),
            integrase: None,
            attc: vec![],
            proteins: vec![],
        };
        for hit in array.into_hits() {
            integron.add_attc(hit);
        }
        integron
    }

    /// An integrase with its array
    pub fn complete(id: usize, replicon: &Replicon, integrase: Hit, array: Cluster) -> Self {
        let mut integron = Self::from_integrase(id, replicon, integrase);
        for hit in array.into_hits() {
            integron.add_attc(hit);
        }
        integron
    }

    pub(crate) fn add_attc(&mut self, hit: Hit) {
        self.attc.push(hit);
    }

    /// Keeps the proteins lying between the integrase and the far end of the
    /// array, or around the array when there is no integrase, with a margin
    /// of [`CASSETTE_MARGIN`] past the outer attC. In0 integrons get none.
    pub fn add_proteins(&mut self, proteins: &[Protein]) {
        let (first, last) = match (self.attc.first(), self.attc.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return,
        };
        let len = self.replicon_len as i64;
        let wrap = |x: i64| x.rem_euclid(len);
        let margin = CASSETTE_MARGIN as i64;

        let mut debut = first.start() as i64;
        let mut fin = last.end() as i64;
        match &self.integrase {
            // integrase after the array
            Some(int) if wrap(debut - int.end() as i64) > wrap(int.start() as i64 - fin) => {
                fin = int.start() as i64;
                debut -= margin;
            }
            Some(int) => {
                debut = int.end() as i64;
                fin += margin;
            }
            None => {
                debut -= margin;
                fin += margin;
            }
        }
        let span = wrap(fin - debut);

        let integrase_id = self.integrase.as_ref().and_then(|h| h.id());
        self.proteins = proteins
            .iter()
            .filter(|p| Some(p.id()) != integrase_id)
            .filter(|p| {
                wrap(fin - p.end() as i64) < span || wrap(p.start() as i64 - debut) < span
            })
            .cloned()
            .collect();
    }

    /// Gives back the integrase and the attC sites
    pub fn into_parts(self) -> (Option<Hit>, Vec<Hit>) {
        (self.integrase, self.attc)
    }

    // Immutable accessors
    pub fn id(&self) -> usize {
        self.id
    }
    pub fn replicon(&self) -> &str {
        &self.replicon
    }
    pub fn integrase(&self) -> Option<&Hit> {
        self.integrase.as_ref()
    }
    pub fn attc(&self) -> &[Hit] {
        &self.attc
    }
    pub fn proteins(&self) -> &[Protein] {
        &self.proteins
    }

    pub fn has_integrase(&self) -> bool {
        self.integrase.is_some()
    }

    pub fn has_attc(&self) -> bool {
        !self.attc.is_empty()
    }

    pub fn integron_type(&self) -> IntegronType {
        match (self.has_integrase(), self.has_attc()) {
            (true, true) => IntegronType::Complete,
            (false, true) => IntegronType::AttC0,
            (true, false) => IntegronType::In0,
            (false, false) => unreachable!("integron {} has no element", self.id),
        }
    }

    /// Strand of the attC array
    pub fn array_strand(&self) -> Option<Strand> {
        self.attc.first().map(|h| h.strand())
    }

    /// Where the integrase sits relative to the attC array
    pub fn integrase_side(&self, replicon: &Replicon) -> Option<Side> {
        let int = self.integrase.as_ref()?;
        let first = self.attc.first()?;
        let last = self.attc.last()?;

        let left = replicon.ahead(first.start(), int.end());
        let right = replicon.ahead(int.start(), last.end());
        let side = match (left, right) {
            (Some(l), Some(r)) if l < r => Side::Left,
            (Some(_), Some(_)) => Side::Right,
            (Some(_), None) => Side::Left,
            (None, Some(_)) => Side::Right,
            (None, None) if int.start() <= first.start() => Side::Left,
            (None, None) => Side::Right,
        };
        Some(side)
    }

    /// Distance from the previous attC for each site, `None` for the first
    ///
    /// ```
    /// # use integron::libs::cluster::build_clusters;
    /// # use integron::libs::integron::Integron;
    /// # use integron::libs::hit::{Hit, Strand, Topology};
    /// # use integron::libs::replicon::Replicon;
    /// let rep = Replicon::new("chr", 1_000_000, Topology::Linear, 4000);
    /// let hits = vec![
    ///     Hit::attc("chr", 1500, 1550, Strand::Forward, 1e-5, "attc_4").unwrap(),
    ///     Hit::attc("chr", 1600, 1650, Strand::Forward, 1e-5, "attc_4").unwrap(),
    /// ];
    /// let array = build_clusters(hits, &rep, false).remove(0);
    /// let integron = Integron::from_array(1, &rep, array);
    /// assert_eq!(integron.cassette_sizes(), vec![None, Some(50)]);
    /// ```
    pub fn cassette_sizes(&self) -> Vec<Option<u64>> {
        let len = self.replicon_len as i64;
        let mut sizes = Vec::with_capacity(self.attc.len());
        for (i, hit) in self.attc.iter().enumerate() {
            if i == 0 {
                sizes.push(None);
            } else {
                let prev = &self.attc[i - 1];
                let d = (hit.start() as i64 - prev.end() as i64).rem_euclid(len);
                sizes.push(Some(d as u64));
            }
        }
        sizes
    }

    /// Leftmost coordinate of any element
    pub fn min_position(&self) -> u64 {
        self.integrase
            .iter()
            .chain(self.attc.iter())
            .map(|h| h.start())
            .min()
            .unwrap_or(0)
    }

    /// Every hit held, integrase first
    pub fn hits(&self) -> impl Iterator<Item = &Hit> {
        self.integrase.iter().chain(self.attc.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::cluster::build_clusters;
    use crate::libs::hit::Topology;

    fn array(rep: &Replicon, starts: &[u64], strand: Strand) -> Cluster {
        let hits = starts
            .iter()
            .map(|&s| Hit::attc(rep.name(), s, s + 50, strand, 1e-5, "attc_4").unwrap())
            .collect();
        build_clusters(hits, rep, true).remove(0)
    }

    fn integrase(start: u64, end: u64) -> Hit {
        Hit::integrase("rep", "rep_7", start, end, Strand::Reverse, 1e-40, "intersection_tyr_intI")
            .unwrap()
    }

    #[test]
    fn classification() {
        let rep = Replicon::new("rep", 1_000_000, Topology::Linear, 4000);

        let i = Integron::from_integrase(1, &rep, integrase(1000, 1300));
        assert_eq!(i.integron_type(), IntegronType::In0);
        assert!(!i.has_attc());

        let i = Integron::from_array(2, &rep, array(&rep, &[1500, 1600], Strand::Forward));
        assert_eq!(i.integron_type(), IntegronType::AttC0);
        assert!(!i.has_integrase());

        let i = Integron::complete(
            3,
            &rep,
            integrase(1000, 1300),
            array(&rep, &[1500, 1600], Strand::Forward),
        );
        assert_eq!(i.integron_type(), IntegronType::Complete);
        assert_eq!(i.hits().count(), 3);
        assert_eq!(i.integron_type().to_string(), "complete");
    }

    #[test]
    fn integrase_side_linear_and_circular() {
        let lin = Replicon::new("rep", 1_000_000, Topology::Linear, 4000);
        let i = Integron::complete(1, &lin, integrase(1000, 1300), array(&lin, &[1500], Strand::Forward));
        assert_eq!(i.integrase_side(&lin), Some(Side::Left));

        let i = Integron::complete(1, &lin, integrase(5000, 5300), array(&lin, &[1500], Strand::Forward));
        assert_eq!(i.integrase_side(&lin), Some(Side::Right));

        let circ = Replicon::new("rep", 1_000_000, Topology::Circular, 4000);
        let i = Integron::complete(
            1,
            &circ,
            integrase(1000, 1300),
            array(&circ, &[998_000], Strand::Forward),
        );
        assert_eq!(i.integrase_side(&circ), Some(Side::Right));
    }

    #[test]
    fn cassette_sizes_wrap_through_origin() {
        let rep = Replicon::new("rep", 100_000, Topology::Circular, 4000);
        let i = Integron::from_array(1, &rep, array(&rep, &[99_000, 500], Strand::Forward));
        assert_eq!(i.attc()[0].start(), 99_000);
        assert_eq!(i.cassette_sizes(), vec![None, Some(1450)]);
        assert_eq!(i.min_position(), 500);
    }

    #[test]
    fn proteins_between_integrase_and_array() {
        let rep = Replicon::new("rep", 20_000, Topology::Linear, 4000);
        let proteins = vec![
            Protein::new("rep_1", 1001, 1300, Strand::Forward),
            Protein::new("rep_2", 1700, 2500, Strand::Forward),
            Protein::new("rep_3", 3000, 3500, Strand::Forward),
            Protein::new("rep_4", 100, 900, Strand::Reverse),
        ];
        // integrase on the left: keep up to 200 bp past the last attC
        let mut i = Integron::complete(
            1,
            &rep,
            integrase(1001, 1300),
            array(&rep, &[1500, 1600], Strand::Forward),
        );
        i.add_proteins(&proteins);
        let ids: Vec<&str> = i.proteins().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["rep_2"]);

        // no integrase: 200 bp on both sides
        let mut i = Integron::from_array(2, &rep, array(&rep, &[1000, 1100], Strand::Forward));
        i.add_proteins(&proteins);
        let ids: Vec<&str> = i.proteins().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["rep_1", "rep_4"]);

        let mut i = Integron::from_integrase(3, &rep, integrase(5000, 5300));
        i.add_proteins(&proteins);
        assert!(i.proteins().is_empty());
    }

    #[test]
    fn proteins_with_integrase_after_array() {
        let rep = Replicon::new("rep", 100_000, Topology::Circular, 4000);
        let proteins = vec![
            Protein::new("rep_8", 99_500, 99_900, Strand::Reverse),
            Protein::new("rep_9", 1000, 1400, Strand::Reverse),
            Protein::new("rep_10", 3000, 4000, Strand::Reverse),
        ];
        // array through the origin, integrase right of it
        let mut i = Integron::complete(
            1,
            &rep,
            integrase(3000, 4000),
            array(&rep, &[99_700, 300], Strand::Reverse),
        );
        i.add_proteins(&proteins);
        let ids: Vec<&str> = i.proteins().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["rep_8", "rep_9"]);
    }
}
