use crate::libs::hit::Topology;

/// Tunables of one detection run
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// maximal distance between two attC sites of an array, and between an
    /// array and its integrase
    pub dist_threshold: u64,
    /// attC hits at or above this e-value are ignored
    pub attc_evalue: f64,
    pub keep_palindromes: bool,
    /// take integrases found by either profile, not only by both
    pub union_integrases: bool,
    pub linear: bool,
    /// run the exhaustive attC search around each integron
    pub exhaustive: bool,
    pub cmsearch: String,
    pub attc_model: Option<String>,
    pub cpu: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            dist_threshold: 4000,
            attc_evalue: 1.0,
            keep_palindromes: false,
            union_integrases: false,
            linear: false,
            exhaustive: false,
            cmsearch: "cmsearch".to_string(),
            attc_model: None,
            cpu: 1,
        }
    }
}

impl Options {
    /// Requested topology; the replicon may still fall back to linear
    pub fn topology(&self) -> Topology {
        if self.linear {
            Topology::Linear
        } else {
            Topology::Circular
        }
    }
}
