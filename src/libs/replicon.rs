use crate::libs::error::Error;
use crate::libs::hit::{distance, Topology};
use log::{info, warn};
use std::fmt;

/// A stretch of the replicon, 0-based and half-open.
///
/// On a circular replicon `beg > end` means the window runs through the
/// origin: `[beg, len) + [0, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub beg: u64,
    pub end: u64,
}

impl Window {
    pub fn new(beg: u64, end: u64) -> Self {
        Self { beg, end }
    }

    pub fn wraps(&self) -> bool {
        self.beg > self.end
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.beg, self.end)
    }
}

/// Which side of a feature something lies on, origin to the left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Replicon descriptor: name, length, topology and the clustering threshold.
#[derive(Debug, Clone)]
pub struct Replicon {
    name: String,
    len: u64,
    topology: Topology,
    dist_threshold: u64,
    seq: Option<Vec<u8>>,
}

impl Replicon {
    /// Applies the topology rule: circularity is only honoured when the
    /// replicon is longer than four times the distance threshold.
    ///
    /// ```
    /// # use integron::libs::replicon::Replicon;
    /// # use integron::libs::hit::Topology;
    /// let rep = Replicon::new("chr", 1_000_000, Topology::Circular, 4000);
    /// assert_eq!(rep.topology(), Topology::Circular);
    /// let rep = Replicon::new("plasmid", 16_000, Topology::Circular, 4000);
    /// assert_eq!(rep.topology(), Topology::Linear);
    /// ```
    pub fn new(name: &str, len: u64, topology: Topology, dist_threshold: u64) -> Self {
        let topology = if topology == Topology::Circular && len <= 4 * dist_threshold {
            warn!(
                "replicon {} is too short ({} bp) to be circular with a {} bp threshold, treated as linear",
                name, len, dist_threshold
            );
            Topology::Linear
        } else {
            topology
        };

        Self {
            name: name.to_string(),
            len,
            topology,
            dist_threshold,
            seq: None,
        }
    }

    /// Loads the first record of a FASTA file
    pub fn from_fasta(infile: &str, topology: Topology, dist_threshold: u64) -> Result<Self, Error> {
        if infile != "stdin" && !std::path::Path::new(infile).is_file() {
            return Err(Error::Replicon(format!("can't find the replicon file {}", infile)));
        }
        let reader = intspan::reader(infile);
        let mut fa_in = noodles_fasta::io::Reader::new(reader);

        let record = match fa_in.records().next() {
            Some(result) => result.map_err(|e| Error::io(e, infile))?,
            None => return Err(Error::Replicon(format!("no sequence in {}", infile))),
        };
        let name = String::from_utf8_lossy(record.name()).to_string();
        let seq: Vec<u8> = record.sequence().as_ref().to_vec();
        if seq.is_empty() {
            return Err(Error::Replicon(format!("sequence {} is empty", name)));
        }
        info!("replicon {} loaded: {} bp", name, seq.len());

        let mut replicon = Self::new(&name, seq.len() as u64, topology, dist_threshold);
        replicon.seq = Some(seq);
        Ok(replicon)
    }

    // Immutable accessors
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn len(&self) -> u64 {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    pub fn topology(&self) -> Topology {
        self.topology
    }
    pub fn is_circular(&self) -> bool {
        self.topology == Topology::Circular
    }
    pub fn dist_threshold(&self) -> u64 {
        self.dist_threshold
    }
    pub fn has_sequence(&self) -> bool {
        self.seq.is_some()
    }

    /// Forward distance from `b` to `a` under this replicon's topology
    pub fn distance(&self, a: u64, b: u64) -> i64 {
        distance(a, b, self.topology, self.len)
    }

    /// Forward distance from `b` to `a`, `None` when `a` is not ahead of `b`
    /// on a linear replicon
    pub fn ahead(&self, a: u64, b: u64) -> Option<u64> {
        let d = self.distance(a, b);
        if d < 0 {
            None
        } else {
            Some(d as u64)
        }
    }

    /// Moves an offset towards the origin; wraps or clamps at 0
    pub fn shift_left(&self, pos: u64, by: u64) -> u64 {
        match self.topology {
            Topology::Circular => (pos + self.len - by % self.len) % self.len,
            Topology::Linear => pos.saturating_sub(by),
        }
    }

    /// Moves an offset away from the origin; wraps or clamps at `len`
    pub fn shift_right(&self, pos: u64, by: u64) -> u64 {
        match self.topology {
            Topology::Circular => (pos + by) % self.len,
            Topology::Linear => std::cmp::min(self.len, pos + by),
        }
    }

    /// Window covering 1-based `start..=end`, padded on both sides
    ///
    /// ```
    /// # use integron::libs::replicon::{Replicon, Window};
    /// # use integron::libs::hit::Topology;
    /// let rep = Replicon::new("chr", 100_000, Topology::Circular, 4000);
    /// assert_eq!(rep.window(1000, 1200, 4000, 200), Window::new(96_999, 1400));
    /// let rep = Replicon::new("chr", 100_000, Topology::Linear, 4000);
    /// assert_eq!(rep.window(1000, 1200, 4000, 200), Window::new(0, 1400));
    /// ```
    pub fn window(&self, start: u64, end: u64, pad_left: u64, pad_right: u64) -> Window {
        Window::new(
            self.shift_left(start - 1, pad_left),
            self.shift_right(end, pad_right),
        )
    }

    /// Number of bases in the window
    pub fn window_len(&self, window: &Window) -> u64 {
        if window.wraps() {
            self.len - window.beg + window.end
        } else {
            window.end - window.beg
        }
    }

    /// Maps a 1-based position relative to a window back to the replicon
    ///
    /// ```
    /// # use integron::libs::replicon::Replicon;
    /// # use integron::libs::hit::Topology;
    /// let rep = Replicon::new("chr", 100_000, Topology::Circular, 4000);
    /// assert_eq!(rep.map_position(99_900, 1), 99_901);
    /// assert_eq!(rep.map_position(99_900, 100), 100_000);
    /// assert_eq!(rep.map_position(99_900, 101), 1);
    /// ```
    pub fn map_position(&self, window_beg: u64, pos: u64) -> u64 {
        (window_beg + pos - 1) % self.len + 1
    }

    /// Sequence of the window, joined through the origin when it wraps
    pub fn subseq(&self, window: &Window) -> Result<Vec<u8>, Error> {
        let seq = self.seq.as_ref().ok_or_else(|| {
            Error::Replicon(format!("no sequence loaded for replicon {}", self.name))
        })?;
        let beg = window.beg as usize;
        let end = window.end as usize;
        if beg > seq.len() || end > seq.len() {
            return Err(Error::Replicon(format!(
                "window {} out of replicon {} ({} bp)",
                window, self.name, self.len
            )));
        }

        let sub = if window.wraps() {
            let mut sub = seq[beg..].to_vec();
            sub.extend_from_slice(&seq[..end]);
            sub
        } else {
            seq[beg..end].to_vec()
        };
        Ok(sub)
    }

    #[cfg(test)]
    pub(crate) fn with_sequence(mut self, seq: &[u8]) -> Self {
        self.len = seq.len() as u64;
        self.seq = Some(seq.to_vec());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_replicon_is_linear() {
        let rep = Replicon::new("p", 16_001, Topology::Circular, 4000);
        assert!(rep.is_circular());
        let rep = Replicon::new("p", 16_000, Topology::Circular, 4000);
        assert!(!rep.is_circular());
        let rep = Replicon::new("p", 1_000_000, Topology::Linear, 4000);
        assert!(!rep.is_circular());
    }

    #[test]
    fn shifts_wrap_or_clamp() {
        let circ = Replicon::new("c", 100_000, Topology::Circular, 4000);
        assert_eq!(circ.shift_left(100, 4000), 96_100);
        assert_eq!(circ.shift_right(99_000, 4000), 3000);

        let lin = Replicon::new("l", 100_000, Topology::Linear, 4000);
        assert_eq!(lin.shift_left(100, 4000), 0);
        assert_eq!(lin.shift_right(99_000, 4000), 100_000);
    }

    #[test]
    fn ahead_rejects_linear_backwards() {
        let lin = Replicon::new("l", 100_000, Topology::Linear, 4000);
        assert_eq!(lin.ahead(500, 300), Some(200));
        assert_eq!(lin.ahead(300, 500), None);

        let circ = Replicon::new("c", 100_000, Topology::Circular, 4000);
        assert_eq!(circ.ahead(300, 500), Some(99_800));
    }

    #[test]
    fn subseq_through_origin() {
        let rep = Replicon::new("c", 10, Topology::Linear, 1).with_sequence(b"ACGTACGTTT");
        assert_eq!(rep.subseq(&Window::new(2, 5)).unwrap(), b"GTA".to_vec());
        assert_eq!(rep.subseq(&Window::new(8, 2)).unwrap(), b"TTAC".to_vec());
        assert_eq!(rep.window_len(&Window::new(8, 2)), 4);
        assert!(rep.subseq(&Window::new(8, 12)).is_err());
    }

    #[test]
    fn subseq_needs_sequence() {
        let rep = Replicon::new("c", 10, Topology::Linear, 1);
        assert!(rep.subseq(&Window::new(0, 5)).is_err());
    }
}
