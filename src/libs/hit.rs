use crate::libs::error::Error;
use std::fmt;

//----------------------------
// Strand / kind / topology
//----------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    /// `+1` / `-1`, as written in the result tables
    pub fn sign(&self) -> i8 {
        match self {
            Strand::Forward => 1,
            Strand::Reverse => -1,
        }
    }

    /// Accepts `+`, `-`, `1`, `-1`, `D` (gembase direct) and `C` (complement)
    ///
    /// ```
    /// # use integron::libs::hit::Strand;
    /// assert_eq!(Strand::parse("+"), Some(Strand::Forward));
    /// assert_eq!(Strand::parse("-1"), Some(Strand::Reverse));
    /// assert_eq!(Strand::parse("x"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Strand> {
        match s {
            "+" | "1" | "+1" | "D" => Some(Strand::Forward),
            "-" | "-1" | "C" => Some(Strand::Reverse),
            _ => None,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.sign())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    Integrase,
    AttC,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Circular,
    Linear,
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Topology::Circular => write!(f, "circ"),
            Topology::Linear => write!(f, "lin"),
        }
    }
}

/// Forward distance from `b` to `a`.
///
/// Circular replicons wrap, so the result is always in `[0, len)`.
/// Linear replicons never wrap and the result is signed: a negative value
/// means `a` lies before `b`.
///
/// ```
/// # use integron::libs::hit::{distance, Topology};
/// assert_eq!(distance(1500, 1300, Topology::Linear, 1_000_000), 200);
/// assert_eq!(distance(1000, 998_050, Topology::Circular, 1_000_000), 2950);
/// assert_eq!(distance(1000, 998_050, Topology::Linear, 1_000_000), -997_050);
/// ```
pub fn distance(a: u64, b: u64, topology: Topology, len: u64) -> i64 {
    let d = a as i64 - b as i64;
    match topology {
        Topology::Circular => d.rem_euclid(len as i64),
        Topology::Linear => d,
    }
}

//----------------------------
// Hit
//----------------------------
/// One located, scored feature. Coordinates are 1-based and inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    replicon: String,
    id: Option<String>,
    start: u64,
    end: u64,
    strand: Strand,
    evalue: f64,
    model: String,
    kind: HitKind,
}

impl Hit {
    /// Builds an attC hit, swapping reversed coordinates.
    ///
    /// ```
    /// # use integron::libs::hit::{Hit, Strand};
    /// let hit = Hit::attc("rep", 1550, 1500, Strand::Reverse, 1e-5, "attc_4").unwrap();
    /// assert_eq!(hit.start(), 1500);
    /// assert_eq!(hit.end(), 1550);
    /// assert_eq!(hit.strand(), Strand::Reverse);
    /// assert!(Hit::attc("rep", 0, 50, Strand::Forward, 1e-5, "attc_4").is_err());
    /// ```
    pub fn attc(
        replicon: &str,
        start: u64,
        end: u64,
        strand: Strand,
        evalue: f64,
        model: &str,
    ) -> Result<Self, Error> {
        Self::build(replicon, None, start, end, strand, evalue, model, HitKind::AttC)
    }

    pub fn integrase(
        replicon: &str,
        protein: &str,
        start: u64,
        end: u64,
        strand: Strand,
        evalue: f64,
        model: &str,
    ) -> Result<Self, Error> {
        Self::build(
            replicon,
            Some(protein.to_string()),
            start,
            end,
            strand,
            evalue,
            model,
            HitKind::Integrase,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        replicon: &str,
        id: Option<String>,
        start: u64,
        end: u64,
        strand: Strand,
        evalue: f64,
        model: &str,
        kind: HitKind,
    ) -> Result<Self, Error> {
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        if start == 0 {
            return Err(Error::InvalidHit(format!(
                "{}: start must be 1-based, got {}..{}",
                replicon, start, end
            )));
        }
        if evalue.is_nan() || evalue < 0.0 {
            return Err(Error::InvalidHit(format!(
                "{}: bad e-value {} at {}..{}",
                replicon, evalue, start, end
            )));
        }

        Ok(Self {
            replicon: replicon.to_string(),
            id,
            start,
            end,
            strand,
            evalue,
            model: model.to_string(),
            kind,
        })
    }

    /// The same hit under another model name
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    // Immutable accessors
    pub fn replicon(&self) -> &str {
        &self.replicon
    }
    /// Protein id for integrases, `None` for attC sites
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
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
    pub fn evalue(&self) -> f64 {
        self.evalue
    }
    pub fn model(&self) -> &str {
        &self.model
    }
    pub fn kind(&self) -> HitKind {
        self.kind
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Key for exact-duplicate detection
    pub fn key(&self) -> (u64, u64, Strand) {
        (self.start, self.end, self.strand)
    }
}

/// Orders hits by start, then e-value
pub fn by_start_evalue(a: &Hit, b: &Hit) -> std::cmp::Ordering {
    a.start
        .cmp(&b.start)
        .then_with(|| a.evalue.total_cmp(&b.evalue))
}
