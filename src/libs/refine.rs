//! Exhaustive attC search around assembled integrons.
//!
//! The genome-wide attC search uses heuristic filters. The exhaustive mode
//! (`cmsearch --max`) finds more sites but is too slow for a whole replicon,
//! so it only runs in windows around the integrons found by the fast pass,
//! and slides outwards as long as it keeps finding sites next to the array.
//!
//! ```text
//! Fast pass:
//!                  attC
//! __________________-->____-->_________-->_____________
//! ______<--------______________________________________
//!          intI
//!                 ^-----------------------------------^
//!                  window, then slid right while hits keep coming
//!
//! Refined:
//!                  attC          ***         ***
//! __________________-->____-->___-->___-->___-->_______
//! ______<--------______________________________________
//! ```

use crate::libs::assemble::{assemble, PHAGE_INT_MODEL};
use crate::libs::cluster::build_clusters;
use crate::libs::error::Error;
use crate::libs::hit::{by_start_evalue, Hit, Strand};
use crate::libs::integron::{Integron, IntegronType};
use crate::libs::replicon::{Replicon, Side, Window};
use intspan::IntSpan;
use itertools::Itertools;
use log::{debug, info, warn};
use std::collections::HashSet;

/// Bases shared by two consecutive windows, so a site on the border is seen
pub const OVERLAP: u64 = 200;

/// Accepted attC lengths (`end - start`) for exhaustive hits
pub const ATTC_MIN_LEN: u64 = 41;
pub const ATTC_MAX_LEN: u64 = 199;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrand {
    Top,
    Bottom,
    Both,
}

impl From<Strand> for SearchStrand {
    fn from(strand: Strand) -> Self {
        match strand {
            Strand::Forward => SearchStrand::Top,
            Strand::Reverse => SearchStrand::Bottom,
        }
    }
}

/// The exhaustive attC search engine.
///
/// Returned hits carry coordinates relative to the window: position 1 is
/// the first base of `window`.
pub trait AttcSearch {
    fn search(
        &mut self,
        replicon: &Replicon,
        window: &Window,
        strand: SearchStrand,
    ) -> Result<Vec<Hit>, Error>;
}

/// Moves window-relative hits back onto the replicon.
///
/// Hits outside the accepted attC length are dropped, as are hits that
/// would run through the origin once mapped.
pub fn localize(hits: Vec<Hit>, window: &Window, replicon: &Replicon) -> Vec<Hit> {
    let mut located = Vec::with_capacity(hits.len());
    for hit in hits {
        if hit.len() < ATTC_MIN_LEN || hit.len() > ATTC_MAX_LEN {
            debug!(
                "exhaustive hit of {} bp in window {} dropped",
                hit.len(),
                window
            );
            continue;
        }
        let start = replicon.map_position(window.beg, hit.start());
        let end = replicon.map_position(window.beg, hit.end());
        if start > end {
            debug!("exhaustive hit {}..{} runs through the origin, dropped", start, end);
            continue;
        }
        match Hit::attc(replicon.name(), start, end, hit.strand(), hit.evalue(), hit.model()) {
            Ok(h) => located.push(h),
            Err(e) => debug!("{}", e),
        }
    }
    located
}

//----------------------------
// Expansion
//----------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// the last window brought nothing next to the current edge
    NoAdjacentHit,
    /// a linear replicon's end was reached
    RepliconEnd,
    /// a circular window came back to its start or to the integrase
    Wrapped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue(Window),
    Stop(StopReason),
}

/// State of the outward slide on one side of an element.
///
/// `edge` is the outermost known site on that side (a 1-based end when
/// going right, a 1-based start when going left). `room` is the number of
/// bases the window may still cover before a barrier.
#[derive(Debug, Clone)]
pub struct Expansion {
    side: Side,
    window: Window,
    edge: u64,
    room: u64,
}

impl Expansion {
    pub fn new(side: Side, window: Window, edge: u64, room: u64) -> Self {
        Self {
            side,
            window,
            edge,
            room,
        }
    }

    /// Sets up the slide from `window`, stopping before `barrier`, a 0-based
    /// offset only used on circular replicons
    pub fn towards(side: Side, window: Window, edge: u64, barrier: u64, replicon: &Replicon) -> Self {
        let len = replicon.len();
        let room = if replicon.is_circular() {
            let free = len - replicon.window_len(&window);
            let gap = match side {
                Side::Right => (barrier + len - window.end) % len,
                Side::Left => (window.beg + len - barrier) % len,
            };
            std::cmp::min(gap, free)
        } else {
            match side {
                Side::Right => len - window.end,
                Side::Left => window.beg,
            }
        };
        Self::new(side, window, edge, room)
    }

    pub fn side(&self) -> Side {
        self.side
    }
    pub fn window(&self) -> &Window {
        &self.window
    }
    pub fn edge(&self) -> u64 {
        self.edge
    }

    /// Decides on the next window from the hits of the current one.
    ///
    /// Hits chain from the edge: a hit counts when it starts within the
    /// distance threshold of the edge or of a hit already counted.
    pub fn advance(&mut self, found: &[Hit], replicon: &Replicon) -> Step {
        let dist = replicon.dist_threshold();

        // (distance to the near end, distance to the far end), from the edge
        let mut reaches: Vec<(u64, u64)> = found
            .iter()
            .filter_map(|h| match self.side {
                Side::Right => Some((
                    replicon.ahead(h.start(), self.edge)?,
                    replicon.ahead(h.end(), self.edge)?,
                )),
                Side::Left => Some((
                    replicon.ahead(self.edge, h.end())?,
                    replicon.ahead(self.edge, h.start())?,
                )),
            })
            .collect();
        reaches.sort_unstable();

        let mut reach = 0;
        let mut adjacent = 0;
        for (near, far) in reaches {
            if near > reach + dist {
                break;
            }
            reach = std::cmp::max(reach, far);
            adjacent += 1;
        }
        if adjacent == 0 {
            return Step::Stop(StopReason::NoAdjacentHit);
        }

        self.edge = match self.side {
            Side::Right => replicon.shift_right(self.edge - 1, reach) + 1,
            Side::Left => replicon.shift_left(self.edge - 1, reach) + 1,
        };

        if self.room == 0 {
            return Step::Stop(if replicon.is_circular() {
                StopReason::Wrapped
            } else {
                StopReason::RepliconEnd
            });
        }
        let step = std::cmp::min(dist, self.room);
        self.room -= step;

        self.window = match self.side {
            Side::Right => Window::new(
                replicon.shift_left(self.window.end, OVERLAP),
                replicon.shift_right(self.window.end, step),
            ),
            Side::Left => Window::new(
                replicon.shift_left(self.window.beg, step),
                replicon.shift_right(self.window.beg, OVERLAP),
            ),
        };
        Step::Continue(self.window)
    }
}

//----------------------------
// Planning
//----------------------------
/// Regions already passed to the search engine, one set of 1-based
/// positions per strand
#[derive(Debug, Default, Clone)]
pub struct Searched {
    top: IntSpan,
    bottom: IntSpan,
}

impl Searched {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn top(&self) -> &IntSpan {
        &self.top
    }
    pub fn bottom(&self) -> &IntSpan {
        &self.bottom
    }

    /// Adds a window; `Both` marks the two strands.
    ///
    /// `IntSpan` holds `i32`, so windows past `i32::MAX` are not tracked.
    pub fn record(&mut self, window: &Window, strand: SearchStrand, replicon: &Replicon) {
        let span = match window_span(window, replicon) {
            Some(span) => span,
            None => {
                warn!(
                    "window {} of {} lies past {}, not tracked as searched",
                    window,
                    replicon.name(),
                    i32::MAX
                );
                return;
            }
        };

        if strand != SearchStrand::Bottom {
            self.top.merge(&span);
        }
        if strand != SearchStrand::Top {
            self.bottom.merge(&span);
        }
    }

    /// Whether the 1-based `pos` was searched on `strand`
    pub fn contains(&self, pos: u64, strand: SearchStrand) -> bool {
        let pos = match i32::try_from(pos) {
            Ok(pos) => pos,
            Err(_) => return false,
        };
        match strand {
            SearchStrand::Top => self.top.contains(pos),
            SearchStrand::Bottom => self.bottom.contains(pos),
            SearchStrand::Both => self.top.contains(pos) && self.bottom.contains(pos),
        }
    }
}

/// 1-based positions of a window, split at the origin when it wraps
fn window_span(window: &Window, replicon: &Replicon) -> Option<IntSpan> {
    let beg = i32::try_from(window.beg).ok()?;
    let end = i32::try_from(window.end).ok()?;

    let mut span = IntSpan::new();
    if window.wraps() {
        let len = i32::try_from(replicon.len()).ok()?;
        span.add_pair(beg + 1, len);
        if end > 0 {
            span.add_pair(1, end);
        }
    } else if end > beg {
        span.add_pair(beg + 1, end);
    }
    Some(span)
}

/// Where and how to search around one integron
#[derive(Debug, Clone)]
pub struct Plan {
    pub window: Window,
    pub strand: SearchStrand,
    pub expansions: Vec<Expansion>,
}

/// Window policy per integron type. `None` means the integron is not
/// searched.
pub fn plan(integron: &Integron, replicon: &Replicon, searched: &Searched) -> Option<Plan> {
    let dist = replicon.dist_threshold();

    match integron.integron_type() {
        IntegronType::Complete => {
            let int = integron.integrase()?;
            let first = integron.attc().first()?;
            let last = integron.attc().last()?;
            let toward = integron.integrase_side(replicon)?.opposite();

            let (window, edge, barrier) = match toward {
                Side::Right => (
                    replicon.window(first.start(), last.end(), OVERLAP, dist),
                    last.end(),
                    int.start() - 1,
                ),
                Side::Left => (
                    replicon.window(first.start(), last.end(), dist, OVERLAP),
                    first.start(),
                    int.end(),
                ),
            };
            Some(Plan {
                window,
                strand: SearchStrand::from(first.strand()),
                expansions: vec![Expansion::towards(toward, window, edge, barrier, replicon)],
            })
        }
        IntegronType::AttC0 => {
            let first = integron.attc().first()?;
            let last = integron.attc().last()?;
            let strand = SearchStrand::from(first.strand());
            if integron
                .attc()
                .iter()
                .any(|h| searched.contains(h.start(), strand))
            {
                debug!(
                    "attC array at {}..{} already searched on its strand",
                    first.start(),
                    last.end()
                );
                return None;
            }

            let window = replicon.window(first.start(), last.end(), dist, dist);
            Some(Plan {
                window,
                strand,
                expansions: both_sides(window, first.start(), last.end(), replicon),
            })
        }
        IntegronType::In0 => {
            let int = integron.integrase()?;
            if int.model() == PHAGE_INT_MODEL {
                debug!(
                    "{} only hit by {}, not searched",
                    int.id().unwrap_or("-"),
                    PHAGE_INT_MODEL
                );
                return None;
            }

            let window = replicon.window(int.start(), int.end(), dist, dist);
            Some(Plan {
                window,
                strand: SearchStrand::Both,
                expansions: both_sides(window, int.start(), int.end(), replicon),
            })
        }
    }
}

fn both_sides(window: Window, start: u64, end: u64, replicon: &Replicon) -> Vec<Expansion> {
    vec![
        Expansion::towards(Side::Left, window, start, window.end, replicon),
        Expansion::towards(Side::Right, window, end, window.beg, replicon),
    ]
}

//----------------------------
// Refinement
//----------------------------
#[derive(Debug, Default)]
pub struct RefineReport {
    /// integrons searched
    pub searched: usize,
    /// windows passed to the search engine
    pub windows: usize,
    /// attC sites not known from the fast pass
    pub added: usize,
    pub regions: Searched,
    /// failed windows with their integron id, one per aborted direction
    pub failures: Vec<(usize, Error)>,
}

impl RefineReport {
    /// Number of integrons with at least one failed window
    pub fn failed_integrons(&self) -> usize {
        self.failures.iter().map(|(id, _)| id).unique().count()
    }
}

/// Runs the exhaustive search around every integron, then builds the
/// integrons again from the fast-pass and the exhaustive attC sites.
///
/// A failed window stops that direction for that integron only; sites
/// already known are never removed.
pub fn refine<S: AttcSearch + ?Sized>(
    integrons: Vec<Integron>,
    replicon: &Replicon,
    searcher: &mut S,
    keep_palindromes: bool,
) -> (Vec<Integron>, RefineReport) {
    let mut report = RefineReport::default();
    let mut found: Vec<Hit> = vec![];

    for integron in integrons.iter() {
        let plan = match plan(integron, replicon, &report.regions) {
            Some(plan) => plan,
            None => continue,
        };
        report.searched += 1;

        report.windows += 1;
        report.regions.record(&plan.window, plan.strand, replicon);
        let initial = match searcher.search(replicon, &plan.window, plan.strand) {
            Ok(hits) => localize(hits, &plan.window, replicon),
            Err(e) => {
                warn!("integron {}: {}", integron.id(), e);
                report.failures.push((integron.id(), e));
                continue;
            }
        };
        found.extend(initial.iter().cloned());

        for mut expansion in plan.expansions {
            let mut last = initial.clone();
            loop {
                match expansion.advance(&last, replicon) {
                    Step::Continue(window) => {
                        report.windows += 1;
                        report.regions.record(&window, plan.strand, replicon);
                        match searcher.search(replicon, &window, plan.strand) {
                            Ok(hits) => {
                                last = localize(hits, &window, replicon);
                                found.extend(last.iter().cloned());
                            }
                            Err(e) => {
                                warn!("integron {}: {}", integron.id(), e);
                                report.failures.push((integron.id(), e));
                                break;
                            }
                        }
                    }
                    Step::Stop(reason) => {
                        debug!(
                            "integron {}: {:?} expansion stopped ({:?})",
                            integron.id(),
                            expansion.side(),
                            reason
                        );
                        break;
                    }
                }
            }
        }
    }

    let (integrons, added) = reassemble(integrons, found, replicon, keep_palindromes);
    report.added = added;

    info!(
        "Exhaustive search: {} integron(s), {} window(s), {} attC site(s) added, {} failure(s)",
        report.searched,
        report.windows,
        report.added,
        report.failures.len()
    );
    (integrons, report)
}

/// Clusters and assembles the union of known and exhaustive sites, so a site
/// found from two integrons lands in one of them and arrays keep one strand.
/// Returns the integrons and the number of new sites.
fn reassemble(
    integrons: Vec<Integron>,
    found: Vec<Hit>,
    replicon: &Replicon,
    keep_palindromes: bool,
) -> (Vec<Integron>, usize) {
    let mut integrases = vec![];
    let mut attc = vec![];
    for integron in integrons {
        let (integrase, sites) = integron.into_parts();
        integrases.extend(integrase);
        attc.extend(sites);
    }

    let known: HashSet<(u64, u64, Strand)> = attc.iter().map(|h| h.key()).collect();
    let added = found
        .iter()
        .map(|h| h.key())
        .filter(|key| !known.contains(key))
        .unique()
        .count();

    attc.extend(found);
    attc.sort_by(by_start_evalue);
    let attc: Vec<Hit> = attc.into_iter().unique_by(|h| h.key()).collect();
    integrases.sort_by(by_start_evalue);

    let clusters = build_clusters(attc, replicon, keep_palindromes);
    (assemble(integrases, clusters, replicon), added)
}
