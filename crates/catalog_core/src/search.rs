use crate::CatalogError;

/// Distance between fetches while looking for an empty page.
pub const BOUND_STEP: u32 = 50;
/// Hard cap on bisection iterations.
pub const MAX_BISECTION_STEPS: u32 = 200;
/// Separate cap on the upward walk, for sections that never show an empty page.
pub const MAX_BOUND_FETCHES: u32 = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Bounding { upper: u32 },
    Bisecting { lo: u32, hi: u32 },
    Done { count: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStep {
    /// Fetch this page and report whether it has listings.
    Fetch(u32),
    /// The last non-empty page; `0` for a section without listings.
    Found(u32),
}

/// Pure page-count search: walks up in fixed steps until an empty page shows
/// up, then bisects `[1, upper]` for the last non-empty page.
///
/// The caller performs the fetches; every answer goes through [`PageSearch::record`].
#[derive(Debug, Clone)]
pub struct PageSearch {
    section: String,
    phase: Phase,
    fetches: u32,
    bound_fetches: u32,
    bisection_steps: u32,
    max_bound_fetches: u32,
    max_bisection_steps: u32,
    highest_full: Option<u32>,
    lowest_empty: Option<u32>,
}

impl PageSearch {
    pub fn new(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            phase: Phase::Bounding { upper: BOUND_STEP },
            fetches: 0,
            bound_fetches: 0,
            bisection_steps: 0,
            max_bound_fetches: MAX_BOUND_FETCHES,
            max_bisection_steps: MAX_BISECTION_STEPS,
            highest_full: None,
            lowest_empty: None,
        }
    }

    pub fn with_bisection_cap(mut self, max_steps: u32) -> Self {
        self.max_bisection_steps = max_steps;
        self
    }

    pub fn with_bound_cap(mut self, max_fetches: u32) -> Self {
        self.max_bound_fetches = max_fetches;
        self
    }

    /// Fetches recorded so far, both phases.
    pub fn fetches(&self) -> u32 {
        self.fetches
    }

    pub fn bisection_steps(&self) -> u32 {
        self.bisection_steps
    }

    pub fn next_step(&self) -> SearchStep {
        match self.phase {
            Phase::Bounding { upper } => SearchStep::Fetch(upper),
            Phase::Bisecting { lo, hi } => SearchStep::Fetch(lo + (hi - lo) / 2),
            Phase::Done { count } => SearchStep::Found(count),
        }
    }

    /// Feeds back the answer for the page returned by [`PageSearch::next_step`].
    pub fn record(&mut self, page: u32, non_empty: bool) -> Result<(), CatalogError> {
        self.fetches += 1;
        match self.phase {
            Phase::Bounding { .. } => self.bound_fetches += 1,
            Phase::Bisecting { .. } => self.bisection_steps += 1,
            Phase::Done { .. } => {}
        }
        self.check_monotonic(page, non_empty)?;

        self.phase = match self.phase {
            Phase::Bounding { upper } if non_empty => Phase::Bounding {
                upper: upper.saturating_add(BOUND_STEP),
            },
            Phase::Bounding { upper } => Phase::Bisecting { lo: 1, hi: upper },
            Phase::Bisecting { lo, hi } => {
                let (lo, hi) = if non_empty { (page + 1, hi) } else { (lo, page - 1) };
                if lo > hi {
                    Phase::Done { count: hi }
                } else {
                    Phase::Bisecting { lo, hi }
                }
            }
            done @ Phase::Done { .. } => done,
        };

        let over_cap = match self.phase {
            Phase::Bounding { .. } => self.bound_fetches >= self.max_bound_fetches,
            Phase::Bisecting { .. } | Phase::Done { .. } => {
                self.bisection_steps > self.max_bisection_steps
            }
        };
        if over_cap {
            return Err(self.divergence());
        }
        Ok(())
    }

    fn check_monotonic(&mut self, page: u32, non_empty: bool) -> Result<(), CatalogError> {
        if non_empty {
            if self.lowest_empty.is_some_and(|empty| page >= empty) {
                return Err(self.divergence());
            }
            self.highest_full = Some(self.highest_full.map_or(page, |full| full.max(page)));
        } else {
            if self.highest_full.is_some_and(|full| page <= full) {
                return Err(self.divergence());
            }
            self.lowest_empty = Some(self.lowest_empty.map_or(page, |empty| empty.min(page)));
        }
        Ok(())
    }

    fn divergence(&self) -> CatalogError {
        let (lo, hi) = match self.phase {
            Phase::Bounding { upper } => (1, upper),
            Phase::Bisecting { lo, hi } => (lo, hi),
            Phase::Done { count } => (count, count),
        };
        CatalogError::SearchDivergence {
            section: self.section.clone(),
            fetches: self.fetches,
            lo,
            hi,
        }
    }
}
