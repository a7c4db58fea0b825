use crate::{CatalogError, Company};

pub const DEFAULT_RETRY_BUDGET: u32 = 10;

/// What one draw of (section, page, listing) produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Sampled(Company),
    /// The chosen page had no listings left after exclusion.
    NoCandidates,
    /// The company was classified but lists no email.
    NoEmails(Company),
    Fault(CatalogError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accept(Company),
    /// Draw again; one unit of budget was charged.
    Retry,
    /// Sleep the timeout backoff and draw again; nothing was charged.
    Backoff,
    /// Budget spent, at least one attempt ended benignly: no sample this time.
    GiveUp,
    /// Budget spent and every attempt was a fault.
    Fail(CatalogError),
}

/// Retry bookkeeping for a single sample request. The decision depends only
/// on the outcome tag and the counters, never on how the outcome was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleLedger {
    budget: u32,
    consumed: u32,
    benign: u32,
    timeouts: u32,
    last_fault: Option<String>,
}

impl SampleLedger {
    pub fn new(budget: u32) -> Self {
        Self {
            budget,
            consumed: 0,
            benign: 0,
            timeouts: 0,
            last_fault: None,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.consumed
    }

    pub fn timeouts(&self) -> u32 {
        self.timeouts
    }

    pub fn record(&mut self, outcome: AttemptOutcome) -> Decision {
        match outcome {
            AttemptOutcome::Sampled(company) => return Decision::Accept(company),
            AttemptOutcome::Fault(err) if err.is_timeout() => {
                self.timeouts += 1;
                return Decision::Backoff;
            }
            AttemptOutcome::NoCandidates | AttemptOutcome::NoEmails(_) => {
                self.consumed += 1;
                self.benign += 1;
            }
            AttemptOutcome::Fault(err) => {
                self.consumed += 1;
                self.last_fault = Some(err.to_string());
            }
        }

        if self.consumed < self.budget {
            Decision::Retry
        } else if self.benign > 0 {
            Decision::GiveUp
        } else {
            Decision::Fail(CatalogError::SamplingExhausted {
                attempts: self.consumed,
                last_error: self.last_fault.clone().unwrap_or_default(),
            })
        }
    }
}

impl Default for SampleLedger {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_BUDGET)
    }
}
