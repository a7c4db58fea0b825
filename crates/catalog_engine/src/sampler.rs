use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;

use catalog_core::{
    AttemptOutcome, CatalogError, Company, Decision, ExcludeSet, SampleLedger, Section,
    DEFAULT_RETRY_BUDGET,
};
use catalog_logging::{catalog_debug, catalog_error, catalog_info, catalog_warn};

use crate::pages::{ContactSource, SectionPageSource};
use crate::pagination::PaginationIndex;

#[derive(Debug, Clone)]
pub struct SamplerSettings {
    /// Attempts charged per sample request before giving up.
    pub retry_budget: u32,
    /// Pause after a transport timeout. Timeouts are not charged.
    pub timeout_backoff: Duration,
    /// Draw from sections without a cached page count too, discovering it.
    pub discover_uncached: bool,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            retry_budget: DEFAULT_RETRY_BUDGET,
            timeout_backoff: Duration::from_secs(60),
            discover_uncached: true,
        }
    }
}

impl SamplerSettings {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.retry_budget == 0 {
            return Err(CatalogError::InvalidConfig(
                "retry budget must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Draws random companies: random section, random page, random listing not in
/// the exclude set.
pub struct RandomSampler<'a, S, R> {
    site: &'a S,
    sections: Vec<Section>,
    /// Indices into `sections` that may still be drawn.
    eligible: Vec<usize>,
    exclude: &'a ExcludeSet,
    settings: SamplerSettings,
    rng: R,
}

impl<'a, S, R> RandomSampler<'a, S, R>
where
    S: SectionPageSource + ContactSource,
    R: Rng,
{
    pub fn new(
        site: &'a S,
        sections: Vec<Section>,
        exclude: &'a ExcludeSet,
        settings: SamplerSettings,
        rng: R,
    ) -> Self {
        let eligible: Vec<usize> = sections
            .iter()
            .enumerate()
            .filter(|(_, section)| settings.discover_uncached || section.has_cached_count())
            .map(|(idx, _)| idx)
            .collect();
        if eligible.len() < sections.len() {
            catalog_info!(
                "sampling from {} of {} sections (uncached sections skipped)",
                eligible.len(),
                sections.len()
            );
        }
        Self {
            site,
            sections,
            eligible,
            exclude,
            settings,
            rng,
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn into_sections(self) -> Vec<Section> {
        self.sections
    }

    pub fn eligible_sections(&self) -> usize {
        self.eligible.len()
    }

    /// One sample request. `Ok(None)` means the retry budget ran out on benign
    /// outcomes and the caller may simply ask again.
    pub async fn sample(&mut self) -> Result<Option<Company>, CatalogError> {
        let mut ledger = SampleLedger::new(self.settings.retry_budget);
        loop {
            let outcome = self.attempt().await;
            match ledger.record(outcome) {
                Decision::Accept(company) => return Ok(Some(company)),
                Decision::Retry => {}
                Decision::Backoff => {
                    catalog_warn!(
                        "waiting {:?} after timeout before retrying",
                        self.settings.timeout_backoff
                    );
                    tokio::time::sleep(self.settings.timeout_backoff).await;
                }
                Decision::GiveUp => {
                    catalog_warn!(
                        "no sample after {} attempts, too many pages without usable companies",
                        ledger.attempts()
                    );
                    return Ok(None);
                }
                Decision::Fail(err) => return Err(err),
            }
        }
    }

    async fn attempt(&mut self) -> AttemptOutcome {
        let Some(&idx) = self.eligible.choose(&mut self.rng) else {
            return AttemptOutcome::Fault(CatalogError::InvalidConfig(
                "no sections left to sample from".into(),
            ));
        };

        let index = PaginationIndex::new(self.site);
        let section = &mut self.sections[idx];
        let page_count = match index.resolve(section).await {
            Ok(count) => count,
            Err(err) => {
                if matches!(err, CatalogError::SearchDivergence { .. }) {
                    catalog_error!("{}: {}; dropping section for this run", section.name(), err);
                    self.eligible.retain(|&i| i != idx);
                } else {
                    log_fault(&err);
                }
                return AttemptOutcome::Fault(err);
            }
        };
        if page_count == 0 {
            catalog_info!("{}: section has no listings", section.name());
            return AttemptOutcome::NoCandidates;
        }

        let page = self.rng.gen_range(1..=page_count);
        let listings = match self.site.section_page(section.id(), page).await {
            Ok(parsed) => parsed.listings,
            Err(err) => {
                log_fault(&err);
                return AttemptOutcome::Fault(err);
            }
        };

        let candidates: Vec<_> = listings
            .iter()
            .filter(|listing| !self.exclude.contains(&listing.contact_url))
            .collect();
        let Some(listing) = candidates.choose(&mut self.rng) else {
            catalog_info!(
                "{}: page {} has no eligible listings ({} excluded or missing)",
                section.name(),
                page,
                listings.len()
            );
            return AttemptOutcome::NoCandidates;
        };

        catalog_debug!("{}: page {} -> {}", section.name(), page, listing.contact_url);
        match self.site.company(section.id(), listing).await {
            Ok(company) if company.has_emails() => AttemptOutcome::Sampled(company),
            Ok(company) => {
                catalog_info!("sample failed as company {} has no emails", company.name());
                AttemptOutcome::NoEmails(company)
            }
            Err(err) => {
                log_fault(&err);
                AttemptOutcome::Fault(err)
            }
        }
    }
}

fn log_fault(err: &CatalogError) {
    if err.is_timeout() {
        catalog_warn!("sample failed due to timeout: {}", err);
    } else {
        catalog_warn!("sample failed due to {}", err);
    }
}
