//! Catalog core: data model, error taxonomy and the pure decision logic
//! (page-count search, sample retry ledger) driven by the engine.
mod error;
mod ledger;
mod model;
mod search;

pub use error::CatalogError;
pub use ledger::{AttemptOutcome, Decision, SampleLedger, DEFAULT_RETRY_BUDGET};
pub use model::{
    merge_page_counts, total_listings, Company, ExcludeSet, Listing, PageCount, PageCountMap,
    Section, SectionId, PAGE_SIZE,
};
pub use search::{
    PageSearch, SearchStep, BOUND_STEP, MAX_BISECTION_STEPS, MAX_BOUND_FETCHES,
};
