//! Catalog engine: fetching, page parsing and the sampling runs built on
//! `catalog_core`.
mod cache;
mod classify;
mod decode;
mod directory;
pub mod dom;
mod fetch;
mod pages;
mod pagination;
mod records;
mod run;
mod sampler;
mod types;

pub use cache::{flush_page_counts, CacheError, JsonFileStore, PageCountStore};
pub use classify::{
    email_address, ContactDetails, ContactPageClassifier, LayoutVariant, TERMINATED_BUSINESS,
};
pub use decode::decode_body;
pub use directory::{CatalogDirectory, CATALOG_ROOT};
pub use fetch::{build_url, FetchSettings, Fetcher, RateLimitedFetcher, ReqwestFetcher};
pub use pages::{
    CatalogSite, ContactSource, ListingParser, SectionPage, SectionPageSource, PAGE_PARAM,
};
pub use pagination::PaginationIndex;
pub use records::{
    contact_rows, load_exclude_set, read_exclude_set, write_section_sizes, CompanySink, ContactRow,
    CsvCompanySink, RecordError, SectionSizeRow, CONTACT_HEADER,
};
pub use run::{
    count_cached_sections, count_catalog_sections, run_sampling, run_section_sizes, SampleReport,
    SampleRunSettings, SizeRunSettings,
};
pub use sampler::{RandomSampler, SamplerSettings};
pub use types::{FailureKind, FetchError, FetchedPage};
