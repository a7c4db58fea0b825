use catalog_core::{
    total_listings, CatalogError, PageCount, PageSearch, SearchStep, Section, SectionId,
};
use catalog_logging::{catalog_debug, catalog_info, catalog_trace};

use crate::pages::SectionPageSource;

/// Finds and checks how many result pages a section has.
///
/// A count `k` is only ever reported when page `k` has listings and page
/// `k + 1` has none.
pub struct PaginationIndex<'a, S: ?Sized> {
    pages: &'a S,
}

impl<'a, S: SectionPageSource + ?Sized> PaginationIndex<'a, S> {
    pub fn new(pages: &'a S) -> Self {
        Self { pages }
    }

    /// Page count for `section`, validating a cached value once per run and
    /// discovering it from scratch when there is none or it no longer holds.
    pub async fn resolve(&self, section: &mut Section) -> Result<u32, CatalogError> {
        match section.state() {
            PageCount::Verified(count) => Ok(count),
            PageCount::Cached(cached) => {
                if self.validate(section.id(), cached).await? {
                    catalog_debug!("{}: cached page count {} still holds", section.name(), cached);
                    section.mark_verified(cached);
                    return Ok(cached);
                }
                catalog_info!(
                    "{}: cached page count {} is stale, rediscovering",
                    section.name(),
                    cached
                );
                section.invalidate();
                self.discover_into(section).await
            }
            PageCount::Unknown | PageCount::Invalidated => self.discover_into(section).await,
        }
    }

    /// Two fetches: page `cached` must have listings, page `cached + 1` must not.
    pub async fn validate(&self, section: &SectionId, cached: u32) -> Result<bool, CatalogError> {
        if cached > 0 && self.listing_count(section, cached).await? == 0 {
            return Ok(false);
        }
        Ok(self.listing_count(section, cached + 1).await? == 0)
    }

    pub async fn discover(&self, section: &SectionId) -> Result<u32, CatalogError> {
        let mut search = PageSearch::new(section.name.as_str());
        loop {
            match search.next_step() {
                SearchStep::Found(count) => {
                    catalog_info!(
                        "{}: {} pages, found with {} fetches",
                        section.name,
                        count,
                        search.fetches()
                    );
                    return Ok(count);
                }
                SearchStep::Fetch(page) => {
                    let listings = self.listing_count(section, page).await?;
                    search.record(page, listings > 0)?;
                }
            }
        }
    }

    /// `(pages - 1) * PAGE_SIZE + listings on the last page`; one extra fetch.
    pub async fn total_listings(&self, section: &mut Section) -> Result<u64, CatalogError> {
        let count = self.resolve(section).await?;
        if count == 0 {
            return Ok(0);
        }
        let on_last = self.listing_count(section.id(), count).await?;
        Ok(total_listings(count, on_last))
    }

    async fn discover_into(&self, section: &mut Section) -> Result<u32, CatalogError> {
        let count = self.discover(section.id()).await?;
        section.mark_verified(count);
        Ok(count)
    }

    async fn listing_count(&self, section: &SectionId, page: u32) -> Result<usize, CatalogError> {
        let count = self.pages.section_page(section, page).await?.listing_count;
        catalog_trace!("{}: fetch page {} -> {}", section.name, page, count);
        Ok(count)
    }
}
