use std::sync::Mutex;

use catalog_core::{CatalogError, PageCount, Section, SectionId, MAX_BOUND_FETCHES, PAGE_SIZE};
use catalog_engine::{PaginationIndex, SectionPage, SectionPageSource};
use pretty_assertions::assert_eq;

/// One section whose page sizes come from a closure. Records every page asked for.
struct ScriptedPages {
    listings_on: Box<dyn Fn(u32) -> usize + Send + Sync>,
    failing_page: Option<u32>,
    requested: Mutex<Vec<u32>>,
}

impl ScriptedPages {
    fn new(listings_on: impl Fn(u32) -> usize + Send + Sync + 'static) -> Self {
        Self {
            listings_on: Box::new(listings_on),
            failing_page: None,
            requested: Mutex::new(Vec::new()),
        }
    }

    /// `pages` full pages followed by a last page with `on_last` listings.
    fn sized(full_pages: u32, on_last: usize) -> Self {
        Self::new(move |page| {
            if page <= full_pages {
                PAGE_SIZE as usize
            } else if page == full_pages + 1 {
                on_last
            } else {
                0
            }
        })
    }

    fn failing_at(mut self, page: u32) -> Self {
        self.failing_page = Some(page);
        self
    }

    fn requested(&self) -> Vec<u32> {
        self.requested.lock().unwrap().clone()
    }

    fn clear(&self) {
        self.requested.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl SectionPageSource for ScriptedPages {
    async fn section_page(
        &self,
        section: &SectionId,
        page: u32,
    ) -> Result<SectionPage, CatalogError> {
        self.requested.lock().unwrap().push(page);
        if self.failing_page == Some(page) {
            return Err(CatalogError::SectionPage {
                section: section.name.clone(),
                page,
                status: 503,
                url: format!("{}?p={}", section.url, page),
            });
        }
        Ok(SectionPage {
            listing_count: (self.listings_on)(page),
            listings: Vec::new(),
        })
    }
}

fn doprava() -> SectionId {
    SectionId::new("Doprava", "https://catalog.test/doprava/")
}

#[tokio::test]
async fn discovered_count_satisfies_invariant() {
    for pages in [0u32, 1, 2, 4, 49, 50, 51, 137, 260] {
        let source = ScriptedPages::new(move |page| if page <= pages { 3 } else { 0 });
        let index = PaginationIndex::new(&source);

        let found = index.discover(&doprava()).await.unwrap();

        assert_eq!(found, pages, "section with {pages} pages");
        if found > 0 {
            assert!((source.listings_on)(found) > 0);
        }
        assert_eq!((source.listings_on)(found + 1), 0);
    }
}

#[tokio::test]
async fn four_page_section_totals_82_listings() {
    let source = ScriptedPages::sized(3, 7);
    let index = PaginationIndex::new(&source);
    let mut section = Section::new(doprava());

    let total = index.total_listings(&mut section).await.unwrap();

    assert_eq!(total, 82);
    assert_eq!(section.state(), PageCount::Verified(4));
    // Bisection fetches, then one fetch of the last page.
    assert_eq!(source.requested(), vec![50, 25, 12, 6, 3, 4, 5, 4]);
}

#[tokio::test]
async fn empty_section_totals_zero() {
    let source = ScriptedPages::new(|_| 0);
    let index = PaginationIndex::new(&source);
    let mut section = Section::new(doprava());

    assert_eq!(index.total_listings(&mut section).await.unwrap(), 0);
    assert_eq!(section.page_count(), Some(0));
}

#[tokio::test]
async fn second_run_reuses_count_with_two_requests() {
    let source = ScriptedPages::sized(3, 7);
    let index = PaginationIndex::new(&source);

    let mut first = Section::new(doprava());
    let discovered = index.resolve(&mut first).await.unwrap();
    source.clear();

    let mut second = Section::with_cached(doprava(), first.page_count());
    let validated = index.resolve(&mut second).await.unwrap();

    assert_eq!(discovered, 4);
    assert_eq!(validated, 4);
    assert_eq!(second.state(), PageCount::Verified(4));
    assert_eq!(source.requested(), vec![4, 5]);
}

#[tokio::test]
async fn verified_count_is_not_fetched_again() {
    let source = ScriptedPages::sized(3, 7);
    let index = PaginationIndex::new(&source);
    let mut section = Section::with_cached(doprava(), Some(4));

    index.resolve(&mut section).await.unwrap();
    source.clear();
    index.resolve(&mut section).await.unwrap();

    assert!(source.requested().is_empty());
}

#[tokio::test]
async fn section_that_grew_is_rediscovered() {
    // Cached 3, but page 4 now has listings as well.
    let source = ScriptedPages::sized(3, 7);
    let index = PaginationIndex::new(&source);
    let mut section = Section::with_cached(doprava(), Some(3));

    let count = index.resolve(&mut section).await.unwrap();

    assert_eq!(count, 4);
    assert_eq!(section.state(), PageCount::Verified(4));
    assert_eq!(&source.requested()[..2], &[3, 4]);
}

#[tokio::test]
async fn section_that_shrank_is_rediscovered() {
    let source = ScriptedPages::sized(1, 10);
    let index = PaginationIndex::new(&source);
    let mut section = Section::with_cached(doprava(), Some(6));

    let count = index.resolve(&mut section).await.unwrap();

    assert_eq!(count, 2);
    // Page 6 came back empty, so page 7 was never asked for.
    assert_eq!(source.requested()[0], 6);
    assert_ne!(source.requested().get(1), Some(&7));
}

#[tokio::test]
async fn cached_zero_only_checks_first_page() {
    let source = ScriptedPages::new(|_| 0);
    let index = PaginationIndex::new(&source);

    assert!(index.validate(&doprava(), 0).await.unwrap());
    assert_eq!(source.requested(), vec![1]);
}

#[tokio::test]
async fn inconsistent_section_reports_divergence() {
    let source = ScriptedPages::new(|page| if page % 3 != 0 { 1 } else { 0 });
    let index = PaginationIndex::new(&source);
    let mut section = Section::new(doprava());

    let err = index.resolve(&mut section).await.unwrap_err();

    assert!(matches!(
        err,
        CatalogError::SearchDivergence { ref section, .. } if section == "Doprava"
    ));
    assert_eq!(section.page_count(), None);
}

#[tokio::test]
async fn endless_section_stops_at_bound_cap() {
    let source = ScriptedPages::new(|_| 1);
    let index = PaginationIndex::new(&source);

    let err = index.discover(&doprava()).await.unwrap_err();

    assert!(matches!(
        err,
        CatalogError::SearchDivergence { fetches, .. } if fetches == MAX_BOUND_FETCHES
    ));
    assert_eq!(source.requested().len() as u32, MAX_BOUND_FETCHES);
}

#[tokio::test]
async fn page_fetch_failure_propagates() {
    let source = ScriptedPages::sized(3, 7).failing_at(25);
    let index = PaginationIndex::new(&source);
    let mut section = Section::new(doprava());

    let err = index.resolve(&mut section).await.unwrap_err();

    assert!(matches!(err, CatalogError::SectionPage { page: 25, status: 503, .. }));
    assert_eq!(section.state(), PageCount::Unknown);
}
