use regex::Regex;
use scraper::Html;
use url::Url;

use catalog_core::{CatalogError, Company, Listing, SectionId};
use catalog_logging::{catalog_debug, catalog_warn};

use crate::classify::ContactPageClassifier;
use crate::dom::{resolve_href, DomNode, Query};
use crate::Fetcher;

/// Query parameter selecting a result page of a section.
pub const PAGE_PARAM: &str = "p";

/// One result page of a section.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SectionPage {
    /// Listing rows on the page, with or without a usable contact link.
    pub listing_count: usize,
    pub listings: Vec<Listing>,
}

#[async_trait::async_trait]
pub trait SectionPageSource: Send + Sync {
    async fn section_page(
        &self,
        section: &SectionId,
        page: u32,
    ) -> Result<SectionPage, CatalogError>;
}

#[async_trait::async_trait]
pub trait ContactSource: Send + Sync {
    async fn company(
        &self,
        section: &SectionId,
        listing: &Listing,
    ) -> Result<Company, CatalogError>;
}

/// Reads listing rows out of a section result page.
#[derive(Debug, Clone)]
pub struct ListingParser {
    container: Query,
    listing: Query,
    contact_link: Query,
}

impl ListingParser {
    pub fn new() -> Self {
        let contact = Regex::new("/kontakt$").expect("static pattern");
        Self {
            container: Query::id("divFirmy"),
            listing: Query::tag("div").with_attr("itemtype", "https://schema.org/Organization"),
            contact_link: Query::tag("a").with_attr_matching("href", contact),
        }
    }

    pub fn parse(
        &self,
        html: &str,
        section: &SectionId,
        page: u32,
        page_url: &str,
    ) -> Result<SectionPage, CatalogError> {
        let document = Html::parse_document(html);
        let container = document
            .root_element()
            .find_first(&self.container)
            .ok_or_else(|| CatalogError::MalformedSectionPage {
                section: section.name.clone(),
                page,
                url: page_url.to_string(),
            })?;

        let base = Url::parse(page_url).ok();
        let rows = container.find_all(&self.listing);
        let mut listings = Vec::with_capacity(rows.len());
        for row in &rows {
            let contact_url = row
                .find_first(&self.contact_link)
                .and_then(|anchor| anchor.attr("href"))
                .and_then(|href| resolve_href(href, base.as_ref()));
            match contact_url {
                Some(contact_url) => listings.push(Listing { contact_url }),
                None => {
                    // Rows after a broken one are not trusted either.
                    catalog_warn!(
                        "{}: page {} has a listing without contact url, keeping {} before it",
                        section.name,
                        page,
                        listings.len()
                    );
                    break;
                }
            }
        }

        Ok(SectionPage {
            listing_count: rows.len(),
            listings,
        })
    }
}

impl Default for ListingParser {
    fn default() -> Self {
        Self::new()
    }
}

/// The live catalog seen through a fetcher: section result pages and
/// classified contact pages.
pub struct CatalogSite<'a> {
    fetcher: &'a dyn Fetcher,
    listings: ListingParser,
    classifier: ContactPageClassifier,
}

impl<'a> CatalogSite<'a> {
    pub fn new(fetcher: &'a dyn Fetcher) -> Self {
        Self {
            fetcher,
            listings: ListingParser::new(),
            classifier: ContactPageClassifier::new(),
        }
    }
}

#[async_trait::async_trait]
impl SectionPageSource for CatalogSite<'_> {
    async fn section_page(
        &self,
        section: &SectionId,
        page: u32,
    ) -> Result<SectionPage, CatalogError> {
        let page_number = page.to_string();
        let response = self
            .fetcher
            .fetch(&section.url, &[(PAGE_PARAM, page_number.as_str())])
            .await
            .map_err(|err| err.into_catalog_error(&section.url))?;

        if !response.is_success() {
            return Err(CatalogError::SectionPage {
                section: section.name.clone(),
                page,
                status: response.status,
                url: response.final_url,
            });
        }

        let parsed = self
            .listings
            .parse(&response.body, section, page, &response.final_url)?;
        catalog_debug!(
            "{}: page {} has {} listings",
            section.name,
            page,
            parsed.listing_count
        );
        Ok(parsed)
    }
}

#[async_trait::async_trait]
impl ContactSource for CatalogSite<'_> {
    async fn company(
        &self,
        section: &SectionId,
        listing: &Listing,
    ) -> Result<Company, CatalogError> {
        let url = listing.contact_url.as_str();
        let response = self
            .fetcher
            .fetch(url, &[])
            .await
            .map_err(|err| err.into_catalog_error(url))?;

        if !response.is_success() {
            return Err(CatalogError::HttpStatus {
                url: response.final_url,
                status: response.status,
            });
        }

        let details = self.classifier.classify_html(&response.body, url)?;
        catalog_debug!("{} classified as {:?}", url, details.variant);
        details.into_company(&section.name, url)
    }
}
