use std::collections::HashSet;

use scraper::Html;
use url::Url;

use catalog_core::{CatalogError, SectionId};
use catalog_logging::{catalog_info, catalog_warn};

use crate::dom::{resolve_href, DomNode, Query};
use crate::Fetcher;

pub const CATALOG_ROOT: &str = "https://www.edb.cz/katalog-firem/";

/// The catalog's front page: section headers laid out in columns.
#[derive(Debug, Clone)]
pub struct CatalogDirectory {
    root_url: String,
    columns: Query,
    headers: Query,
    link: Query,
}

impl CatalogDirectory {
    pub fn new(root_url: impl Into<String>) -> Self {
        Self {
            root_url: root_url.into(),
            columns: Query::tag("div").with_class("col"),
            headers: Query::tag("h3"),
            link: Query::tag("a"),
        }
    }

    pub async fn list_sections(
        &self,
        fetcher: &dyn Fetcher,
    ) -> Result<Vec<SectionId>, CatalogError> {
        let response = fetcher
            .fetch(&self.root_url, &[])
            .await
            .map_err(|err| err.into_catalog_error(&self.root_url))?;
        if !response.is_success() {
            return Err(CatalogError::CatalogFetch {
                url: response.final_url,
                status: response.status,
            });
        }

        let sections = self.parse_sections(&response.body, &response.final_url);
        catalog_info!("catalog lists {} sections", sections.len());
        Ok(sections)
    }

    /// Section headers in document order. Headers without a link or a name are
    /// skipped, as are repeated names.
    pub fn parse_sections(&self, html: &str, base_url: &str) -> Vec<SectionId> {
        let document = Html::parse_document(html);
        let base = Url::parse(base_url).ok();
        let mut seen = HashSet::new();
        let mut sections = Vec::new();

        let root = document.root_element();
        for column in root.find_all(&self.columns) {
            for header in column.find_all(&self.headers) {
                let name = header.text_content();
                let url = header
                    .find_first(&self.link)
                    .and_then(|anchor| anchor.attr("href"))
                    .and_then(|href| resolve_href(href, base.as_ref()));
                let Some(url) = url.filter(|_| !name.is_empty()) else {
                    catalog_warn!("skipping section header without name or link: {:?}", name);
                    continue;
                };
                if !seen.insert(name.clone()) {
                    catalog_warn!("duplicate section name {:?}, keeping the first", name);
                    continue;
                }
                sections.push(SectionId::new(name, url));
            }
        }
        sections
    }
}

impl Default for CatalogDirectory {
    fn default() -> Self {
        Self::new(CATALOG_ROOT)
    }
}
