use std::collections::{BTreeMap, HashSet};

use crate::CatalogError;

/// Listings shown on every full result page of a section.
pub const PAGE_SIZE: u32 = 25;

/// Section name to last known page count, as persisted between runs.
pub type PageCountMap = BTreeMap<String, u32>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SectionId {
    pub name: String,
    pub url: String,
}

impl SectionId {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Where a section's page count came from during this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageCount {
    #[default]
    Unknown,
    /// Read from the cache, not yet checked against the site.
    Cached(u32),
    /// Validated or discovered during this run.
    Verified(u32),
    /// The cached value failed validation and no replacement was found.
    Invalidated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    id: SectionId,
    page_count: PageCount,
}

impl Section {
    pub fn new(id: SectionId) -> Self {
        Self {
            id,
            page_count: PageCount::Unknown,
        }
    }

    pub fn with_cached(id: SectionId, cached: Option<u32>) -> Self {
        Self {
            id,
            page_count: cached.map_or(PageCount::Unknown, PageCount::Cached),
        }
    }

    pub fn id(&self) -> &SectionId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn url(&self) -> &str {
        &self.id.url
    }

    pub fn state(&self) -> PageCount {
        self.page_count
    }

    pub fn page_count(&self) -> Option<u32> {
        match self.page_count {
            PageCount::Cached(k) | PageCount::Verified(k) => Some(k),
            PageCount::Unknown | PageCount::Invalidated => None,
        }
    }

    pub fn has_cached_count(&self) -> bool {
        matches!(self.page_count, PageCount::Cached(_))
    }

    pub fn mark_verified(&mut self, count: u32) {
        self.page_count = PageCount::Verified(count);
    }

    pub fn invalidate(&mut self) {
        self.page_count = PageCount::Invalidated;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub contact_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    name: String,
    section_name: String,
    contact_url: String,
    emails: Vec<String>,
}

impl Company {
    /// Fails with `MissingCompanyName` for a blank name; a record always has one.
    pub fn new(
        name: impl Into<String>,
        section_name: impl Into<String>,
        contact_url: impl Into<String>,
        emails: Vec<String>,
    ) -> Result<Self, CatalogError> {
        let name = name.into();
        let contact_url = contact_url.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(CatalogError::MissingCompanyName { url: contact_url });
        }
        Ok(Self {
            name: trimmed.to_string(),
            section_name: section_name.into(),
            contact_url,
            emails,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn section_name(&self) -> &str {
        &self.section_name
    }

    pub fn contact_url(&self) -> &str {
        &self.contact_url
    }

    pub fn emails(&self) -> &[String] {
        &self.emails
    }

    pub fn has_emails(&self) -> bool {
        !self.emails.is_empty()
    }
}

/// Contact URLs already collected by earlier runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludeSet {
    urls: HashSet<String>,
}

impl ExcludeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ExcludeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            urls: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// `(pages - 1) * PAGE_SIZE + listings on the last page`.
pub fn total_listings(page_count: u32, on_last_page: usize) -> u64 {
    if page_count == 0 {
        return 0;
    }
    u64::from(page_count - 1) * u64::from(PAGE_SIZE) + on_last_page as u64
}

/// Folds this run's page counts into the mapping loaded at startup.
///
/// Entries for sections never touched this run survive unchanged; entries whose
/// cached value was disproved and not rediscovered are dropped.
pub fn merge_page_counts(loaded: &PageCountMap, sections: &[Section]) -> PageCountMap {
    let mut merged = loaded.clone();
    for section in sections {
        match section.state() {
            PageCount::Cached(k) | PageCount::Verified(k) => {
                merged.insert(section.name().to_string(), k);
            }
            PageCount::Invalidated => {
                merged.remove(section.name());
            }
            PageCount::Unknown => {}
        }
    }
    merged
}
