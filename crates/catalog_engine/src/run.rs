use rand::Rng;

use catalog_core::{merge_page_counts, CatalogError, ExcludeSet, PageCountMap, Section, SectionId};
use catalog_logging::{catalog_error, catalog_info, catalog_warn};

use crate::cache::{flush_page_counts, PageCountStore};
use crate::directory::{CatalogDirectory, CATALOG_ROOT};
use crate::pages::CatalogSite;
use crate::pagination::PaginationIndex;
use crate::records::{CompanySink, SectionSizeRow};
use crate::sampler::{RandomSampler, SamplerSettings};
use crate::Fetcher;

#[derive(Debug, Clone)]
pub struct SampleRunSettings {
    pub requested: usize,
    pub catalog_root: String,
    pub sampler: SamplerSettings,
}

impl Default for SampleRunSettings {
    fn default() -> Self {
        Self {
            requested: 1,
            catalog_root: CATALOG_ROOT.to_string(),
            sampler: SamplerSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleReport {
    pub collected: usize,
    pub rows_written: usize,
    /// Sample requests that ended without a company.
    pub empty_rounds: usize,
}

#[derive(Debug, Clone)]
pub struct SizeRunSettings {
    pub catalog_root: String,
    pub discover_uncached: bool,
}

impl Default for SizeRunSettings {
    fn default() -> Self {
        Self {
            catalog_root: CATALOG_ROOT.to_string(),
            discover_uncached: true,
        }
    }
}

/// Collects `settings.requested` companies into `sink`.
///
/// The page count cache is loaded before the first request and written back
/// exactly once on the way out, whether the run succeeded or not.
pub async fn run_sampling<R: Rng>(
    fetcher: &dyn Fetcher,
    store: &dyn PageCountStore,
    sink: &mut dyn CompanySink,
    exclude: &ExcludeSet,
    settings: &SampleRunSettings,
    rng: R,
) -> Result<SampleReport, CatalogError> {
    settings.sampler.validate()?;
    let loaded = store.load();

    let directory = CatalogDirectory::new(settings.catalog_root.as_str());
    let ids = match directory.list_sections(fetcher).await {
        Ok(ids) => ids,
        Err(err) => return finish(Err(err), flush_page_counts(store, &loaded)),
    };

    let site = CatalogSite::new(fetcher);
    let sections = attach_cached_counts(ids, &loaded);
    let mut sampler = RandomSampler::new(&site, sections, exclude, settings.sampler.clone(), rng);
    if !exclude.is_empty() {
        catalog_info!("excluding {} known contact urls", exclude.len());
    }

    let outcome = collect_samples(&mut sampler, sink, settings.requested).await;
    let flushed = flush_page_counts(store, &merge_page_counts(&loaded, sampler.sections()));
    finish(outcome, flushed)
}

async fn collect_samples<R: Rng>(
    sampler: &mut RandomSampler<'_, CatalogSite<'_>, R>,
    sink: &mut dyn CompanySink,
    requested: usize,
) -> Result<SampleReport, CatalogError> {
    let mut report = SampleReport::default();
    while report.collected < requested {
        let Some(company) = sampler.sample().await? else {
            report.empty_rounds += 1;
            continue;
        };
        let rows = sink
            .write_company(&company)
            .map_err(|err| CatalogError::Output(err.to_string()))?;
        report.rows_written += rows;
        catalog_info!(
            "[{}]: {} with {} email{}",
            report.collected,
            company.name(),
            company.emails().len(),
            if company.emails().len() == 1 { "" } else { "s" }
        );
        report.collected += 1;
    }
    Ok(report)
}

/// Total listings per section, in catalog order. Sections that fail are logged
/// and left out; the rest still get counted.
pub async fn run_section_sizes(
    fetcher: &dyn Fetcher,
    store: &dyn PageCountStore,
    settings: &SizeRunSettings,
) -> Result<Vec<SectionSizeRow>, CatalogError> {
    let loaded = store.load();
    let directory = CatalogDirectory::new(settings.catalog_root.as_str());
    let ids = match directory.list_sections(fetcher).await {
        Ok(ids) => ids,
        Err(err) => return finish(Err(err), flush_page_counts(store, &loaded)),
    };

    let site = CatalogSite::new(fetcher);
    let index = PaginationIndex::new(&site);
    let mut sections = attach_cached_counts(ids, &loaded);
    let selected: Vec<usize> = (0..sections.len())
        .filter(|&idx| settings.discover_uncached || sections[idx].has_cached_count())
        .collect();

    let mut rows = Vec::with_capacity(selected.len());
    for (position, &idx) in selected.iter().enumerate() {
        let section = &mut sections[idx];
        catalog_info!("[{}/{}]: {}", position + 1, selected.len(), section.name());
        match index.total_listings(section).await {
            Ok(total) => rows.push(SectionSizeRow {
                group: section.name().to_string(),
                num_companies: total,
            }),
            Err(err) => catalog_warn!("{}: skipped, {}", section.name(), err),
        }
    }

    let flushed = flush_page_counts(store, &merge_page_counts(&loaded, &sections));
    finish(Ok(rows), flushed)
}

pub async fn count_catalog_sections(
    fetcher: &dyn Fetcher,
    catalog_root: &str,
) -> Result<usize, CatalogError> {
    let ids = CatalogDirectory::new(catalog_root)
        .list_sections(fetcher)
        .await?;
    Ok(ids.len())
}

pub fn count_cached_sections(store: &dyn PageCountStore) -> usize {
    store.load().len()
}

fn attach_cached_counts(ids: Vec<SectionId>, loaded: &PageCountMap) -> Vec<Section> {
    ids.into_iter()
        .map(|id| {
            let cached = loaded.get(&id.name).copied();
            Section::with_cached(id, cached)
        })
        .collect()
}

/// The run's own error wins over a cache write failure, which is then only logged.
fn finish<T>(
    outcome: Result<T, CatalogError>,
    flushed: Result<(), CatalogError>,
) -> Result<T, CatalogError> {
    match (outcome, flushed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(flush_err)) => Err(flush_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(flush_err)) => {
            catalog_error!("{}", flush_err);
            Err(err)
        }
    }
}
