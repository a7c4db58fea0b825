use std::fs::File;
use std::io::BufWriter;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use catalog_core::ExcludeSet;
use catalog_engine::{
    count_cached_sections, count_catalog_sections, load_exclude_set, run_sampling,
    run_section_sizes, write_section_sizes, CsvCompanySink, FetchSettings, Fetcher, JsonFileStore,
    PageCountStore, RateLimitedFetcher, ReqwestFetcher,
};
use catalog_logging::{catalog_debug, catalog_info};

use crate::cli::{Cli, Command, CountTarget, SampleArgs, SizeArgs};

pub async fn run(cli: Cli) -> Result<()> {
    let store = JsonFileStore::new(&cli.group_cache);
    match &cli.command {
        Command::Count {
            target: CountTarget::Cached,
        } => {
            println!("{}", count_cached_sections(&store));
            Ok(())
        }
        Command::Count {
            target: CountTarget::Total,
        } => {
            let fetcher = build_fetcher(cli.limit)?;
            let sections = count_catalog_sections(&fetcher, &cli.catalog_root).await?;
            println!("{sections}");
            Ok(())
        }
        Command::Sample(args) => {
            let fetcher = build_fetcher(cli.limit)?;
            sample(&fetcher, &store, &cli.catalog_root, args).await
        }
        Command::Size(args) => {
            let fetcher = build_fetcher(cli.limit)?;
            size(&fetcher, &store, &cli.catalog_root, args).await
        }
    }
}

fn build_fetcher(requests_per_second: f64) -> Result<RateLimitedFetcher<ReqwestFetcher>> {
    let client =
        ReqwestFetcher::new(FetchSettings::default()).context("failed to create HTTP client")?;
    let fetcher = RateLimitedFetcher::new(client, requests_per_second)?;
    catalog_debug!("one request per {:?}", fetcher.min_interval());
    Ok(fetcher)
}

async fn sample(
    fetcher: &dyn Fetcher,
    store: &dyn PageCountStore,
    catalog_root: &str,
    args: &SampleArgs,
) -> Result<()> {
    let exclude = match &args.exclude {
        Some(path) => load_exclude_set(path)
            .with_context(|| format!("failed to read exclude file {}", path.display()))?,
        None => ExcludeSet::new(),
    };
    let mut sink = CsvCompanySink::open(&args.output, args.append)
        .with_context(|| format!("failed to open output {}", args.output.display()))?;

    let report = run_sampling(
        fetcher,
        store,
        &mut sink,
        &exclude,
        &args.run_settings(catalog_root),
        StdRng::from_entropy(),
    )
    .await?;

    catalog_info!(
        "collected {} samples, {} rows written to {}",
        report.collected,
        report.rows_written,
        args.output.display()
    );
    if report.empty_rounds > 0 {
        catalog_info!("{} sample requests ended without a company", report.empty_rounds);
    }
    Ok(())
}

async fn size(
    fetcher: &dyn Fetcher,
    store: &dyn PageCountStore,
    catalog_root: &str,
    args: &SizeArgs,
) -> Result<()> {
    let rows = run_section_sizes(fetcher, store, &args.run_settings(catalog_root)).await?;

    let file = File::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    write_section_sizes(BufWriter::new(file), &rows)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    let total: u64 = rows.iter().map(|row| row.num_companies).sum();
    catalog_info!(
        "{} sections with {} companies written to {}",
        rows.len(),
        total,
        args.output.display()
    );
    Ok(())
}
