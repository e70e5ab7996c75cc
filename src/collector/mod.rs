//! Busan open-data collector
//!
//! Pages through the restaurant and tourist-information listings of the
//! Busan open-data API, keeps the entries that carry coordinates, and
//! writes each listing to its own JSON file.
//!
//! # Examples
//!
//! ```no_run
//! use oasis::collector::{run_collection, DataApiClient, Dataset};
//! use oasis::config::CollectorConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CollectorConfig::from_env()?;
//! let client = DataApiClient::new(config.base_url.clone(), config.api_key.clone(), config.timeout)?;
//! for report in run_collection(&client, &config, &Dataset::ALL).await? {
//!     println!("{}: {} records", report.collection.dataset, report.collection.records.len());
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod dataset;
mod error;
mod output;
mod page;
mod paginate;

pub use client::{DataApiClient, PageSource};
pub use dataset::Dataset;
pub use error::{CollectError, OutputError};
pub use output::write_records;
pub use page::{normalize_item, parse_page, OneOrMany, Page, RawItem};
pub use paginate::{collect, CollectOptions, Collection, StopReason};

use std::path::PathBuf;

use crate::config::CollectorConfig;

/// Outcome of collecting and saving one dataset
#[derive(Debug)]
pub struct DatasetReport {
    pub collection: Collection,
    pub path: PathBuf,
}

/// Collect each dataset in turn and write one file per dataset.
///
/// A dataset whose pagination failed part-way still gets its file, holding
/// whatever was gathered before the failure. Only a write failure aborts.
pub async fn run_collection<S: PageSource>(
    source: &S,
    config: &CollectorConfig,
    datasets: &[Dataset],
) -> Result<Vec<DatasetReport>, OutputError> {
    let options = CollectOptions::from(config);
    let mut reports = Vec::with_capacity(datasets.len());

    for &dataset in datasets {
        println!("Collecting {}...", dataset);
        let collection = collect(source, dataset, &options).await;
        let path = write_records(&config.output_dir, dataset.file_name(), &collection.records)?;
        println!(
            "Collected {} {} -> {}",
            collection.records.len(),
            dataset,
            path.display()
        );
        reports.push(DatasetReport { collection, path });
    }

    Ok(reports)
}
