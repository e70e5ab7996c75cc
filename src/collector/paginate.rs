//! Bounded, sequential pagination over one listing.

use indicatif::{ProgressBar, ProgressStyle};
use yansi::Paint;
use std::time::Duration;

use super::client::PageSource;
use super::dataset::Dataset;
use super::error::CollectError;
use super::page::{normalize_item, parse_page, Page, RawItem};
use crate::config::{CollectorConfig, ItemPolicy};
use crate::models::{Category, PoiRecord};

/// Knobs for a single [`collect`] call.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub max_pages: u32,
    pub page_size: u32,
    pub page_delay: Duration,
    pub item_policy: ItemPolicy,
    pub show_progress: bool,
}

impl From<&CollectorConfig> for CollectOptions {
    fn from(config: &CollectorConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            page_size: config.page_size,
            page_delay: config.page_delay,
            item_policy: config.item_policy,
            show_progress: true,
        }
    }
}

/// Why pagination ended.
#[derive(Debug)]
pub enum StopReason {
    /// A page came back with no items
    Exhausted,
    /// `max_pages` pages were fetched
    PageCap,
    /// The response lacked the dataset's wrapper key
    MissingWrapper { page: u32 },
    /// A request or parse failure aborted the run
    Failed { page: u32, error: CollectError },
}

impl StopReason {
    pub fn is_failure(&self) -> bool {
        matches!(self, StopReason::Failed { .. })
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Exhausted => write!(f, "exhausted"),
            StopReason::PageCap => write!(f, "page cap"),
            StopReason::MissingWrapper { page } => write!(f, "no data (page {})", page),
            StopReason::Failed { page, error } => write!(f, "failed on page {}: {}", page, error),
        }
    }
}

/// Records gathered for one dataset, plus bookkeeping.
#[derive(Debug)]
pub struct Collection {
    pub dataset: Dataset,
    pub records: Vec<PoiRecord>,
    pub pages_fetched: u32,
    pub items_seen: usize,
    pub items_dropped: usize,
    pub items_skipped: usize,
    pub stop: StopReason,
}

struct PageBatch {
    records: Vec<PoiRecord>,
    dropped: usize,
    skipped: usize,
}

fn normalize_page(items: &[RawItem], category: Category, policy: ItemPolicy) -> Result<PageBatch, CollectError> {
    let mut batch = PageBatch {
        records: Vec::with_capacity(items.len()),
        dropped: 0,
        skipped: 0,
    };
    for item in items {
        match normalize_item(item, category) {
            Ok(Some(record)) => batch.records.push(record),
            Ok(None) => batch.dropped += 1,
            Err(e) => match policy {
                ItemPolicy::Strict => return Err(e),
                ItemPolicy::Skip => {
                    tracing::warn!(%e, "Skipping malformed item");
                    batch.skipped += 1;
                }
            },
        }
    }
    Ok(batch)
}

fn progress_bar(options: &CollectOptions, dataset: Dataset) -> ProgressBar {
    if !options.show_progress {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(options.max_pages as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} {prefix} [{bar:20.cyan/blue}] page {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_prefix(dataset.label());
    pb
}

// Prints above the bar when it is drawn, straight to stdout otherwise.
fn narrate(pb: &ProgressBar, line: String) {
    if pb.is_hidden() {
        println!("{}", line);
    } else {
        pb.println(line);
    }
}

/// Fetch pages of `dataset` one at a time until the listing runs dry, the
/// page cap is hit, or something fails. Records from pages completed before
/// a failure are kept.
pub async fn collect<S: PageSource>(source: &S, dataset: Dataset, options: &CollectOptions) -> Collection {
    tracing::info!(%dataset, max_pages = options.max_pages, page_size = options.page_size, "Starting collection");
    let pb = progress_bar(options, dataset);

    let mut records = Vec::new();
    let mut pages_fetched = 0u32;
    let mut items_seen = 0usize;
    let mut items_dropped = 0usize;
    let mut items_skipped = 0usize;
    let mut page_no = 1u32;

    let stop = loop {
        if page_no > options.max_pages {
            tracing::info!(%dataset, "Reached page cap of {}", options.max_pages);
            break StopReason::PageCap;
        }
        if page_no > 1 && !options.page_delay.is_zero() {
            tokio::time::sleep(options.page_delay).await;
        }

        let body = match source.fetch_page(dataset, page_no, options.page_size).await {
            Ok(body) => body,
            Err(error) => {
                tracing::error!(%dataset, page = page_no, %error, "API request failed");
                narrate(&pb, format!("  page {}: {}", page_no, Paint::new(format!("request failed: {}", error)).red()));
                break StopReason::Failed { page: page_no, error };
            }
        };

        let (items, total_count) = match parse_page(dataset, &body) {
            Ok(Page::Items { items, total_count }) => (items, total_count),
            Ok(Page::MissingWrapper) => {
                tracing::warn!(%dataset, page = page_no, "Response carried no data");
                narrate(&pb, format!("  page {}: {}", page_no, Paint::new("no data in response").yellow()));
                break StopReason::MissingWrapper { page: page_no };
            }
            Err(error) => {
                tracing::error!(%dataset, page = page_no, %error, "Failed to parse response");
                narrate(&pb, format!("  page {}: {}", page_no, Paint::new(format!("bad response: {}", error)).red()));
                break StopReason::Failed { page: page_no, error };
            }
        };

        if items.is_empty() {
            tracing::info!(%dataset, total = records.len(), "All pages collected");
            break StopReason::Exhausted;
        }

        let with_coordinates = items.iter().filter(|i| i.has_coordinates()).count();
        let batch = match normalize_page(&items, dataset.category(), options.item_policy) {
            Ok(batch) => batch,
            Err(error) => {
                tracing::error!(%dataset, page = page_no, %error, "Failed to parse item");
                narrate(&pb, format!("  page {}: {}", page_no, Paint::new(format!("bad item: {}", error)).red()));
                break StopReason::Failed { page: page_no, error };
            }
        };

        items_seen += items.len();
        items_dropped += batch.dropped;
        items_skipped += batch.skipped;
        records.extend(batch.records);
        pages_fetched += 1;

        tracing::info!(
            %dataset,
            page = page_no,
            items = items.len(),
            with_coordinates,
            total_count = ?total_count,
            "Page collected"
        );
        pb.set_position(pages_fetched as u64);
        pb.set_message(format!("{} records", records.len()));
        narrate(
            &pb,
            format!("  page {}: {} items ({} with coordinates)", page_no, items.len(), with_coordinates),
        );

        page_no += 1;
    };

    pb.finish_and_clear();
    tracing::info!(%dataset, records = records.len(), %stop, "Collection finished");

    Collection {
        dataset,
        records,
        pages_fetched,
        items_seen,
        items_dropped,
        items_skipped,
        stop,
    }
}
