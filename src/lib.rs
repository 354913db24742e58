pub mod categories;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod output;
pub mod reports;
pub mod server;
pub mod types;
pub mod util;

pub use error::{ReportError, Result};

use loader::LoadReport;
use output::{ExportedFile, Tables};
use std::path::Path;
use tracing::info;

/// What one ETL run read and wrote.
#[derive(Debug, Clone)]
pub struct EtlSummary {
    pub load: LoadReport,
    pub files: Vec<ExportedFile>,
    pub tables: Tables,
}

/// Load the raw CSV, normalize and enrich every row, aggregate, and write
/// all tables into `output_dir`.
pub fn run_etl(input: &Path, output_dir: &Path) -> Result<EtlSummary> {
    let (movies, load) = loader::load_and_clean(input)?;
    info!(
        "Normalized {} movies ({} unreadable rows skipped)",
        movies.len(),
        load.parse_errors
    );
    let tables = Tables::build(movies);
    let files = output::export_all(output_dir, &tables)?;
    Ok(EtlSummary {
        load,
        files,
        tables,
    })
}
