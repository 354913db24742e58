pub mod filters;
pub mod terminal;
pub mod views;

use crate::config::MinSupport;
use crate::error::{ReportError, Result};
use crate::output::MOVIES_MAIN;
use crate::types::MovieRecord;
use filters::{FilterOptions, Filters};
use std::path::Path;
use tracing::{info, warn};

/// The exported main table, loaded once and shared read-only by every
/// dashboard front end.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub movies: Vec<MovieRecord>,
    pub options: FilterOptions,
    pub min_support: MinSupport,
}

impl Dataset {
    pub fn from_records(movies: Vec<MovieRecord>, min_support: MinSupport) -> Self {
        Dataset {
            options: FilterOptions::from_records(&movies),
            movies,
            min_support,
        }
    }

    /// Read `movies_main.csv` from the ETL output directory. Rows that no
    /// longer deserialize are skipped with a warning.
    pub fn load(data_dir: &Path, min_support: MinSupport) -> Result<Self> {
        let path = data_dir.join(MOVIES_MAIN);
        if !path.is_file() {
            return Err(ReportError::DataNotReady(data_dir.to_path_buf()));
        }
        let mut rdr = csv::Reader::from_path(&path).map_err(|e| ReportError::csv(&path, e))?;
        let mut movies = Vec::new();
        let mut skipped = 0usize;
        for (idx, result) in rdr.deserialize::<MovieRecord>().enumerate() {
            match result {
                Ok(mut movie) => {
                    movie.restore_genres();
                    movies.push(movie);
                }
                Err(e) => {
                    skipped += 1;
                    warn!("Skipping row {} of {:?}: {}", idx + 2, path, e);
                }
            }
        }
        if movies.is_empty() {
            return Err(ReportError::DataNotReady(data_dir.to_path_buf()));
        }
        info!(
            "Loaded {} movies from {:?} ({} skipped)",
            movies.len(),
            path,
            skipped
        );
        Ok(Self::from_records(movies, min_support))
    }

    pub fn filter(&self, filters: &Filters) -> Vec<&MovieRecord> {
        filters.apply(&self.movies)
    }

    pub fn select(
        &self,
        era: Option<&str>,
        genre: Option<&str>,
        budget: Option<&str>,
    ) -> Result<Filters> {
        self.options.select(era, genre, budget)
    }
}
