use crate::error::{ReportError, Result};
use crate::reports;
use crate::types::{
    ActorPerformanceRow, DirectorPerformanceRow, FunnelStageRow, GenrePerformanceRow, GenreRow,
    MovieRecord, YearlyTrendRow,
};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

pub const MOVIES_MAIN: &str = "movies_main.csv";
pub const MOVIES_BY_GENRE: &str = "movies_by_genre.csv";
pub const DIRECTOR_PERFORMANCE: &str = "director_performance.csv";
pub const ACTOR_PERFORMANCE: &str = "actor_performance.csv";
pub const YEARLY_TRENDS: &str = "yearly_trends.csv";
pub const FUNNEL_ANALYSIS: &str = "funnel_analysis.csv";
pub const GENRE_PERFORMANCE: &str = "genre_performance.csv";

/// Everything the pipeline exports, built from one normalized table.
#[derive(Debug, Clone)]
pub struct Tables {
    pub movies: Vec<MovieRecord>,
    pub by_genre: Vec<GenreRow>,
    pub directors: Vec<DirectorPerformanceRow>,
    pub actors: Vec<ActorPerformanceRow>,
    pub yearly: Vec<YearlyTrendRow>,
    pub funnel: Vec<FunnelStageRow>,
    pub genres: Vec<GenrePerformanceRow>,
}

impl Tables {
    pub fn build(movies: Vec<MovieRecord>) -> Self {
        Tables {
            by_genre: reports::explode_genres(&movies),
            directors: reports::director_performance(&movies),
            actors: reports::actor_performance(&movies),
            yearly: reports::yearly_trends(&movies),
            funnel: reports::funnel_analysis(&movies),
            genres: reports::genre_performance(&movies),
            movies,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct ExportedFile {
    #[tabled(rename = "File")]
    pub name: &'static str,
    #[tabled(rename = "Rows")]
    pub rows: usize,
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| ReportError::csv(path, e))?;
    for r in rows {
        wtr.serialize(r).map_err(|e| ReportError::csv(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write every table into `dir`, creating it first. Existing files are
/// overwritten so each run fully regenerates the outputs.
pub fn export_all(dir: &Path, tables: &Tables) -> Result<Vec<ExportedFile>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    let mut export = |name: &'static str, rows: usize, res: Result<()>| -> Result<()> {
        res?;
        info!("Wrote {} rows to {:?}", rows, dir.join(name));
        written.push(ExportedFile { name, rows });
        Ok(())
    };
    let t = tables;
    export(MOVIES_MAIN, t.movies.len(), write_csv(&dir.join(MOVIES_MAIN), &t.movies))?;
    export(
        MOVIES_BY_GENRE,
        t.by_genre.len(),
        write_csv(&dir.join(MOVIES_BY_GENRE), &t.by_genre),
    )?;
    export(
        DIRECTOR_PERFORMANCE,
        t.directors.len(),
        write_csv(&dir.join(DIRECTOR_PERFORMANCE), &t.directors),
    )?;
    export(
        ACTOR_PERFORMANCE,
        t.actors.len(),
        write_csv(&dir.join(ACTOR_PERFORMANCE), &t.actors),
    )?;
    export(YEARLY_TRENDS, t.yearly.len(), write_csv(&dir.join(YEARLY_TRENDS), &t.yearly))?;
    export(
        FUNNEL_ANALYSIS,
        t.funnel.len(),
        write_csv(&dir.join(FUNNEL_ANALYSIS), &t.funnel),
    )?;
    export(
        GENRE_PERFORMANCE,
        t.genres.len(),
        write_csv(&dir.join(GENRE_PERFORMANCE), &t.genres),
    )?;
    Ok(written)
}

/// Markdown rendering of the first `max_rows` rows.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table<T>(title: &str, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n{}", title);
    if rows.len() > max_rows {
        println!("(first {} of {} rows)", max_rows, rows.len());
    }
    println!();
    println!("{}\n", render_table(rows, max_rows));
}
