use movie_report::categories::{BudgetTier, FunnelStage, RoiTier};
use movie_report::config::MinSupport;
use movie_report::dashboard::views::{self, DetailQuery};
use movie_report::dashboard::Dataset;
use movie_report::output::{
    ACTOR_PERFORMANCE, DIRECTOR_PERFORMANCE, FUNNEL_ANALYSIS, GENRE_PERFORMANCE, MOVIES_BY_GENRE,
    MOVIES_MAIN, YEARLY_TRENDS,
};
use movie_report::run_etl;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const HEADER: &str = "id,movie_title,budget,revenue,gross,release_date,title_year,vote_average,imdb_score,genres,director_name,actor_1_name,runtime,content_rating,original_language";

fn write_source(dir: &Path) -> std::path::PathBuf {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(HEADER.as_bytes());
    bytes.extend_from_slice(b"\n");
    let rows = [
        "1,Avatar\u{a0},10000000,40000000,,2012-06-01,,7.0,7.8,Action|Drama,Ann,Xavi,120,PG-13,en",
        "2,Second,20000000,,10000000,2012-07-01,,5.0,,\"[{'id': 18, 'name': 'Drama'}]\",Bob,Yara,,Unrated,fr",
        "3,Third,0,5000000,,,1995,6.0,6.4,Comedy,Ann,Xavi,95,,",
        "4,Fourth,abc,n/a,,not a date,,8.0,,,Cid,Zoe,,,",
    ];
    for row in rows {
        bytes.extend_from_slice(row.as_bytes());
        bytes.extend_from_slice(b"\n");
    }
    // Latin-1 e-acute in the title.
    bytes.extend_from_slice(b"5,Am\xe9lie,5000000,30000000,,2001-04-25,,7.9,8.3,Comedy|Romance,Jean,Audrey,122,R,fr\n");
    let path = dir.join("merged.csv");
    fs::write(&path, bytes).unwrap();
    path
}

fn read_rows(path: &Path) -> Vec<HashMap<String, String>> {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    rdr.deserialize().map(|r| r.unwrap()).collect()
}

#[test]
fn etl_writes_every_table() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_source(tmp.path());
    let out = tmp.path().join("out");

    let summary = run_etl(&input, &out).unwrap();
    assert_eq!(summary.load.total_rows, 5);
    assert_eq!(summary.load.parse_errors, 0);
    assert_eq!(summary.load.year_from_title_year, 1);

    let names: Vec<&str> = summary.files.iter().map(|f| f.name).collect();
    assert_eq!(
        names,
        vec![
            MOVIES_MAIN,
            MOVIES_BY_GENRE,
            DIRECTOR_PERFORMANCE,
            ACTOR_PERFORMANCE,
            YEARLY_TRENDS,
            FUNNEL_ANALYSIS,
            GENRE_PERFORMANCE,
        ]
    );
    for f in &summary.files {
        assert!(out.join(f.name).is_file(), "{} missing", f.name);
    }
    assert_eq!(read_rows(&out.join(MOVIES_MAIN)).len(), 5);
}

#[test]
fn rows_are_normalized_and_enriched() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_source(tmp.path());
    let summary = run_etl(&input, &tmp.path().join("out")).unwrap();
    let movies = &summary.tables.movies;

    let avatar = &movies[0];
    assert_eq!(avatar.title, "Avatar");
    assert_eq!(avatar.profit, Some(30_000_000.0));
    assert_eq!(avatar.roi, Some(300.0));
    assert_eq!(avatar.funnel_stage, FunnelStage::ExceptionalRoi);
    assert_eq!(avatar.roi_category, RoiTier::Hit);
    assert_eq!(avatar.budget_category, BudgetTier::Low);
    assert_eq!(avatar.language, "EN");

    let second = &movies[1];
    assert_eq!(second.revenue, Some(10_000_000.0), "gross fills missing revenue");
    assert_eq!(second.primary_genre, "Drama");
    assert_eq!(second.content_rating, "NR");
    assert_eq!(second.funnel_stage, FunnelStage::PartialRecovery);

    let third = &movies[2];
    assert_eq!(third.year, Some(1995));
    assert_eq!(third.roi, None);
    assert_eq!(third.funnel_stage, FunnelStage::NoInvestmentData);

    let fourth = &movies[3];
    assert_eq!(fourth.budget, None);
    assert_eq!(fourth.revenue, None);
    assert_eq!(fourth.year, None);
    assert_eq!(fourth.primary_genre, "Unknown");
    assert!(!fourth.is_profitable);

    assert_eq!(movies[4].title, "Amélie");
}

#[test]
fn rerunning_produces_identical_files() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_source(tmp.path());
    let out = tmp.path().join("out");

    let first = run_etl(&input, &out).unwrap();
    let snapshot: Vec<Vec<u8>> = first
        .files
        .iter()
        .map(|f| fs::read(out.join(f.name)).unwrap())
        .collect();
    let second = run_etl(&input, &out).unwrap();
    for (f, before) in second.files.iter().zip(snapshot) {
        assert_eq!(fs::read(out.join(f.name)).unwrap(), before, "{} changed", f.name);
    }
}

#[test]
fn genre_table_regroups_to_main_table() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_source(tmp.path());
    let out = tmp.path().join("out");
    run_etl(&input, &out).unwrap();

    let main = read_rows(&out.join(MOVIES_MAIN));
    let by_genre = read_rows(&out.join(MOVIES_BY_GENRE));

    let mut regrouped: HashMap<String, Vec<String>> = HashMap::new();
    for row in &by_genre {
        regrouped
            .entry(row["id"].clone())
            .or_default()
            .push(row["Genre"].clone());
    }
    for row in &main {
        let expected: usize = row["Genre Count"].parse().unwrap();
        let got = regrouped.get(&row["id"]).map_or(0, Vec::len);
        assert_eq!(got, expected, "movie {}", row["id"]);
    }
    assert_eq!(
        regrouped["1"],
        vec!["Action".to_string(), "Drama".to_string()]
    );
}

#[test]
fn dashboard_reads_the_etl_output() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_source(tmp.path());
    let out = tmp.path().join("out");
    let summary = run_etl(&input, &out).unwrap();

    let dataset = Dataset::load(&out, MinSupport::default()).unwrap();
    assert_eq!(dataset.movies, summary.tables.movies);

    let filters = dataset.select(None, Some("Comedy"), None).unwrap();
    let rows = dataset.filter(&filters);
    assert_eq!(rows.len(), 2);

    let query = DetailQuery::parse(Some("am"), Some("ROI"), Some("desc"), None).unwrap();
    let view = views::details(&rows, &query);
    assert_eq!(view.total, 2);
    assert_eq!(view.showing, 1);
    assert_eq!(view.rows[0].title, "Amélie");

    assert!(dataset.select(None, Some("Western"), None).is_err());
}
