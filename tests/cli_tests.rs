use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

const SOURCE: &str = "\
id,movie_title,budget,revenue,gross,release_date,title_year,vote_average,imdb_score,genres,director_name,actor_1_name
1,Alpha,10000000,40000000,,2012-06-01,,7.0,7.8,Action|Drama,Ann,Xavi
2,Beta,20000000,,10000000,2012-07-01,,5.0,,Drama,Bob,Yara
3,Gamma,,,,,1995,6.0,6.4,Comedy,Ann,Xavi
";

fn write_source(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("merged.csv");
    fs::write(&path, SOURCE).unwrap();
    path
}

#[test]
fn etl_exports_tables_and_prints_previews() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_source(tmp.path());
    let out = tmp.path().join("tableau");

    let mut cmd = Command::cargo_bin("movie-report").unwrap();
    cmd.arg("etl")
        .arg("--input")
        .arg(&input)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Director Performance"))
        .stdout(predicate::str::contains("7_Exceptional_ROI"))
        .stdout(predicate::str::contains("movies_main.csv"));

    assert!(out.join("movies_main.csv").is_file());
    assert!(out.join("genre_performance.csv").is_file());
}

#[test]
fn etl_reports_missing_source() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("movie-report").unwrap();
    cmd.arg("etl")
        .arg("--input")
        .arg(tmp.path().join("nope.csv"))
        .arg("--output-dir")
        .arg(tmp.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Source file not found"));
}

#[test]
fn config_file_supplies_paths() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_source(tmp.path());
    let out = tmp.path().join("from-config");
    let config = tmp.path().join("report.toml");
    fs::write(
        &config,
        format!(
            "[paths]\ninput = {:?}\noutput_dir = {:?}\n",
            input.display().to_string(),
            out.display().to_string()
        ),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("movie-report").unwrap();
    cmd.arg("--config")
        .arg(&config)
        .arg("etl")
        .assert()
        .success();
    assert!(out.join("movies_main.csv").is_file());
}

#[test]
fn dashboard_without_data_points_at_etl() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("movie-report").unwrap();
    cmd.arg("dashboard")
        .arg("--data-dir")
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("movie-report etl"));
}

#[test]
fn dashboard_menu_runs_over_exported_data() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_source(tmp.path());
    let out = tmp.path().join("tableau");
    Command::cargo_bin("movie-report")
        .unwrap()
        .args(["etl", "--input"])
        .arg(&input)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();

    let mut cmd = Command::cargo_bin("movie-report").unwrap();
    cmd.arg("dashboard")
        .arg("--data-dir")
        .arg(&out)
        .write_stdin("1\n4\n7\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("--- Overview ---"))
        .stdout(predicate::str::contains("--- Investment-to-Profitability Funnel ---"));
}
