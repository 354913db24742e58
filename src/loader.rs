use crate::categories::{
    Bucket, BudgetTier, Era, FunnelStage, RatingTier, RoiTier, RuntimeTier, Season, SocialTier,
};
use crate::error::{ReportError, Result};
use crate::metrics::{combined_rating, derive_financials, resolve_revenue};
use crate::types::{MovieRecord, RawRow, UNKNOWN};
use crate::util::{median, parse_date_safe, parse_f64_safe, parse_i64_safe};
use chrono::Datelike;
use csv::{ByteRecord, ReaderBuilder, StringRecord};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

const NOT_RATED: &str = "Not Rated";

/// Content ratings folded onto the MPAA scale.
static CONTENT_RATING_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Not Rated", "NR"),
        ("Unrated", "NR"),
        ("TV-14", "PG-13"),
        ("TV-MA", "R"),
        ("TV-PG", "PG"),
        ("Passed", "G"),
        ("Approved", "G"),
        ("GP", "PG"),
        ("M", "PG"),
    ])
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub parse_errors: usize,
    pub imputed_runtime: usize,
    pub imputed_duration: usize,
    pub imputed_aspect_ratio: usize,
    pub year_from_title_year: usize,
}

/// Read the merged source CSV and normalize every row.
///
/// The export is Latin-1 in places, so fields that are not valid UTF-8 are
/// decoded byte-per-char instead of failing the row.
pub fn load_and_clean(path: &Path) -> Result<(Vec<MovieRecord>, LoadReport)> {
    if !path.is_file() {
        return Err(ReportError::SourceNotFound(path.to_path_buf()));
    }
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| ReportError::csv(path, e))?;
    let headers = decode_record(rdr.byte_headers().map_err(|e| ReportError::csv(path, e))?);

    let mut rows = Vec::new();
    let mut parse_errors = 0usize;
    for (idx, result) in rdr.byte_records().enumerate() {
        let parsed = result
            .map(|raw| decode_record(&raw))
            .and_then(|rec| rec.deserialize::<RawRow>(Some(&headers)));
        match parsed {
            Ok(row) => rows.push(row),
            Err(e) => {
                parse_errors += 1;
                warn!("Skipping source row {}: {}", idx + 2, e);
            }
        }
    }
    info!("Read {} rows from {:?}", rows.len(), path);

    let (records, mut report) = normalize(rows);
    report.total_rows += parse_errors;
    report.parse_errors = parse_errors;
    Ok((records, report))
}

fn decode_record(raw: &ByteRecord) -> StringRecord {
    raw.iter().map(decode_field).collect()
}

fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Values parsed from one raw row, before dataset-wide imputation.
struct Staged {
    raw: RawRow,
    row_number: usize,
    runtime: Option<f64>,
    duration: Option<f64>,
    aspect_ratio: Option<f64>,
}

/// Turn raw rows into enriched records. No row is ever dropped here.
pub fn normalize(rows: Vec<RawRow>) -> (Vec<MovieRecord>, LoadReport) {
    let staged: Vec<Staged> = rows
        .into_iter()
        .enumerate()
        .map(|(idx, raw)| Staged {
            runtime: parse_f64_safe(raw.runtime.as_deref()),
            duration: parse_f64_safe(raw.duration.as_deref()),
            aspect_ratio: parse_f64_safe(raw.aspect_ratio.as_deref()),
            row_number: idx + 1,
            raw,
        })
        .collect();

    // Column medians are global statistics over the whole dataset.
    let median_of = |f: fn(&Staged) -> Option<f64>| median(staged.iter().filter_map(f).collect());
    let runtime_median = median_of(|s| s.runtime);
    let duration_median = median_of(|s| s.duration);
    let aspect_median = median_of(|s| s.aspect_ratio);
    debug!(
        "Imputation medians: runtime={:?} duration={:?} aspect_ratio={:?}",
        runtime_median, duration_median, aspect_median
    );

    let mut report = LoadReport {
        total_rows: staged.len(),
        ..LoadReport::default()
    };
    let records = staged
        .into_iter()
        .map(|mut s| {
            if s.runtime.is_none() && runtime_median.is_some() {
                s.runtime = runtime_median;
                report.imputed_runtime += 1;
            }
            if s.duration.is_none() && duration_median.is_some() {
                s.duration = duration_median;
                report.imputed_duration += 1;
            }
            if s.aspect_ratio.is_none() && aspect_median.is_some() {
                s.aspect_ratio = aspect_median;
                report.imputed_aspect_ratio += 1;
            }
            let (record, year_fallback) = build_record(s);
            if year_fallback {
                report.year_from_title_year += 1;
            }
            record
        })
        .collect();
    (records, report)
}

/// Returns the record and whether its year came from `title_year`.
fn build_record(s: Staged) -> (MovieRecord, bool) {
    let raw = s.raw;

    let budget = parse_f64_safe(raw.budget.as_deref());
    let revenue = resolve_revenue(
        parse_f64_safe(raw.revenue.as_deref()),
        parse_f64_safe(raw.gross.as_deref()),
    );
    let fin = derive_financials(budget, revenue);
    let funnel_stage = FunnelStage::classify(budget, revenue);

    let release = parse_date_safe(raw.release_date.as_deref());
    let title_year = parse_i64_safe(raw.title_year.as_deref())
        .filter(|y| *y > 0)
        .and_then(|y| i32::try_from(y).ok());
    let year = release.map(|d| d.year()).or(title_year);
    let year_fallback = release.is_none() && year.is_some();
    let month = release.map(|d| d.month());

    let tmdb_rating = parse_f64_safe(raw.vote_average.as_deref());
    let imdb_rating = parse_f64_safe(raw.imdb_score.as_deref());
    let combined = combined_rating(tmdb_rating, imdb_rating);

    let runtime_minutes = s.runtime.or(s.duration);

    let genres = parse_genres(raw.genres.as_deref());

    let likes = |v: &Option<String>| parse_f64_safe(v.as_deref()).map_or(0, |n| n as i64);
    let movie_fb_likes = likes(&raw.movie_facebook_likes);
    let director_fb_likes = likes(&raw.director_facebook_likes);
    let cast_fb_likes = likes(&raw.cast_total_facebook_likes);
    let total_social_engagement = movie_fb_likes + cast_fb_likes + director_fb_likes;

    let id = raw
        .id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("row-{}", s.row_number));

    let record = MovieRecord {
        id,
        title: clean_title(raw.movie_title.as_deref()),
        year,
        month,
        quarter: month.map(|m| (m - 1) / 3 + 1),
        month_name: release.map(|d| d.format("%B").to_string()),
        day_of_week: release.map(|d| d.format("%A").to_string()),
        season: Season::classify(month),
        era: Era::classify(year),

        budget,
        revenue,
        profit: fin.profit,
        roi: fin.roi,
        profit_margin: fin.profit_margin,
        revenue_to_budget_ratio: fin.revenue_to_budget_ratio,
        is_profitable: fin.is_profitable,
        budget_category: BudgetTier::classify(budget),
        roi_category: RoiTier::classify(fin.roi),
        funnel_stage,
        funnel_order: funnel_stage.rank(),

        tmdb_rating,
        imdb_rating,
        combined_rating: combined,
        rating_category: RatingTier::classify(combined),
        vote_count: parse_i64_safe(raw.vote_count.as_deref()),
        popularity: parse_f64_safe(raw.popularity.as_deref()),

        primary_genre: genres
            .first()
            .cloned()
            .unwrap_or_else(|| UNKNOWN.to_string()),
        all_genres: if genres.is_empty() {
            UNKNOWN.to_string()
        } else {
            genres.join(", ")
        },
        genre_count: genres.len(),
        content_rating: canonical_content_rating(raw.content_rating.as_deref()),
        runtime_minutes,
        runtime_category: RuntimeTier::classify(runtime_minutes),
        duration: s.duration,
        aspect_ratio: s.aspect_ratio,
        language: text_or_unknown(raw.original_language.as_deref()).to_uppercase(),

        director: text_or_unknown(raw.director_name.as_deref()),
        lead_actor: text_or_unknown(raw.actor_1_name.as_deref()),
        actor_2: text_or_unknown(raw.actor_2_name.as_deref()),
        actor_3: text_or_unknown(raw.actor_3_name.as_deref()),

        movie_fb_likes,
        director_fb_likes,
        cast_fb_likes,
        lead_actor_fb_likes: likes(&raw.actor_1_facebook_likes),
        total_social_engagement,
        social_category: SocialTier::classify(total_social_engagement),

        critic_reviews: parse_i64_safe(raw.num_critic_for_reviews.as_deref()),
        user_reviews: parse_i64_safe(raw.num_user_for_reviews.as_deref()),
        genre_list: genres,
    };
    (record, year_fallback)
}

fn text_or_unknown(s: Option<&str>) -> String {
    match s.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// Trim and drop the non-breaking spaces and stray `Â` left behind by the
/// Latin-1 round trip of the IMDB scrape.
pub fn clean_title(s: Option<&str>) -> String {
    let cleaned: String = s
        .unwrap_or_default()
        .chars()
        .filter(|c| *c != '\u{a0}' && *c != 'Â')
        .collect();
    text_or_unknown(Some(&cleaned))
}

pub fn canonical_content_rating(s: Option<&str>) -> String {
    let rating = match s.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => NOT_RATED,
    };
    CONTENT_RATING_ALIASES
        .get(rating)
        .copied()
        .unwrap_or(rating)
        .to_string()
}

/// Genres come either pipe-separated (`Action|Adventure`) or as a
/// JSON-like list of `{'id': .., 'name': ..}` objects. Anything unreadable
/// yields no genres.
pub fn parse_genres(s: Option<&str>) -> Vec<String> {
    let Some(s) = s.map(str::trim).filter(|s| !s.is_empty()) else {
        return Vec::new();
    };
    if s.contains('[') {
        let value: serde_json::Value = match serde_json::from_str(&s.replace('\'', "\"")) {
            Ok(v) => v,
            Err(_) => return Vec::new(),
        };
        let Some(items) = value.as_array() else {
            return Vec::new();
        };
        return items
            .iter()
            .filter_map(|item| match item {
                serde_json::Value::Object(map) => {
                    map.get("name").and_then(|n| n.as_str()).map(str::to_string)
                }
                serde_json::Value::String(name) => Some(name.clone()),
                _ => None,
            })
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();
    }
    s.split('|')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(budget: &str, revenue: &str) -> RawRow {
        RawRow {
            id: Some("1".into()),
            movie_title: Some("Avatar\u{a0}".into()),
            budget: Some(budget.into()),
            revenue: Some(revenue.into()),
            genres: Some("Action|Adventure|Fantasy".into()),
            release_date: Some("2009-12-10".into()),
            ..RawRow::default()
        }
    }

    #[test]
    fn builds_financials_and_labels() {
        let (records, report) = normalize(vec![raw("10000000", "40000000")]);
        assert_eq!(report.total_rows, 1);
        let r = &records[0];
        assert_eq!(r.title, "Avatar");
        assert_eq!(r.profit, Some(30_000_000.0));
        assert_eq!(r.roi, Some(300.0));
        assert_eq!(r.budget_category, BudgetTier::Low);
        assert_eq!(r.funnel_stage, FunnelStage::ExceptionalRoi);
        assert_eq!(r.funnel_order, 7);
        assert_eq!(r.year, Some(2009));
        assert_eq!(r.month, Some(12));
        assert_eq!(r.quarter, Some(4));
        assert_eq!(r.month_name.as_deref(), Some("December"));
        assert_eq!(r.season, Season::Winter);
        assert_eq!(r.era, Era::TwoThousands);
        assert_eq!(r.primary_genre, "Action");
        assert_eq!(r.genre_count, 3);
        assert_eq!(r.genres(), vec!["Action", "Adventure", "Fantasy"]);
    }

    #[test]
    fn zero_budget_is_unknown_and_unprofitable() {
        let (records, _) = normalize(vec![raw("0", "5000")]);
        let r = &records[0];
        assert_eq!(r.roi, None);
        assert!(!r.is_profitable);
        assert_eq!(r.budget_category, BudgetTier::Unknown);
        assert_eq!(r.funnel_stage, FunnelStage::NoInvestmentData);
    }

    #[test]
    fn bad_cells_become_missing_without_dropping_rows() {
        let mut bad = raw("lots", "???");
        bad.vote_count = Some("many".into());
        let (records, _) = normalize(vec![bad, raw("100", "200")]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].budget, None);
        assert_eq!(records[0].revenue, None);
        assert_eq!(records[0].vote_count, None);
        assert_eq!(records[0].budget_category, BudgetTier::Unknown);
    }

    #[test]
    fn imputes_medians_and_sentinels() {
        let mut a = raw("1", "1");
        a.runtime = Some("100".into());
        a.duration = Some("90".into());
        let mut b = raw("1", "1");
        b.runtime = Some("120".into());
        let c = raw("1", "1");
        let (records, report) = normalize(vec![a, b, c]);
        assert_eq!(report.imputed_runtime, 1);
        assert_eq!(report.imputed_duration, 2);
        assert_eq!(records[2].runtime_minutes, Some(110.0));
        assert_eq!(records[1].duration, Some(90.0));
        assert_eq!(records[2].runtime_category, RuntimeTier::Standard);
        assert_eq!(records[2].director, "Unknown");
        assert_eq!(records[2].content_rating, "NR");
        assert_eq!(records[2].language, "UNKNOWN");
    }

    #[test]
    fn year_falls_back_to_title_year() {
        let mut row = raw("1", "1");
        row.release_date = Some("not a date".into());
        row.title_year = Some("1985.0".into());
        let (records, report) = normalize(vec![row]);
        assert_eq!(records[0].year, Some(1985));
        assert_eq!(records[0].month, None);
        assert_eq!(records[0].era, Era::PreDigital);
        assert_eq!(report.year_from_title_year, 1);
    }

    #[test]
    fn out_of_range_title_year_is_missing() {
        let mut row = raw("1", "1");
        row.release_date = None;
        row.title_year = Some("9999999999".into());
        let (records, report) = normalize(vec![row]);
        assert_eq!(records[0].year, None);
        assert_eq!(records[0].era, Era::Unknown);
        assert_eq!(report.year_from_title_year, 0);
    }

    #[test]
    fn parses_both_genre_encodings() {
        assert_eq!(
            parse_genres(Some("[{'id': 28, 'name': 'Action'}, {'id': 12, 'name': 'Adventure'}]")),
            vec!["Action", "Adventure"]
        );
        assert_eq!(parse_genres(Some("Comedy| Drama |")), vec!["Comedy", "Drama"]);
        assert!(parse_genres(Some("[broken")).is_empty());
        assert!(parse_genres(None).is_empty());
    }

    #[test]
    fn canonicalizes_content_ratings() {
        assert_eq!(canonical_content_rating(Some("TV-MA")), "R");
        assert_eq!(canonical_content_rating(Some("PG-13")), "PG-13");
        assert_eq!(canonical_content_rating(None), "NR");
    }

    #[test]
    fn missing_genres_default_to_unknown() {
        let mut row = raw("1", "1");
        row.genres = None;
        let (records, _) = normalize(vec![row]);
        assert_eq!(records[0].primary_genre, "Unknown");
        assert_eq!(records[0].all_genres, "Unknown");
        assert!(records[0].genres().is_empty());
    }

    #[test]
    fn latin1_fields_are_decoded() {
        assert_eq!(decode_field(b"Am\xe9lie"), "Amélie");
        assert_eq!(decode_field("Amélie".as_bytes()), "Amélie");
    }
}
