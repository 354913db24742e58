//! Data behind the five dashboard pages. Every builder takes the already
//! filtered rows and returns a plain serializable struct; nothing here
//! knows about terminals or HTTP.
use crate::categories::{BudgetTier, FunnelStage};
use crate::config::MinSupport;
use crate::error::{ReportError, Result};
use crate::reports::GroupStats;
use crate::types::{MovieRecord, UNKNOWN};
use crate::util::{
    average, format_currency, format_opt_currency, format_opt_number, format_opt_percent, median,
    quantile_sorted, round_to, safe_div,
};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

const SCATTER_LIMIT: usize = 1000;
const TOP_GENRES: usize = 10;
const RATING_BINS: usize = 30;
const MONEY_BINS: usize = 50;
const TREND_START_YEAR: i32 = 1970;
const ROI_BOX_RANGE: (f64, f64) = (-100.0, 1000.0);

fn pct(part: usize, whole: usize) -> Option<f64> {
    safe_div(part as f64, whole as f64).map(|r| round_to(r * 100.0, 1))
}

fn display_opt_pct(v: &Option<f64>) -> String {
    v.map(|p| format!("{:.1}%", p))
        .unwrap_or_else(|| "—".to_string())
}

fn display_currency(v: &f64) -> String {
    format_currency(*v)
}

fn with_budget<'a>(rows: &[&'a MovieRecord]) -> Vec<&'a MovieRecord> {
    rows.iter().copied().filter(|r| r.has_budget()).collect()
}

fn with_budget_and_revenue<'a>(rows: &[&'a MovieRecord]) -> Vec<&'a MovieRecord> {
    rows.iter()
        .copied()
        .filter(|r| r.has_budget() && r.has_revenue())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub movies: usize,
    pub with_budget: usize,
    pub profitable: usize,
    pub total_revenue: f64,
    pub total_budget: f64,
    /// Total budget spread over the movies that have one.
    pub avg_budget: Option<f64>,
    pub median_roi: Option<f64>,
    /// Percent of movies with a budget that turned a profit.
    pub success_rate: Option<f64>,
}

pub fn kpis(rows: &[&MovieRecord]) -> Kpis {
    let valid = with_budget(rows);
    let profitable = valid.iter().filter(|r| r.is_profitable).count();
    let total_budget: f64 = rows.iter().filter_map(|r| r.budget).sum();
    Kpis {
        movies: rows.len(),
        with_budget: valid.len(),
        profitable,
        total_revenue: rows.iter().filter_map(|r| r.revenue).sum(),
        total_budget,
        avg_budget: safe_div(total_budget, valid.len() as f64),
        median_roi: median(valid.iter().filter_map(|r| r.roi).collect()),
        success_rate: pct(profitable, valid.len()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bins: Vec<Bin>,
    pub mean: Option<f64>,
}

impl Histogram {
    /// Equal-width bins spanning min..=max; the last bin is closed.
    pub fn build(values: &[f64], bins: usize) -> Self {
        let mean = average(values);
        let (Some(min), Some(max)) = (
            values.iter().copied().reduce(f64::min),
            values.iter().copied().reduce(f64::max),
        ) else {
            return Histogram {
                bins: Vec::new(),
                mean,
            };
        };
        if bins == 0 || max <= min {
            return Histogram {
                bins: vec![Bin {
                    start: min,
                    end: max,
                    count: values.len(),
                }],
                mean,
            };
        }
        let width = (max - min) / bins as f64;
        let mut counts = vec![0usize; bins];
        for v in values {
            let idx = (((v - min) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| Bin {
                start: min + width * i as f64,
                end: min + width * (i + 1) as f64,
                count,
            })
            .collect();
        Histogram { bins, mean }
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub title: String,
    pub primary_genre: String,
    pub year: Option<i32>,
    pub budget: f64,
    pub revenue: Option<f64>,
    pub roi: Option<f64>,
    pub popularity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct GenreRevenue {
    #[tabled(rename = "Genre")]
    pub genre: String,
    #[tabled(rename = "Total Revenue", display_with = "display_currency")]
    pub total_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct YearPoint {
    #[tabled(rename = "Year")]
    pub year: i32,
    #[tabled(rename = "Revenue", display_with = "display_currency")]
    pub revenue: f64,
    #[tabled(rename = "Budget", display_with = "display_currency")]
    pub budget: f64,
    #[tabled(rename = "Movies")]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewView {
    pub kpis: Kpis,
    pub revenue_vs_budget: Vec<ScatterPoint>,
    pub top_genres: Vec<GenreRevenue>,
    pub yearly: Vec<YearPoint>,
    pub rating_histogram: Histogram,
}

pub fn overview(rows: &[&MovieRecord]) -> OverviewView {
    let revenue_vs_budget = with_budget(rows)
        .into_iter()
        .take(SCATTER_LIMIT)
        .map(|r| ScatterPoint {
            title: r.title.clone(),
            primary_genre: r.primary_genre.clone(),
            year: r.year,
            budget: r.budget.unwrap_or_default(),
            revenue: r.revenue,
            roi: r.roi,
            popularity: r.popularity,
        })
        .collect();

    let mut by_genre: BTreeMap<&str, f64> = BTreeMap::new();
    for r in rows {
        *by_genre.entry(r.primary_genre.as_str()).or_default() += r.revenue.unwrap_or_default();
    }
    let mut top_genres: Vec<GenreRevenue> = by_genre
        .into_iter()
        .map(|(genre, total_revenue)| GenreRevenue {
            genre: genre.to_string(),
            total_revenue,
        })
        .collect();
    top_genres.sort_by(|a, b| b.total_revenue.total_cmp(&a.total_revenue));
    top_genres.truncate(TOP_GENRES);

    let mut by_year: BTreeMap<i32, YearPoint> = BTreeMap::new();
    for r in rows {
        let Some(year) = r.year.filter(|y| *y > TREND_START_YEAR) else {
            continue;
        };
        let point = by_year.entry(year).or_insert(YearPoint {
            year,
            revenue: 0.0,
            budget: 0.0,
            count: 0,
        });
        point.revenue += r.revenue.unwrap_or_default();
        point.budget += r.budget.unwrap_or_default();
        point.count += 1;
    }

    let ratings: Vec<f64> = rows.iter().filter_map(|r| r.combined_rating).collect();

    OverviewView {
        kpis: kpis(rows),
        revenue_vs_budget,
        top_genres,
        yearly: by_year.into_values().collect(),
        rating_histogram: Histogram::build(&ratings, RATING_BINS),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spread {
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

impl Spread {
    fn of(values: Vec<f64>) -> Self {
        Spread {
            mean: average(&values),
            median: median(values),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct BudgetTierRow {
    #[tabled(rename = "Budget Category")]
    pub tier: BudgetTier,
    #[tabled(rename = "Movies")]
    pub count: usize,
    #[tabled(rename = "Avg Revenue", display_with = "format_opt_currency")]
    pub avg_revenue: Option<f64>,
    #[tabled(rename = "Median ROI", display_with = "format_opt_percent")]
    pub median_roi: Option<f64>,
    #[tabled(rename = "Success Rate", display_with = "display_opt_pct")]
    pub success_rate: Option<f64>,
}

/// Five-number summary of ROI within one budget tier.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct BoxStats {
    #[tabled(rename = "Budget Category")]
    pub tier: BudgetTier,
    #[tabled(rename = "N")]
    pub count: usize,
    #[tabled(rename = "Min", display_with = "format_opt_percent")]
    pub min: Option<f64>,
    #[tabled(rename = "Q1", display_with = "format_opt_percent")]
    pub q1: Option<f64>,
    #[tabled(rename = "Median", display_with = "format_opt_percent")]
    pub median: Option<f64>,
    #[tabled(rename = "Q3", display_with = "format_opt_percent")]
    pub q3: Option<f64>,
    #[tabled(rename = "Max", display_with = "format_opt_percent")]
    pub max: Option<f64>,
}

impl BoxStats {
    fn of(tier: BudgetTier, mut values: Vec<f64>) -> Self {
        values.sort_by(f64::total_cmp);
        BoxStats {
            tier,
            count: values.len(),
            min: values.first().copied(),
            q1: quantile_sorted(&values, 0.25),
            median: quantile_sorted(&values, 0.5),
            q3: quantile_sorted(&values, 0.75),
            max: values.last().copied(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialView {
    pub movies: usize,
    pub budget: Spread,
    pub revenue: Spread,
    pub profit: Spread,
    pub roi: Spread,
    pub by_budget_tier: Vec<BudgetTierRow>,
    pub roi_by_budget_tier: Vec<BoxStats>,
    pub budget_histogram: Histogram,
    pub revenue_histogram: Histogram,
}

pub fn financial(rows: &[&MovieRecord]) -> FinancialView {
    let valid = with_budget_and_revenue(rows);
    let column = |f: fn(&MovieRecord) -> Option<f64>| -> Vec<f64> {
        valid.iter().filter_map(|&r| f(r)).collect()
    };
    let budgets = column(|r| r.budget);
    let revenues = column(|r| r.revenue);

    let mut tiers: BTreeMap<BudgetTier, Vec<&MovieRecord>> = BTreeMap::new();
    for r in &valid {
        if r.budget_category != BudgetTier::Unknown {
            tiers.entry(r.budget_category).or_default().push(r);
        }
    }
    let by_budget_tier = tiers
        .iter()
        .map(|(tier, members)| {
            let stats = GroupStats::from_records(members.iter().copied());
            BudgetTierRow {
                tier: *tier,
                count: stats.count,
                avg_revenue: stats.avg_revenue(),
                median_roi: stats.median_roi(),
                success_rate: stats.success_pct(),
            }
        })
        .collect();
    let roi_by_budget_tier = tiers
        .iter()
        .map(|(tier, members)| {
            let rois = members
                .iter()
                .filter_map(|r| r.roi)
                .filter(|roi| (ROI_BOX_RANGE.0..=ROI_BOX_RANGE.1).contains(roi))
                .collect();
            BoxStats::of(*tier, rois)
        })
        .collect();

    FinancialView {
        movies: valid.len(),
        budget: Spread::of(budgets.clone()),
        revenue: Spread::of(revenues.clone()),
        profit: Spread::of(column(|r| r.profit)),
        roi: Spread::of(column(|r| r.roi)),
        by_budget_tier,
        roi_by_budget_tier,
        budget_histogram: Histogram::build(&budgets, MONEY_BINS),
        revenue_histogram: Histogram::build(&revenues, MONEY_BINS),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct GenreMatrixRow {
    #[tabled(rename = "Genre")]
    pub genre: String,
    #[tabled(rename = "Movies")]
    pub movies: usize,
    #[tabled(rename = "Total Revenue", display_with = "display_currency")]
    pub total_revenue: f64,
    #[tabled(rename = "Avg Revenue", display_with = "format_opt_currency")]
    pub avg_revenue: Option<f64>,
    #[tabled(rename = "Median ROI", display_with = "format_opt_percent")]
    pub median_roi: Option<f64>,
    #[tabled(rename = "Success Rate", display_with = "display_opt_pct")]
    pub success_rate: Option<f64>,
    #[tabled(rename = "Avg Rating", display_with = "format_opt_number")]
    pub avg_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct LeaderRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Movies")]
    pub movies: usize,
    #[tabled(rename = "Total Revenue", display_with = "display_currency")]
    pub total_revenue: f64,
    #[tabled(rename = "Median ROI", display_with = "format_opt_percent")]
    pub median_roi: Option<f64>,
    #[tabled(rename = "Success Rate", display_with = "display_opt_pct")]
    pub success_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ContentRatingRow {
    #[tabled(rename = "Content Rating")]
    pub content_rating: String,
    #[tabled(rename = "Movies")]
    pub movies: usize,
    #[tabled(rename = "Avg Revenue", display_with = "format_opt_currency")]
    pub avg_revenue: Option<f64>,
    #[tabled(rename = "Median ROI", display_with = "format_opt_percent")]
    pub median_roi: Option<f64>,
    #[tabled(rename = "Success Rate", display_with = "display_opt_pct")]
    pub success_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenrePeopleView {
    pub genre_matrix: Vec<GenreMatrixRow>,
    pub top_directors: Vec<LeaderRow>,
    pub top_actors: Vec<LeaderRow>,
    pub content_ratings: Vec<ContentRatingRow>,
}

/// Groups with at least `min_rows` members, largest total revenue first.
fn supported_groups<'a, K>(
    rows: &[&'a MovieRecord],
    key: K,
    min_rows: usize,
) -> Vec<(&'a str, GroupStats)>
where
    K: Fn(&'a MovieRecord) -> &'a str,
{
    let mut map: BTreeMap<&'a str, GroupStats> = BTreeMap::new();
    for &r in rows {
        map.entry(key(r)).or_default().push(r);
    }
    let mut groups: Vec<(&str, GroupStats)> = map
        .into_iter()
        .filter(|(_, s)| s.count >= min_rows)
        .collect();
    groups.sort_by(|a, b| b.1.total_revenue().total_cmp(&a.1.total_revenue()));
    groups
}

fn leaderboard<'a, K>(rows: &[&'a MovieRecord], key: K, min_rows: usize, top_n: usize) -> Vec<LeaderRow>
where
    K: Fn(&'a MovieRecord) -> &'a str,
{
    let known: Vec<&'a MovieRecord> = rows
        .iter()
        .copied()
        .filter(|&r| key(r) != UNKNOWN)
        .collect();
    supported_groups(&known, &key, min_rows)
        .into_iter()
        .take(top_n)
        .map(|(name, s)| LeaderRow {
            name: name.to_string(),
            movies: s.count,
            total_revenue: s.total_revenue(),
            median_roi: s.median_roi(),
            success_rate: s.success_pct(),
        })
        .collect()
}

pub fn genre_people(rows: &[&MovieRecord], support: &MinSupport) -> GenrePeopleView {
    let valid = with_budget_and_revenue(rows);
    let genre_matrix = supported_groups(&valid, |r| r.primary_genre.as_str(), support.genres)
        .into_iter()
        .map(|(genre, s)| GenreMatrixRow {
            genre: genre.to_string(),
            movies: s.count,
            total_revenue: s.total_revenue(),
            avg_revenue: s.avg_revenue(),
            median_roi: s.median_roi(),
            success_rate: s.success_pct(),
            avg_rating: s.avg_rating(),
        })
        .collect();
    let content_ratings = supported_groups(
        &valid,
        |r| r.content_rating.as_str(),
        support.content_ratings,
    )
    .into_iter()
    .map(|(rating, s)| ContentRatingRow {
        content_rating: rating.to_string(),
        movies: s.count,
        avg_revenue: s.avg_revenue(),
        median_roi: s.median_roi(),
        success_rate: s.success_pct(),
    })
    .collect();
    GenrePeopleView {
        genre_matrix,
        top_directors: leaderboard(
            &valid,
            |r| r.director.as_str(),
            support.directors,
            support.top_n,
        ),
        top_actors: leaderboard(
            &valid,
            |r| r.lead_actor.as_str(),
            support.actors,
            support.top_n,
        ),
        content_ratings,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct FunnelStep {
    #[tabled(rename = "Stage")]
    pub stage: &'static str,
    #[tabled(rename = "Movies")]
    pub movies: usize,
    #[tabled(rename = "% of Total", display_with = "display_opt_pct")]
    pub pct_of_total: Option<f64>,
    #[tabled(rename = "Conversion", display_with = "display_opt_pct")]
    pub conversion: Option<f64>,
    #[tabled(rename = "Dropped")]
    pub dropped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct StageCount {
    #[tabled(rename = "Funnel Stage")]
    pub stage: FunnelStage,
    #[tabled(rename = "Movies")]
    pub movies: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct GenreFunnelRow {
    #[tabled(rename = "Genre")]
    pub genre: String,
    #[tabled(rename = "Movies")]
    pub total: usize,
    #[tabled(rename = "Has Revenue", display_with = "display_opt_pct")]
    pub revenue_rate: Option<f64>,
    #[tabled(rename = "Profitable", display_with = "display_opt_pct")]
    pub profit_rate: Option<f64>,
    #[tabled(rename = "High ROI (>300%)", display_with = "display_opt_pct")]
    pub high_roi_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelView {
    pub stages: Vec<FunnelStep>,
    pub distribution: Vec<StageCount>,
    pub by_genre: Vec<GenreFunnelRow>,
}

fn roi_above(r: &MovieRecord, threshold: f64) -> bool {
    r.roi.is_some_and(|roi| roi > threshold)
}

pub fn funnel(rows: &[&MovieRecord], support: &MinSupport) -> FunnelView {
    let valid = with_budget(rows);
    let count = |pred: &dyn Fn(&MovieRecord) -> bool| valid.iter().filter(|&&r| pred(r)).count();
    let [recovery, ..] = FunnelStage::RATIO_THRESHOLDS;
    let stage_counts: [(&'static str, usize); 8] = [
        ("Total Movies", rows.len()),
        ("Has Budget", valid.len()),
        ("Generated Revenue", count(&|r| r.has_revenue())),
        (
            "Recovered 50%+",
            count(&|r| match (r.budget, r.revenue) {
                (Some(b), Some(rev)) => rev > 0.0 && rev >= b * recovery,
                _ => false,
            }),
        ),
        ("Profitable", count(&|r| r.is_profitable)),
        ("Strong ROI (>100%)", count(&|r| roi_above(r, 100.0))),
        ("High ROI (>300%)", count(&|r| roi_above(r, 300.0))),
        ("Blockbuster (>1000%)", count(&|r| roi_above(r, 1000.0))),
    ];
    let total = stage_counts[0].1;
    let stages = stage_counts
        .iter()
        .enumerate()
        .map(|(i, (stage, movies))| {
            let prev = i.checked_sub(1).map(|p| stage_counts[p].1);
            FunnelStep {
                stage: *stage,
                movies: *movies,
                pct_of_total: pct(*movies, total),
                conversion: prev.and_then(|p| pct(*movies, p)),
                dropped: prev.map_or(0, |p| p.saturating_sub(*movies)),
            }
        })
        .collect();

    let mut distribution: BTreeMap<FunnelStage, usize> = BTreeMap::new();
    for r in rows {
        *distribution.entry(r.funnel_stage).or_default() += 1;
    }

    let mut genres: BTreeMap<&str, Vec<&MovieRecord>> = BTreeMap::new();
    for r in &valid {
        genres.entry(r.primary_genre.as_str()).or_default().push(r);
    }
    let mut by_genre: Vec<GenreFunnelRow> = genres
        .into_iter()
        .filter(|(_, members)| members.len() >= support.genre_funnel)
        .map(|(genre, members)| {
            let n = members.len();
            let hits =
                |pred: fn(&MovieRecord) -> bool| members.iter().filter(|&&r| pred(r)).count();
            GenreFunnelRow {
                genre: genre.to_string(),
                total: n,
                revenue_rate: pct(hits(|r| r.has_revenue()), n),
                profit_rate: pct(hits(|r| r.is_profitable), n),
                high_roi_rate: pct(hits(|r| roi_above(r, 300.0)), n),
            }
        })
        .collect();
    by_genre.sort_by(|a, b| {
        a.profit_rate
            .partial_cmp(&b.profit_rate)
            .unwrap_or(Ordering::Equal)
    });

    FunnelView {
        stages,
        distribution: distribution
            .into_iter()
            .map(|(stage, movies)| StageCount { stage, movies })
            .collect(),
        by_genre,
    }
}

macro_rules! choice_enum {
    ($name:ident, $dimension:literal { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
        pub enum $name {
            #[default]
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = ReportError;

            fn from_str(s: &str) -> Result<Self> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(s.trim()))
                    .ok_or_else(|| ReportError::InvalidSelection {
                        dimension: $dimension,
                        value: s.to_string(),
                    })
            }
        }
    };
}

choice_enum!(SortColumn, "sort column" {
    Revenue => "Revenue",
    Budget => "Budget",
    Roi => "ROI",
    Year => "Year",
    CombinedRating => "Combined Rating",
    Popularity => "Popularity",
});

choice_enum!(SortOrder, "sort order" {
    Descending => "Descending",
    Ascending => "Ascending",
});

choice_enum!(RowLimit, "row limit" {
    Top25 => "25",
    Top50 => "50",
    Top100 => "100",
    Top250 => "250",
    All => "All",
});

impl SortColumn {
    fn value(&self, r: &MovieRecord) -> Option<f64> {
        match self {
            SortColumn::Revenue => r.revenue,
            SortColumn::Budget => r.budget,
            SortColumn::Roi => r.roi,
            SortColumn::Year => r.year.map(f64::from),
            SortColumn::CombinedRating => r.combined_rating,
            SortColumn::Popularity => r.popularity,
        }
    }
}

impl SortOrder {
    /// `asc`/`desc` are accepted alongside the full names.
    pub fn parse_loose(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            _ => s.parse(),
        }
    }
}

impl RowLimit {
    pub fn rows(&self) -> Option<usize> {
        match self {
            RowLimit::Top25 => Some(25),
            RowLimit::Top50 => Some(50),
            RowLimit::Top100 => Some(100),
            RowLimit::Top250 => Some(250),
            RowLimit::All => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetailQuery {
    pub search: Option<String>,
    pub sort: SortColumn,
    pub order: SortOrder,
    pub limit: RowLimit,
}

impl DetailQuery {
    pub fn parse(
        search: Option<&str>,
        sort: Option<&str>,
        order: Option<&str>,
        limit: Option<&str>,
    ) -> Result<Self> {
        fn present(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|s| !s.is_empty())
        }
        Ok(DetailQuery {
            search: present(search).map(str::to_string),
            sort: present(sort).map(str::parse).transpose()?.unwrap_or_default(),
            order: present(order)
                .map(SortOrder::parse_loose)
                .transpose()?
                .unwrap_or_default(),
            limit: present(limit).map(str::parse).transpose()?.unwrap_or_default(),
        })
    }
}

/// A visible row of the details page, also the layout of the CSV download.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct DetailRow {
    #[serde(rename = "Title")]
    #[tabled(rename = "Title")]
    pub title: String,
    #[serde(rename = "Primary Genre")]
    #[tabled(rename = "Primary Genre")]
    pub primary_genre: String,
    #[serde(rename = "Year")]
    #[tabled(rename = "Year", display_with = "display_opt_year")]
    pub year: Option<i32>,
    #[serde(rename = "Director")]
    #[tabled(rename = "Director")]
    pub director: String,
    #[serde(rename = "Lead Actor")]
    #[tabled(rename = "Lead Actor")]
    pub lead_actor: String,
    #[serde(rename = "Budget")]
    #[tabled(rename = "Budget", display_with = "format_opt_currency")]
    pub budget: Option<f64>,
    #[serde(rename = "Revenue")]
    #[tabled(rename = "Revenue", display_with = "format_opt_currency")]
    pub revenue: Option<f64>,
    #[serde(rename = "Profit")]
    #[tabled(rename = "Profit", display_with = "format_opt_currency")]
    pub profit: Option<f64>,
    #[serde(rename = "ROI")]
    #[tabled(rename = "ROI", display_with = "format_opt_percent")]
    pub roi: Option<f64>,
    #[serde(rename = "Is Profitable")]
    #[tabled(rename = "Is Profitable", display_with = "display_profitable")]
    pub is_profitable: bool,
    #[serde(rename = "Combined Rating")]
    #[tabled(rename = "Combined Rating", display_with = "format_opt_number")]
    pub combined_rating: Option<f64>,
    #[serde(rename = "Content Rating")]
    #[tabled(rename = "Content Rating")]
    pub content_rating: String,
    #[serde(rename = "Budget Category")]
    #[tabled(rename = "Budget Category")]
    pub budget_category: BudgetTier,
}

fn display_opt_year(v: &Option<i32>) -> String {
    v.map(|y| y.to_string()).unwrap_or_else(|| "—".to_string())
}

fn display_profitable(v: &bool) -> String {
    let label = if *v { "Profitable" } else { "Loss" };
    label.to_string()
}

impl From<&MovieRecord> for DetailRow {
    fn from(r: &MovieRecord) -> Self {
        DetailRow {
            title: r.title.clone(),
            primary_genre: r.primary_genre.clone(),
            year: r.year,
            director: r.director.clone(),
            lead_actor: r.lead_actor.clone(),
            budget: r.budget,
            revenue: r.revenue,
            profit: r.profit,
            roi: r.roi,
            is_profitable: r.is_profitable,
            combined_rating: r.combined_rating,
            content_rating: r.content_rating.clone(),
            budget_category: r.budget_category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailsView {
    /// Rows after filtering, before search and limit.
    pub total: usize,
    pub showing: usize,
    pub rows: Vec<DetailRow>,
}

impl DetailsView {
    pub fn summary(&self) -> String {
        format!("Showing {} of {} movies", self.showing, self.total)
    }
}

/// Search, sort and cut the filtered rows. Missing sort values go last in
/// either direction; ties keep their original order.
pub fn details(rows: &[&MovieRecord], query: &DetailQuery) -> DetailsView {
    let needle = query.search.as_deref().map(str::to_lowercase);
    let mut hits: Vec<&MovieRecord> = rows
        .iter()
        .copied()
        .filter(|r| match &needle {
            Some(n) => r.title.to_lowercase().contains(n.as_str()),
            None => true,
        })
        .collect();
    hits.sort_by(|a, b| match (query.sort.value(a), query.sort.value(b)) {
        (Some(x), Some(y)) => match query.order {
            SortOrder::Ascending => x.total_cmp(&y),
            SortOrder::Descending => y.total_cmp(&x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    if let Some(n) = query.limit.rows() {
        hits.truncate(n);
    }
    DetailsView {
        total: rows.len(),
        showing: hits.len(),
        rows: hits.into_iter().map(DetailRow::from).collect(),
    }
}

/// CSV text of the visible detail rows.
pub fn details_csv(view: &DetailsView) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in &view.rows {
        wtr.serialize(row)
            .map_err(|e| ReportError::csv("movies_filtered.csv", e))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| ReportError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::fixtures::{movies, sample};

    fn refs(records: &[MovieRecord]) -> Vec<&MovieRecord> {
        records.iter().collect()
    }

    #[test]
    fn kpis_use_budgeted_movies_for_roi_and_success() {
        let records = sample();
        let k = kpis(&refs(&records));
        assert_eq!(k.movies, 4);
        assert_eq!(k.with_budget, 3);
        assert_eq!(k.profitable, 1);
        assert_eq!(k.total_revenue, 55_000_000.0);
        assert_eq!(k.total_budget, 80_000_000.0);
        assert_eq!(k.median_roi, Some(125.0));
        assert_eq!(k.success_rate, Some(33.3));
    }

    #[test]
    fn kpis_on_empty_selection_are_undefined_not_nan() {
        let k = kpis(&[]);
        assert_eq!(k.movies, 0);
        assert_eq!(k.median_roi, None);
        assert_eq!(k.success_rate, None);
        assert_eq!(k.avg_budget, None);
    }

    #[test]
    fn histogram_counts_every_value_once() {
        let values: Vec<f64> = (0..=100).map(f64::from).collect();
        let h = Histogram::build(&values, 30);
        assert_eq!(h.bins.len(), 30);
        assert_eq!(h.total(), values.len());
        assert_eq!(h.mean, Some(50.0));
        let flat = Histogram::build(&[7.0, 7.0], 30);
        assert_eq!(flat.bins.len(), 1);
        assert_eq!(flat.total(), 2);
        assert!(Histogram::build(&[], 30).bins.is_empty());
    }

    #[test]
    fn overview_ranks_genres_and_skips_early_years() {
        let records = sample();
        let view = overview(&refs(&records));
        assert_eq!(view.top_genres[0].genre, "Action");
        assert_eq!(view.top_genres[0].total_revenue, 40_000_000.0);
        let years: Vec<i32> = view.yearly.iter().map(|y| y.year).collect();
        assert_eq!(years, vec![1995, 2012]);
        assert_eq!(view.revenue_vs_budget.len(), 3);
        assert_eq!(view.rating_histogram.total(), 4);
    }

    #[test]
    fn financial_view_only_uses_complete_financials() {
        let records = sample();
        let view = financial(&refs(&records));
        assert_eq!(view.movies, 2);
        assert_eq!(view.budget.mean, Some(15_000_000.0));
        assert_eq!(view.roi.median, Some(125.0));
        let tiers: Vec<BudgetTier> = view.by_budget_tier.iter().map(|t| t.tier).collect();
        assert_eq!(tiers, vec![BudgetTier::Low, BudgetTier::Medium]);
        assert_eq!(view.roi_by_budget_tier[0].median, Some(300.0));
    }

    #[test]
    fn roi_box_ignores_outliers() {
        let records = movies(&[
            ("A", "D", "X", "1000000", "100000000", "Drama", "2001-01-01", "7"),
            ("B", "D", "X", "1000000", "2000000", "Drama", "2001-01-01", "7"),
        ]);
        let view = financial(&refs(&records));
        let micro = &view.roi_by_budget_tier[0];
        assert_eq!(micro.tier, BudgetTier::Micro);
        assert_eq!(micro.count, 1);
        assert_eq!(micro.max, Some(100.0));
    }

    #[test]
    fn leaderboards_respect_min_support() {
        let records = movies(&[
            ("A", "Nolan", "Bale", "10", "40", "Drama", "2005-01-01", "8"),
            ("B", "Nolan", "Bale", "10", "5", "Drama", "2006-01-01", "7"),
            ("C", "Nolan", "Caine", "10", "30", "Action", "2008-01-01", "8"),
            ("D", "Solo", "Bale", "10", "900", "Action", "2009-01-01", "6"),
        ]);
        let support = MinSupport {
            directors: 3,
            actors: 3,
            genres: 1,
            content_ratings: 1,
            genre_funnel: 1,
            top_n: 15,
        };
        let view = genre_people(&refs(&records), &support);
        assert_eq!(view.top_directors.len(), 1);
        assert_eq!(view.top_directors[0].name, "Nolan");
        assert_eq!(view.top_directors[0].movies, 3);
        assert_eq!(view.top_actors[0].name, "Bale");
        assert_eq!(view.genre_matrix[0].genre, "Action");
        assert_eq!(view.content_ratings[0].content_rating, "NR");
        assert_eq!(view.content_ratings[0].movies, 4);
    }

    #[test]
    fn leaderboards_skip_unknown_people() {
        let records = movies(&[
            ("A", "", "Bale", "10", "900", "Drama", "2005-01-01", "8"),
            ("B", "", "Bale", "10", "900", "Drama", "2006-01-01", "7"),
            ("C", "Nolan", "", "10", "30", "Drama", "2008-01-01", "8"),
        ]);
        let support = MinSupport {
            directors: 1,
            actors: 1,
            ..MinSupport::default()
        };
        let view = genre_people(&refs(&records), &support);
        let directors: Vec<&str> = view.top_directors.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(directors, vec!["Nolan"]);
        let actors: Vec<&str> = view.top_actors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(actors, vec!["Bale"]);
    }

    #[test]
    fn conversion_funnel_is_cumulative() {
        let records = sample();
        let view = funnel(&refs(&records), &MinSupport { genre_funnel: 1, ..MinSupport::default() });
        let counts: Vec<usize> = view.stages.iter().map(|s| s.movies).collect();
        assert_eq!(counts, vec![4, 3, 2, 2, 1, 1, 0, 0]);
        assert_eq!(view.stages[1].conversion, Some(75.0));
        assert_eq!(view.stages[1].dropped, 1);
        assert_eq!(view.stages[0].conversion, None);
        assert_eq!(view.stages[2].pct_of_total, Some(50.0));
        assert_eq!(view.distribution.len(), 4);
        let genres: Vec<&str> = view.by_genre.iter().map(|g| g.genre.as_str()).collect();
        assert_eq!(genres, vec!["Drama", "Action"]);
    }

    #[test]
    fn details_search_sort_and_limit() {
        let records = sample();
        let rows = refs(&records);
        let q = DetailQuery::parse(None, Some("Budget"), Some("asc"), None).unwrap();
        let view = details(&rows, &q);
        let titles: Vec<&str> = view.rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Gamma", "Alpha", "Beta", "Delta"]);

        let q = DetailQuery::parse(Some("ALP"), None, None, None).unwrap();
        let view = details(&rows, &q);
        assert_eq!(view.summary(), "Showing 1 of 4 movies");

        let q = DetailQuery {
            sort: SortColumn::Revenue,
            ..DetailQuery::default()
        };
        let view = details(&rows, &q);
        assert_eq!(view.rows.last().unwrap().title, "Delta");
    }

    #[test]
    fn missing_values_sort_last_in_both_directions() {
        let records = sample();
        let rows = refs(&records);
        for order in ["Ascending", "Descending"] {
            let q = DetailQuery::parse(None, Some("Year"), Some(order), None).unwrap();
            assert_eq!(details(&rows, &q).rows.last().unwrap().title, "Delta");
        }
    }

    #[test]
    fn detail_query_rejects_unknown_choices() {
        assert!(DetailQuery::parse(None, Some("Title"), None, None).is_err());
        assert!(DetailQuery::parse(None, None, Some("sideways"), None).is_err());
        assert!(DetailQuery::parse(None, None, None, Some("10")).is_err());
        let q = DetailQuery::parse(None, Some("combined rating"), None, Some("all")).unwrap();
        assert_eq!(q.sort, SortColumn::CombinedRating);
        assert_eq!(q.limit.rows(), None);
    }

    #[test]
    fn download_has_the_visible_columns() {
        let records = sample();
        let view = details(&refs(&records), &DetailQuery::default());
        let csv = details_csv(&view).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Title,Primary Genre,Year,Director,Lead Actor,Budget,Revenue,Profit,ROI,\
             Is Profitable,Combined Rating,Content Rating,Budget Category"
        );
        assert_eq!(lines.count(), 4);
    }
}
