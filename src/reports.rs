use crate::categories::{Bucket, FunnelStage};
use crate::types::{
    ActorPerformanceRow, DirectorPerformanceRow, FunnelStageRow, GenrePerformanceRow, GenreRow,
    MovieRecord, YearlyTrendRow, UNKNOWN,
};
use crate::util::{average, median, rate, round_to};
use std::collections::BTreeMap;

/// Running totals for one group of movies. Values are pushed in source
/// order so sums come out the same on every run.
#[derive(Debug, Default, Clone)]
pub struct GroupStats {
    pub count: usize,
    pub budgets: Vec<f64>,
    pub revenues: Vec<f64>,
    pub profits: Vec<f64>,
    pub rois: Vec<f64>,
    pub ratings: Vec<f64>,
    pub socials: Vec<f64>,
    pub profitable: Vec<bool>,
}

impl GroupStats {
    pub fn push(&mut self, r: &MovieRecord) {
        self.count += 1;
        self.budgets.extend(r.budget);
        self.revenues.extend(r.revenue);
        self.profits.extend(r.profit);
        self.rois.extend(r.roi);
        self.ratings.extend(r.combined_rating);
        self.socials.push(r.total_social_engagement as f64);
        self.profitable.push(r.is_profitable);
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a MovieRecord>) -> Self {
        let mut stats = GroupStats::default();
        for r in records {
            stats.push(r);
        }
        stats
    }

    pub fn total_budget(&self) -> f64 {
        self.budgets.iter().sum()
    }

    pub fn total_revenue(&self) -> f64 {
        self.revenues.iter().sum()
    }

    pub fn total_profit(&self) -> f64 {
        self.profits.iter().sum()
    }

    pub fn avg_budget(&self) -> Option<f64> {
        mean2(&self.budgets)
    }

    pub fn avg_revenue(&self) -> Option<f64> {
        mean2(&self.revenues)
    }

    pub fn avg_profit(&self) -> Option<f64> {
        mean2(&self.profits)
    }

    pub fn avg_roi(&self) -> Option<f64> {
        mean2(&self.rois)
    }

    pub fn median_roi(&self) -> Option<f64> {
        median(self.rois.clone()).map(|m| round_to(m, 2))
    }

    pub fn avg_rating(&self) -> Option<f64> {
        mean2(&self.ratings)
    }

    pub fn avg_social(&self) -> Option<f64> {
        mean2(&self.socials)
    }

    /// Share of profitable movies as a percentage with one decimal.
    pub fn success_pct(&self) -> Option<f64> {
        rate(&self.profitable).map(|r| round_to(r * 100.0, 1))
    }
}

fn mean2(v: &[f64]) -> Option<f64> {
    average(v).map(|m| round_to(m, 2))
}

/// One row per (movie, genre) pair, movies in source order and genres in
/// list order. Movies without genres contribute no rows.
pub fn explode_genres(records: &[MovieRecord]) -> Vec<GenreRow> {
    records
        .iter()
        .flat_map(|r| {
            r.genres().into_iter().map(move |g| GenreRow {
                id: r.id.clone(),
                title: r.title.clone(),
                year: r.year,
                budget: r.budget,
                revenue: r.revenue,
                profit: r.profit,
                roi: r.roi,
                combined_rating: r.combined_rating,
                director: r.director.clone(),
                lead_actor: r.lead_actor.clone(),
                funnel_stage: r.funnel_stage,
                genre: g.to_string(),
            })
        })
        .collect()
}

/// Group by a person column, leaving out movies where the person is
/// unknown. Likes are taken from the first movie seen for that person.
fn group_people<K, L>(records: &[MovieRecord], key: K, likes: L) -> Vec<(String, GroupStats, i64)>
where
    K: Fn(&MovieRecord) -> &str,
    L: Fn(&MovieRecord) -> i64,
{
    let mut map: BTreeMap<&str, (GroupStats, i64)> = BTreeMap::new();
    for r in records.iter().filter(|&r| key(r) != UNKNOWN) {
        map.entry(key(r))
            .or_insert_with(|| (GroupStats::default(), likes(r)))
            .0
            .push(r);
    }
    let mut rows: Vec<(String, GroupStats, i64)> = map
        .into_iter()
        .map(|(name, (stats, fb))| (name.to_string(), stats, fb))
        .collect();
    // Stable sort keeps name order among equal revenues.
    rows.sort_by(|a, b| b.1.total_revenue().total_cmp(&a.1.total_revenue()));
    rows
}

pub fn director_performance(records: &[MovieRecord]) -> Vec<DirectorPerformanceRow> {
    group_people(records, |r| r.director.as_str(), |r| r.director_fb_likes)
        .into_iter()
        .map(|(director, s, fb_likes)| DirectorPerformanceRow {
            director,
            movie_count: s.count,
            total_budget: s.total_budget(),
            total_revenue: s.total_revenue(),
            total_profit: s.total_profit(),
            avg_roi: s.avg_roi(),
            avg_rating: s.avg_rating(),
            success_rate: s.success_pct(),
            fb_likes,
        })
        .collect()
}

pub fn actor_performance(records: &[MovieRecord]) -> Vec<ActorPerformanceRow> {
    group_people(records, |r| r.lead_actor.as_str(), |r| r.lead_actor_fb_likes)
        .into_iter()
        .map(|(lead_actor, s, fb_likes)| ActorPerformanceRow {
            lead_actor,
            movie_count: s.count,
            total_budget: s.total_budget(),
            total_revenue: s.total_revenue(),
            total_profit: s.total_profit(),
            avg_roi: s.avg_roi(),
            avg_rating: s.avg_rating(),
            success_rate: s.success_pct(),
            fb_likes,
        })
        .collect()
}

/// Movies without a year are left out.
pub fn yearly_trends(records: &[MovieRecord]) -> Vec<YearlyTrendRow> {
    let mut map: BTreeMap<i32, GroupStats> = BTreeMap::new();
    for r in records {
        if let Some(year) = r.year {
            map.entry(year).or_default().push(r);
        }
    }
    map.into_iter()
        .map(|(year, s)| YearlyTrendRow {
            year,
            movie_count: s.count,
            avg_budget: s.avg_budget(),
            avg_revenue: s.avg_revenue(),
            avg_profit: s.avg_profit(),
            avg_roi: s.avg_roi(),
            avg_rating: s.avg_rating(),
            success_rate: s.success_pct(),
            avg_social: s.avg_social(),
        })
        .collect()
}

/// Stages that no movie reached are omitted.
pub fn funnel_analysis(records: &[MovieRecord]) -> Vec<FunnelStageRow> {
    let mut map: BTreeMap<FunnelStage, GroupStats> = BTreeMap::new();
    for r in records {
        map.entry(r.funnel_stage).or_default().push(r);
    }
    map.into_iter()
        .map(|(stage, s)| FunnelStageRow {
            funnel_stage: stage,
            movie_count: s.count,
            total_budget: s.total_budget(),
            total_revenue: s.total_revenue(),
            total_profit: s.total_profit(),
            avg_roi: s.avg_roi(),
            avg_rating: s.avg_rating(),
            stage_order: stage.rank(),
        })
        .collect()
}

/// Every genre a movie belongs to counts, not only the primary one.
pub fn genre_performance(records: &[MovieRecord]) -> Vec<GenrePerformanceRow> {
    let mut map: BTreeMap<&str, GroupStats> = BTreeMap::new();
    for r in records {
        for g in r.genres() {
            map.entry(g).or_default().push(r);
        }
    }
    let mut rows: Vec<GenrePerformanceRow> = map
        .into_iter()
        .map(|(genre, s)| GenrePerformanceRow {
            genre: genre.to_string(),
            movie_count: s.count,
            total_revenue: s.total_revenue(),
            avg_budget: s.avg_budget(),
            avg_roi: s.avg_roi(),
            median_roi: s.median_roi(),
            avg_rating: s.avg_rating(),
            success_rate: s.success_pct(),
        })
        .collect();
    rows.sort_by(|a, b| b.total_revenue.total_cmp(&a.total_revenue));
    rows
}
