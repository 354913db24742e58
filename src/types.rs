use crate::categories::{
    BudgetTier, Era, FunnelStage, RatingTier, RoiTier, RuntimeTier, Season, SocialTier,
};
use crate::util::{format_int, format_opt_currency, format_opt_number, format_opt_percent};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Placeholder for missing text fields such as director or genre.
pub const UNKNOWN: &str = "Unknown";

/// One line of the merged TMDB/IMDB export, untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawRow {
    pub id: Option<String>,
    pub movie_title: Option<String>,
    pub budget: Option<String>,
    pub revenue: Option<String>,
    pub gross: Option<String>,
    pub release_date: Option<String>,
    pub title_year: Option<String>,
    pub vote_average: Option<String>,
    pub imdb_score: Option<String>,
    pub vote_count: Option<String>,
    pub popularity: Option<String>,
    pub runtime: Option<String>,
    pub duration: Option<String>,
    pub aspect_ratio: Option<String>,
    pub genres: Option<String>,
    pub content_rating: Option<String>,
    pub original_language: Option<String>,
    pub director_name: Option<String>,
    pub actor_1_name: Option<String>,
    pub actor_2_name: Option<String>,
    pub actor_3_name: Option<String>,
    pub movie_facebook_likes: Option<String>,
    pub director_facebook_likes: Option<String>,
    pub cast_total_facebook_likes: Option<String>,
    pub actor_1_facebook_likes: Option<String>,
    pub num_critic_for_reviews: Option<String>,
    pub num_user_for_reviews: Option<String>,
}

/// A cleaned, enriched movie. This is also the row layout of
/// `movies_main.csv`, which the dashboard reads back; numeric cells that no
/// longer parse on the way back in are treated as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    #[serde(rename = "id")]
    pub id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year", deserialize_with = "csv::invalid_option")]
    pub year: Option<i32>,
    #[serde(rename = "Month", deserialize_with = "csv::invalid_option")]
    pub month: Option<u32>,
    #[serde(rename = "Quarter", deserialize_with = "csv::invalid_option")]
    pub quarter: Option<u32>,
    #[serde(rename = "Month Name")]
    pub month_name: Option<String>,
    #[serde(rename = "Day Of Week")]
    pub day_of_week: Option<String>,
    #[serde(rename = "Season")]
    pub season: Season,
    #[serde(rename = "Era")]
    pub era: Era,

    #[serde(rename = "Budget", deserialize_with = "csv::invalid_option")]
    pub budget: Option<f64>,
    #[serde(rename = "Revenue", deserialize_with = "csv::invalid_option")]
    pub revenue: Option<f64>,
    #[serde(rename = "Profit", deserialize_with = "csv::invalid_option")]
    pub profit: Option<f64>,
    #[serde(rename = "ROI", deserialize_with = "csv::invalid_option")]
    pub roi: Option<f64>,
    #[serde(rename = "Profit Margin", deserialize_with = "csv::invalid_option")]
    pub profit_margin: Option<f64>,
    #[serde(
        rename = "Revenue To Budget Ratio",
        deserialize_with = "csv::invalid_option"
    )]
    pub revenue_to_budget_ratio: Option<f64>,
    #[serde(rename = "Is Profitable")]
    pub is_profitable: bool,
    #[serde(rename = "Budget Category")]
    pub budget_category: BudgetTier,
    #[serde(rename = "ROI Category")]
    pub roi_category: RoiTier,
    #[serde(rename = "Funnel Stage")]
    pub funnel_stage: FunnelStage,
    #[serde(rename = "Funnel Order")]
    pub funnel_order: u8,

    #[serde(rename = "TMDB Rating", deserialize_with = "csv::invalid_option")]
    pub tmdb_rating: Option<f64>,
    #[serde(rename = "IMDB Rating", deserialize_with = "csv::invalid_option")]
    pub imdb_rating: Option<f64>,
    #[serde(rename = "Combined Rating", deserialize_with = "csv::invalid_option")]
    pub combined_rating: Option<f64>,
    #[serde(rename = "Rating Category")]
    pub rating_category: RatingTier,
    #[serde(rename = "Vote Count", deserialize_with = "csv::invalid_option")]
    pub vote_count: Option<i64>,
    #[serde(rename = "Popularity", deserialize_with = "csv::invalid_option")]
    pub popularity: Option<f64>,

    #[serde(rename = "Primary Genre")]
    pub primary_genre: String,
    #[serde(rename = "All Genres")]
    pub all_genres: String,
    #[serde(rename = "Genre Count")]
    pub genre_count: usize,
    #[serde(rename = "Content Rating")]
    pub content_rating: String,
    #[serde(rename = "Runtime Minutes", deserialize_with = "csv::invalid_option")]
    pub runtime_minutes: Option<f64>,
    #[serde(rename = "Runtime Category")]
    pub runtime_category: RuntimeTier,
    #[serde(rename = "Duration", deserialize_with = "csv::invalid_option")]
    pub duration: Option<f64>,
    #[serde(rename = "Aspect Ratio", deserialize_with = "csv::invalid_option")]
    pub aspect_ratio: Option<f64>,
    #[serde(rename = "Language")]
    pub language: String,

    #[serde(rename = "Director")]
    pub director: String,
    #[serde(rename = "Lead Actor")]
    pub lead_actor: String,
    #[serde(rename = "Actor 2")]
    pub actor_2: String,
    #[serde(rename = "Actor 3")]
    pub actor_3: String,

    #[serde(rename = "Movie FB Likes")]
    pub movie_fb_likes: i64,
    #[serde(rename = "Director FB Likes")]
    pub director_fb_likes: i64,
    #[serde(rename = "Cast FB Likes")]
    pub cast_fb_likes: i64,
    #[serde(rename = "Lead Actor FB Likes")]
    pub lead_actor_fb_likes: i64,
    #[serde(rename = "Total Social Engagement")]
    pub total_social_engagement: i64,
    #[serde(rename = "Social Category")]
    pub social_category: SocialTier,

    #[serde(rename = "Critic Reviews", deserialize_with = "csv::invalid_option")]
    pub critic_reviews: Option<i64>,
    #[serde(rename = "User Reviews", deserialize_with = "csv::invalid_option")]
    pub user_reviews: Option<i64>,

    /// Parsed genre names. Not a column; `All Genres` is its display form.
    #[serde(skip)]
    pub genre_list: Vec<String>,
}

impl MovieRecord {
    /// Genres in their original order; empty when the movie had none.
    pub fn genres(&self) -> Vec<&str> {
        self.genre_list.iter().map(String::as_str).collect()
    }

    /// Rebuild the genre list of a record read back from `movies_main.csv`.
    pub fn restore_genres(&mut self) {
        self.genre_list = if self.genre_count == 0 {
            Vec::new()
        } else {
            self.all_genres.split(", ").map(str::to_string).collect()
        };
    }

    pub fn has_budget(&self) -> bool {
        self.budget.is_some_and(|b| b > 0.0)
    }

    pub fn has_revenue(&self) -> bool {
        self.revenue.is_some_and(|r| r > 0.0)
    }
}

/// One (movie, genre) pair of `movies_by_genre.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreRow {
    #[serde(rename = "id")]
    pub id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year", deserialize_with = "csv::invalid_option")]
    pub year: Option<i32>,
    #[serde(rename = "Budget", deserialize_with = "csv::invalid_option")]
    pub budget: Option<f64>,
    #[serde(rename = "Revenue", deserialize_with = "csv::invalid_option")]
    pub revenue: Option<f64>,
    #[serde(rename = "Profit", deserialize_with = "csv::invalid_option")]
    pub profit: Option<f64>,
    #[serde(rename = "ROI", deserialize_with = "csv::invalid_option")]
    pub roi: Option<f64>,
    #[serde(rename = "Combined Rating", deserialize_with = "csv::invalid_option")]
    pub combined_rating: Option<f64>,
    #[serde(rename = "Director")]
    pub director: String,
    #[serde(rename = "Lead Actor")]
    pub lead_actor: String,
    #[serde(rename = "Funnel Stage")]
    pub funnel_stage: FunnelStage,
    #[serde(rename = "Genre")]
    pub genre: String,
}

fn display_rate_pct(v: &Option<f64>) -> String {
    v.map(|p| format!("{:.1}%", p))
        .unwrap_or_else(|| "—".to_string())
}

fn display_currency(v: &f64) -> String {
    format_opt_currency(&Some(*v))
}

fn display_count(v: &usize) -> String {
    format_int(*v)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct DirectorPerformanceRow {
    #[serde(rename = "Director")]
    #[tabled(rename = "Director")]
    pub director: String,
    #[serde(rename = "Movie Count")]
    #[tabled(rename = "Movie Count", display_with = "display_count")]
    pub movie_count: usize,
    #[serde(rename = "Total Budget")]
    #[tabled(rename = "Total Budget", display_with = "display_currency")]
    pub total_budget: f64,
    #[serde(rename = "Total Revenue")]
    #[tabled(rename = "Total Revenue", display_with = "display_currency")]
    pub total_revenue: f64,
    #[serde(rename = "Total Profit")]
    #[tabled(rename = "Total Profit", display_with = "display_currency")]
    pub total_profit: f64,
    #[serde(rename = "Avg ROI")]
    #[tabled(rename = "Avg ROI", display_with = "format_opt_percent")]
    pub avg_roi: Option<f64>,
    #[serde(rename = "Avg Rating")]
    #[tabled(rename = "Avg Rating", display_with = "format_opt_number")]
    pub avg_rating: Option<f64>,
    #[serde(rename = "Success Rate")]
    #[tabled(rename = "Success Rate", display_with = "display_rate_pct")]
    pub success_rate: Option<f64>,
    #[serde(rename = "FB Likes")]
    #[tabled(rename = "FB Likes")]
    pub fb_likes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct ActorPerformanceRow {
    #[serde(rename = "Lead Actor")]
    #[tabled(rename = "Lead Actor")]
    pub lead_actor: String,
    #[serde(rename = "Movie Count")]
    #[tabled(rename = "Movie Count", display_with = "display_count")]
    pub movie_count: usize,
    #[serde(rename = "Total Budget")]
    #[tabled(rename = "Total Budget", display_with = "display_currency")]
    pub total_budget: f64,
    #[serde(rename = "Total Revenue")]
    #[tabled(rename = "Total Revenue", display_with = "display_currency")]
    pub total_revenue: f64,
    #[serde(rename = "Total Profit")]
    #[tabled(rename = "Total Profit", display_with = "display_currency")]
    pub total_profit: f64,
    #[serde(rename = "Avg ROI")]
    #[tabled(rename = "Avg ROI", display_with = "format_opt_percent")]
    pub avg_roi: Option<f64>,
    #[serde(rename = "Avg Rating")]
    #[tabled(rename = "Avg Rating", display_with = "format_opt_number")]
    pub avg_rating: Option<f64>,
    #[serde(rename = "Success Rate")]
    #[tabled(rename = "Success Rate", display_with = "display_rate_pct")]
    pub success_rate: Option<f64>,
    #[serde(rename = "FB Likes")]
    #[tabled(rename = "FB Likes")]
    pub fb_likes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct YearlyTrendRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Movie Count")]
    #[tabled(rename = "Movie Count")]
    pub movie_count: usize,
    #[serde(rename = "Avg Budget")]
    #[tabled(rename = "Avg Budget", display_with = "format_opt_currency")]
    pub avg_budget: Option<f64>,
    #[serde(rename = "Avg Revenue")]
    #[tabled(rename = "Avg Revenue", display_with = "format_opt_currency")]
    pub avg_revenue: Option<f64>,
    #[serde(rename = "Avg Profit")]
    #[tabled(rename = "Avg Profit", display_with = "format_opt_currency")]
    pub avg_profit: Option<f64>,
    #[serde(rename = "Avg ROI")]
    #[tabled(rename = "Avg ROI", display_with = "format_opt_percent")]
    pub avg_roi: Option<f64>,
    #[serde(rename = "Avg Rating")]
    #[tabled(rename = "Avg Rating", display_with = "format_opt_number")]
    pub avg_rating: Option<f64>,
    #[serde(rename = "Success Rate")]
    #[tabled(rename = "Success Rate", display_with = "display_rate_pct")]
    pub success_rate: Option<f64>,
    #[serde(rename = "Avg Social")]
    #[tabled(rename = "Avg Social", display_with = "format_opt_number")]
    pub avg_social: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct FunnelStageRow {
    #[serde(rename = "Funnel Stage")]
    #[tabled(rename = "Funnel Stage")]
    pub funnel_stage: FunnelStage,
    #[serde(rename = "Movie Count")]
    #[tabled(rename = "Movie Count")]
    pub movie_count: usize,
    #[serde(rename = "Total Budget")]
    #[tabled(rename = "Total Budget", display_with = "display_currency")]
    pub total_budget: f64,
    #[serde(rename = "Total Revenue")]
    #[tabled(rename = "Total Revenue", display_with = "display_currency")]
    pub total_revenue: f64,
    #[serde(rename = "Total Profit")]
    #[tabled(rename = "Total Profit", display_with = "display_currency")]
    pub total_profit: f64,
    #[serde(rename = "Avg ROI")]
    #[tabled(rename = "Avg ROI", display_with = "format_opt_percent")]
    pub avg_roi: Option<f64>,
    #[serde(rename = "Avg Rating")]
    #[tabled(rename = "Avg Rating", display_with = "format_opt_number")]
    pub avg_rating: Option<f64>,
    #[serde(rename = "Stage Order")]
    #[tabled(rename = "Stage Order")]
    pub stage_order: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct GenrePerformanceRow {
    #[serde(rename = "Genre")]
    #[tabled(rename = "Genre")]
    pub genre: String,
    #[serde(rename = "Movie Count")]
    #[tabled(rename = "Movie Count")]
    pub movie_count: usize,
    #[serde(rename = "Total Revenue")]
    #[tabled(rename = "Total Revenue", display_with = "display_currency")]
    pub total_revenue: f64,
    #[serde(rename = "Avg Budget")]
    #[tabled(rename = "Avg Budget", display_with = "format_opt_currency")]
    pub avg_budget: Option<f64>,
    #[serde(rename = "Avg ROI")]
    #[tabled(rename = "Avg ROI", display_with = "format_opt_percent")]
    pub avg_roi: Option<f64>,
    #[serde(rename = "Median ROI")]
    #[tabled(rename = "Median ROI", display_with = "format_opt_percent")]
    pub median_roi: Option<f64>,
    #[serde(rename = "Avg Rating")]
    #[tabled(rename = "Avg Rating", display_with = "format_opt_number")]
    pub avg_rating: Option<f64>,
    #[serde(rename = "Success Rate")]
    #[tabled(rename = "Success Rate", display_with = "display_rate_pct")]
    pub success_rate: Option<f64>,
}
