//! Financial figures derived from a movie's budget and revenue.
use crate::util::{round_to, safe_div};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Financials {
    pub profit: Option<f64>,
    /// Percent, rounded to two decimals.
    pub roi: Option<f64>,
    /// Percent of revenue, rounded to two decimals.
    pub profit_margin: Option<f64>,
    pub revenue_to_budget_ratio: Option<f64>,
    pub is_profitable: bool,
}

/// Box-office revenue, falling back to the IMDB gross when the TMDB figure
/// is missing or non-positive.
pub fn resolve_revenue(revenue: Option<f64>, gross: Option<f64>) -> Option<f64> {
    match revenue {
        Some(r) if r > 0.0 => Some(r),
        _ => gross.filter(|g| *g > 0.0),
    }
}

pub fn derive_financials(budget: Option<f64>, revenue: Option<f64>) -> Financials {
    let (Some(budget), Some(revenue)) = (budget, revenue) else {
        return Financials::default();
    };
    let profit = revenue - budget;
    let roi = if budget > 0.0 {
        safe_div(profit, budget).map(|r| round_to(r * 100.0, 2))
    } else {
        None
    };
    let profit_margin = if revenue > 0.0 {
        safe_div(profit, revenue).map(|m| round_to(m * 100.0, 2))
    } else {
        None
    };
    let revenue_to_budget_ratio = if budget > 0.0 {
        safe_div(revenue, budget).map(|r| round_to(r, 2))
    } else {
        None
    };
    Financials {
        profit: Some(profit),
        roi,
        profit_margin,
        revenue_to_budget_ratio,
        is_profitable: profit > 0.0 && budget > 0.0 && revenue > 0.0,
    }
}

/// Mean of whichever of the two rating sources is present.
pub fn combined_rating(tmdb: Option<f64>, imdb: Option<f64>) -> Option<f64> {
    match (tmdb, imdb) {
        (Some(a), Some(b)) => Some(round_to((a + b) / 2.0, 2)),
        (Some(a), None) | (None, Some(a)) => Some(round_to(a, 2)),
        (None, None) => None,
    }
}
