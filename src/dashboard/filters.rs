use crate::categories::{Bucket, BudgetTier, Era};
use crate::error::{ReportError, Result};
use crate::types::MovieRecord;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

pub const ALL: &str = "All";

/// Either no restriction or one exact value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Selection<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(v) => v == value,
        }
    }

    /// `None`, empty and `"All"` all mean no restriction.
    pub fn parse_with<F>(raw: Option<&str>, parse: F) -> Result<Self>
    where
        F: FnOnce(&str) -> Result<T>,
    {
        match raw.map(str::trim) {
            None | Some("") | Some(ALL) => Ok(Selection::All),
            Some(s) => parse(s).map(Selection::Only),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str(ALL),
            Selection::Only(v) => v.fmt(f),
        }
    }
}

impl<T: fmt::Display> Serialize for Selection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The three global filters. They combine with logical AND.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Filters {
    pub era: Selection<Era>,
    pub genre: Selection<String>,
    pub budget: Selection<BudgetTier>,
}

impl Filters {
    pub fn matches(&self, r: &MovieRecord) -> bool {
        self.era.matches(&r.era)
            && self.genre.matches(&r.primary_genre)
            && self.budget.matches(&r.budget_category)
    }

    pub fn apply<'a, I>(&self, rows: I) -> Vec<&'a MovieRecord>
    where
        I: IntoIterator<Item = &'a MovieRecord>,
    {
        rows.into_iter().filter(|r| self.matches(r)).collect()
    }

    pub fn describe(&self) -> String {
        let part = |s: String, all: &str| if s == ALL { all.to_string() } else { s };
        format!(
            "{} | {} | {}",
            part(self.era.to_string(), "All Eras"),
            part(self.genre.to_string(), "All Genres"),
            part(self.budget.to_string(), "All Budgets"),
        )
    }
}

/// Values offered for each filter: "All" followed by the distinct values
/// present in the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub eras: Vec<String>,
    pub genres: Vec<String>,
    pub budgets: Vec<String>,
}

impl FilterOptions {
    pub fn from_records(records: &[MovieRecord]) -> Self {
        let eras: BTreeSet<Era> = records.iter().map(|r| r.era).collect();
        let genres: BTreeSet<&str> = records.iter().map(|r| r.primary_genre.as_str()).collect();
        let budgets: BTreeSet<BudgetTier> = records.iter().map(|r| r.budget_category).collect();
        let with_all = |values: Vec<String>| {
            std::iter::once(ALL.to_string())
                .chain(values)
                .collect::<Vec<_>>()
        };
        FilterOptions {
            eras: with_all(eras.iter().map(|e| e.label().to_string()).collect()),
            genres: with_all(genres.iter().map(|g| g.to_string()).collect()),
            budgets: with_all(budgets.iter().map(|b| b.label().to_string()).collect()),
        }
    }

    /// Parse raw selections. Era and budget accept any known label; the
    /// genre must be one present in the data.
    pub fn select(
        &self,
        era: Option<&str>,
        genre: Option<&str>,
        budget: Option<&str>,
    ) -> Result<Filters> {
        Ok(Filters {
            era: Selection::parse_with(era, |s| s.parse())?,
            genre: Selection::parse_with(genre, |s| {
                if self.genres.iter().any(|g| g == s) {
                    Ok(s.to_string())
                } else {
                    Err(ReportError::InvalidSelection {
                        dimension: "genre",
                        value: s.to_string(),
                    })
                }
            })?,
            budget: Selection::parse_with(budget, |s| s.parse())?,
        })
    }
}
