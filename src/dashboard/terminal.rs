// Interactive terminal front end for the dashboard.
//
// A numbered page menu plus a filter menu. Input and output are generic so
// the whole session can be driven from a script in tests; end of input
// always leaves the menu.
use super::filters::{Filters, Selection};
use super::views::{self, DetailQuery, Histogram, RowLimit, SortColumn, SortOrder};
use super::Dataset;
use crate::error::Result;
use crate::output::render_table;
use crate::util::{format_currency, format_int, format_opt_currency, format_opt_percent};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;

const PREVIEW_ROWS: usize = 15;
const BAR_WIDTH: usize = 40;

#[derive(Debug, Clone, Default)]
struct Session {
    filters: Filters,
    query: DetailQuery,
}

pub struct Terminal<'a, R, W> {
    dataset: &'a Dataset,
    input: R,
    out: W,
    download_path: PathBuf,
    session: Session,
}

impl<'a, R: BufRead, W: Write> Terminal<'a, R, W> {
    pub fn new(dataset: &'a Dataset, input: R, out: W, download_path: &Path) -> Self {
        Terminal {
            dataset,
            input,
            out,
            download_path: download_path.to_path_buf(),
            session: Session::default(),
        }
    }

    /// `None` once input is exhausted.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.out, "{}", prompt)?;
        self.out.flush()?;
        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(buf.trim().to_string()))
    }

    fn read_choice(&mut self) -> Result<Option<String>> {
        self.read_line("Enter choice: ")
    }

    /// Pick one of `options` by number. Blank input or an out-of-range
    /// number keeps `None`.
    fn pick(&mut self, title: &str, options: &[String]) -> Result<Option<usize>> {
        writeln!(self.out, "\n{}", title)?;
        for (i, opt) in options.iter().enumerate() {
            writeln!(self.out, "  [{}] {}", i + 1, opt)?;
        }
        let Some(raw) = self.read_line("Enter choice (blank keeps current): ")? else {
            return Ok(None);
        };
        match raw.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => Ok(Some(n - 1)),
            _ if raw.is_empty() => Ok(None),
            _ => {
                writeln!(self.out, "Invalid choice, keeping current value.")?;
                Ok(None)
            }
        }
    }

    pub fn run(mut self) -> Result<()> {
        loop {
            let dataset = self.dataset;
            let rows = dataset.filter(&self.session.filters);
            writeln!(self.out, "\n=== Movie Analytics Dashboard ===")?;
            writeln!(
                self.out,
                "Filters: {} ({} of {} movies)",
                self.session.filters.describe(),
                format_int(rows.len()),
                format_int(dataset.movies.len())
            )?;
            writeln!(self.out, "[1] Overview")?;
            writeln!(self.out, "[2] Financial Performance")?;
            writeln!(self.out, "[3] Genre & People")?;
            writeln!(self.out, "[4] Funnel Analysis")?;
            writeln!(self.out, "[5] Movie Details")?;
            writeln!(self.out, "[6] Change Filters")?;
            writeln!(self.out, "[7] Exit")?;
            let Some(choice) = self.read_choice()? else {
                return Ok(());
            };
            match choice.as_str() {
                "1" => self.show_overview(&rows)?,
                "2" => self.show_financial(&rows)?,
                "3" => self.show_genre_people(&rows)?,
                "4" => self.show_funnel(&rows)?,
                "5" => {
                    if !self.show_details(&rows)? {
                        return Ok(());
                    }
                }
                "6" => self.change_filters()?,
                "7" => return Ok(()),
                _ => writeln!(self.out, "Invalid choice. Please enter 1-7.")?,
            }
        }
    }

    fn table<T: tabled::Tabled + Clone>(&mut self, title: &str, rows: &[T]) -> Result<()> {
        writeln!(self.out, "\n{}", title)?;
        writeln!(self.out, "{}", render_table(rows, PREVIEW_ROWS))?;
        Ok(())
    }

    fn histogram(&mut self, title: &str, h: &Histogram, label: fn(f64) -> String) -> Result<()> {
        writeln!(self.out, "\n{}", title)?;
        let peak = h.bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
        for bin in &h.bins {
            let bar = "#".repeat(bin.count * BAR_WIDTH / peak);
            writeln!(
                self.out,
                "{:>10} - {:<10} | {:<width$} {}",
                label(bin.start),
                label(bin.end),
                bar,
                bin.count,
                width = BAR_WIDTH
            )?;
        }
        if let Some(mean) = h.mean {
            writeln!(self.out, "Mean: {}", label(mean))?;
        }
        Ok(())
    }

    fn show_overview(&mut self, rows: &[&crate::types::MovieRecord]) -> Result<()> {
        let v = views::overview(rows);
        let k = &v.kpis;
        writeln!(self.out, "\n--- Overview ---")?;
        writeln!(
            self.out,
            "Total Revenue: {} ({} movies)",
            format_currency(k.total_revenue),
            format_int(k.movies)
        )?;
        writeln!(
            self.out,
            "Total Budget:  {} (avg {})",
            format_currency(k.total_budget),
            format_opt_currency(&k.avg_budget)
        )?;
        writeln!(
            self.out,
            "Median ROI:    {} ({} profitable)",
            format_opt_percent(&k.median_roi),
            format_int(k.profitable)
        )?;
        writeln!(
            self.out,
            "Success Rate:  {} ({} lost money)",
            k.success_rate
                .map(|s| format!("{:.1}%", s))
                .unwrap_or_else(|| "—".to_string()),
            format_int(k.with_budget - k.profitable)
        )?;
        writeln!(
            self.out,
            "Revenue vs budget: {} movies with a budget plotted",
            v.revenue_vs_budget.len()
        )?;
        self.table("Top Genres by Revenue", &v.top_genres)?;
        let recent: Vec<_> = v.yearly.iter().rev().take(PREVIEW_ROWS).cloned().collect();
        self.table("Recent Years", &recent)?;
        self.histogram("Rating Distribution", &v.rating_histogram, |x| {
            format!("{:.1}", x)
        })
    }

    fn show_financial(&mut self, rows: &[&crate::types::MovieRecord]) -> Result<()> {
        let v = views::financial(rows);
        writeln!(self.out, "\n--- Financial Performance ---")?;
        writeln!(self.out, "{} movies with budget and revenue", format_int(v.movies))?;
        let spreads = [
            ("Budget", v.budget),
            ("Revenue", v.revenue),
            ("Profit", v.profit),
        ];
        for (name, spread) in spreads {
            writeln!(
                self.out,
                "Avg {:<8} {} (median {})",
                name,
                format_opt_currency(&spread.mean),
                format_opt_currency(&spread.median)
            )?;
        }
        writeln!(
            self.out,
            "Median ROI   {} (mean {})",
            format_opt_percent(&v.roi.median),
            format_opt_percent(&v.roi.mean)
        )?;
        self.table("Budget Category Performance", &v.by_budget_tier)?;
        self.table("ROI Distribution by Budget Category", &v.roi_by_budget_tier)?;
        self.histogram("Budget Distribution", &v.budget_histogram, format_currency)?;
        self.histogram("Revenue Distribution", &v.revenue_histogram, format_currency)
    }

    fn show_genre_people(&mut self, rows: &[&crate::types::MovieRecord]) -> Result<()> {
        let v = views::genre_people(rows, &self.dataset.min_support);
        writeln!(self.out, "\n--- Genre & People ---")?;
        self.table("Genre Performance Matrix", &v.genre_matrix)?;
        self.table("Top Directors by Revenue", &v.top_directors)?;
        self.table("Top Lead Actors by Revenue", &v.top_actors)?;
        self.table("Content Rating Performance", &v.content_ratings)
    }

    fn show_funnel(&mut self, rows: &[&crate::types::MovieRecord]) -> Result<()> {
        let v = views::funnel(rows, &self.dataset.min_support);
        writeln!(self.out, "\n--- Investment-to-Profitability Funnel ---")?;
        self.table("Funnel", &v.stages)?;
        self.table("Funnel Stage Distribution", &v.distribution)?;
        self.table("Funnel Conversion by Genre", &v.by_genre)
    }

    /// Returns `false` when input ran out.
    fn show_details(&mut self, rows: &[&crate::types::MovieRecord]) -> Result<bool> {
        writeln!(self.out, "\n--- Movie Details ---")?;
        let Some(search) = self.read_line("Search by title (blank for all): ")? else {
            return Ok(false);
        };
        self.session.query.search = Some(search).filter(|s| !s.is_empty());

        let sorts: Vec<String> = SortColumn::ALL.iter().map(|s| s.to_string()).collect();
        if let Some(i) = self.pick("Sort by", &sorts)? {
            self.session.query.sort = SortColumn::ALL[i];
        }
        let orders: Vec<String> = SortOrder::ALL.iter().map(|s| s.to_string()).collect();
        if let Some(i) = self.pick("Order", &orders)? {
            self.session.query.order = SortOrder::ALL[i];
        }
        let limits: Vec<String> = RowLimit::ALL.iter().map(|s| s.to_string()).collect();
        if let Some(i) = self.pick("Show", &limits)? {
            self.session.query.limit = RowLimit::ALL[i];
        }

        let view = views::details(rows, &self.session.query);
        writeln!(
            self.out,
            "\n{} (sorted by {}, {})",
            view.summary(),
            self.session.query.sort,
            self.session.query.order
        )?;
        writeln!(self.out, "{}", render_table(&view.rows, view.rows.len()))?;

        loop {
            let Some(answer) = self.read_line("Download as CSV (Y/N): ")? else {
                return Ok(false);
            };
            match answer.to_uppercase().as_str() {
                "Y" => {
                    std::fs::write(&self.download_path, views::details_csv(&view)?)?;
                    info!("Wrote {} rows to {:?}", view.rows.len(), self.download_path);
                    writeln!(self.out, "Saved to {}", self.download_path.display())?;
                    return Ok(true);
                }
                "N" => return Ok(true),
                _ => writeln!(self.out, "Invalid choice. Please enter Y or N.")?,
            }
        }
    }

    fn change_filters(&mut self) -> Result<()> {
        let dataset = self.dataset;
        let opts = &dataset.options;
        let menus = [
            ("Era", &opts.eras),
            ("Genre", &opts.genres),
            ("Budget Category", &opts.budgets),
        ];
        for (title, values) in menus {
            let Some(i) = self.pick(title, values)? else {
                continue;
            };
            let value = values[i].as_str();
            let f = &mut self.session.filters;
            match title {
                "Era" => f.era = Selection::parse_with(Some(value), |s| s.parse())?,
                "Genre" => f.genre = Selection::parse_with(Some(value), |s| Ok(s.to_string()))?,
                _ => f.budget = Selection::parse_with(Some(value), |s| s.parse())?,
            }
        }
        Ok(())
    }
}
