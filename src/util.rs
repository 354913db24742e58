// Lenient cell parsing, null-aware statistics and display formatting for
// money and counts. Every parser here maps bad input to `None`.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Date layouts seen in the merged movie exports, tried in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d-%b-%Y"];

/// Numeric cell to `f64`. Whitespace, a leading `$` and thousands
/// separators are tolerated; text, `"nan"` and `"inf"` all read as missing.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.trim_start_matches('$').replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Whole numbers, tolerating a trailing `.0` (`"2009.0"`).
pub fn parse_i64_safe(s: Option<&str>) -> Option<i64> {
    let v = parse_f64_safe(s)?;
    if v.fract() != 0.0 {
        return None;
    }
    Some(v as i64)
}

pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// `num / den`, undefined when the denominator is zero.
pub fn safe_div(num: f64, den: f64) -> Option<f64> {
    if den == 0.0 {
        return None;
    }
    let v = num / den;
    v.is_finite().then_some(v)
}

pub fn round_to(v: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (v * factor).round() / factor
}

/// Arithmetic mean; `None` for an empty slice so callers never see NaN.
pub fn average(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    let sum: f64 = v.iter().copied().sum();
    Some(sum / v.len() as f64)
}

/// Takes ownership and sorts in place.
pub fn median(mut v: Vec<f64>) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    v.sort_by(f64::total_cmp);
    let mid = v.len() / 2;
    if v.len() % 2 == 1 {
        Some(v[mid])
    } else {
        Some((v[mid - 1] + v[mid]) / 2.0)
    }
}

/// Linear-interpolated quantile over an already sorted slice, `q` in `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Mean of a boolean column, i.e. the fraction of `true` values.
pub fn rate(flags: &[bool]) -> Option<f64> {
    if flags.is_empty() {
        return None;
    }
    Some(flags.iter().filter(|f| **f).count() as f64 / flags.len() as f64)
}

/// `1234567.891` with 2 decimals gives `1,234,567.89`.
pub fn format_number(n: f64, decimals: usize) -> String {
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Compact currency: `$1.2B`, `$150M`, `$900K`, `$12`.
pub fn format_currency(v: f64) -> String {
    let sign = if v < 0.0 { "-" } else { "" };
    let a = v.abs();
    if a >= 1e9 {
        format!("{}${:.1}B", sign, a / 1e9)
    } else if a >= 1e6 {
        format!("{}${:.0}M", sign, a / 1e6)
    } else if a >= 1e3 {
        format!("{}${:.0}K", sign, a / 1e3)
    } else {
        format!("{}${:.0}", sign, a)
    }
}

pub fn format_opt_currency(v: &Option<f64>) -> String {
    v.map(format_currency).unwrap_or_else(|| "—".to_string())
}

pub fn format_opt_percent(v: &Option<f64>) -> String {
    v.map(|p| format!("{:.0}%", p))
        .unwrap_or_else(|| "—".to_string())
}

pub fn format_opt_number(v: &Option<f64>) -> String {
    v.map(|n| format_number(n, 2))
        .unwrap_or_else(|| "—".to_string())
}
