//! `InputHolder`: CSV/TSV/space-delimited stream reading with
//! delimiter auto-detection, header/time-column detection, ISO-8601
//! timestamps, and `smooth` linear interpolation.

use crate::storage::error::{StorageError, StorageResult};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Matches a trailing parenthetical unit annotation on a header cell
/// (`"t (s)"`, `"V(mV)"`) so it can be stripped before comparing against
/// the bare names in [`select_time_column`]'s precedence list.
fn unit_suffix() -> &'static Regex {
    static UNIT_SUFFIX: OnceLock<Regex> = OnceLock::new();
    UNIT_SUFFIX.get_or_init(|| Regex::new(r"\s*\([^()]*\)\s*$").unwrap())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Comma,
    Space,
}

impl Delimiter {
    pub fn as_char(self) -> char {
        match self {
            Delimiter::Tab => '\t',
            Delimiter::Comma => ',',
            Delimiter::Space => ' ',
        }
    }

    /// Detect delimiter from the first non-empty line ("tab >
    /// comma > space; space treated as delimiter only if no tab or comma
    /// appears ... and a non-space character is present").
    pub fn detect(first_line: &str) -> Option<Delimiter> {
        if first_line.contains('\t') {
            Some(Delimiter::Tab)
        } else if first_line.contains(',') {
            Some(Delimiter::Comma)
        } else if first_line.contains(' ') && first_line.chars().any(|c| !c.is_whitespace()) {
            Some(Delimiter::Space)
        } else {
            None
        }
    }
}

/// A parsed input stream: column headers (synthesized as `"0", "1", ...`
/// when the first line is already numeric), the data rows, and which
/// column (if any) holds the time axis.
#[derive(Debug, Clone, Default)]
pub struct InputHolder {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub time_column: Option<usize>,
}

impl InputHolder {
    pub fn open(path: &Path) -> StorageResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|_| StorageError::MissingFile(path.display().to_string()))?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let Some(first) = lines.next() else {
            return InputHolder::default();
        };
        let delim = Delimiter::detect(first).unwrap_or(Delimiter::Space);
        let sep = delim.as_char();

        let first_is_header = first
            .split(sep)
            .any(|tok| !tok.trim().is_empty() && tok.trim().parse::<f64>().is_err());

        let (headers, data_lines): (Vec<String>, Vec<&str>) = if first_is_header {
            (first.split(sep).map(|s| s.trim().to_string()).collect(), lines.collect())
        } else {
            let width = first.split(sep).count();
            let mut all = vec![first];
            all.extend(lines);
            ((0..width).map(|i| i.to_string()).collect(), all)
        };

        let rows: Vec<Vec<f64>> = data_lines
            .into_iter()
            .map(|line| line.split(sep).map(|tok| parse_cell(tok.trim())).collect())
            .collect();

        let time_column = select_time_column(&headers);
        InputHolder { headers, rows, time_column }
    }

    /// Linear interpolation of `column` at time `t` (scenario 6:
    /// rows `(0,0),(1,10)` at `t=0.3` -> `3`). Clamps to the nearest
    /// endpoint outside the sampled range; `NaN` when there is no time
    /// column or no rows.
    pub fn smooth(&self, column: usize, t: f64) -> f64 {
        let Some(tcol) = self.time_column else { return f64::NAN };
        match self.rows.len() {
            0 => return f64::NAN,
            1 => return self.rows[0].get(column).copied().unwrap_or(f64::NAN),
            _ => {}
        }

        for window in self.rows.windows(2) {
            let (t0, t1) = (window[0][tcol], window[1][tcol]);
            if t >= t0 && t <= t1 {
                let v0 = window[0].get(column).copied().unwrap_or(f64::NAN);
                let v1 = window[1].get(column).copied().unwrap_or(f64::NAN);
                if (t1 - t0).abs() < f64::EPSILON {
                    return v0;
                }
                let frac = (t - t0) / (t1 - t0);
                return v0 + frac * (v1 - v0);
            }
        }

        if t < self.rows[0][tcol] {
            self.rows[0].get(column).copied().unwrap_or(f64::NAN)
        } else {
            self.rows.last().unwrap().get(column).copied().unwrap_or(f64::NAN)
        }
    }

    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.rows.get(row).and_then(|r| r.get(column)).copied().unwrap_or(f64::NAN)
    }
}

fn parse_cell(tok: &str) -> f64 {
    if tok.is_empty() {
        return f64::NAN;
    }
    if let Ok(v) = tok.parse::<f64>() {
        return v;
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(tok) {
        return dt.timestamp() as f64;
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(tok, "%Y-%m-%d") {
        let epoch = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        return date.signed_duration_since(epoch).num_seconds() as f64;
    }
    f64::NAN
}

/// Pick the time column by header match precedence ("`$t` >
/// `time` > `date` > `t` > any column containing `time`").
fn select_time_column(headers: &[String]) -> Option<usize> {
    let lower: Vec<String> = headers
        .iter()
        .map(|h| unit_suffix().replace(&h.to_lowercase(), "").into_owned())
        .collect();
    for exact in ["$t", "time", "date", "t"] {
        if let Some(i) = lower.iter().position(|h| h == exact) {
            return Some(i);
        }
    }
    lower.iter().position(|h| h.contains("time"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_precedence_prefers_tab_over_comma_over_space() {
        assert_eq!(Delimiter::detect("a\tb,c d"), Some(Delimiter::Tab));
        assert_eq!(Delimiter::detect("a,b c"), Some(Delimiter::Comma));
        assert_eq!(Delimiter::detect("a b c"), Some(Delimiter::Space));
        assert_eq!(Delimiter::detect(""), None);
    }

    #[test]
    fn a_numeric_first_line_gets_synthesized_headers() {
        let holder = InputHolder::parse("0,0\n1,10\n");
        assert_eq!(holder.headers, vec!["0", "1"]);
        assert_eq!(holder.rows.len(), 2);
    }

    #[test]
    fn a_non_numeric_first_line_is_treated_as_a_header() {
        let holder = InputHolder::parse("t,x\n0,0\n1,10\n");
        assert_eq!(holder.headers, vec!["t", "x"]);
        assert_eq!(holder.rows.len(), 2);
        assert_eq!(holder.time_column, Some(0));
    }

    #[test]
    fn time_column_selection_follows_the_documented_precedence() {
        assert_eq!(select_time_column(&["a".into(), "time".into(), "t".into()]), Some(1));
        assert_eq!(select_time_column(&["a".into(), "t".into()]), Some(1));
        assert_eq!(select_time_column(&["a".into(), "sometime_ago".into()]), Some(1));
        assert_eq!(select_time_column(&["a".into(), "b".into()]), None);
    }

    #[test]
    fn smooth_linearly_interpolates_between_surrounding_rows() {
        let holder = InputHolder::parse("0,0\n1,10\n");
        assert!((holder.smooth(1, 0.3) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn smooth_clamps_outside_the_sampled_range() {
        let holder = InputHolder::parse("0,0\n1,10\n");
        assert_eq!(holder.smooth(1, -1.0), 0.0);
        assert_eq!(holder.smooth(1, 5.0), 10.0);
    }

    #[test]
    fn iso_dates_in_the_time_column_convert_to_unix_time() {
        assert_eq!(parse_cell("1970-01-02"), 86400.0);
    }

    #[test]
    fn a_header_with_a_trailing_unit_annotation_still_matches_on_its_bare_name() {
        assert_eq!(select_time_column(&["t (s)".into(), "V (mV)".into()]), Some(0));
    }
}
