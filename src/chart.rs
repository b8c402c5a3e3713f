use crate::error::{Error, Result};
use crate::table::Table;
use once_cell::sync::Lazy;
use serde::Serialize;

/// Canonical chart columns with their recognized header variants.
/// Headers are matched case-insensitively after trimming.
static COLUMNS: Lazy<[ColumnSpec; 3]> = Lazy::new(|| {
    [
        ColumnSpec {
            canonical: "year",
            variants: &["year", "fiscal year", "yr"],
        },
        ColumnSpec {
            canonical: "debt service coverage ratio",
            variants: &[
                "debt service coverage ratio",
                "dscr",
                "coverage ratio",
                "debt service coverage",
            ],
        },
        ColumnSpec {
            canonical: "minimum debt service coverage ratio",
            variants: &[
                "minimum debt service coverage ratio",
                "minimum dscr",
                "min dscr",
                "dscr covenant",
                "minimum coverage ratio",
                "covenant",
            ],
        },
    ]
});

struct ColumnSpec {
    canonical: &'static str,
    variants: &'static [&'static str],
}

impl ColumnSpec {
    fn find(&self, normalized_headers: &[String]) -> Result<usize> {
        normalized_headers
            .iter()
            .position(|h| self.variants.contains(&h.as_str()))
            .ok_or_else(|| Error::MissingColumn {
                column: self.canonical.to_string(),
                accepted: self.variants.join(", "),
            })
    }
}

/// Debt-service-coverage chart data, derived from one spreadsheet
/// upload. A presentation artifact for the display layer, never
/// persisted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DscrChart {
    /// Bar series: coverage ratio per year, in original row order
    pub coverage: Vec<SeriesPoint>,

    /// Overlaid line series: minimum covenant per year
    pub covenant: Vec<SeriesPoint>,

    /// X-axis ticks at integer year values
    pub x_ticks: Vec<i64>,
}

/// One (year, value) point in a chart series.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct SeriesPoint {
    /// Integer year
    pub year: i64,

    /// Series value for that year
    pub value: f64,
}

/// Derives the DSCR chart from a spreadsheet-derived table.
///
/// Column headers are normalized (trim + lowercase) and mapped through
/// the recognized variant sets. Rows whose mapped cells are all empty
/// are skipped; anything else must parse numerically.
///
/// # Errors
///
/// Returns [`Error::MissingColumn`] if a canonical column cannot be
/// mapped, or [`Error::NonNumericCell`] for unparseable values. The
/// caller is expected to surface either error; memo generation itself
/// proceeds without a chart.
pub fn derive_chart(table: &Table) -> Result<DscrChart> {
    let normalized: Vec<String> = table
        .headers
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let year_idx = COLUMNS[0].find(&normalized)?;
    let coverage_idx = COLUMNS[1].find(&normalized)?;
    let covenant_idx = COLUMNS[2].find(&normalized)?;

    let mut coverage = Vec::new();
    let mut covenant = Vec::new();
    let mut x_ticks = Vec::new();

    for (row_number, row) in table.rows.iter().enumerate() {
        let year_cell = cell(row, year_idx);
        let coverage_cell = cell(row, coverage_idx);
        let covenant_cell = cell(row, covenant_idx);

        if year_cell.is_empty() && coverage_cell.is_empty() && covenant_cell.is_empty() {
            continue;
        }

        let year = parse_numeric(COLUMNS[0].canonical, row_number + 1, year_cell)? as i64;
        let coverage_value = parse_numeric(COLUMNS[1].canonical, row_number + 1, coverage_cell)?;
        let covenant_value = parse_numeric(COLUMNS[2].canonical, row_number + 1, covenant_cell)?;

        coverage.push(SeriesPoint {
            year,
            value: coverage_value,
        });
        covenant.push(SeriesPoint {
            year,
            value: covenant_value,
        });
        x_ticks.push(year);
    }

    Ok(DscrChart {
        coverage,
        covenant,
        x_ticks,
    })
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("").trim()
}

fn parse_numeric(column: &str, row: usize, value: &str) -> Result<f64> {
    value.parse::<f64>().map_err(|_| Error::NonNumericCell {
        column: column.to_string(),
        row,
        value: value.to_string(),
    })
}
