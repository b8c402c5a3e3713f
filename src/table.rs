use crate::error::{Error, Result};
use calamine::{Data, Reader, Xlsx};
use std::io::Cursor;

/// A spreadsheet- or CSV-derived table with one header row.
///
/// Cell values are kept as display strings; numeric interpretation is
/// left to consumers such as the chart derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Column headers, in original order
    pub headers: Vec<String>,

    /// Data rows, in original row order
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Parses the first worksheet of an xlsx workbook.
    ///
    /// The first row is treated as the header row; trailing empty cells
    /// are kept so every row has the header's width.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Extraction`] if the workbook cannot be opened or
    /// contains no worksheet.
    pub fn from_xlsx_bytes(name: &str, bytes: &[u8]) -> Result<Self> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
            .map_err(|e| Error::extraction(name, format!("not a readable workbook: {e}")))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| Error::extraction(name, "workbook has no worksheets"))?
            .map_err(|e| Error::extraction(name, format!("failed to read worksheet: {e}")))?;

        let mut iter = range.rows();
        let headers = match iter.next() {
            Some(row) => row.iter().map(format_cell).collect::<Vec<_>>(),
            None => Vec::new(),
        };

        let width = headers.len();
        let rows = iter
            .map(|row| {
                let mut cells: Vec<String> = row.iter().map(format_cell).collect();
                cells.resize(width.max(cells.len()), String::new());
                cells
            })
            .collect();

        Ok(Self { headers, rows })
    }

    /// Parses delimited text (comma-separated, header row first).
    ///
    /// Rows are read in flexible mode so a short record does not abort
    /// the whole file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Extraction`] if the content is not valid UTF-8
    /// or a record cannot be parsed.
    pub fn from_csv_bytes(name: &str, bytes: &[u8]) -> Result<Self> {
        let content = std::str::from_utf8(bytes)
            .map_err(|_| Error::extraction(name, "CSV content is not valid UTF-8"))?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut records = reader.records();
        let headers = match records.next() {
            Some(record) => {
                let record =
                    record.map_err(|e| Error::extraction(name, format!("bad CSV header: {e}")))?;
                record.iter().map(|s| s.to_string()).collect::<Vec<_>>()
            }
            None => Vec::new(),
        };

        let width = headers.len();
        let mut rows = Vec::new();
        for record in records {
            let record =
                record.map_err(|e| Error::extraction(name, format!("bad CSV record: {e}")))?;
            let mut cells: Vec<String> = record.iter().map(|s| s.to_string()).collect();
            cells.resize(width.max(cells.len()), String::new());
            rows.push(cells);
        }

        Ok(Self { headers, rows })
    }

    /// Returns true if the table has no header and no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    /// Renders the table as a plain-text dump: aligned header row plus
    /// one line per record, in original row order.
    #[must_use]
    pub fn to_text(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);

        let mut widths = vec![0usize; columns];
        for (i, header) in self.headers.iter().enumerate() {
            widths[i] = widths[i].max(header.chars().count());
        }
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        render_line(&mut out, &self.headers, &widths);
        for row in &self.rows {
            render_line(&mut out, row, &widths);
        }
        out
    }
}

fn render_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        line.push_str(cell);
        for _ in cell.chars().count()..*width {
            line.push(' ');
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Formats a calamine cell for the text dump.
fn format_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#{e:?}"),
    }
}

/// Builds a one-sheet xlsx workbook in memory for tests. Numeric-looking
/// cells below the header row are written as numbers, mirroring how real
/// workbooks arrive.
#[cfg(test)]
pub(crate) fn xlsx_fixture(rows: &[&[&str]]) -> Vec<u8> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();

    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if r > 0 {
                if let Ok(n) = cell.parse::<f64>() {
                    sheet.write_number(r as u32, c as u16, n).unwrap();
                    continue;
                }
            }
            sheet.write_string(r as u32, c as u16, *cell).unwrap();
        }
    }

    workbook.save_to_buffer().unwrap()
}
