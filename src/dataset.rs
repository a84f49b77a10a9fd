use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{RegopError, Result};
use crate::names::Canonicalizer;

// ---------------------------------------------------------------------------
// Column layout
// ---------------------------------------------------------------------------

/// Zero-based positions of the columns the dashboard reads. Header text in
/// the uploaded sheets is not reliable, so columns are addressed by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub date: usize,
    pub destination: usize,
    pub company: usize,
    pub hour: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            date: 0,
            destination: 3,
            company: 11,
            hour: 14,
        }
    }
}

impl ColumnLayout {
    fn indices(&self) -> [(&'static str, usize); 4] {
        [
            ("date", self.date),
            ("destination", self.destination),
            ("company", self.company),
            ("hour", self.hour),
        ]
    }

    /// Minimum number of columns a sheet needs.
    pub fn required_width(&self) -> usize {
        self.indices().iter().map(|(_, i)| *i).max().unwrap_or(0) + 1
    }

    pub fn check_distinct(&self) -> Result<()> {
        let idx = self.indices();
        for (i, (a, ai)) in idx.iter().enumerate() {
            for (b, bi) in &idx[i + 1..] {
                if ai == bi {
                    return Err(RegopError::Layout(format!(
                        "{a} and {b} columns both point at index {ai}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn check_width(&self, width: usize) -> Result<()> {
        let needed = self.required_width();
        if width < needed {
            let (name, index) = self
                .indices()
                .into_iter()
                .filter(|(_, i)| *i >= width)
                .max_by_key(|(_, i)| *i)
                .unwrap_or(("hour", self.hour));
            return Err(RegopError::Layout(format!(
                "sheet has {width} columns but the {name} column is configured at index {index} \
                 ({needed} columns required)"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Raw sheet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    /// Numbers, including Excel date/time serials.
    Number(f64),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(n) => n.is_nan(),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
        }
    }
}

/// First sheet of an uploaded file, header row separated out.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.len())
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }
}

pub fn load_table(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" | "txt" => load_csv(path),
        #[cfg(feature = "xlsx")]
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_workbook(path),
        _ => Err(RegopError::UnsupportedFile(path.display().to_string())),
    }
}

fn load_csv(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let headers = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(
            record
                .iter()
                .map(|f| {
                    if f.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(f.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(RawTable { headers, rows })
}

#[cfg(feature = "xlsx")]
fn load_workbook(path: &Path) -> Result<RawTable> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| RegopError::Layout(format!("{} has no worksheets", path.display())))??;

    let convert = |cell: &Data| match cell {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
    };

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|r| r.iter().map(|c| convert(c).as_text()).collect())
        .unwrap_or_default();
    let rows = rows.map(|r| r.iter().map(convert).collect()).collect();
    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// Cell parsers
// ---------------------------------------------------------------------------

/// First serial past 9999-12-31, the last day Excel can represent.
const EXCEL_SERIAL_END: f64 = 2_958_466.0;

fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..EXCEL_SERIAL_END).contains(&serial) {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    base.checked_add_signed(chrono::Duration::try_seconds(seconds)?)
}

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d"];

/// Day-first calendar date. Any time-of-day suffix is ignored.
pub fn parse_date_dayfirst(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

pub fn parse_date_cell(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Empty => None,
        Cell::Text(s) => parse_date_dayfirst(s),
        Cell::Number(n) => excel_serial_to_datetime(*n).map(|dt| dt.date()),
    }
}

/// Hour component of an `HH:MM:SS` (or `HH:MM`) time. A date prefix such as
/// `2024-01-01 08:15:00` is skipped.
pub fn parse_hour(raw: &str) -> Option<u8> {
    let raw = raw.trim();
    let time_part = raw.rsplit(['T', ' ']).next().unwrap_or(raw);
    let time = NaiveTime::parse_from_str(time_part, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time_part, "%H:%M"))
        .ok()?;
    u8::try_from(time.hour()).ok()
}

pub fn parse_hour_cell(cell: &Cell) -> Option<u8> {
    match cell {
        Cell::Empty => None,
        Cell::Text(s) => parse_hour(s),
        Cell::Number(n) => {
            // Excel stores times as a fraction of a day, date-times as serials.
            let dt = excel_serial_to_datetime(*n)?;
            u8::try_from(dt.hour()).ok()
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    /// `None` when the date cell did not parse.
    pub date: Option<NaiveDate>,
    pub destination: String,
    /// Canonical company name.
    pub company: String,
    /// `None` when the hour cell did not parse.
    pub hour: Option<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<DispatchRecord>,
    /// Rows dropped for a missing required value.
    pub dropped: usize,
    /// Kept rows whose date or hour failed to parse.
    pub unparsed: usize,
}

impl Dataset {
    pub fn from_table(table: &RawTable, layout: &ColumnLayout, names: &Canonicalizer) -> Result<Self> {
        layout.check_distinct()?;
        layout.check_width(table.width())?;

        let empty = Cell::Empty;
        let mut ds = Dataset::default();
        for row in &table.rows {
            let cell = |i: usize| row.get(i).unwrap_or(&empty);
            let required = [
                cell(layout.date),
                cell(layout.destination),
                cell(layout.company),
                cell(layout.hour),
            ];
            if required.iter().any(|c| c.is_missing()) {
                ds.dropped += 1;
                continue;
            }
            let date = parse_date_cell(cell(layout.date));
            let hour = parse_hour_cell(cell(layout.hour));
            if date.is_none() || hour.is_none() {
                ds.unparsed += 1;
            }
            ds.records.push(DispatchRecord {
                date,
                destination: cell(layout.destination).as_text(),
                company: names.canonical(&cell(layout.company).as_text()),
                hour,
            });
        }
        tracing::debug!(
            kept = ds.records.len(),
            dropped = ds.dropped,
            unparsed = ds.unparsed,
            "dataset parsed"
        );
        Ok(ds)
    }

    pub fn load(path: &Path, layout: &ColumnLayout, names: &Canonicalizer) -> Result<Self> {
        let table = load_table(path)?;
        Self::from_table(&table, layout, names)
    }
}
