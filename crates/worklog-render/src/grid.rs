//! In-memory report grid
//!
//! The layout pass fills a [`ReportGrid`]; the XLSX writer only walks it.
//! Keeping the two apart lets later passes (weekend highlight) restyle
//! cells that were already placed, which the worksheet API cannot do.

use chrono::NaiveDate;
use std::collections::BTreeMap;

/// What a grid row represents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RowKind {
    Header,
    Project,
    User,
    Issue,
    Total,
}

/// Visual role of a cell, resolved to a concrete format by the writer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellStyle {
    Header,
    DateHeader,
    Project,
    UserText,
    UserCurrency,
    UserHours,
    UserDate,
    IssueTask,
    IssueCurrency,
    IssueHours,
    IssueDate,
    TotalLabel,
    TotalHours,
    TotalCurrency,
}

impl CellStyle {
    pub const ALL: [CellStyle; 14] = [
        CellStyle::Header,
        CellStyle::DateHeader,
        CellStyle::Project,
        CellStyle::UserText,
        CellStyle::UserCurrency,
        CellStyle::UserHours,
        CellStyle::UserDate,
        CellStyle::IssueTask,
        CellStyle::IssueCurrency,
        CellStyle::IssueHours,
        CellStyle::IssueDate,
        CellStyle::TotalLabel,
        CellStyle::TotalHours,
        CellStyle::TotalCurrency,
    ];
}

#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Blank,
    Text(String),
    Number(f64),
    /// Formula text including the leading `=`
    Formula(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
    /// Weekend highlight overrides the fill of `style`
    pub weekend: bool,
}

impl Cell {
    pub fn new(value: CellValue, style: CellStyle) -> Self {
        Self {
            value,
            style,
            weekend: false,
        }
    }

    pub fn formula(&self) -> Option<&str> {
        match &self.value {
            CellValue::Formula(f) => Some(f),
            _ => None,
        }
    }

    pub fn number(&self) -> Option<f64> {
        match self.value {
            CellValue::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.value {
            CellValue::Text(t) => Some(t),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GridRow {
    pub kind: RowKind,
    pub height: Option<f64>,
    cells: BTreeMap<u16, Cell>,
}

impl GridRow {
    fn new(kind: RowKind) -> Self {
        Self {
            kind,
            height: None,
            cells: BTreeMap::new(),
        }
    }

    pub fn cell(&self, col: u16) -> Option<&Cell> {
        self.cells.get(&col)
    }

    /// Cells in column order
    pub fn cells(&self) -> impl Iterator<Item = (u16, &Cell)> {
        self.cells.iter().map(|(col, cell)| (*col, cell))
    }
}

/// The whole report sheet
#[derive(Clone, Debug, PartialEq)]
pub struct ReportGrid {
    pub sheet_name: String,
    /// Calendar day shown in each date column, starting at `first_date_col`
    pub dates: Vec<NaiveDate>,
    pub first_date_col: u16,
    rows: Vec<GridRow>,
    /// Rate cells that get the zero-rate conditional highlight
    pub zero_rate_cells: Vec<(u32, u16)>,
}

impl ReportGrid {
    pub fn new(sheet_name: impl Into<String>, dates: Vec<NaiveDate>, first_date_col: u16) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            dates,
            first_date_col,
            rows: Vec::new(),
            zero_rate_cells: Vec::new(),
        }
    }

    /// Last used column (the last date column, or the last fixed column)
    pub fn last_col(&self) -> u16 {
        (self.first_date_col + self.dates.len() as u16).saturating_sub(1)
    }

    /// Column holding `date`, if it is within the report range
    pub fn date_col(&self, date: NaiveDate) -> Option<u16> {
        self.dates
            .iter()
            .position(|d| *d == date)
            .map(|idx| self.first_date_col + idx as u16)
    }

    pub fn date_cols(&self) -> impl Iterator<Item = (u16, NaiveDate)> + '_ {
        self.dates
            .iter()
            .enumerate()
            .map(|(idx, date)| (self.first_date_col + idx as u16, *date))
    }

    /// Append a row, returning its zero-based index
    pub fn push_row(&mut self, kind: RowKind) -> u32 {
        self.rows.push(GridRow::new(kind));
        (self.rows.len() - 1) as u32
    }

    pub fn set_height(&mut self, row: u32, height: f64) {
        if let Some(r) = self.rows.get_mut(row as usize) {
            r.height = Some(height);
        }
    }

    pub fn set(&mut self, row: u32, col: u16, value: CellValue, style: CellStyle) {
        if let Some(r) = self.rows.get_mut(row as usize) {
            r.cells.insert(col, Cell::new(value, style));
        }
    }

    /// Style every empty cell of `row` in `cols` as a blank with `style`
    pub fn fill_blank(&mut self, row: u32, cols: std::ops::RangeInclusive<u16>, style: CellStyle) {
        if let Some(r) = self.rows.get_mut(row as usize) {
            for col in cols {
                r.cells
                    .entry(col)
                    .or_insert_with(|| Cell::new(CellValue::Blank, style));
            }
        }
    }

    /// Flag the cell at (`row`, `col`) as a weekend cell, creating a blank
    /// with `fallback` style when the cell is empty
    pub fn mark_weekend(&mut self, row: u32, col: u16, fallback: CellStyle) {
        if let Some(r) = self.rows.get_mut(row as usize) {
            r.cells
                .entry(col)
                .or_insert_with(|| Cell::new(CellValue::Blank, fallback))
                .weekend = true;
        }
    }

    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    pub fn row(&self, row: u32) -> Option<&GridRow> {
        self.rows.get(row as usize)
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.row(row).and_then(|r| r.cell(col))
    }

    /// Indices of rows of `kind`, top to bottom
    pub fn rows_of(&self, kind: RowKind) -> impl Iterator<Item = u32> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.kind == kind)
            .map(|(idx, _)| idx as u32)
    }

    pub fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }
}

/// Convert a zero-based column index to its letter (0 -> A, 26 -> AA)
pub fn col_to_letter(col: u16) -> String {
    let mut result = String::new();
    let mut n = u32::from(col);
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// A1-style reference for zero-based `row`/`col`
pub fn cell_ref(row: u32, col: u16) -> String {
    format!("{}{}", col_to_letter(col), row + 1)
}
