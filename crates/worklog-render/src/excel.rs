//! XLSX writer for the report grid
//!
//! Walks a [`ReportGrid`] once and emits a single worksheet with
//! rust_xlsxwriter. Every cell style role maps to a prebuilt [`Format`];
//! weekend cells get the same format with the weekend fill.

use crate::grid::{CellStyle, CellValue, ReportGrid};
use crate::layout::{
    ReportBuilder, COST_COL, FIRST_DATE_COL, HOURS_COL, NAME_COL, POSITION_COL, RATE_COL, TASK_COL,
};
use rust_xlsxwriter::{
    ConditionalFormatCell, ConditionalFormatCellRule, Format, FormatAlign, FormatBorder, Workbook,
    Worksheet,
};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;
use worklog_core::{write_atomically, DateRange, RenderError, ReportRenderer, Worklog};

const HEADER_BLUE: u32 = 0x2487BC;
const PROJECT_BLUE: u32 = 0xBEE0F2;
const USER_BLUE: u32 = 0xD3E2EA;
const TOTAL_BLUE: u32 = 0x53AEDE;
const LIGHT_RED: u32 = 0xFEC7CE;
const ZERO_RATE_FONT: u32 = 0x9A0511;

const CURRENCY_NUM_FORMAT: &str = "[$$-409]#,##0.00";
const HOURS_NUM_FORMAT: &str = "0.00";

/// Excel worklog cost report
#[derive(Clone, Debug, Default)]
pub struct ExcelReport;

impl ExcelReport {
    pub fn new() -> Self {
        Self
    }

    /// Lay out `worklog` for `range` without writing anything
    pub fn layout(&self, worklog: &Worklog, range: &DateRange) -> Result<ReportGrid, RenderError> {
        Ok(ReportBuilder::new(range)?.build(worklog))
    }

    /// Serialize a laid-out grid to XLSX bytes
    pub fn write_grid(&self, grid: &ReportGrid) -> Result<Vec<u8>, RenderError> {
        let mut workbook = Workbook::new();
        let formats = ExcelFormats::new();

        let sheet = workbook.add_worksheet();
        sheet
            .set_name(&grid.sheet_name)
            .map_err(|e| RenderError::Format(e.to_string()))?;

        self.setup_columns(sheet, grid)?;
        self.write_cells(sheet, grid, &formats)?;
        self.add_zero_rate_highlight(sheet, grid, &formats)?;

        sheet
            .set_freeze_panes(1, FIRST_DATE_COL)
            .map_err(|e| RenderError::Format(e.to_string()))?;

        workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))
    }

    /// Render and write the report to `path`, replacing any previous file
    pub fn save(&self, worklog: &Worklog, range: &DateRange, path: &Path) -> Result<(), RenderError> {
        let bytes = self.render(worklog, range)?;
        write_atomically(path, &bytes)?;
        info!(
            path = %path.display(),
            projects = worklog.projects.len(),
            users = worklog.user_count(),
            "Report written"
        );
        Ok(())
    }

    fn setup_columns(&self, sheet: &mut Worksheet, grid: &ReportGrid) -> Result<(), RenderError> {
        let widths = [
            (NAME_COL, 30),
            (POSITION_COL, 30),
            (TASK_COL, 60),
            (RATE_COL, 10),
            (HOURS_COL, 10),
            (COST_COL, 20),
        ];
        for (col, width) in widths {
            sheet
                .set_column_width(col, width)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }
        for (col, _) in grid.date_cols() {
            sheet
                .set_column_width(col, 6)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }
        Ok(())
    }

    fn write_cells(
        &self,
        sheet: &mut Worksheet,
        grid: &ReportGrid,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        for (row_idx, row) in grid.rows().iter().enumerate() {
            let row_idx = row_idx as u32;
            if let Some(height) = row.height {
                sheet
                    .set_row_height(row_idx, height)
                    .map_err(|e| RenderError::Format(e.to_string()))?;
            }

            for (col, cell) in row.cells() {
                let format = formats.get(cell.style, cell.weekend);
                let result = match &cell.value {
                    CellValue::Blank => sheet.write_blank(row_idx, col, format),
                    CellValue::Text(text) => sheet.write_string_with_format(row_idx, col, text, format),
                    CellValue::Number(n) => sheet.write_number_with_format(row_idx, col, *n, format),
                    CellValue::Formula(f) => {
                        sheet.write_formula_with_format(row_idx, col, f.as_str(), format)
                    }
                };
                result.map_err(|e| RenderError::Format(e.to_string()))?;
            }
        }
        Ok(())
    }

    fn add_zero_rate_highlight(
        &self,
        sheet: &mut Worksheet,
        grid: &ReportGrid,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        for (row, col) in &grid.zero_rate_cells {
            let conditional_format = ConditionalFormatCell::new()
                .set_rule(ConditionalFormatCellRule::EqualTo(0))
                .set_format(formats.zero_rate.clone());
            sheet
                .add_conditional_format(*row, *col, *row, *col, &conditional_format)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }
        Ok(())
    }
}

impl ReportRenderer for ExcelReport {
    type Output = Vec<u8>;

    fn render(&self, worklog: &Worklog, range: &DateRange) -> Result<Vec<u8>, RenderError> {
        let grid = self.layout(worklog, range)?;
        self.write_grid(&grid)
    }
}

/// Reusable formats keyed by style role and weekend flag
struct ExcelFormats {
    cells: HashMap<(CellStyle, bool), Format>,
    fallback: Format,
    zero_rate: Format,
}

impl ExcelFormats {
    fn new() -> Self {
        let mut cells = HashMap::new();
        for style in CellStyle::ALL {
            let base = Self::base(style);
            let weekend = base.clone().set_background_color(LIGHT_RED);
            cells.insert((style, false), base);
            cells.insert((style, true), weekend);
        }

        let zero_rate = Format::new()
            .set_font_color(ZERO_RATE_FONT)
            .set_background_color(LIGHT_RED);

        Self {
            cells,
            fallback: Format::new(),
            zero_rate,
        }
    }

    fn get(&self, style: CellStyle, weekend: bool) -> &Format {
        self.cells.get(&(style, weekend)).unwrap_or(&self.fallback)
    }

    fn base(style: CellStyle) -> Format {
        let user = || {
            Format::new()
                .set_bold()
                .set_font_size(12)
                .set_background_color(USER_BLUE)
        };
        let total = || Format::new().set_bold().set_background_color(TOTAL_BLUE);

        match style {
            CellStyle::Header => Format::new()
                .set_bold()
                .set_font_size(13)
                .set_font_color(0xFFFFFF)
                .set_background_color(HEADER_BLUE)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin),
            CellStyle::DateHeader => Format::new()
                .set_bold()
                .set_font_size(13)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin),
            CellStyle::Project => Format::new()
                .set_bold()
                .set_font_size(12)
                .set_align(FormatAlign::VerticalCenter)
                .set_background_color(PROJECT_BLUE),
            CellStyle::UserText => user(),
            CellStyle::UserCurrency => user().set_num_format(CURRENCY_NUM_FORMAT),
            CellStyle::UserHours => user().set_num_format(HOURS_NUM_FORMAT),
            CellStyle::UserDate => user()
                .set_num_format(HOURS_NUM_FORMAT)
                .set_align(FormatAlign::Center),
            CellStyle::IssueTask => Format::new().set_text_wrap(),
            CellStyle::IssueCurrency => Format::new().set_num_format(CURRENCY_NUM_FORMAT),
            CellStyle::IssueHours => Format::new().set_num_format(HOURS_NUM_FORMAT),
            CellStyle::IssueDate => Format::new()
                .set_num_format(HOURS_NUM_FORMAT)
                .set_align(FormatAlign::Center),
            CellStyle::TotalLabel => total().set_align(FormatAlign::Center),
            CellStyle::TotalHours => total().set_num_format(HOURS_NUM_FORMAT),
            CellStyle::TotalCurrency => total().set_num_format(CURRENCY_NUM_FORMAT),
        }
    }
}
