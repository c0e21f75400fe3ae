//! # worklog-render
//!
//! Cost report rendering for aggregated worklogs.
//!
//! Rendering is two-phase:
//! - [`ReportBuilder`] lays the worklog out into a [`ReportGrid`]
//!   (one header row, a banner per project, a summary row per user, a detail
//!   row per issue, a grand total, and the weekend highlight pass)
//! - [`ExcelReport`] writes the grid to a single-sheet XLSX workbook
//!
//! ## Example
//!
//! ```rust,ignore
//! use worklog_core::{DateRange, ReportRenderer};
//! use worklog_render::ExcelReport;
//!
//! let range = DateRange::parse("2024-01-01", "2024-01-07")?;
//! let report = ExcelReport::new();
//! let grid = report.layout(&worklog, &range)?;
//! assert_eq!(grid.sheet_name, "Jan 1 - Jan 7");
//! report.save(&worklog, &range, Path::new("report.xlsx"))?;
//! ```

pub mod excel;
pub mod grid;
pub mod layout;

pub use excel::ExcelReport;
pub use grid::{col_to_letter, Cell, CellStyle, CellValue, GridRow, ReportGrid, RowKind};
pub use layout::{date_label, sheet_name, ReportBuilder};
