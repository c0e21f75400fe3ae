//! Report layout: worklog model to [`ReportGrid`]
//!
//! ```text
//! | Name  | Position | Task          | Rate | Hours        | Total cost | 1/1 | 1/2 | ...
//! | PRJ                                                                              |  project banner
//! | Alice | Dev      |               | 45   | =SUM(G3:M3)  | =D3*E3     |     | =SUM(H4:H5)
//! |       |          | PRJ-1: Login  | 45   | =SUM(G4:M4)  | =D4*E4     |     | 1.5 |
//! |       |          | PRJ-2: Logout | 45   | =SUM(G5:M5)  | =D5*E5     |     | 0.5 |
//! | Total |          |               |      | =SUM(E3)     | =SUM(F3)   |
//! ```

use crate::grid::{cell_ref, col_to_letter, CellStyle, CellValue, ReportGrid, RowKind};
use chrono::{Datelike, NaiveDate};
use tracing::debug;
use worklog_core::{is_weekend, DateRange, Issue, Project, RenderError, User, Worklog};

pub const NAME_COL: u16 = 0;
pub const POSITION_COL: u16 = 1;
pub const TASK_COL: u16 = 2;
pub const RATE_COL: u16 = 3;
pub const HOURS_COL: u16 = 4;
pub const COST_COL: u16 = 5;
/// First per-day column (G)
pub const FIRST_DATE_COL: u16 = 6;

pub const FIXED_HEADERS: [&str; 6] = ["Name", "Position", "Task", "Rate", "Hours", "Total cost"];

pub const HEADER_ROW_HEIGHT: f64 = 25.0;
pub const PROJECT_ROW_HEIGHT: f64 = 25.0;

/// Worksheet column limit
const MAX_COLS: usize = 16_384;

/// Lays out one report; consumed by [`ReportBuilder::build`]
pub struct ReportBuilder {
    grid: ReportGrid,
}

impl ReportBuilder {
    pub fn new(range: &DateRange) -> Result<Self, RenderError> {
        let dates: Vec<NaiveDate> = range.days().collect();
        if dates.len() + usize::from(FIRST_DATE_COL) > MAX_COLS {
            return Err(RenderError::InvalidData(format!(
                "Date range {} .. {} needs {} day columns, the sheet holds at most {}",
                range.from,
                range.to,
                dates.len(),
                MAX_COLS - usize::from(FIRST_DATE_COL)
            )));
        }

        Ok(Self {
            grid: ReportGrid::new(sheet_name(range), dates, FIRST_DATE_COL),
        })
    }

    pub fn build(mut self, worklog: &Worklog) -> ReportGrid {
        self.write_header();
        for project in &worklog.projects {
            self.write_project(project);
        }
        self.write_total();
        self.highlight_weekends();
        self.grid
    }

    fn write_header(&mut self) {
        let row = self.grid.push_row(RowKind::Header);
        self.grid.set_height(row, HEADER_ROW_HEIGHT);

        for (col, title) in FIXED_HEADERS.iter().enumerate() {
            self.grid.set(
                row,
                col as u16,
                CellValue::Text((*title).to_string()),
                CellStyle::Header,
            );
        }

        let labels: Vec<(u16, String)> = self
            .grid
            .date_cols()
            .map(|(col, date)| (col, date_label(date)))
            .collect();
        for (col, label) in labels {
            self.grid
                .set(row, col, CellValue::Text(label), CellStyle::DateHeader);
        }
    }

    fn write_project(&mut self, project: &Project) {
        let row = self.grid.push_row(RowKind::Project);
        self.grid.set_height(row, PROJECT_ROW_HEIGHT);
        self.grid.set(
            row,
            NAME_COL,
            CellValue::Text(project.key.clone()),
            CellStyle::Project,
        );
        let last_col = self.grid.last_col();
        self.grid.fill_blank(row, 0..=last_col, CellStyle::Project);

        for user in &project.users {
            self.write_user(user);
        }
    }

    fn write_user(&mut self, user: &User) {
        let row = self.grid.push_row(RowKind::User);
        let first_issue_row = row + 1;
        let last_issue_row = row + user.issues.len() as u32;

        self.grid.set(
            row,
            NAME_COL,
            CellValue::Text(user.display_name.clone()),
            CellStyle::UserText,
        );
        self.grid.set(
            row,
            POSITION_COL,
            CellValue::Text(user.position.clone()),
            CellStyle::UserText,
        );
        self.write_rate_and_totals(row, user.rate, CellStyle::UserCurrency, CellStyle::UserHours);
        self.grid.zero_rate_cells.push((row, RATE_COL));

        if !user.issues.is_empty() {
            let days: Vec<(u16, NaiveDate)> = self.grid.date_cols().collect();
            for (col, date) in days {
                if !user.has_effort_on(date) {
                    continue;
                }
                let letter = col_to_letter(col);
                self.grid.set(
                    row,
                    col,
                    CellValue::Formula(format!(
                        "=SUM({letter}{}:{letter}{})",
                        first_issue_row + 1,
                        last_issue_row + 1
                    )),
                    CellStyle::UserDate,
                );
            }
        }

        let last_col = self.grid.last_col();
        self.grid.fill_blank(row, 0..=last_col, CellStyle::UserText);

        for issue in &user.issues {
            self.write_issue(issue, user.rate);
        }
    }

    fn write_issue(&mut self, issue: &Issue, rate: i64) {
        let row = self.grid.push_row(RowKind::Issue);

        self.grid.set(
            row,
            TASK_COL,
            CellValue::Text(issue.title()),
            CellStyle::IssueTask,
        );
        self.write_rate_and_totals(row, rate, CellStyle::IssueCurrency, CellStyle::IssueHours);

        for effort in &issue.efforts {
            match self.grid.date_col(effort.date) {
                Some(col) => self.grid.set(
                    row,
                    col,
                    CellValue::Number(effort.hours()),
                    CellStyle::IssueDate,
                ),
                None => debug!(
                    issue = %issue.key,
                    date = %effort.date,
                    "Effort outside report range, not placed"
                ),
            }
        }
    }

    /// Rate, `Hours = SUM(date cells)` and `Total cost = Rate * Hours`
    fn write_rate_and_totals(
        &mut self,
        row: u32,
        rate: i64,
        currency: CellStyle,
        hours: CellStyle,
    ) {
        let first = cell_ref(row, FIRST_DATE_COL);
        let last = cell_ref(row, self.grid.last_col());

        self.grid
            .set(row, RATE_COL, CellValue::Number(rate as f64), currency);
        self.grid.set(
            row,
            HOURS_COL,
            CellValue::Formula(format!("=SUM({first}:{last})")),
            hours,
        );
        self.grid.set(
            row,
            COST_COL,
            CellValue::Formula(format!(
                "={}*{}",
                cell_ref(row, RATE_COL),
                cell_ref(row, HOURS_COL)
            )),
            currency,
        );
    }

    fn write_total(&mut self) {
        let user_rows: Vec<u32> = self.grid.rows_of(RowKind::User).collect();
        let row = self.grid.push_row(RowKind::Total);

        self.grid.set(
            row,
            NAME_COL,
            CellValue::Text("Total".into()),
            CellStyle::TotalLabel,
        );
        self.grid
            .set(row, HOURS_COL, sum_of(&user_rows, HOURS_COL), CellStyle::TotalHours);
        self.grid
            .set(row, COST_COL, sum_of(&user_rows, COST_COL), CellStyle::TotalCurrency);
    }

    /// Weekend columns: header cell plus every data row, never the total row
    fn highlight_weekends(&mut self) {
        let weekend_cols: Vec<u16> = self
            .grid
            .date_cols()
            .filter(|(_, date)| is_weekend(*date))
            .map(|(col, _)| col)
            .collect();
        if weekend_cols.is_empty() {
            return;
        }

        let rows: Vec<(u32, RowKind)> = self
            .grid
            .rows()
            .iter()
            .enumerate()
            .map(|(idx, r)| (idx as u32, r.kind))
            .collect();

        for (row, kind) in rows {
            let fallback = match kind {
                RowKind::Header => CellStyle::DateHeader,
                RowKind::Project => CellStyle::Project,
                RowKind::User => CellStyle::UserDate,
                RowKind::Issue => CellStyle::IssueDate,
                RowKind::Total => continue,
            };
            for col in &weekend_cols {
                self.grid.mark_weekend(row, *col, fallback);
            }
        }
    }
}

/// `=SUM(E3,E7,...)` over `rows`, or a literal 0 when there are none
fn sum_of(rows: &[u32], col: u16) -> CellValue {
    if rows.is_empty() {
        return CellValue::Number(0.0);
    }
    let refs: Vec<String> = rows.iter().map(|row| cell_ref(*row, col)).collect();
    CellValue::Formula(format!("=SUM({})", refs.join(",")))
}

/// Date column label, `M/D` without zero padding
pub fn date_label(date: NaiveDate) -> String {
    format!("{}/{}", date.month(), date.day())
}

/// Sheet name for the report range, e.g. `Jan 1 - Jan 7`
pub fn sheet_name(range: &DateRange) -> String {
    format!(
        "{} - {}",
        range.from.format("%b %-d"),
        range.to.format("%b %-d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use worklog_core::Effort;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range() -> DateRange {
        DateRange::parse("2024-01-01", "2024-01-07").unwrap()
    }

    fn issue(key: &str, efforts: &[(u32, i64)]) -> Issue {
        Issue {
            key: key.into(),
            summary: format!("{key} summary"),
            efforts: efforts
                .iter()
                .map(|(day, secs)| Effort::new(date(2024, 1, *day), *secs))
                .collect(),
        }
    }

    fn user(name: &str, rate: i64, issues: Vec<Issue>) -> User {
        User {
            account_id: format!("id-{name}"),
            display_name: name.into(),
            position: "Dev".into(),
            rate,
            issues,
        }
    }

    fn build(worklog: &Worklog) -> ReportGrid {
        ReportBuilder::new(&range()).unwrap().build(worklog)
    }

    #[test]
    fn labels_and_sheet_name() {
        assert_eq!(date_label(date(2024, 1, 7)), "1/7");
        assert_eq!(date_label(date(2024, 12, 25)), "12/25");
        assert_eq!(sheet_name(&range()), "Jan 1 - Jan 7");
    }

    #[test]
    fn empty_worklog_has_header_and_zero_total() {
        let grid = build(&Worklog::default());

        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.row(0).unwrap().kind, RowKind::Header);
        let total = grid.row(1).unwrap();
        assert_eq!(total.kind, RowKind::Total);
        assert_eq!(total.cell(HOURS_COL).unwrap().number(), Some(0.0));
        assert_eq!(total.cell(COST_COL).unwrap().number(), Some(0.0));
    }

    #[test]
    fn user_and_issue_formulas() {
        let mut project = Project::new("PRJ");
        project.users.push(user(
            "Alice",
            45,
            vec![issue("PRJ-1", &[(2, 5400)]), issue("PRJ-2", &[(2, 1800), (3, 3600)])],
        ));
        let grid = build(&Worklog::new(vec![project]));

        // header, project, user(2), issues(3, 4), total
        let user_row = 2;
        assert_eq!(grid.row(user_row).unwrap().kind, RowKind::User);
        assert_eq!(grid.cell(user_row, HOURS_COL).unwrap().formula(), Some("=SUM(G3:M3)"));
        assert_eq!(grid.cell(user_row, COST_COL).unwrap().formula(), Some("=D3*E3"));
        assert_eq!(grid.cell(user_row, 7).unwrap().formula(), Some("=SUM(H4:H5)"));
        assert_eq!(grid.cell(user_row, 8).unwrap().formula(), Some("=SUM(I4:I5)"));
        assert_eq!(grid.cell(user_row, 6).unwrap().formula(), None);

        assert_eq!(grid.cell(3, TASK_COL).unwrap().text(), Some("PRJ-1: PRJ-1 summary"));
        assert_eq!(grid.cell(3, RATE_COL).unwrap().number(), Some(45.0));
        assert_eq!(grid.cell(3, 7).unwrap().number(), Some(1.5));
        assert_eq!(grid.cell(4, 7).unwrap().number(), Some(0.5));
        assert_eq!(grid.cell(4, HOURS_COL).unwrap().formula(), Some("=SUM(G5:M5)"));

        assert_eq!(grid.zero_rate_cells, vec![(user_row, RATE_COL)]);
    }

    #[test]
    fn total_sums_user_rows_only() {
        let mut a = Project::new("A");
        a.users.push(user("Alice", 10, vec![issue("A-1", &[(1, 3600)])]));
        let mut b = Project::new("B");
        b.users.push(user("Bob", 20, vec![issue("B-1", &[(2, 3600)])]));
        let grid = build(&Worklog::new(vec![a, b]));

        let total = grid.rows_of(RowKind::Total).next().unwrap();
        // users sit on rows 3 and 6 (1-based)
        assert_eq!(grid.cell(total, HOURS_COL).unwrap().formula(), Some("=SUM(E3,E6)"));
        assert_eq!(grid.cell(total, COST_COL).unwrap().formula(), Some("=SUM(F3,F6)"));
    }

    #[test]
    fn weekend_columns_are_highlighted_except_total() {
        let mut project = Project::new("PRJ");
        project
            .users
            .push(user("Alice", 0, vec![issue("PRJ-1", &[(6, 3600)])]));
        let grid = build(&Worklog::new(vec![project]));

        // Jan 6 and Jan 7 2024 are Saturday and Sunday: columns L and M
        let total = grid.rows_of(RowKind::Total).next().unwrap();
        for row in 0..total {
            for col in [11, 12] {
                assert!(grid.cell(row, col).unwrap().weekend, "row {row} col {col}");
            }
            assert!(!grid.cell(row, 10).map_or(false, |c| c.weekend));
        }
        assert!(grid.cell(total, 11).is_none());
        assert_eq!(grid.cell(3, 11).unwrap().number(), Some(1.0));
    }

    #[test]
    fn efforts_outside_range_are_dropped() {
        let mut project = Project::new("PRJ");
        project.users.push(user(
            "Alice",
            0,
            vec![Issue {
                key: "PRJ-1".into(),
                summary: String::new(),
                efforts: vec![Effort::new(date(2024, 2, 1), 3600)],
            }],
        ));
        let grid = build(&Worklog::new(vec![project]));

        let issue_row = grid.rows_of(RowKind::Issue).next().unwrap();
        let numbers = grid
            .row(issue_row)
            .unwrap()
            .cells()
            .filter(|(col, cell)| *col >= FIRST_DATE_COL && cell.number().is_some())
            .count();
        assert_eq!(numbers, 0);
        assert_eq!(grid.cell(issue_row, TASK_COL).unwrap().text(), Some("PRJ-1: "));
    }

    #[test]
    fn oversized_range_is_rejected() {
        let range = DateRange::parse("1900-01-01", "2000-01-01").unwrap();
        assert!(matches!(
            ReportBuilder::new(&range),
            Err(RenderError::InvalidData(_))
        ));
    }
}
