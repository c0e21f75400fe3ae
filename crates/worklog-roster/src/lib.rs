//! # worklog-roster
//!
//! Spreadsheet storage for the per-project rate roster.
//!
//! ## File layout
//!
//! ```text
//! Sheet: PRJ                         (one sheet per project key)
//! | Name        | Position   | Rate |
//! |-------------|------------|------|
//! | Alice Smith | Developer  | 45   |
//! | Bob Jones   |            | 0    |  <- rate 0 highlighted red
//! ```
//!
//! The first row of each sheet is a header and is skipped on read; rows with
//! an empty name are ignored. The rate must be an integer. A missing file
//! loads as an empty roster. Saving rewrites the whole file.

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::{
    ConditionalFormatCell, ConditionalFormatCellRule, Format, FormatAlign, FormatBorder, Workbook,
    Worksheet, XlsxError,
};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use worklog_core::{write_atomically, ProjectRoster, Roster, RosterEntry, RosterError, Worklog};

/// Rows above the first user row
const HEADER_ROWS: u32 = 1;

const NAME_COL: u16 = 0;
const POSITION_COL: u16 = 1;
const RATE_COL: u16 = 2;

/// Currency number format used for rate cells
pub const RATE_NUM_FORMAT: &str = "[$$-409]#,##0";

/// Roster spreadsheet at a fixed path
#[derive(Clone, Debug)]
pub struct RosterStore {
    path: PathBuf,
}

impl RosterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the roster; an absent file yields an empty roster
    pub fn load(&self) -> Result<Roster, RosterError> {
        match std::fs::metadata(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "Roster file not found, starting empty");
                return Ok(Roster::new());
            }
            Err(e) => return Err(RosterError::Io(e)),
            Ok(_) => {}
        }

        let mut workbook: Xlsx<_> = open_workbook(&self.path).map_err(|e| self.decode_error(e))?;
        let mut roster = Roster::new();

        for sheet_name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&sheet_name)
                .map_err(|e| self.decode_error(e))?;
            let users = parse_sheet(&sheet_name, &range)?;
            *roster.project_mut(sheet_name) = users;
        }

        info!(
            path = %self.path.display(),
            projects = roster.project_count(),
            users = roster.user_count(),
            "Roster loaded"
        );
        debug!("roster: {}", roster.to_pretty_json());

        Ok(roster)
    }

    /// Persist `roster`, replacing the file
    pub fn save(&self, roster: &Roster) -> Result<(), RosterError> {
        let bytes = render_roster(roster)?;
        write_atomically(&self.path, &bytes)?;

        info!(
            path = %self.path.display(),
            projects = roster.project_count(),
            users = roster.user_count(),
            "Roster saved"
        );
        Ok(())
    }

    /// Reconcile `stored` against `worklog`, persist the result and return it
    pub fn sync(&self, stored: &Roster, worklog: &Worklog) -> Result<Roster, RosterError> {
        let reconciled = stored.reconcile(worklog);
        self.save(&reconciled)?;
        debug!("roster: {}", reconciled.to_pretty_json());
        Ok(reconciled)
    }

    fn decode_error(&self, err: impl std::fmt::Display) -> RosterError {
        RosterError::Decode {
            path: self.path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

// ============================================================================
// Reading
// ============================================================================

/// Parse one project sheet
fn parse_sheet(project: &str, range: &Range<Data>) -> Result<ProjectRoster, RosterError> {
    let mut users = ProjectRoster::default();

    let (Some((start_row, _)), Some((end_row, _))) = (range.start(), range.end()) else {
        return Ok(users);
    };

    for row in start_row.max(HEADER_ROWS)..=end_row {
        let name = cell_text(range.get_value((row, u32::from(NAME_COL))));
        if name.trim().is_empty() {
            continue;
        }

        let position = cell_text(range.get_value((row, u32::from(POSITION_COL))));
        let rate = parse_rate(range.get_value((row, u32::from(RATE_COL)))).map_err(|value| {
            RosterError::InvalidRate {
                project: project.to_string(),
                user: name.clone(),
                row: row + 1,
                value,
            }
        })?;

        users.insert(name, RosterEntry::new(position, rate));
    }

    Ok(users)
}

/// Cell text exactly as stored; names must match Tempo display names verbatim
fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.clone(),
        Some(Data::Float(f)) if f.fract() == 0.0 => format!("{}", *f as i64),
        Some(other) => other.to_string(),
    }
}

/// Integer rate; the offending text on failure
fn parse_rate(cell: Option<&Data>) -> Result<i64, String> {
    match cell {
        None | Some(Data::Empty) => Ok(0),
        Some(Data::Int(i)) => Ok(*i),
        Some(Data::Float(f)) if f.fract() == 0.0 => Ok(*f as i64),
        Some(Data::String(s)) if s.trim().is_empty() => Ok(0),
        Some(Data::String(s)) => s.trim().parse::<i64>().map_err(|_| s.clone()),
        Some(other) => Err(other.to_string()),
    }
}

// ============================================================================
// Writing
// ============================================================================

struct RosterFormats {
    header: Format,
    text: Format,
    rate: Format,
    zero_rate: Format,
}

impl RosterFormats {
    fn new() -> Self {
        let header = Format::new()
            .set_bold()
            .set_font_size(13)
            .set_font_color(0xFFFFFF)
            .set_background_color(0x009A00)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin);

        let text = Format::new().set_font_size(12);

        let rate = Format::new().set_font_size(12).set_num_format(RATE_NUM_FORMAT);

        let zero_rate = Format::new()
            .set_font_color(0x9A0511)
            .set_background_color(0xFEC7CE);

        Self {
            header,
            text,
            rate,
            zero_rate,
        }
    }
}

/// Render the roster workbook to XLSX bytes
pub fn render_roster(roster: &Roster) -> Result<Vec<u8>, RosterError> {
    let mut workbook = Workbook::new();
    let formats = RosterFormats::new();

    for (project, users) in roster.projects() {
        let sheet = workbook.add_worksheet();
        sheet.set_name(project).map_err(format_error)?;
        write_project_sheet(sheet, users, &formats).map_err(format_error)?;
    }

    workbook.save_to_buffer().map_err(format_error)
}

fn write_project_sheet(
    sheet: &mut Worksheet,
    users: &ProjectRoster,
    formats: &RosterFormats,
) -> Result<(), XlsxError> {
    for (col, header) in ["Name", "Position", "Rate"].iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &formats.header)?;
    }
    sheet.set_row_height(0, 25)?;
    sheet.set_column_width(NAME_COL, 30)?;
    sheet.set_column_width(POSITION_COL, 30)?;
    sheet.set_column_width(RATE_COL, 10)?;

    let mut row = HEADER_ROWS;
    for (name, entry) in users.iter() {
        sheet.write_string_with_format(row, NAME_COL, name, &formats.text)?;
        sheet.write_string_with_format(row, POSITION_COL, &entry.position, &formats.text)?;
        sheet.write_number_with_format(row, RATE_COL, entry.rate as f64, &formats.rate)?;
        row += 1;
    }

    if row > HEADER_ROWS {
        let unset_rate = ConditionalFormatCell::new()
            .set_rule(ConditionalFormatCellRule::EqualTo(0))
            .set_format(formats.zero_rate.clone());
        sheet.add_conditional_format(HEADER_ROWS, RATE_COL, row - 1, RATE_COL, &unset_rate)?;
    }

    Ok(())
}

fn format_error(err: XlsxError) -> RosterError {
    RosterError::Format(err.to_string())
}
