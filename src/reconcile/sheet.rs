//! Monthly attendance sheet normalization.
//!
//! The sheet is wide: one row per employee and record kind (`datang` for
//! clock-in, `pulang` for clock-out) and one column per day of the month. It is
//! folded into one punch per employee and day.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Cursor};

use calamine::{Data, Reader, Xlsx};
use chrono::{NaiveDate, NaiveTime};
use derive_more::Display;
use tracing::{debug, warn};

use crate::model::attendance::{AttendanceStatus, NewAttendance};
use crate::model::employee::NO_DIVISION;
use crate::reconcile::classifier::{Classifier, PunchValue};

const ID_HEADERS: &[&str] = &["id"];
const NAME_HEADERS: &[&str] = &["nama", "name"];
const KIND_HEADERS: &[&str] = &["jenis", "kind"];

#[derive(Debug, Display, PartialEq)]
pub enum SheetError {
    #[display(fmt = "Column '{}' not found in the sheet", _0)]
    MissingColumn(&'static str),
    #[display(fmt = "No day columns (1-31) found in the sheet")]
    NoDayColumns,
    #[display(fmt = "Unreadable sheet: {}", _0)]
    Unreadable(String),
}

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Xlsx,
}

impl SheetFormat {
    /// Picks the reader from the upload's content type. Without a usable type
    /// the bytes are sniffed: xlsx files are zip archives.
    pub fn detect(content_type: Option<&str>, bytes: &[u8]) -> Option<Self> {
        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase());

        match mime.as_deref() {
            Some(XLSX_CONTENT_TYPE) => Some(SheetFormat::Xlsx),
            Some("text/csv" | "application/csv" | "text/plain") => Some(SheetFormat::Csv),
            None | Some("" | "application/octet-stream") => Some(if bytes.starts_with(ZIP_MAGIC) {
                SheetFormat::Xlsx
            } else {
                SheetFormat::Csv
            }),
            Some(_) => None,
        }
    }
}

/// Excel stores times as a fraction of a day.
fn excel_time(value: f64) -> Option<String> {
    let seconds = (value.fract().abs() * 86_400.0).round() as u32 % 86_400;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).map(|t| t.format("%H:%M").to_string())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{f:.0}"),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_time(dt.as_f64()).unwrap_or_default(),
        _ => String::new(),
    }
}

/// Sheet cells as text, header row kept apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawSheet {
    pub fn from_csv<R: io::Read>(reader: R) -> Result<Self, SheetError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| SheetError::Unreadable(e.to_string()))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| SheetError::Unreadable(e.to_string()))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Reads the first worksheet of an xlsx workbook. Time-formatted cells
    /// become `HH:MM`.
    pub fn from_xlsx(bytes: &[u8]) -> Result<Self, SheetError> {
        let mut workbook = Xlsx::new(Cursor::new(bytes))
            .map_err(|e| SheetError::Unreadable(e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| SheetError::Unreadable("workbook has no worksheet".into()))?
            .map_err(|e| SheetError::Unreadable(e.to_string()))?;

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
        let headers = rows.next().unwrap_or_default();

        Ok(Self {
            headers,
            rows: rows.collect(),
        })
    }

    pub fn read(format: SheetFormat, bytes: &[u8]) -> Result<Self, SheetError> {
        match format {
            SheetFormat::Csv => Self::from_csv(bytes),
            SheetFormat::Xlsx => Self::from_xlsx(bytes),
        }
    }

    fn column(&self, names: &[&str]) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
    }

    /// Columns whose header is a bare day number between 1 and 31.
    fn day_columns(&self) -> Vec<(usize, u32)> {
        self.headers
            .iter()
            .enumerate()
            .filter_map(|(idx, h)| {
                let h = h.trim();
                if h.is_empty() || !h.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                h.parse::<u32>()
                    .ok()
                    .filter(|day| (1..=31).contains(day))
                    .map(|day| (idx, day))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PunchKind {
    ClockIn,
    ClockOut,
}

impl PunchKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "datang" => Some(PunchKind::ClockIn),
            "pulang" => Some(PunchKind::ClockOut),
            _ => None,
        }
    }
}

/// One employee-day after folding. The date is not known yet: the sheet only
/// carries the day of the month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPunch {
    pub employee_id: i64,
    pub name: String,
    pub day: u32,
    pub clock_in: Option<String>,
    pub clock_out: Option<String>,
    pub status: AttendanceStatus,
}

#[derive(Default)]
struct Slot {
    name: String,
    clock_in: Option<String>,
    clock_out: Option<String>,
}

/// Folds the sheet into one punch per (employee, day), ordered by employee id
/// then day.
pub fn normalize(
    sheet: &RawSheet,
    classifier: &Classifier,
) -> Result<Vec<NormalizedPunch>, SheetError> {
    let id_col = sheet.column(ID_HEADERS).ok_or(SheetError::MissingColumn("ID"))?;
    let name_col = sheet
        .column(NAME_HEADERS)
        .ok_or(SheetError::MissingColumn("Nama"))?;
    let kind_col = sheet
        .column(KIND_HEADERS)
        .ok_or(SheetError::MissingColumn("Jenis"))?;

    let day_cols = sheet.day_columns();
    if day_cols.is_empty() {
        return Err(SheetError::NoDayColumns);
    }

    let mut slots: BTreeMap<(i64, u32), Slot> = BTreeMap::new();

    for (line, row) in sheet.rows.iter().enumerate() {
        let cell = |idx: usize| row.get(idx).map(|v| v.trim()).unwrap_or("");

        let raw_id = cell(id_col);
        let Ok(employee_id) = raw_id.parse::<i64>() else {
            warn!(line = line + 2, id = raw_id, "Skipping sheet row with unreadable employee ID");
            continue;
        };

        let Some(kind) = PunchKind::parse(cell(kind_col)) else {
            debug!(line = line + 2, kind = cell(kind_col), "Ignoring sheet row of unknown kind");
            continue;
        };

        for &(idx, day) in &day_cols {
            let value = cell(idx);
            if value.is_empty() {
                continue;
            }

            let slot = slots.entry((employee_id, day)).or_insert_with(|| Slot {
                name: cell(name_col).to_string(),
                ..Slot::default()
            });
            let field = match kind {
                PunchKind::ClockIn => &mut slot.clock_in,
                PunchKind::ClockOut => &mut slot.clock_out,
            };
            // first occurrence wins
            if field.is_none() {
                *field = Some(value.to_string());
            }
        }
    }

    Ok(slots
        .into_iter()
        .map(|((employee_id, day), slot)| {
            let status = match slot.clock_in.as_deref() {
                None => AttendanceStatus::NoData,
                Some(text) => classifier.classify(Some(PunchValue::Text(text))).into(),
            };
            NormalizedPunch {
                employee_id,
                name: slot.name,
                day,
                clock_in: slot.clock_in,
                clock_out: slot.clock_out,
                status,
            }
        })
        .collect())
}

pub fn division_for(divisions: &HashMap<i64, String>, employee_id: i64) -> String {
    divisions
        .get(&employee_id)
        .cloned()
        .unwrap_or_else(|| NO_DIVISION.to_string())
}

/// Dates the punches within `year`/`month` and attaches divisions. Days that
/// do not exist in the month are dropped.
pub fn into_attendance(
    punches: Vec<NormalizedPunch>,
    divisions: &HashMap<i64, String>,
    year: i32,
    month: u32,
) -> Vec<NewAttendance> {
    punches
        .into_iter()
        .filter_map(|punch| {
            let Some(date) = NaiveDate::from_ymd_opt(year, month, punch.day) else {
                warn!(
                    employee_id = punch.employee_id,
                    day = punch.day,
                    year,
                    month,
                    "Skipping punch for a day outside the month"
                );
                return None;
            };
            Some(NewAttendance {
                division: division_for(divisions, punch.employee_id),
                name: punch.name,
                date,
                clock_in: punch.clock_in,
                clock_out: punch.clock_out,
                status: punch.status,
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn sheet(csv: &str) -> RawSheet {
        RawSheet::from_csv(csv.as_bytes()).unwrap()
    }

    /// Two-day workbook for employee 7 with one time-formatted cell and one
    /// typed as text.
    pub(crate) fn workbook() -> Vec<u8> {
        use rust_xlsxwriter::{Format, Workbook};

        let mut workbook = Workbook::new();
        let time = Format::new().set_num_format("hh:mm");
        let ws = workbook.add_worksheet();
        for (col, header) in ["ID", "Nama", "Jenis"].into_iter().enumerate() {
            ws.write_string(0, col as u16, header).unwrap();
        }
        ws.write_number(0, 3, 1).unwrap();
        ws.write_number(0, 4, 2).unwrap();

        ws.write_number(1, 0, 7).unwrap();
        ws.write_string(1, 1, "Budi").unwrap();
        ws.write_string(1, 2, "datang").unwrap();
        ws.write_number_with_format(1, 3, 8.0 / 24.0, &time).unwrap();
        ws.write_string(1, 4, "09:30").unwrap();

        ws.write_number(2, 0, 7).unwrap();
        ws.write_string(2, 1, "Budi").unwrap();
        ws.write_string(2, 2, "pulang").unwrap();
        ws.write_number_with_format(2, 3, 17.5 / 24.0, &time).unwrap();

        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn xlsx_cells_become_text_and_times_become_clock_values() {
        let sheet = RawSheet::from_xlsx(&workbook()).unwrap();
        assert_eq!(sheet.headers, vec!["ID", "Nama", "Jenis", "1", "2"]);
        assert_eq!(sheet.rows[0][..4], ["7", "Budi", "datang", "08:00"]);

        let punches = normalize(&sheet, &Classifier::default()).unwrap();
        assert_eq!(punches.len(), 2);
        assert_eq!(punches[0].clock_in.as_deref(), Some("08:00"));
        assert_eq!(punches[0].clock_out.as_deref(), Some("17:30"));
        assert_eq!(punches[0].status, AttendanceStatus::OnTime);
        assert_eq!(punches[1].status, AttendanceStatus::Late);
    }

    #[test]
    fn garbage_xlsx_is_unreadable() {
        assert!(matches!(
            RawSheet::from_xlsx(b"PK\x03\x04 not a workbook"),
            Err(SheetError::Unreadable(_))
        ));
    }

    #[test]
    fn format_follows_content_type_then_magic_bytes() {
        let xlsx = workbook();
        assert_eq!(
            SheetFormat::detect(Some(XLSX_CONTENT_TYPE), b""),
            Some(SheetFormat::Xlsx)
        );
        assert_eq!(
            SheetFormat::detect(Some("text/csv; charset=utf-8"), &xlsx),
            Some(SheetFormat::Csv)
        );
        assert_eq!(SheetFormat::detect(None, &xlsx), Some(SheetFormat::Xlsx));
        assert_eq!(
            SheetFormat::detect(Some("application/octet-stream"), b"ID,Nama"),
            Some(SheetFormat::Csv)
        );
        assert_eq!(SheetFormat::detect(Some("image/png"), b""), None);
    }

    #[test]
    fn folds_clock_in_and_out_into_one_record() {
        let sheet = sheet("ID,Nama,Jenis,1,2,3\n7,Budi,datang,,,08:00\n7,Budi,pulang,,,17:00\n");
        let punches = normalize(&sheet, &Classifier::default()).unwrap();

        assert_eq!(
            punches,
            vec![NormalizedPunch {
                employee_id: 7,
                name: "Budi".into(),
                day: 3,
                clock_in: Some("08:00".into()),
                clock_out: Some("17:00".into()),
                status: AttendanceStatus::OnTime,
            }]
        );
    }

    #[test]
    fn missing_kind_column_fails_the_whole_sheet() {
        let sheet = sheet("ID,Nama,1\n7,Budi,08:00\n");
        assert_eq!(
            normalize(&sheet, &Classifier::default()),
            Err(SheetError::MissingColumn("Jenis"))
        );
    }

    #[test]
    fn sheet_without_day_columns_is_rejected() {
        let sheet = sheet("ID,Nama,Jenis,Catatan\n7,Budi,datang,x\n");
        assert_eq!(
            normalize(&sheet, &Classifier::default()),
            Err(SheetError::NoDayColumns)
        );
    }

    #[test]
    fn kind_is_case_insensitive_and_headers_accept_english() {
        let sheet = sheet("id,name,kind,1\n3,Sari,DATANG,09:30\n");
        let punches = normalize(&sheet, &Classifier::default()).unwrap();
        assert_eq!(punches.len(), 1);
        assert_eq!(punches[0].status, AttendanceStatus::Late);
        assert_eq!(punches[0].clock_out, None);
    }

    #[test]
    fn clock_out_only_yields_no_data() {
        let sheet = sheet("ID,Nama,Jenis,5\n4,Andi,pulang,16:45\n");
        let punches = normalize(&sheet, &Classifier::default()).unwrap();
        assert_eq!(punches.len(), 1);
        assert_eq!(punches[0].clock_in, None);
        assert_eq!(punches[0].clock_out.as_deref(), Some("16:45"));
        assert_eq!(punches[0].status, AttendanceStatus::NoData);
    }

    #[test]
    fn unparsable_clock_in_is_kept_as_invalid() {
        let sheet = sheet("ID,Nama,Jenis,2\n4,Andi,datang,pagi\n");
        let punches = normalize(&sheet, &Classifier::default()).unwrap();
        assert_eq!(punches[0].status, AttendanceStatus::InvalidTime);
        assert_eq!(punches[0].clock_in.as_deref(), Some("pagi"));
    }

    #[test]
    fn duplicate_kind_keeps_first_value() {
        let sheet = sheet("ID,Nama,Jenis,1\n1,Rina,datang,08:10\n1,Rina,datang,10:00\n");
        let punches = normalize(&sheet, &Classifier::default()).unwrap();
        assert_eq!(punches.len(), 1);
        assert_eq!(punches[0].clock_in.as_deref(), Some("08:10"));
        assert_eq!(punches[0].status, AttendanceStatus::OnTime);
    }

    #[test]
    fn output_is_ordered_and_bad_rows_are_skipped() {
        let sheet = sheet(
            "ID,Nama,Jenis,2,1,32\n\
             9,Zaki,datang,08:00,08:05,07:00\n\
             x,Nobody,datang,08:00,,\n\
             2,Ayu,lembur,08:00,,\n\
             2,Ayu,datang,,09:00,\n",
        );
        let punches = normalize(&sheet, &Classifier::default()).unwrap();
        let keys: Vec<(i64, u32)> = punches.iter().map(|p| (p.employee_id, p.day)).collect();
        assert_eq!(keys, vec![(2, 1), (9, 1), (9, 2)]);
    }

    #[test]
    fn dating_attaches_divisions_and_drops_impossible_days() {
        let sheet = sheet("ID,Nama,Jenis,30,31\n1,Rina,datang,08:00,08:00\n2,Tono,datang,08:00,\n");
        let punches = normalize(&sheet, &Classifier::default()).unwrap();
        let divisions = HashMap::from([(1, "Finance".to_string())]);

        let records = into_attendance(punches, &divisions, 2024, 4);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].division, "Finance");
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());
        assert_eq!(records[1].name, "Tono");
        assert_eq!(records[1].division, NO_DIVISION);
    }

    #[test]
    fn byte_order_mark_does_not_hide_the_id_column() {
        let sheet = sheet("\u{feff}ID,Nama,Jenis,1\n1,Rina,datang,08:00\n");
        assert_eq!(normalize(&sheet, &Classifier::default()).unwrap().len(), 1);
    }
}
