use crate::models::{DateOption, DateResolution};
use crate::normalize::is_blank;
use calamine::Data;
use chrono::{Datelike, Days, NaiveDate};

/// Final date of a batch, or the two candidates the user still has to choose from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateDecision {
    Final(String),
    NeedsConfirmation { first: DateOption, second: DateOption },
}

/// Spreadsheet day zero (keeps the 1900 leap-year offset)
fn serial_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Calendar date of a spreadsheet serial; the fractional part (time of day) is dropped
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let days = serial.trunc() as i64;
    let epoch = serial_epoch()?;
    if days >= 0 {
        epoch.checked_add_days(Days::new(days as u64))
    } else {
        epoch.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

fn format_dmy(d: u32, m: u32, y: i32) -> String {
    format!("{:02}/{:02}/{}", d, m, y)
}

/// Day/month disambiguation of a date the sheet may have read with swapped fields
pub fn resolve_date(date: NaiveDate) -> DateResolution {
    let (d, m, y) = (date.day(), date.month(), date.year());

    if d > 12 || m > 12 {
        // month > 12 means the fields were read the wrong way round
        if m > 12 {
            return DateResolution::Resolved(format_dmy(m, d, y));
        }
        return DateResolution::Resolved(format_dmy(d, m, y));
    }

    if d != m {
        return DateResolution::Ambiguous {
            first: DateOption { d, m, full: format_dmy(d, m, y) },
            second: DateOption { d: m, m: d, full: format_dmy(m, d, y) },
        };
    }

    DateResolution::Resolved(format_dmy(d, m, y))
}

/// Resolve the invoice-date cell of the first data row
pub fn resolve_date_cell(cell: &Data) -> DateResolution {
    let date = match cell {
        Data::Float(f) => serial_to_date(*f),
        Data::Int(i) => serial_to_date(*i as f64),
        Data::DateTime(dt) => serial_to_date(dt.as_f64()),
        Data::DateTimeIso(s) => s.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
        Data::String(s) if !is_blank(s) => {
            let s = s.trim();
            if let Ok(literal) = NaiveDate::parse_from_str(s, "%d/%m/%Y") {
                // already written out as day/month/year text
                return DateResolution::Resolved(literal.format("%d/%m/%Y").to_string());
            }
            s.parse::<f64>().ok().and_then(serial_to_date)
        }
        _ => None,
    };

    match date {
        Some(date) => resolve_date(date),
        None => DateResolution::Resolved(String::new()),
    }
}

/// A confirmed date always wins; otherwise only an unambiguous batch proceeds
pub fn decide_batch_date(resolution: &DateResolution, confirmed: Option<&str>) -> DateDecision {
    if let Some(confirmed) = confirmed.map(str::trim).filter(|c| !c.is_empty()) {
        return DateDecision::Final(confirmed.to_string());
    }
    match resolution {
        DateResolution::Resolved(date) => DateDecision::Final(date.clone()),
        DateResolution::Ambiguous { first, second } => DateDecision::NeedsConfirmation {
            first: first.clone(),
            second: second.clone(),
        },
    }
}
