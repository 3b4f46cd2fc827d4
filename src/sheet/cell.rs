use crate::normalize::{clean_string, parse_amount, parse_measure};
use calamine::Data;

/// Cell rendered the way it reads in the sheet; whole floats lose their `.0`
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
                format!("{:.0}", f)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

/// `clean_string` applied to a cell
pub fn cell_clean(cell: &Data) -> String {
    clean_string(&cell_text(cell))
}

/// Trimmed, upper-cased text used for header and label matching
pub fn cell_label(cell: &Data) -> String {
    cell_text(cell).trim().to_uppercase()
}

/// Numeric value, 0.0 for anything unparseable
pub fn cell_f64(cell: &Data) -> f64 {
    cell_opt_f64(cell).unwrap_or(0.0)
}

/// Numeric value, `None` for empty or non-numeric cells
pub fn cell_opt_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) if f.is_finite() => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::DateTime(dt) => Some(dt.as_f64()),
        Data::String(s) => parse_amount(s),
        _ => None,
    }
}

/// Temperature / density value; text uses `parse_measure` so `28,5` reads as 28.5
pub fn cell_measure(cell: &Data) -> Option<f64> {
    match cell {
        Data::String(s) => parse_measure(s),
        other => cell_opt_f64(other),
    }
}
